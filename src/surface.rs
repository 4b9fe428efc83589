//! Full-viewport drawing surface
//!
//! The surface keeps its backing buffer at `logical size × clamped DPR` and
//! scales every draw call so callers work in logical (CSS) pixels.
//! Acquisition goes through [`SurfaceHandle::initialize`]; dropping or tearing
//! down the handle detaches the node from the page.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use crate::consts::{DPR_MAX, DPR_MIN};
use crate::error::SurfaceError;
use crate::renderer::color::Rgba;
use crate::renderer::recording::RecordingContext;

/// Host viewport snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    /// Logical width (CSS px)
    pub width: f32,
    /// Logical height (CSS px)
    pub height: f32,
    /// Raw ratio reported by the host, unclamped
    pub device_pixel_ratio: f32,
}

impl ViewportMetrics {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    pub fn logical_size(&self) -> Vec2 {
        Vec2::new(self.width.max(0.0), self.height.max(0.0))
    }
}

/// Logical-to-physical scale applied to all drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform { scale: 1.0 };

    pub fn scale(scale: f32) -> Self {
        Self { scale }
    }
}

/// Derived surface geometry, recomputed on every resize
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceState {
    pub logical: Vec2,
    /// Clamped device pixel ratio
    pub device_pixel_ratio: f32,
    /// Backing buffer size in physical pixels
    pub physical: (u32, u32),
    pub transform: Transform,
}

impl SurfaceState {
    /// Compute geometry with the default `[1, 2]` ratio clamp
    pub fn compute(metrics: ViewportMetrics) -> Self {
        Self::compute_clamped(metrics, DPR_MIN, DPR_MAX)
    }

    pub fn compute_clamped(metrics: ViewportMetrics, min: f32, max: f32) -> Self {
        let dpr = clamp_ratio(metrics.device_pixel_ratio, min, max);
        let logical = metrics.logical_size();
        Self {
            logical,
            device_pixel_ratio: dpr,
            physical: (
                (logical.x * dpr).floor() as u32,
                (logical.y * dpr).floor() as u32,
            ),
            transform: Transform::scale(dpr),
        }
    }
}

/// Clamp a host-reported ratio; non-finite or non-positive values count as 1
pub fn clamp_ratio(raw: f32, min: f32, max: f32) -> f32 {
    let raw = if raw.is_finite() && raw > 0.0 { raw } else { 1.0 };
    raw.clamp(min, max)
}

/// Immediate-mode 2D drawing context
pub trait DrawContext {
    /// Reallocate the backing buffer (physical pixels). Resets the transform.
    fn resize_buffer(&mut self, width: u32, height: u32);
    fn set_transform(&mut self, transform: Transform);
    /// Clear the entire physical buffer
    fn clear(&mut self);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32);
    /// Fill a circle with a radial gradient from `inner` at the centre to `outer` at the rim
    fn fill_radial(&mut self, center: Vec2, radius: f32, inner: Rgba, outer: Rgba);
}

/// Owner of the page-level drawing node
pub trait SurfaceBackend {
    type Context: DrawContext;

    /// Insert one full-viewport, pointer-transparent node behind all content
    /// and return its drawing context.
    fn attach(&mut self) -> Result<Self::Context, SurfaceError>;

    /// Remove the node and any listeners registered in `attach`
    fn detach(&mut self);
}

/// An attached surface. Detaches on [`teardown`](Self::teardown) or drop.
pub struct SurfaceHandle<B: SurfaceBackend> {
    backend: B,
    ctx: B::Context,
    state: SurfaceState,
    dpr_clamp: (f32, f32),
    /// Bumped whenever the backing buffer changes size
    generation: u64,
    attached: bool,
}

impl<B: SurfaceBackend> SurfaceHandle<B> {
    /// Attach the surface and size it to `metrics`
    pub fn initialize(backend: B, metrics: ViewportMetrics) -> Result<Self, SurfaceError> {
        Self::initialize_clamped(backend, metrics, DPR_MIN, DPR_MAX)
    }

    pub fn initialize_clamped(
        mut backend: B,
        metrics: ViewportMetrics,
        dpr_min: f32,
        dpr_max: f32,
    ) -> Result<Self, SurfaceError> {
        let ctx = backend.attach()?;
        let state = SurfaceState::compute_clamped(metrics, dpr_min, dpr_max);
        let mut handle = Self {
            backend,
            ctx,
            state,
            dpr_clamp: (dpr_min, dpr_max),
            generation: 0,
            attached: true,
        };
        handle.apply_state();
        log::info!(
            "Surface attached: {}x{} logical, {}x{} physical @ {}x",
            state.logical.x,
            state.logical.y,
            state.physical.0,
            state.physical.1,
            state.device_pixel_ratio
        );
        Ok(handle)
    }

    /// Resync the backing buffer and transform to `metrics`.
    ///
    /// Idempotent: unchanged metrics produce the same size and transform. The
    /// transform is always reapplied since a buffer resize resets it.
    pub fn resize(&mut self, metrics: ViewportMetrics) -> SurfaceState {
        let (min, max) = self.dpr_clamp;
        let next = SurfaceState::compute_clamped(metrics, min, max);
        if next.physical != self.state.physical {
            self.generation += 1;
            log::debug!(
                "Surface resized to {}x{} physical (gen {})",
                next.physical.0,
                next.physical.1,
                self.generation
            );
        }
        self.state = next;
        self.apply_state();
        next
    }

    fn apply_state(&mut self) {
        let (w, h) = self.state.physical;
        self.ctx.resize_buffer(w, h);
        self.ctx.set_transform(self.state.transform);
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn context(&mut self) -> &mut B::Context {
        &mut self.ctx
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Detach the node now
    pub fn teardown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.attached {
            self.backend.detach();
            self.attached = false;
            log::info!("Surface detached");
        }
    }
}

impl<B: SurfaceBackend> Drop for SurfaceHandle<B> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Off-screen backend that records draw calls instead of painting.
///
/// Cloning shares the attachment flag, so a caller can keep a clone to
/// observe teardown.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    attached: Rc<Cell<bool>>,
    recording: RecordingContext,
    /// Simulate a host that cannot hand out a drawing context
    pub unavailable: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose `attach` always fails
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    /// Shared view of everything drawn through this backend
    pub fn recording(&self) -> RecordingContext {
        self.recording.clone()
    }
}

impl SurfaceBackend for HeadlessBackend {
    type Context = RecordingContext;

    fn attach(&mut self) -> Result<RecordingContext, SurfaceError> {
        if self.unavailable {
            return Err(SurfaceError::ContextUnavailable);
        }
        self.attached.set(true);
        Ok(self.recording.clone())
    }

    fn detach(&mut self) {
        self.attached.set(false);
    }
}
