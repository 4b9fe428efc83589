//! Platform abstraction layer
//!
//! The core modules talk to the host only through traits
//! ([`SurfaceBackend`](crate::surface::SurfaceBackend),
//! [`DrawContext`](crate::surface::DrawContext),
//! [`FrameHost`](crate::scheduler::FrameHost)). This module provides the
//! browser implementations:
//! - Canvas 2D surface and context
//! - `requestAnimationFrame` frame host
//! - Resize / visibility listeners
//! - IntersectionObserver-driven reveal and the nav cue timer

#[cfg(target_arch = "wasm32")]
pub mod web;
