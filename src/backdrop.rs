//! Mounted particle backdrop
//!
//! Owns the surface, the field, the renderer and the scheduler for one page
//! view. `mount` acquires everything, `unmount` releases everything: after it
//! returns no node is attached and no frame request is pending.

use std::ops::ControlFlow;
use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::renderer::{FrameStats, ProximityRenderer};
use crate::scheduler::{FrameHost, FrameScheduler};
use crate::settings::FieldSettings;
use crate::sim::ParticleField;
use crate::surface::{SurfaceBackend, SurfaceHandle, SurfaceState, ViewportMetrics};

pub struct Backdrop<B: SurfaceBackend> {
    /// `None` when the drawing context was unavailable
    surface: Option<SurfaceHandle<B>>,
    field: ParticleField,
    renderer: ProximityRenderer,
    scheduler: FrameScheduler,
    settings: FieldSettings,
    /// Frames painted since mount
    pub frames: u64,
    pub last_stats: FrameStats,
}

impl<B: SurfaceBackend> Backdrop<B> {
    /// Attach the surface, spawn the field and request the first frame.
    ///
    /// If the surface cannot be acquired the backdrop is degraded: it keeps no
    /// node, schedules nothing and every call is a no-op. Settings that fail
    /// validation are replaced by the defaults.
    pub fn mount<H: FrameHost>(
        backend: B,
        metrics: ViewportMetrics,
        settings: FieldSettings,
        seed: u64,
        host: &mut H,
    ) -> Self {
        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                log::warn!("Rejected backdrop settings ({}); using defaults", e);
                FieldSettings::default()
            }
        };
        let surface = match SurfaceHandle::initialize_clamped(
            backend,
            metrics,
            settings.dpr_min,
            settings.dpr_max,
        ) {
            Ok(surface) => Some(surface),
            Err(e) => {
                log::warn!("Backdrop disabled: {}", e);
                None
            }
        };

        let mut rng = Pcg32::seed_from_u64(seed);
        let field = ParticleField::spawn(
            settings.particle_count,
            metrics.logical_size(),
            &settings,
            &mut rng,
        );
        let mut scheduler = FrameScheduler::new(settings.tick_hz, settings.max_substeps);
        if surface.is_some() {
            scheduler.start(host);
            log::info!(
                "Backdrop mounted: {} particles, seed {}",
                settings.particle_count,
                seed
            );
        }

        Self {
            surface,
            field,
            renderer: ProximityRenderer::new(&settings),
            scheduler,
            settings,
            frames: 0,
            last_stats: FrameStats::default(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.surface.is_none()
    }

    /// Viewport changed: resync the buffer and the field bounds
    pub fn on_resize(&mut self, metrics: ViewportMetrics) {
        if let Some(surface) = &mut self.surface {
            let state = surface.resize(metrics);
            self.field.resize(state.logical);
        }
    }

    /// Page visibility changed
    pub fn set_visible(&mut self, visible: bool) {
        self.scheduler.set_visible(visible);
    }

    /// Host frame callback. Advances the field for each due tick and paints
    /// once. Returns what was painted, if anything.
    pub fn on_frame<H: FrameHost>(&mut self, host: &mut H, now: Duration) -> Option<FrameStats> {
        let surface = self.surface.as_mut()?;

        let field = &mut self.field;
        let moving = self.settings.effective_motion();
        let ticks = self.scheduler.on_frame(host, now, |ticks| {
            if moving {
                for _ in 0..ticks {
                    field.tick();
                }
            }
            ControlFlow::Continue(())
        });
        if ticks == 0 {
            return None;
        }

        let stats = self.renderer.render(surface, self.field.particles());
        self.frames += 1;
        self.last_stats = stats;
        Some(stats)
    }

    /// Stop the frame loop and detach the surface
    pub fn unmount<H: FrameHost>(mut self, host: &mut H) {
        self.scheduler.cancel(host);
        if let Some(surface) = self.surface.take() {
            surface.teardown();
        }
        log::info!("Backdrop unmounted after {} frames", self.frames);
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn surface_state(&self) -> Option<SurfaceState> {
        self.surface.as_ref().map(|s| s.state())
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualFrameHost;
    use crate::surface::HeadlessBackend;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn metrics() -> ViewportMetrics {
        ViewportMetrics::new(800.0, 600.0, 1.0)
    }

    #[test]
    fn test_mount_frame_unmount() {
        let backend = HeadlessBackend::new();
        let probe = backend.clone();
        let rec = backend.recording();
        let mut host = ManualFrameHost::new();
        let mut backdrop =
            Backdrop::mount(backend, metrics(), FieldSettings::default(), 9, &mut host);
        assert!(!backdrop.is_degraded());
        assert!(probe.is_attached());
        assert_eq!(host.pending(), 1);

        host.fire();
        let stats = backdrop.on_frame(&mut host, ms(0)).unwrap();
        assert_eq!(stats.glyphs, 32);
        assert_eq!(backdrop.field().ticks, 1);
        assert_eq!(host.pending(), 1);

        let drawn = rec.draw_calls();
        backdrop.unmount(&mut host);
        assert!(!probe.is_attached());
        assert_eq!(host.pending(), 0);

        // The host clock keeps going; nothing draws
        for _ in 0..10 {
            host.fire();
        }
        assert_eq!(rec.draw_calls(), drawn);
    }

    #[test]
    fn test_unavailable_surface_degrades() {
        let mut host = ManualFrameHost::new();
        let mut backdrop = Backdrop::mount(
            HeadlessBackend::unavailable(),
            metrics(),
            FieldSettings::default(),
            1,
            &mut host,
        );
        assert!(backdrop.is_degraded());
        assert_eq!(host.pending(), 0);
        assert_eq!(backdrop.on_frame(&mut host, ms(16)), None);
        backdrop.on_resize(ViewportMetrics::new(10.0, 10.0, 1.0));
        assert_eq!(backdrop.surface_state(), None);
        backdrop.unmount(&mut host);
    }

    #[test]
    fn test_resize_between_frames_uses_new_buffer() {
        let backend = HeadlessBackend::new();
        let rec = backend.recording();
        let mut host = ManualFrameHost::new();
        let mut backdrop =
            Backdrop::mount(backend, metrics(), FieldSettings::default(), 3, &mut host);
        backdrop.on_frame(&mut host, ms(0));

        backdrop.on_resize(ViewportMetrics::new(1600.0, 1200.0, 3.0));
        assert_eq!(rec.buffer_size(), (3200, 2400));
        assert_eq!(backdrop.field().bounds(), glam::Vec2::new(1600.0, 1200.0));

        backdrop.on_frame(&mut host, ms(17));
        assert_eq!(rec.buffer_size(), (3200, 2400));
        assert_eq!(rec.clears(), 2);
    }

    #[test]
    fn test_hidden_page_paints_nothing() {
        let backend = HeadlessBackend::new();
        let rec = backend.recording();
        let mut host = ManualFrameHost::new();
        let mut backdrop =
            Backdrop::mount(backend, metrics(), FieldSettings::default(), 3, &mut host);
        backdrop.set_visible(false);
        assert_eq!(backdrop.on_frame(&mut host, ms(0)), None);
        assert_eq!(rec.clears(), 0);
        backdrop.set_visible(true);
        assert!(backdrop.on_frame(&mut host, ms(16)).is_some());
    }

    #[test]
    fn test_reduced_motion_keeps_field_still() {
        let mut settings = FieldSettings::default();
        settings.reduced_motion = true;
        let mut host = ManualFrameHost::new();
        let mut backdrop = Backdrop::mount(HeadlessBackend::new(), metrics(), settings, 5, &mut host);
        let before: Vec<_> = backdrop.field().particles().to_vec();
        backdrop.on_frame(&mut host, ms(0));
        backdrop.on_frame(&mut host, ms(50));
        assert_eq!(backdrop.field().particles(), &before[..]);
        assert_eq!(backdrop.frames, 2);
    }

    #[test]
    fn test_invalid_settings_fall_back_to_defaults() {
        let mut settings = FieldSettings::default();
        settings.max_speed = 0.0;
        settings.particle_count = 7;
        let mut host = ManualFrameHost::new();
        let mut backdrop = Backdrop::mount(HeadlessBackend::new(), metrics(), settings, 2, &mut host);
        assert_eq!(backdrop.settings(), &FieldSettings::default());
        assert_eq!(backdrop.field().len(), 32);
        assert!(backdrop.on_frame(&mut host, ms(0)).is_some());

        let mut inverted = FieldSettings::default();
        inverted.radius_min = 6.0;
        let backdrop = Backdrop::mount(HeadlessBackend::new(), metrics(), inverted, 2, &mut host);
        assert_eq!(backdrop.settings().radius_min, FieldSettings::default().radius_min);
    }

    #[test]
    fn test_dense_preset_uses_grid_path() {
        let settings = FieldSettings::from_preset(crate::settings::DensityPreset::Dense);
        let mut host = ManualFrameHost::new();
        let mut backdrop = Backdrop::mount(HeadlessBackend::new(), metrics(), settings, 11, &mut host);
        let stats = backdrop.on_frame(&mut host, ms(0)).unwrap();
        assert_eq!(stats.glyphs, 96);
    }
}
