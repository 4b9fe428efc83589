//! Proximity graph renderer
//!
//! Each frame: clear, link every pair closer than the link distance with a
//! line whose alpha fades linearly to zero at that distance, then draw one
//! pulsing glow per particle on top.

use glam::Vec2;

use super::color::Rgba;
use super::spatial::SpatialGrid;
use crate::consts::BRUTE_FORCE_LIMIT;
use crate::settings::FieldSettings;
use crate::sim::Particle;
use crate::surface::{DrawContext, SurfaceBackend, SurfaceHandle};

/// A link between two particles (by index, `a < b`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
    pub opacity: f32,
}

/// What a frame drew
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub edges: usize,
    pub glyphs: usize,
}

/// Link alpha for a pair at `distance`, or `None` at or beyond `threshold`
#[inline]
pub fn link_opacity(distance: f32, threshold: f32, max_opacity: f32) -> Option<f32> {
    if distance < threshold {
        Some((threshold - distance) / threshold * max_opacity)
    } else {
        None
    }
}

/// Collect every linked pair into `out` (cleared first), sorted by `(a, b)`.
///
/// Small fields use the plain O(n²) pass; larger ones bucket through `grid`.
pub fn proximity_edges(
    particles: &[Particle],
    threshold: f32,
    max_opacity: f32,
    grid: &mut SpatialGrid,
    out: &mut Vec<Edge>,
) {
    out.clear();
    let mut consider = |a: usize, b: usize| {
        let distance = particles[a].pos.distance(particles[b].pos);
        if let Some(opacity) = link_opacity(distance, threshold, max_opacity) {
            out.push(Edge {
                a,
                b,
                distance,
                opacity,
            });
        }
    };

    if particles.len() <= BRUTE_FORCE_LIMIT {
        for a in 0..particles.len() {
            for b in a + 1..particles.len() {
                consider(a, b);
            }
        }
        return;
    }

    if grid.cell_size() != threshold {
        *grid = SpatialGrid::new(threshold);
    }
    let positions: Vec<Vec2> = particles.iter().map(|p| p.pos).collect();
    grid.rebuild(&positions);
    grid.for_each_candidate_pair(&mut consider);
    out.sort_by(|x, y| (x.a, x.b).cmp(&(y.a, y.b)));
}

/// Paints the particle network
#[derive(Debug, Clone)]
pub struct ProximityRenderer {
    pub link_distance: f32,
    pub link_max_opacity: f32,
    pub link_width: f32,
    pub pulse_amplitude: f32,
    pub color: Rgba,
    /// Gradient alpha at glyph centres
    pub core_alpha: f32,
    grid: SpatialGrid,
    edges: Vec<Edge>,
}

impl ProximityRenderer {
    pub fn new(settings: &FieldSettings) -> Self {
        Self {
            link_distance: settings.link_distance,
            link_max_opacity: settings.link_max_opacity,
            link_width: settings.link_width,
            pulse_amplitude: settings.pulse_amplitude,
            color: Rgba::from_rgb(settings.color, 1.0),
            core_alpha: settings.glyph_core_alpha,
            grid: SpatialGrid::new(settings.link_distance),
            edges: Vec::new(),
        }
    }

    /// Draw one frame onto the surface, always at its current size
    pub fn render<B: SurfaceBackend>(
        &mut self,
        surface: &mut SurfaceHandle<B>,
        particles: &[Particle],
    ) -> FrameStats {
        self.render_to(surface.context(), particles)
    }

    /// Draw one frame onto a bare context
    pub fn render_to<C: DrawContext>(&mut self, ctx: &mut C, particles: &[Particle]) -> FrameStats {
        ctx.clear();

        proximity_edges(
            particles,
            self.link_distance,
            self.link_max_opacity,
            &mut self.grid,
            &mut self.edges,
        );
        for edge in &self.edges {
            ctx.stroke_line(
                particles[edge.a].pos,
                particles[edge.b].pos,
                self.color.with_alpha(edge.opacity),
                self.link_width,
            );
        }

        let inner = self.color.with_alpha(self.core_alpha);
        let outer = self.color.with_alpha(0.0);
        for p in particles {
            ctx.fill_radial(p.pos, p.pulse_radius(self.pulse_amplitude), inner, outer);
        }

        log::trace!(
            "Frame: {} edges, {} glyphs",
            self.edges.len(),
            particles.len()
        );
        FrameStats {
            edges: self.edges.len(),
            glyphs: particles.len(),
        }
    }

    /// Edges drawn in the last frame
    pub fn last_edges(&self) -> &[Edge] {
        &self.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::{DrawCommand, RecordingContext};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn at(x: f32, y: f32) -> Particle {
        Particle::new(Vec2::new(x, y), Vec2::ZERO, 3.0, 0.0)
    }

    #[test]
    fn test_two_particles_fifty_apart() {
        let mut renderer = ProximityRenderer::new(&FieldSettings::default());
        let mut ctx = RecordingContext::new();
        let stats = renderer.render_to(&mut ctx, &[at(0.0, 0.0), at(50.0, 0.0)]);
        assert_eq!(stats, FrameStats { edges: 1, glyphs: 2 });

        let lines = ctx.lines();
        assert_eq!(lines.len(), 1);
        match &lines[0] {
            DrawCommand::Line { color, width, .. } => {
                let expected = (120.0 - 50.0) / 120.0 * 0.35;
                assert!((color.a - expected).abs() < 1e-6);
                assert!((color.a - 0.204).abs() < 1e-3);
                assert_eq!((color.r, color.g, color.b), (139, 92, 246));
                assert_eq!(*width, 1.0);
            }
            other => panic!("expected a line, got {other:?}"),
        }
    }

    #[test]
    fn test_no_edge_at_threshold() {
        assert_eq!(link_opacity(120.0, 120.0, 0.35), None);
        assert_eq!(link_opacity(500.0, 120.0, 0.35), None);
        assert_eq!(link_opacity(0.0, 120.0, 0.35), Some(0.35));

        let mut renderer = ProximityRenderer::new(&FieldSettings::default());
        let mut ctx = RecordingContext::new();
        let stats = renderer.render_to(&mut ctx, &[at(0.0, 0.0), at(120.0, 0.0)]);
        assert_eq!(stats.edges, 0);
    }

    #[test]
    fn test_draw_order_clear_edges_glyphs() {
        let mut renderer = ProximityRenderer::new(&FieldSettings::default());
        let mut ctx = RecordingContext::new();
        renderer.render_to(&mut ctx, &[at(0.0, 0.0), at(10.0, 0.0), at(20.0, 0.0)]);

        let cmds = ctx.commands();
        assert_eq!(cmds[0], DrawCommand::Clear);
        let first_glyph = cmds
            .iter()
            .position(|c| matches!(c, DrawCommand::Radial { .. }))
            .unwrap();
        let last_line = cmds
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Line { .. }))
            .unwrap();
        assert!(last_line < first_glyph);
        assert_eq!(ctx.lines().len(), 3);
    }

    #[test]
    fn test_glyph_gradient_and_pulse() {
        let mut renderer = ProximityRenderer::new(&FieldSettings::default());
        let mut ctx = RecordingContext::new();
        let p = Particle::new(Vec2::new(5.0, 5.0), Vec2::ZERO, 3.0, std::f32::consts::FRAC_PI_2);
        renderer.render_to(&mut ctx, &[p]);

        match ctx.commands().last().unwrap() {
            DrawCommand::Radial {
                radius,
                inner,
                outer,
                ..
            } => {
                assert!((radius - 5.0).abs() < 1e-5);
                assert_eq!(inner.a, 1.0);
                assert_eq!(outer.a, 0.0);
            }
            other => panic!("expected a glyph, got {other:?}"),
        }
    }

    #[test]
    fn test_render_through_surface_uses_latest_size() {
        use crate::surface::{HeadlessBackend, ViewportMetrics};

        let backend = HeadlessBackend::new();
        let rec = backend.recording();
        let mut surface =
            SurfaceHandle::initialize(backend, ViewportMetrics::new(400.0, 300.0, 1.0)).unwrap();
        let mut renderer = ProximityRenderer::new(&FieldSettings::default());
        surface.resize(ViewportMetrics::new(800.0, 600.0, 2.0));
        renderer.render(&mut surface, &[at(1.0, 1.0)]);
        assert_eq!(rec.buffer_size(), (1600, 1200));
        assert_eq!(rec.commands().len(), 2);
    }

    #[test]
    fn test_tiny_link_distance_dense_field() {
        let mut settings = FieldSettings::from_preset(crate::settings::DensityPreset::Dense);
        settings.link_distance = 0.01;
        let mut rng = Pcg32::seed_from_u64(4);
        let bounds = Vec2::new(1000.0, 1000.0);
        let particles: Vec<Particle> = (0..settings.particle_count)
            .map(|_| Particle::random(&mut rng, bounds, &settings))
            .collect();

        let mut renderer = ProximityRenderer::new(&settings);
        let mut ctx = RecordingContext::new();
        let stats = renderer.render_to(&mut ctx, &particles);
        assert_eq!(stats, FrameStats { edges: 0, glyphs: 96 });
    }

    proptest! {
        #[test]
        fn prop_opacity_strictly_decreasing(d1 in 0.0f32..110.0, gap in 0.01f32..10.0) {
            let near = link_opacity(d1, 120.0, 0.35).unwrap();
            let far = link_opacity(d1 + gap, 120.0, 0.35).unwrap();
            prop_assert!(near > far);
            prop_assert!(far > 0.0 && near <= 0.35);
        }

        #[test]
        fn prop_grid_matches_brute_force(seed in any::<u64>(), count in 65usize..200) {
            let settings = FieldSettings::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let bounds = Vec2::new(900.0, 700.0);
            let particles: Vec<Particle> = (0..count)
                .map(|_| Particle::random(&mut rng, bounds, &settings))
                .collect();

            let mut grid = SpatialGrid::new(120.0);
            let mut fast = Vec::new();
            proximity_edges(&particles, 120.0, 0.35, &mut grid, &mut fast);

            let mut slow = Vec::new();
            for a in 0..particles.len() {
                for b in a + 1..particles.len() {
                    let d = particles[a].pos.distance(particles[b].pos);
                    if d < 120.0 {
                        slow.push((a, b));
                    }
                }
            }
            let fast_pairs: Vec<(usize, usize)> = fast.iter().map(|e| (e.a, e.b)).collect();
            prop_assert_eq!(fast_pairs, slow);
        }
    }
}
