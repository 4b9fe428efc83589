//! The fixed-size particle set

use glam::Vec2;
use rand::Rng;

use super::particle::Particle;
use crate::settings::FieldSettings;

/// Particles plus the logical bounds they bounce inside
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    bounds: Vec2,
    phase_step: f32,
    /// Ticks advanced since spawn
    pub ticks: u64,
}

impl ParticleField {
    /// Spawn `count` particles uniformly over `bounds`
    pub fn spawn<R: Rng + ?Sized>(
        count: usize,
        bounds: Vec2,
        settings: &FieldSettings,
        rng: &mut R,
    ) -> Self {
        let particles = (0..count)
            .map(|_| Particle::random(rng, bounds, settings))
            .collect();
        log::debug!(
            "Spawned {} particles over {}x{}",
            count,
            bounds.x,
            bounds.y
        );
        Self {
            particles,
            bounds,
            phase_step: settings.phase_step,
            ticks: 0,
        }
    }

    /// Build a field from explicit particles
    pub fn from_particles(particles: Vec<Particle>, bounds: Vec2, phase_step: f32) -> Self {
        Self {
            particles,
            bounds,
            phase_step,
            ticks: 0,
        }
    }

    /// Advance every particle one tick inside `bounds`
    pub fn advance(&mut self, bounds: Vec2) {
        self.bounds = bounds;
        for p in &mut self.particles {
            p.step(bounds, self.phase_step);
        }
        self.ticks += 1;
    }

    /// Advance inside the last known bounds
    pub fn tick(&mut self) {
        self.advance(self.bounds);
    }

    /// Track new viewport bounds. Particles left outside walk back in via
    /// reflection rather than being re-spawned.
    pub fn resize(&mut self, bounds: Vec2) {
        self.bounds = bounds;
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Count of particles currently inside the bounds
    pub fn inside_count(&self) -> usize {
        self.particles
            .iter()
            .filter(|p| {
                p.pos.x >= 0.0
                    && p.pos.x <= self.bounds.x
                    && p.pos.y >= 0.0
                    && p.pos.y <= self.bounds.y
            })
            .count()
    }
}
