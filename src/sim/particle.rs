//! A single decorative particle

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::settings::FieldSettings;

/// A point with constant-speed drift and a pulsing radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Position in logical (CSS) pixels
    pub pos: Vec2,
    /// Displacement per tick
    pub vel: Vec2,
    /// Base glyph radius, in [radius_min, radius_max)
    pub radius: f32,
    /// Pulse angle, grows every tick
    pub phase: f32,
}

impl Particle {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32, phase: f32) -> Self {
        Self {
            pos,
            vel,
            radius,
            phase,
        }
    }

    /// Sample a particle uniformly over `bounds`
    pub fn random<R: Rng + ?Sized>(rng: &mut R, bounds: Vec2, settings: &FieldSettings) -> Self {
        let speed = settings.max_speed;
        Self {
            pos: Vec2::new(
                rng.random::<f32>() * bounds.x,
                rng.random::<f32>() * bounds.y,
            ),
            vel: Vec2::new(
                rng.random_range(-speed..speed),
                rng.random_range(-speed..speed),
            ),
            radius: rng.random_range(settings.radius_min..settings.radius_max),
            phase: rng.random_range(0.0..std::f32::consts::TAU),
        }
    }

    /// Advance one tick.
    ///
    /// The position moves first; a component that ends up outside
    /// `[0, bound]` while still heading outward has its velocity flipped, so
    /// the particle may sit past the edge for one tick before heading back.
    pub fn step(&mut self, bounds: Vec2, phase_step: f32) {
        self.pos += self.vel;
        self.phase += phase_step;

        if reflects(self.pos.x, self.vel.x, bounds.x) {
            self.vel.x = -self.vel.x;
        }
        if reflects(self.pos.y, self.vel.y, bounds.y) {
            self.vel.y = -self.vel.y;
        }
    }

    /// Glyph radius for the current phase, never negative
    #[inline]
    pub fn pulse_radius(&self, amplitude: f32) -> f32 {
        (self.radius + self.phase.sin() * amplitude).max(0.0)
    }
}

/// True when `value` lies outside `[0, bound]` and `vel` carries it further out.
///
/// A particle already heading back in (after a shrink, or a rounding
/// overshoot) is left alone instead of being flipped outward again.
#[inline]
pub fn reflects(value: f32, vel: f32, bound: f32) -> bool {
    (value < 0.0 && vel < 0.0) || (value > bound && vel > 0.0)
}
