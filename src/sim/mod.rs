//! Particle field simulation
//!
//! Pure state and motion; no rendering or platform dependencies.
//! Spawning takes a caller-supplied RNG so tests can seed it.

pub mod field;
pub mod particle;

pub use field::ParticleField;
pub use particle::{Particle, reflects};
