//! Neural Backdrop - animated particle network for the Visual Product Finder client
//!
//! Core modules:
//! - `sim`: Particle field (spawn, reflecting-boundary motion)
//! - `renderer`: Proximity edges + pulsing glow glyphs onto a 2D context
//! - `surface`: Full-viewport drawing surface with DPR-synced backing buffer
//! - `scheduler`: Fixed-rate frame scheduler with visibility pause and cancellation
//! - `backdrop`: Mounted composition of the above
//! - `reveal`: One-shot scroll reveal for content blocks
//! - `nav_cue`: Round-robin nav link highlight
//! - `search`: Response model of the remote image-similarity search
//! - `platform`: Browser bindings (wasm32 only)

pub mod backdrop;
pub mod error;
pub mod nav_cue;
pub mod platform;
pub mod renderer;
pub mod reveal;
pub mod scheduler;
pub mod search;
pub mod settings;
pub mod sim;
pub mod surface;

pub use backdrop::Backdrop;
pub use error::{ConfigError, SurfaceError};
pub use settings::{DensityPreset, FieldSettings};

/// Backdrop configuration constants
pub mod consts {
    /// Number of particles in the standard field
    pub const PARTICLE_COUNT: usize = 32;

    /// Maximum distance (logical px) at which two particles are linked
    pub const LINK_DISTANCE: f32 = 120.0;
    /// Smallest link distance settings may ask for
    pub const MIN_LINK_DISTANCE: f32 = 1.0;
    /// Link opacity at zero distance
    pub const LINK_MAX_OPACITY: f32 = 0.35;
    pub const LINK_WIDTH: f32 = 1.0;

    /// Glyph radius swing from `sin(phase)`
    pub const PULSE_AMPLITUDE: f32 = 2.0;
    /// Phase increment per tick (radians)
    pub const PHASE_STEP: f32 = 0.05;

    /// Max absolute velocity component (logical px per tick)
    pub const MAX_SPEED: f32 = 0.25;
    pub const RADIUS_MIN: f32 = 2.0;
    pub const RADIUS_MAX: f32 = 5.0;

    /// Accent colour (violet-500)
    pub const ACCENT_RGB: [u8; 3] = [139, 92, 246];

    /// Fixed tick rate, matches a typical display refresh
    pub const TICK_HZ: f32 = 60.0;
    /// Maximum ticks per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Device pixel ratio clamp
    pub const DPR_MIN: f32 = 1.0;
    pub const DPR_MAX: f32 = 2.0;

    /// Visible fraction at which a reveal target flips
    pub const REVEAL_THRESHOLD: f32 = 0.15;

    /// Above this count, pair search switches to a uniform grid
    pub const BRUTE_FORCE_LIMIT: usize = 64;
}
