//! Canvas-style rendering of the particle network
//!
//! Draws through the [`DrawContext`](crate::surface::DrawContext) seam, so the
//! same code paints a browser canvas or a headless recording.

pub mod color;
pub mod proximity;
pub mod recording;
pub mod spatial;

pub use color::Rgba;
pub use proximity::{Edge, FrameStats, ProximityRenderer, proximity_edges};
pub use recording::{DrawCommand, RecordingContext};
pub use spatial::SpatialGrid;
