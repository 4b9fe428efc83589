//! Headless draw context that records commands

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use super::color::Rgba;
use crate::surface::{DrawContext, Transform};

/// One recorded draw call, in logical coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Line {
        from: Vec2,
        to: Vec2,
        color: Rgba,
        width: f32,
    },
    Radial {
        center: Vec2,
        radius: f32,
        inner: Rgba,
        outer: Rgba,
    },
}

#[derive(Debug)]
struct Recording {
    /// Commands since the last clear
    commands: Vec<DrawCommand>,
    buffer: (u32, u32),
    transform: Transform,
    /// Total draw calls (lines + fills) ever recorded
    draw_calls: u64,
    clears: u64,
}

impl Default for Recording {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            buffer: (0, 0),
            transform: Transform::IDENTITY,
            draw_calls: 0,
            clears: 0,
        }
    }
}

/// Shared, cloneable recording. Clones observe the same command log.
#[derive(Debug, Clone, Default)]
pub struct RecordingContext {
    inner: Rc<RefCell<Recording>>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands drawn since the last clear
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.inner.borrow().commands.clone()
    }

    pub fn buffer_size(&self) -> (u32, u32) {
        self.inner.borrow().buffer
    }

    pub fn transform(&self) -> Transform {
        self.inner.borrow().transform
    }

    pub fn draw_calls(&self) -> u64 {
        self.inner.borrow().draw_calls
    }

    pub fn clears(&self) -> u64 {
        self.inner.borrow().clears
    }

    /// Lines since the last clear
    pub fn lines(&self) -> Vec<DrawCommand> {
        self.commands()
            .into_iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .collect()
    }
}

impl DrawContext for RecordingContext {
    fn resize_buffer(&mut self, width: u32, height: u32) {
        let mut rec = self.inner.borrow_mut();
        rec.buffer = (width, height);
        // Matches a canvas: resizing wipes the pixels and the transform
        rec.transform = Transform::IDENTITY;
        rec.commands.clear();
    }

    fn set_transform(&mut self, transform: Transform) {
        self.inner.borrow_mut().transform = transform;
    }

    fn clear(&mut self) {
        let mut rec = self.inner.borrow_mut();
        rec.commands.clear();
        rec.commands.push(DrawCommand::Clear);
        rec.clears += 1;
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        let mut rec = self.inner.borrow_mut();
        rec.commands.push(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
        rec.draw_calls += 1;
    }

    fn fill_radial(&mut self, center: Vec2, radius: f32, inner: Rgba, outer: Rgba) {
        let mut rec = self.inner.borrow_mut();
        rec.commands.push(DrawCommand::Radial {
            center,
            radius,
            inner,
            outer,
        });
        rec.draw_calls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_starts_new_frame() {
        let mut ctx = RecordingContext::new();
        let observer = ctx.clone();
        let c = Rgba::new(1, 2, 3, 1.0);
        ctx.stroke_line(Vec2::ZERO, Vec2::ONE, c, 1.0);
        ctx.clear();
        ctx.fill_radial(Vec2::ZERO, 2.0, c, c.with_alpha(0.0));
        assert_eq!(observer.commands().len(), 2);
        assert_eq!(observer.commands()[0], DrawCommand::Clear);
        assert_eq!(observer.draw_calls(), 2);
        assert_eq!(observer.clears(), 1);
    }

    #[test]
    fn test_resize_resets_transform() {
        let mut ctx = RecordingContext::new();
        ctx.set_transform(Transform::scale(2.0));
        ctx.resize_buffer(100, 50);
        assert_eq!(ctx.transform(), Transform::IDENTITY);
        assert_eq!(ctx.buffer_size(), (100, 50));
    }
}
