//! The render surface consumed by the render pass.
//!
//! The windowing backend lives outside this crate. Components draw through
//! the narrow [`RenderSurface`] trait, and headless runs use
//! [`RecordingSurface`], which keeps the draw calls of the current frame.

use crate::math::{Color, Rect, Vec2};

/// A draw target with a fixed size.
pub trait RenderSurface {
    /// Width and height of the surface.
    fn size(&self) -> Vec2;

    /// Fill the whole surface, starting a new frame.
    fn clear(&mut self, color: Color);

    /// Draw a rectangle. A `border` of `0` fills it.
    fn draw_rect(&mut self, rect: Rect, color: Color, border: u32);

    /// Finish the frame.
    fn present(&mut self);
}

/// A draw call captured by [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCall {
    Clear(Color),
    Rect { rect: Rect, color: Color, border: u32 },
}

/// Headless surface recording the draw calls of the current frame.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    size: Vec2,
    calls: Vec<DrawCall>,
    presented: u64,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            calls: Vec::new(),
            presented: 0,
        }
    }

    /// Draw calls since the last [`clear`](RenderSurface::clear).
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Rectangles drawn since the last clear, in draw order.
    pub fn rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::Rect { rect, .. } => Some(*rect),
            DrawCall::Clear(_) => None,
        })
    }

    /// Number of frames presented so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.calls.clear();
        self.calls.push(DrawCall::Clear(color));
    }

    fn draw_rect(&mut self, rect: Rect, color: Color, border: u32) {
        self.calls.push(DrawCall::Rect { rect, color, border });
    }

    fn present(&mut self) {
        self.presented += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_starts_a_new_frame() {
        let mut surface = RecordingSurface::new(100.0, 50.0);
        surface.clear(Color::WHITE);
        surface.draw_rect(Rect::new(0.0, 0.0, 5.0, 5.0), Color::RED, 0);
        surface.present();
        assert_eq!(surface.calls().len(), 2);

        surface.clear(Color::BLACK);
        assert_eq!(surface.calls(), &[DrawCall::Clear(Color::BLACK)]);
        assert_eq!(surface.rects().count(), 0);
        assert_eq!(surface.presented(), 1);
        assert_eq!(surface.size(), Vec2::new(100.0, 50.0));
    }
}
