//! Drawing surface consumed by compositors
//!
//! Compositors only ever issue these primitive calls with computed
//! coordinates and colors. Implementations decide how to rasterize.

use glam::Vec2;

pub use crate::color::Color;
use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Multiply,
}

/// Minimal 2D drawing capability set
pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32);
    fn fill_round_rect(&mut self, rect: Rect, radius: f32, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color, width: f32);
    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, color: Color);
    /// Closed polygon; implementations may assume it is convex
    fn fill_path(&mut self, points: &[Vec2], color: Color);
    /// Open polyline
    fn stroke_path(&mut self, points: &[Vec2], color: Color, width: f32);
    fn fill_text(&mut self, text: &str, origin: Vec2, size: f32, color: Color);

    /// Push transform, clip and filter state
    fn save(&mut self);
    fn restore(&mut self);
    fn clip_rect(&mut self, rect: Rect);
    fn translate(&mut self, offset: Vec2);
    fn rotate(&mut self, radians: f32);
    fn scale(&mut self, factor: Vec2);

    /// Gaussian blur radius for subsequent draws (0 = off)
    fn set_blur(&mut self, _radius: f32) {}
    fn set_blend(&mut self, _mode: BlendMode) {}

    /// Debug-group markers around each compositor layer
    fn push_group(&mut self, _label: &'static str) {}
    fn pop_group(&mut self) {}
}
