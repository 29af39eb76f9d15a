//! Tessellating canvas: turns 2D primitives into a triangle list
//!
//! Every primitive becomes triangles in `vertices` after the current
//! transform is applied. Triangles whose bounds miss the clip rect are
//! dropped whole (no partial clipping). Text, blur and blend are not
//! tessellated; text calls are counted so hosts can overlay real glyphs.

use glam::{Affine2, Vec2};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use super::canvas::{BlendMode, Canvas, Color};
use super::vertex::Vertex;
use crate::geometry::Rect;

#[derive(Debug, Clone, Copy)]
struct DrawState {
    transform: Affine2,
    clip: Option<Rect>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine2::IDENTITY,
            clip: None,
        }
    }
}

#[derive(Debug)]
pub struct VertexCanvas {
    pub vertices: Vec<Vertex>,
    /// Segments used for a full circle
    pub segments: u32,
    /// Text calls seen since the last `clear`
    pub text_calls: usize,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl Default for VertexCanvas {
    fn default() -> Self {
        Self::new(24)
    }
}

impl VertexCanvas {
    pub fn new(segments: u32) -> Self {
        Self {
            vertices: Vec::new(),
            segments: segments.max(3),
            text_calls: 0,
            state: DrawState::default(),
            stack: Vec::new(),
        }
    }

    /// Reset for the next frame, keeping allocations
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.text_calls = 0;
        self.state = DrawState::default();
        self.stack.clear();
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    fn tri(&mut self, a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) {
        let t = self.state.transform;
        let (a, b, c) = (
            t.transform_point2(a),
            t.transform_point2(b),
            t.transform_point2(c),
        );
        if let Some(clip) = self.state.clip {
            let bounds = Rect::from_min_max(a.min(b).min(c), a.max(b).max(c));
            // Degenerate bounds still count as inside when touching the clip
            let max = bounds.max();
            let clip_max = clip.max();
            if max.x < clip.min.x
                || max.y < clip.min.y
                || bounds.min.x > clip_max.x
                || bounds.min.y > clip_max.y
            {
                return;
            }
        }
        self.vertices.push(Vertex::at(a, color));
        self.vertices.push(Vertex::at(b, color));
        self.vertices.push(Vertex::at(c, color));
    }

    fn quad(&mut self, a: Vec2, b: Vec2, c: Vec2, d: Vec2, color: [f32; 4]) {
        // a-b-c-d in winding order
        self.tri(a, b, c, color);
        self.tri(a, c, d, color);
    }

    fn rect_tris(&mut self, rect: Rect, color: [f32; 4]) {
        if rect.is_empty() {
            return;
        }
        let max = rect.max();
        self.quad(
            rect.min,
            Vec2::new(max.x, rect.min.y),
            max,
            Vec2::new(rect.min.x, max.y),
            color,
        );
    }

    /// Pie slice from `start` over `span` radians, elliptical radii
    fn fan(&mut self, center: Vec2, radii: Vec2, start: f32, span: f32, color: [f32; 4]) {
        let steps = ((self.segments as f32 * span / TAU).ceil() as u32).max(1);
        for i in 0..steps {
            let t1 = start + span * (i as f32 / steps as f32);
            let t2 = start + span * ((i + 1) as f32 / steps as f32);
            self.tri(
                center,
                center + radii * Vec2::new(t1.cos(), t1.sin()),
                center + radii * Vec2::new(t2.cos(), t2.sin()),
                color,
            );
        }
    }
}

impl Canvas for VertexCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if color.is_invisible() {
            return;
        }
        self.rect_tris(rect, color.to_array());
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32) {
        if color.is_invisible() || rect.is_empty() || width <= 0.0 {
            return;
        }
        let c = color.to_array();
        let w = width.min(rect.width() / 2.0).min(rect.height() / 2.0);
        let (min, size) = (rect.min, rect.size);
        self.rect_tris(Rect::new(min.x, min.y, size.x, w), c);
        self.rect_tris(Rect::new(min.x, min.y + size.y - w, size.x, w), c);
        self.rect_tris(Rect::new(min.x, min.y + w, w, size.y - 2.0 * w), c);
        self.rect_tris(
            Rect::new(min.x + size.x - w, min.y + w, w, size.y - 2.0 * w),
            c,
        );
    }

    fn fill_round_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        if color.is_invisible() || rect.is_empty() {
            return;
        }
        let c = color.to_array();
        let r = radius.max(0.0).min(rect.width() / 2.0).min(rect.height() / 2.0);
        if r <= 0.0 {
            self.rect_tris(rect, c);
            return;
        }
        let (min, max, size) = (rect.min, rect.max(), rect.size);

        // Middle band full width, top and bottom bands inset by r
        self.rect_tris(Rect::new(min.x, min.y + r, size.x, size.y - 2.0 * r), c);
        self.rect_tris(Rect::new(min.x + r, min.y, size.x - 2.0 * r, r), c);
        self.rect_tris(Rect::new(min.x + r, max.y - r, size.x - 2.0 * r, r), c);

        let radii = Vec2::splat(r);
        self.fan(Vec2::new(max.x - r, max.y - r), radii, 0.0, FRAC_PI_2, c);
        self.fan(Vec2::new(min.x + r, max.y - r), radii, FRAC_PI_2, FRAC_PI_2, c);
        self.fan(Vec2::new(min.x + r, min.y + r), radii, PI, FRAC_PI_2, c);
        self.fan(Vec2::new(max.x - r, min.y + r), radii, PI + FRAC_PI_2, FRAC_PI_2, c);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        if color.is_invisible() || radius <= 0.0 {
            return;
        }
        self.fan(center, Vec2::splat(radius), 0.0, TAU, color.to_array());
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color, width: f32) {
        if color.is_invisible() || radius <= 0.0 || width <= 0.0 {
            return;
        }
        let c = color.to_array();
        let inner_radius = (radius - width / 2.0).max(0.0);
        let outer_radius = radius + width / 2.0;
        let segments = self.segments;

        for i in 0..segments {
            let theta1 = (i as f32 / segments as f32) * TAU;
            let theta2 = ((i + 1) as f32 / segments as f32) * TAU;
            let d1 = Vec2::new(theta1.cos(), theta1.sin());
            let d2 = Vec2::new(theta2.cos(), theta2.sin());

            // Two triangles per segment
            self.quad(
                center + d1 * inner_radius,
                center + d1 * outer_radius,
                center + d2 * outer_radius,
                center + d2 * inner_radius,
                c,
            );
        }
    }

    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, color: Color) {
        if color.is_invisible() || radii.x <= 0.0 || radii.y <= 0.0 {
            return;
        }
        self.fan(center, radii, 0.0, TAU, color.to_array());
    }

    fn fill_path(&mut self, points: &[Vec2], color: Color) {
        if color.is_invisible() || points.len() < 3 {
            return;
        }
        let c = color.to_array();
        for pair in points[1..].windows(2) {
            self.tri(points[0], pair[0], pair[1], c);
        }
    }

    fn stroke_path(&mut self, points: &[Vec2], color: Color, width: f32) {
        if color.is_invisible() || points.len() < 2 || width <= 0.0 {
            return;
        }
        let c = color.to_array();
        let half = width / 2.0;
        for pair in points.windows(2) {
            let (p1, p2) = (pair[0], pair[1]);
            // Direction from p1 to p2, perpendicular for width
            let dir = (p2 - p1).normalize_or_zero();
            let perp = Vec2::new(-dir.y, dir.x) * half;
            self.quad(p1 + perp, p1 - perp, p2 - perp, p2 + perp, c);
        }
    }

    fn fill_text(&mut self, _text: &str, _origin: Vec2, _size: f32, _color: Color) {
        self.text_calls += 1;
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => log::warn!("restore without matching save"),
        }
    }

    fn clip_rect(&mut self, rect: Rect) {
        let t = self.state.transform;
        let corners = [
            t.transform_point2(rect.min),
            t.transform_point2(rect.max()),
            t.transform_point2(Vec2::new(rect.min.x, rect.max().y)),
            t.transform_point2(Vec2::new(rect.max().x, rect.min.y)),
        ];
        let lo = corners.iter().copied().fold(Vec2::splat(f32::MAX), Vec2::min);
        let hi = corners.iter().copied().fold(Vec2::splat(f32::MIN), Vec2::max);
        let device = match self.state.clip {
            Some(old) => Rect::from_min_max(lo.max(old.min), hi.min(old.max())),
            None => Rect::from_min_max(lo, hi),
        };
        self.state.clip = Some(device);
    }

    fn translate(&mut self, offset: Vec2) {
        self.state.transform = self.state.transform * Affine2::from_translation(offset);
    }

    fn rotate(&mut self, radians: f32) {
        self.state.transform = self.state.transform * Affine2::from_angle(radians);
    }

    fn scale(&mut self, factor: Vec2) {
        self.state.transform = self.state.transform * Affine2::from_scale(factor);
    }

    fn set_blend(&mut self, mode: BlendMode) {
        log::trace!("blend {:?} ignored by tessellator", mode);
    }
}
