//! Canvas that records commands instead of drawing them
//!
//! Used by tests to assert layer order and by hosts for frame dumps.
//! The command buffer is reused between frames via `clear`.

use glam::Vec2;

use super::canvas::{BlendMode, Canvas, Color};
use crate::geometry::Rect;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect { rect: Rect, color: Color },
    StrokeRect { rect: Rect, color: Color, width: f32 },
    FillRoundRect { rect: Rect, radius: f32, color: Color },
    FillCircle { center: Vec2, radius: f32, color: Color },
    StrokeCircle { center: Vec2, radius: f32, color: Color, width: f32 },
    FillEllipse { center: Vec2, radii: Vec2, color: Color },
    FillPath { points: Vec<Vec2>, color: Color },
    StrokePath { points: Vec<Vec2>, color: Color, width: f32 },
    FillText { text: String, origin: Vec2, size: f32, color: Color },
    Save,
    Restore,
    Clip(Rect),
    Translate(Vec2),
    Rotate(f32),
    Scale(Vec2),
    Blur(f32),
    Blend(BlendMode),
    PushGroup(&'static str),
    PopGroup,
}

#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Labels of every group in the order they were opened
    pub fn groups(&self) -> Vec<&'static str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::PushGroup(label) => Some(*label),
                _ => None,
            })
            .collect()
    }

    /// Commands issued inside the group `label` (first occurrence)
    pub fn group(&self, label: &str) -> &[DrawCommand] {
        let Some(start) = self
            .commands
            .iter()
            .position(|c| matches!(c, DrawCommand::PushGroup(l) if *l == label))
        else {
            return &[];
        };
        let mut depth = 0usize;
        for (offset, cmd) in self.commands[start + 1..].iter().enumerate() {
            match cmd {
                DrawCommand::PushGroup(_) => depth += 1,
                DrawCommand::PopGroup if depth == 0 => {
                    return &self.commands[start + 1..start + 1 + offset];
                }
                DrawCommand::PopGroup => depth -= 1,
                _ => {}
            }
        }
        &self.commands[start + 1..]
    }

    /// Number of primitive (non-state) commands
    pub fn primitive_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_primitive()).count()
    }
}

impl DrawCommand {
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            DrawCommand::FillRect { .. }
                | DrawCommand::StrokeRect { .. }
                | DrawCommand::FillRoundRect { .. }
                | DrawCommand::FillCircle { .. }
                | DrawCommand::StrokeCircle { .. }
                | DrawCommand::FillEllipse { .. }
                | DrawCommand::FillPath { .. }
                | DrawCommand::StrokePath { .. }
                | DrawCommand::FillText { .. }
        )
    }
}

impl Canvas for RecordingCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32) {
        self.commands
            .push(DrawCommand::StrokeRect { rect, color, width });
    }

    fn fill_round_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        self.commands
            .push(DrawCommand::FillRoundRect { rect, radius, color });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands
            .push(DrawCommand::FillCircle { center, radius, color });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color, width: f32) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            color,
            width,
        });
    }

    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, color: Color) {
        self.commands
            .push(DrawCommand::FillEllipse { center, radii, color });
    }

    fn fill_path(&mut self, points: &[Vec2], color: Color) {
        self.commands.push(DrawCommand::FillPath {
            points: points.to_vec(),
            color,
        });
    }

    fn stroke_path(&mut self, points: &[Vec2], color: Color, width: f32) {
        self.commands.push(DrawCommand::StrokePath {
            points: points.to_vec(),
            color,
            width,
        });
    }

    fn fill_text(&mut self, text: &str, origin: Vec2, size: f32, color: Color) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            origin,
            size,
            color,
        });
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::Clip(rect));
    }

    fn translate(&mut self, offset: Vec2) {
        self.commands.push(DrawCommand::Translate(offset));
    }

    fn rotate(&mut self, radians: f32) {
        self.commands.push(DrawCommand::Rotate(radians));
    }

    fn scale(&mut self, factor: Vec2) {
        self.commands.push(DrawCommand::Scale(factor));
    }

    fn set_blur(&mut self, radius: f32) {
        self.commands.push(DrawCommand::Blur(radius));
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.commands.push(DrawCommand::Blend(mode));
    }

    fn push_group(&mut self, label: &'static str) {
        self.commands.push(DrawCommand::PushGroup(label));
    }

    fn pop_group(&mut self) {
        self.commands.push(DrawCommand::PopGroup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_slicing() {
        let mut c = RecordingCanvas::new();
        c.push_group("a");
        c.fill_circle(Vec2::ZERO, 1.0, Color::WHITE);
        c.pop_group();
        c.push_group("b");
        c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK);
        c.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Color::BLACK);
        c.pop_group();

        assert_eq!(c.groups(), vec!["a", "b"]);
        assert_eq!(c.group("a").len(), 1);
        assert_eq!(c.group("b").len(), 2);
        assert!(c.group("missing").is_empty());
        assert_eq!(c.primitive_count(), 3);
    }
}
