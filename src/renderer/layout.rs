//! Grid layout shared by drawing and hit-testing
//!
//! Both `cell_rect` and `hit_test` go through `metrics`, so a point maps
//! to exactly the cell that was drawn under it.

use glam::Vec2;

use crate::geometry::Rect;

/// Square cells centered inside the bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
    /// Space between the bounds and the outer cells
    pub padding: f32,
    /// Space between neighbouring cells
    pub gap: f32,
}

/// Resolved placement for one set of bounds
#[derive(Debug, Clone, Copy, PartialEq)]
struct Metrics {
    origin: Vec2,
    cell: f32,
    pitch: f32,
}

impl GridLayout {
    pub const fn new(columns: usize, rows: usize, padding: f32, gap: f32) -> Self {
        Self {
            columns,
            rows,
            padding,
            gap,
        }
    }

    pub fn len(&self) -> usize {
        self.columns * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn metrics(&self, bounds: Rect) -> Option<Metrics> {
        if self.is_empty() || bounds.is_empty() {
            return None;
        }
        let (cols, rows) = (self.columns as f32, self.rows as f32);
        let avail = bounds.size - Vec2::splat(2.0 * self.padding);
        let cell_w = (avail.x - self.gap * (cols - 1.0)) / cols;
        let cell_h = (avail.y - self.gap * (rows - 1.0)) / rows;
        let cell = cell_w.min(cell_h);
        if cell.is_nan() || cell <= 0.0 {
            return None;
        }
        let pitch = cell + self.gap;
        let grid = Vec2::new(pitch * cols - self.gap, pitch * rows - self.gap);
        let origin = bounds.center() - grid * 0.5;
        Some(Metrics {
            origin,
            cell,
            pitch,
        })
    }

    /// Side length of one cell, or 0 when nothing fits
    pub fn cell_size(&self, bounds: Rect) -> f32 {
        self.metrics(bounds).map_or(0.0, |m| m.cell)
    }

    /// Rectangle of the row-major cell `index`
    pub fn cell_rect(&self, bounds: Rect, index: usize) -> Option<Rect> {
        if index >= self.len() {
            return None;
        }
        let m = self.metrics(bounds)?;
        let (col, row) = (index % self.columns, index / self.columns);
        let min = m.origin + Vec2::new(col as f32, row as f32) * m.pitch;
        Some(Rect {
            min,
            size: Vec2::splat(m.cell),
        })
    }

    /// Cell under `point`; `None` in padding, gaps or outside the grid
    pub fn hit_test(&self, bounds: Rect, point: Vec2) -> Option<usize> {
        let m = self.metrics(bounds)?;
        let local = point - m.origin;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let col = (local.x / m.pitch) as usize;
        let row = (local.y / m.pitch) as usize;
        if col >= self.columns || row >= self.rows {
            return None;
        }
        let index = row * self.columns + col;
        let rect = self.cell_rect(bounds, index)?;
        rect.contains(point).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 220.0, 120.0);

    #[test]
    fn test_cells_are_square_and_centered() {
        let layout = GridLayout::new(4, 2, 10.0, 4.0);
        // width limits: (200 - 3 * 4) / 4 = 47
        assert_eq!(layout.cell_size(BOUNDS), 47.0);
        let first = layout.cell_rect(BOUNDS, 0).unwrap_or_default();
        let last = layout.cell_rect(BOUNDS, 7).unwrap_or_default();
        let left_margin = first.min.x - BOUNDS.min.x;
        let right_margin = BOUNDS.max().x - last.max().x;
        assert!((left_margin - right_margin).abs() < 1e-4);
    }

    #[test]
    fn test_hit_test_matches_cell_rects() {
        let layout = GridLayout::new(4, 2, 10.0, 4.0);
        for i in 0..layout.len() {
            let rect = layout.cell_rect(BOUNDS, i).unwrap_or_default();
            assert_eq!(layout.hit_test(BOUNDS, rect.center()), Some(i));
            assert_eq!(layout.hit_test(BOUNDS, rect.min + Vec2::splat(0.5)), Some(i));
        }
    }

    #[test]
    fn test_hit_test_misses_gaps_and_padding() {
        let layout = GridLayout::new(4, 2, 10.0, 4.0);
        let a = layout.cell_rect(BOUNDS, 0).unwrap_or_default();
        let gap_point = Vec2::new(a.max().x + 2.0, a.center().y);
        assert_eq!(layout.hit_test(BOUNDS, gap_point), None);
        assert_eq!(layout.hit_test(BOUNDS, Vec2::new(1.0, 1.0)), None);
        assert_eq!(layout.hit_test(BOUNDS, Vec2::new(-50.0, 60.0)), None);
    }

    #[test]
    fn test_degenerate_layouts() {
        assert_eq!(GridLayout::new(0, 3, 0.0, 0.0).hit_test(BOUNDS, Vec2::ONE), None);
        let tiny = Rect::new(0.0, 0.0, 4.0, 4.0);
        assert_eq!(GridLayout::new(3, 3, 4.0, 1.0).cell_rect(tiny, 0), None);
        assert_eq!(GridLayout::new(2, 2, 0.0, 0.0).cell_rect(BOUNDS, 4), None);
    }
}
