//! Board snapshots consumed by the flow compositor
//!
//! The compositor only reads these. `hop_distances` is the breadth-first
//! search a host runs over cell adjacency to produce the per-cell
//! distance the fill wave is keyed on.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Distance sentinel for cells the search never reached
pub const UNREACHABLE: i32 = -1;

/// One cell of a flow board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowCell {
    /// A piece sits in the cell
    pub occupied: bool,
    /// The piece is part of the path from the source
    pub connected: bool,
    /// Fixed piece the player cannot move
    pub locked: bool,
    /// Piece conflicts with a neighbour
    pub error: bool,
    /// Suggested next move
    pub hint: bool,
    /// Hops from the source, or `UNREACHABLE`
    pub distance: i32,
}

impl Default for FlowCell {
    fn default() -> Self {
        Self {
            occupied: false,
            connected: false,
            locked: false,
            error: false,
            hint: false,
            distance: UNREACHABLE,
        }
    }
}

impl FlowCell {
    /// Cell takes part in the fill wave
    #[inline]
    pub fn fills(&self) -> bool {
        self.connected && self.distance >= 0
    }
}

/// Read-only per-frame snapshot of a flow minigame board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowBoard {
    pub columns: usize,
    pub rows: usize,
    /// Row-major, `columns * rows` long
    pub cells: Vec<FlowCell>,
    /// Driving condition of the fill and celebration
    pub solved: bool,
}

impl FlowBoard {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![FlowCell::default(); columns * rows],
            solved: false,
        }
    }

    pub fn cell(&self, column: usize, row: usize) -> Option<&FlowCell> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.cells.get(row * self.columns + column)
    }

    /// Largest distance among cells that take part in the fill
    pub fn max_fill_distance(&self) -> Option<i32> {
        self.cells
            .iter()
            .filter(|c| c.fills())
            .map(|c| c.distance)
            .max()
    }

    /// Mark `sources` connected and fill every connected distance by BFS
    /// over occupied cells.
    pub fn connect_from(&mut self, sources: &[usize]) {
        let distances = hop_distances(self.columns, self.rows, sources, |i| {
            self.cells.get(i).is_some_and(|c| c.occupied)
        });
        for (cell, d) in self.cells.iter_mut().zip(distances) {
            cell.distance = d;
            cell.connected = d >= 0;
        }
    }
}

/// Breadth-first hop count from `sources` over 4-connected cells.
///
/// Cells where `passable` is false, and cells not reachable from any
/// source, get `UNREACHABLE`. Sources out of range or impassable are
/// skipped. Distances are non-negative and increase by exactly one along
/// every shortest path.
pub fn hop_distances(
    columns: usize,
    rows: usize,
    sources: &[usize],
    passable: impl Fn(usize) -> bool,
) -> Vec<i32> {
    let size = columns * rows;
    let mut distances = vec![UNREACHABLE; size];
    if size == 0 {
        return distances;
    }

    // BFS from all sources simultaneously
    let mut queue: VecDeque<usize> = VecDeque::new();
    for &s in sources {
        if s < size && passable(s) && distances[s] == UNREACHABLE {
            distances[s] = 0;
            queue.push_back(s);
        }
    }

    while let Some(idx) = queue.pop_front() {
        let current = distances[idx];
        let (x, y) = (idx % columns, idx / columns);
        let neighbours = [
            (y > 0).then(|| idx - columns),
            (y + 1 < rows).then(|| idx + columns),
            (x > 0).then(|| idx - 1),
            (x + 1 < columns).then(|| idx + 1),
        ];
        for n in neighbours.into_iter().flatten() {
            if distances[n] == UNREACHABLE && passable(n) {
                distances[n] = current + 1;
                queue.push_back(n);
            }
        }
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_corridor() {
        let d = hop_distances(4, 1, &[0], |_| true);
        assert_eq!(d, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_wall_blocks_path() {
        // 3x3 with the middle column closed except the bottom row
        let open = |i: usize| !matches!(i, 1 | 4);
        let d = hop_distances(3, 3, &[0], open);
        assert_eq!(d, vec![0, UNREACHABLE, 6, 1, UNREACHABLE, 5, 2, 3, 4]);
    }

    #[test]
    fn test_unreachable_island() {
        let d = hop_distances(3, 1, &[0], |i| i != 1);
        assert_eq!(d, vec![0, UNREACHABLE, UNREACHABLE]);
    }

    #[test]
    fn test_multiple_sources_and_bad_source() {
        let d = hop_distances(5, 1, &[0, 4, 99], |_| true);
        assert_eq!(d, vec![0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_empty_board() {
        assert!(hop_distances(0, 3, &[0], |_| true).is_empty());
    }

    #[test]
    fn test_connect_from_marks_cells() {
        let mut board = FlowBoard::new(3, 1);
        board.cells[0].occupied = true;
        board.cells[1].occupied = true;
        board.connect_from(&[0]);
        assert!(board.cells[1].fills());
        assert!(!board.cells[2].connected);
        assert_eq!(board.max_fill_distance(), Some(1));
        assert_eq!(board.cell(2, 0).map(|c| c.distance), Some(UNREACHABLE));
        assert!(board.cell(3, 0).is_none());
    }
}
