//! Grid Geometry
//!
//! Integer cell positions on a bounded rectangular board.
//! All operations are pure and allocation-free.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::error::EngineError;

/// A cell on the board. `(0, 0)` is the top-left corner.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column, grows to the right
    pub x: u32,
    /// Row, grows downward
    pub y: u32,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Distance to another cell under the given metric.
    #[inline]
    pub fn distance(self, other: Self, metric: RangeMetric) -> u32 {
        distance(self, other, metric)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Board dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    /// Number of columns
    pub width: u32,
    /// Number of rows
    pub height: u32,
}

impl GridSize {
    /// Create a new grid size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if a position lies inside `[0, width) x [0, height)`.
    #[inline]
    pub fn contains(self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Total number of cells.
    #[inline]
    pub fn cell_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Iterate all cells in row-major order.
    pub fn cells(self) -> impl Iterator<Item = Position> {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position::new(x, y)))
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(16, 16)
    }
}

/// Cardinal movement direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward row 0
    Up,
    /// Away from row 0
    Down,
    /// Toward column 0
    Left,
    /// Away from column 0
    Right,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit offset `(dx, dy)` of one step.
    #[inline]
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Metric used for weapon range and transfer adjacency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RangeMetric {
    /// `max(|dx|, |dy|)`: diagonals count as one step
    #[default]
    Chebyshev,
    /// `|dx| + |dy|`
    Manhattan,
}

/// Move `steps` cells from `from` in `direction`.
///
/// Movement is along a straight line, so the path stays on the board
/// exactly when the destination does. A path that would leave the board
/// is rejected in full rather than clamped.
pub fn translate(
    from: Position,
    direction: Direction,
    steps: u32,
    grid: GridSize,
) -> Result<Position, EngineError> {
    if !grid.contains(from) {
        return Err(EngineError::OutOfBounds);
    }

    let (dx, dy) = direction.offset();
    let x = from.x as i64 + dx * steps as i64;
    let y = from.y as i64 + dy * steps as i64;

    if x < 0 || y < 0 || x >= grid.width as i64 || y >= grid.height as i64 {
        return Err(EngineError::OutOfBounds);
    }

    Ok(Position::new(x as u32, y as u32))
}

/// Distance between two cells.
#[inline]
pub fn distance(a: Position, b: Position, metric: RangeMetric) -> u32 {
    let dx = a.x.abs_diff(b.x);
    let dy = a.y.abs_diff(b.y);
    match metric {
        RangeMetric::Chebyshev => dx.max(dy),
        RangeMetric::Manhattan => dx.saturating_add(dy),
    }
}

// =============================================================================
// TESTS
// =============================================================================
