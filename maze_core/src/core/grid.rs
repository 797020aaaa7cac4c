use crate::core::surface::RenderCell;
use crate::core::LogSummary;
use crate::error::{MazeError, MazeResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Width (x extent) of the reference arena
pub const ARENA_WIDTH: usize = 15;
/// Length (y extent) of the reference arena
pub const ARENA_LENGTH: usize = 20;

/// Grid shared between the pose tracker, the explorer loop and observers
pub type SharedGrid = Arc<RwLock<Grid>>;

/// Zero-indexed cell coordinate on the logical grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by a (dx, dy) vector
    pub fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Chebyshev distance, used for 3×3 block membership
    pub fn chebyshev(self, other: Position) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Sensed state of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Unexplored,
    Empty,
    Obstacle,
}

impl CellState {
    pub fn is_known(self) -> bool {
        self != CellState::Unexplored
    }
}

/// Fixed-size arena with per-cell sensed state
///
/// `x` runs along the width, `y` along the length. The START and GOAL zones
/// are the 3×3 blocks centred on fixed anchors in opposite corners; they are
/// never classified as obstacles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    length: usize,
    cells: Vec<CellState>,
    start: Position,
    goal: Position,
}

impl Grid {
    /// Create an unexplored grid; both zones must fit, so each side is at least 3
    pub fn new(width: usize, length: usize) -> MazeResult<Self> {
        if width < 3 || length < 3 || width > i32::MAX as usize || length > i32::MAX as usize {
            return Err(MazeError::config(format!(
                "grid {}x{} cannot hold a 3x3 robot",
                width, length
            )));
        }

        Ok(Self {
            width,
            length,
            cells: vec![CellState::Unexplored; width * length],
            start: Position::new(1, 1),
            goal: Position::new(width as i32 - 2, length as i32 - 2),
        })
    }

    /// The reference 15×20 arena
    pub fn arena() -> Self {
        Self {
            width: ARENA_WIDTH,
            length: ARENA_LENGTH,
            cells: vec![CellState::Unexplored; ARENA_WIDTH * ARENA_LENGTH],
            start: Position::new(1, 1),
            goal: Position::new(ARENA_WIDTH as i32 - 2, ARENA_LENGTH as i32 - 2),
        }
    }

    /// Wrap into the lock shared across background tasks
    pub fn into_shared(self) -> SharedGrid {
        Arc::new(RwLock::new(self))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Anchor (centre) of the START zone
    pub fn start(&self) -> Position {
        self.start
    }

    /// Anchor (centre) of the GOAL zone
    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn contains(&self, p: Position) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.width && (p.y as usize) < self.length
    }

    fn index(&self, p: Position) -> Option<usize> {
        self.contains(p)
            .then(|| p.y as usize * self.width + p.x as usize)
    }

    pub fn cell(&self, p: Position) -> Option<CellState> {
        self.index(p).map(|i| self.cells[i])
    }

    /// Record a sensed state; returns `false` if the cell is outside the grid
    /// or the write would turn a zone cell into an obstacle
    pub fn set_cell(&mut self, p: Position, state: CellState) -> bool {
        if state == CellState::Obstacle && self.in_zone(p) {
            return false;
        }
        match self.index(p) {
            Some(i) => {
                self.cells[i] = state;
                true
            }
            None => false,
        }
    }

    /// Forget everything sensed so far
    pub fn reset(&mut self) {
        self.cells.fill(CellState::Unexplored);
    }

    pub fn in_start_zone(&self, p: Position) -> bool {
        self.contains(p) && p.chebyshev(self.start) <= 1
    }

    pub fn in_goal_zone(&self, p: Position) -> bool {
        self.contains(p) && p.chebyshev(self.goal) <= 1
    }

    /// True for cells of either safe zone
    pub fn in_zone(&self, p: Position) -> bool {
        self.in_start_zone(p) || self.in_goal_zone(p)
    }

    /// All cell coordinates, row by row
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.length as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| Position::new(x, y)))
    }

    /// The 3×3 block centred on `center` (cells may lie outside the grid)
    pub fn footprint(center: Position) -> impl Iterator<Item = Position> {
        (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| center.offset((dx, dy))))
    }

    pub fn footprint_in_bounds(&self, center: Position) -> bool {
        center.x >= 1
            && center.y >= 1
            && (center.x as usize) + 1 < self.width
            && (center.y as usize) + 1 < self.length
    }

    /// Whether the robot may stand with its centre on `center`
    ///
    /// Obstacles always block; unexplored cells block unless `unknown_is_free`.
    pub fn is_traversable(&self, center: Position, unknown_is_free: bool) -> bool {
        self.footprint_in_bounds(center)
            && Self::footprint(center).all(|p| match self.cell(p) {
                Some(CellState::Empty) => true,
                Some(CellState::Unexplored) => unknown_is_free,
                _ => false,
            })
    }

    /// Whether the footprint at `center` overlaps a sensed obstacle
    pub fn footprint_blocked(&self, center: Position) -> bool {
        Self::footprint(center).any(|p| self.cell(p) == Some(CellState::Obstacle))
    }

    /// Number of cells that are no longer unexplored
    pub fn explored_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_known()).count()
    }

    /// Percentage of cells that are no longer unexplored, in `[0, 100]`
    pub fn coverage(&self) -> f32 {
        let explored = self.explored_count();
        if explored == self.cells.len() {
            return 100.0;
        }
        (100 * explored) as f32 / self.cells.len() as f32
    }

    /// Map a grid coordinate onto the renderer's frame
    ///
    /// `row = (length - 1) - y`, `col = x`. Any renderer must preserve this.
    pub fn to_render(&self, p: Position) -> Option<RenderCell> {
        self.contains(p).then(|| RenderCell {
            row: self.length - 1 - p.y as usize,
            col: p.x as usize,
        })
    }

    /// Inverse of [`Grid::to_render`]
    pub fn from_render(&self, cell: RenderCell) -> Option<Position> {
        (cell.row < self.length && cell.col < self.width).then(|| {
            Position::new(cell.col as i32, (self.length - 1 - cell.row) as i32)
        })
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::arena()
    }
}

impl LogSummary for Grid {
    fn log_summary(&self) -> String {
        format!(
            "Grid {}x{} ({:.1}% explored)",
            self.width,
            self.length,
            self.coverage()
        )
    }
}
