use crate::core::grid::{CellState, Grid, Position, SharedGrid};
use crate::core::surface::{Paint, PaintSurface};
use crate::core::LogSummary;
use crate::error::{MazeError, MazeResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Facing direction; NORTH is towards increasing `y`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    North,
    East,
    South,
    West,
}

/// orientation -> (forward vector, left turn, right turn)
const DIRECTIONS: [((i32, i32), Orientation, Orientation); 4] = [
    ((0, 1), Orientation::West, Orientation::East),
    ((1, 0), Orientation::North, Orientation::South),
    ((0, -1), Orientation::East, Orientation::West),
    ((-1, 0), Orientation::South, Orientation::North),
];

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::North,
        Orientation::East,
        Orientation::South,
        Orientation::West,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Unit (dx, dy) of one forward step
    pub fn forward(self) -> (i32, i32) {
        DIRECTIONS[self.index()].0
    }

    pub fn left(self) -> Orientation {
        DIRECTIONS[self.index()].1
    }

    pub fn right(self) -> Orientation {
        DIRECTIONS[self.index()].2
    }

    pub fn opposite(self) -> Orientation {
        self.right().right()
    }

    /// Orientation whose forward vector is `delta`, if it is a unit step
    pub fn from_delta(delta: (i32, i32)) -> Option<Orientation> {
        Self::ALL.into_iter().find(|o| o.forward() == delta)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Orientation::North => "NORTH",
            Orientation::East => "EAST",
            Orientation::South => "SOUTH",
            Orientation::West => "WEST",
        };
        f.write_str(name)
    }
}

/// Discrete motion primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Forward,
    TurnLeft,
    TurnRight,
}

/// Robot position (footprint centre) and facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pose {
    pub position: Position,
    pub orientation: Orientation,
}

impl Pose {
    pub fn new(position: Position, orientation: Orientation) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Front-facing cell of the footprint
    pub fn heading_cell(&self) -> Position {
        self.position.offset(self.orientation.forward())
    }

    /// Pose after applying `mv`, without any bounds checks
    pub fn after(&self, mv: Move) -> Pose {
        match mv {
            Move::Forward => Pose::new(self.heading_cell(), self.orientation),
            Move::TurnLeft => Pose::new(self.position, self.orientation.left()),
            Move::TurnRight => Pose::new(self.position, self.orientation.right()),
        }
    }

    fn covers(&self, p: Position) -> bool {
        p.chebyshev(self.position) <= 1
    }
}

impl LogSummary for Pose {
    fn log_summary(&self) -> String {
        format!("{} facing {}", self.position, self.orientation)
    }
}

struct TrackerState {
    pose: Option<Pose>,
    surface: Box<dyn PaintSurface>,
}

/// Single owner of the robot pose
///
/// Every primitive runs under one lock: footprint paint, pose update and the
/// reconciling repaint are observed together or not at all. The sensed grid
/// is only read here.
pub struct PoseTracker {
    grid: SharedGrid,
    state: Mutex<TrackerState>,
}

impl PoseTracker {
    pub fn new(grid: SharedGrid, surface: impl PaintSurface + 'static) -> Self {
        let tracker = Self {
            grid,
            state: Mutex::new(TrackerState {
                pose: None,
                surface: Box::new(surface),
            }),
        };
        tracker.reset_surface();
        tracker
    }

    pub fn grid(&self) -> &SharedGrid {
        &self.grid
    }

    pub fn pose(&self) -> Option<Pose> {
        self.state.lock().pose
    }

    /// Current pose or [`MazeError::NotInitialized`]
    pub fn require_pose(&self) -> MazeResult<Pose> {
        self.pose().ok_or(MazeError::NotInitialized)
    }

    /// Place the robot from 1-indexed operator input, facing NORTH
    ///
    /// Input whose footprint would leave the grid blanks the surface and
    /// unsets the pose.
    pub fn reset_pose(&self, x: i32, y: i32) -> MazeResult<Pose> {
        let mut state = self.state.lock();
        let grid = self.grid.read();

        let in_range = x >= 2
            && y >= 2
            && x <= grid.width() as i32 - 1
            && y <= grid.length() as i32 - 1;
        if !in_range {
            state.pose = None;
            paint_blank(&grid, state.surface.as_mut());
            warn!("robot position ({}, {}) out of range, grid reset", x, y);
            return Err(MazeError::PositionOutOfRange { x, y });
        }

        let pose = Pose::new(Position::new(x - 1, y - 1), Orientation::North);
        state.pose = Some(pose);
        repaint(&grid, state.surface.as_mut(), &pose);
        paint_footprint(&grid, state.surface.as_mut(), &pose);
        debug!("pose reset to {}", pose.log_summary());
        Ok(pose)
    }

    /// Blank surface with only the zones marked
    pub fn reset_surface(&self) {
        let mut state = self.state.lock();
        let grid = self.grid.read();
        paint_blank(&grid, state.surface.as_mut());
    }

    /// Forget the pose and blank the surface
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.pose = None;
        let grid = self.grid.read();
        paint_blank(&grid, state.surface.as_mut());
    }

    pub fn turn_left(&self) -> MazeResult<Pose> {
        self.apply(Move::TurnLeft)
    }

    pub fn turn_right(&self) -> MazeResult<Pose> {
        self.apply(Move::TurnRight)
    }

    pub fn move_forward(&self) -> MazeResult<Pose> {
        self.apply(Move::Forward)
    }

    /// Apply one primitive, keeping pose and paint in step
    pub fn apply(&self, mv: Move) -> MazeResult<Pose> {
        let mut state = self.state.lock();
        let current = state.pose.ok_or(MazeError::NotInitialized)?;
        let grid = self.grid.read();

        let next = current.after(mv);
        if mv == Move::Forward {
            if !grid.footprint_in_bounds(next.position) {
                return Err(MazeError::OutOfBounds(next.position));
            }
            if grid.footprint_blocked(next.position) {
                return Err(MazeError::Blocked(next.position));
            }
        }

        let surface = state.surface.as_mut();
        for p in Grid::footprint(current.position).filter(|p| !next.covers(*p)) {
            if let Some(cell) = grid.to_render(p) {
                surface.paint(cell, Paint::Explored);
            }
        }
        paint_footprint(&grid, surface, &next);
        state.pose = Some(next);
        repaint(&grid, state.surface.as_mut(), &next);

        Ok(next)
    }

    /// Paint a single grid cell under the tracker lock
    pub fn paint_cell(&self, p: Position, paint: Paint) -> bool {
        let mut state = self.state.lock();
        let grid = self.grid.read();
        match grid.to_render(p) {
            Some(cell) => {
                state.surface.paint(cell, paint);
                true
            }
            None => false,
        }
    }

    /// Reconcile every cell with the sensed grid
    pub fn repaint(&self) {
        let mut state = self.state.lock();
        let grid = self.grid.read();
        match state.pose {
            Some(pose) => {
                repaint(&grid, state.surface.as_mut(), &pose);
                paint_footprint(&grid, state.surface.as_mut(), &pose);
            }
            None => paint_reconciled(&grid, state.surface.as_mut(), None),
        }
    }
}

/// Paint a cell gets when the robot is not on it
fn base_paint(grid: &Grid, p: Position) -> Paint {
    match grid.cell(p) {
        Some(CellState::Obstacle) => Paint::Obstacle,
        Some(CellState::Empty) if !grid.in_zone(p) => Paint::Explored,
        _ if grid.in_zone(p) => Paint::Zone,
        _ => Paint::Background,
    }
}

fn paint_blank(grid: &Grid, surface: &mut dyn PaintSurface) {
    for p in grid.positions() {
        let paint = if grid.in_zone(p) {
            Paint::Zone
        } else {
            Paint::Background
        };
        if let Some(cell) = grid.to_render(p) {
            surface.paint(cell, paint);
        }
    }
}

fn paint_footprint(grid: &Grid, surface: &mut dyn PaintSurface, pose: &Pose) {
    let heading = pose.heading_cell();
    for p in Grid::footprint(pose.position) {
        let paint = if p == heading {
            Paint::Heading
        } else {
            Paint::Footprint
        };
        if let Some(cell) = grid.to_render(p) {
            surface.paint(cell, paint);
        }
    }
}

fn repaint(grid: &Grid, surface: &mut dyn PaintSurface, pose: &Pose) {
    paint_reconciled(grid, surface, Some(pose));
}

fn paint_reconciled(grid: &Grid, surface: &mut dyn PaintSurface, pose: Option<&Pose>) {
    for p in grid.positions() {
        if pose.is_some_and(|pose| pose.covers(p)) {
            continue;
        }
        if let Some(cell) = grid.to_render(p) {
            surface.paint(cell, base_paint(grid, p));
        }
    }
}
