//! A* fastest-path planning for the 3×3 robot
//!
//! Searches over (cell, heading) states so that among paths with the fewest
//! forward moves the one with the fewest turns wins.
//!
//! # Example
//!
//! ```rust
//! use maze_core::core::{CellState, Grid};
//! use maze_library::algorithms::astar::{AStarPlanner, PathPlanner};
//!
//! let mut grid = Grid::arena();
//! for p in grid.positions().collect::<Vec<_>>() {
//!     grid.set_cell(p, CellState::Empty);
//! }
//! let path = AStarPlanner::new()
//!     .find_fastest_path(grid.start(), grid.goal(), &grid)
//!     .unwrap();
//! assert_eq!(path.num_steps(), 29);
//! ```

use maze_core::core::{Grid, LogSummary, Move, Orientation, Position};
use maze_core::error::{MazeError, MazeResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// One cell of a path
pub type Step = Position;

/// Ordered cells visited after the start cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub steps: Vec<Step>,
}

impl Path {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Path cost in forward moves
    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<Step> {
        self.steps.last().copied()
    }

    /// Primitives that drive the robot along the path from `start`, `facing`
    ///
    /// A reversal is two right turns.
    pub fn moves_from(&self, start: Position, facing: Orientation) -> MazeResult<Vec<Move>> {
        let mut moves = Vec::with_capacity(self.steps.len() * 2);
        let mut at = start;
        let mut heading = facing;

        for step in &self.steps {
            let wanted = Orientation::from_delta((step.x - at.x, step.y - at.y)).ok_or_else(|| {
                MazeError::Internal(format!("path jumps from {} to {}", at, step))
            })?;

            if wanted == heading.left() {
                moves.push(Move::TurnLeft);
            } else if wanted == heading.right() {
                moves.push(Move::TurnRight);
            } else if wanted == heading.opposite() {
                moves.push(Move::TurnRight);
                moves.push(Move::TurnRight);
            }
            moves.push(Move::Forward);

            heading = wanted;
            at = *step;
        }

        Ok(moves)
    }
}

impl LogSummary for Path {
    fn log_summary(&self) -> String {
        match (self.steps.first(), self.steps.last()) {
            (Some(first), Some(last)) => {
                format!("Path({} steps, {} -> {})", self.steps.len(), first, last)
            }
            _ => "Path(empty)".to_string(),
        }
    }
}

/// Fastest-path contract
pub trait PathPlanner: Send + Sync {
    /// Path for the robot centre from `start` to `goal` on `grid`
    ///
    /// Returns [`MazeError::NoPath`] when the goal is unreachable.
    fn find_fastest_path(&self, start: Position, goal: Position, grid: &Grid) -> MazeResult<Path>;
}

/// Search state in the open set
#[derive(Clone, Copy, Debug)]
struct AStarNode {
    state: (Position, Orientation),
    g_cost: f64,
    f_cost: f64,
}

impl Eq for AStarNode {}

impl PartialEq for AStarNode {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .f_cost
            .total_cmp(&self.f_cost)
            .then_with(|| self.g_cost.total_cmp(&other.g_cost))
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Turn-aware A* planner
#[derive(Debug, Clone)]
pub struct AStarPlanner {
    /// Cost of a 90° turn; a tie-breaker, kept well below one move
    turn_penalty: f64,
    /// Let the footprint cross cells not yet sensed
    unknown_is_free: bool,
}

impl AStarPlanner {
    pub fn new() -> Self {
        Self {
            turn_penalty: 0.001,
            unknown_is_free: false,
        }
    }

    pub fn with_turn_penalty(mut self, turn_penalty: f64) -> Self {
        self.turn_penalty = turn_penalty;
        self
    }

    /// Optimistic planning through unexplored cells
    pub fn with_unknown_is_free(mut self, unknown_is_free: bool) -> Self {
        self.unknown_is_free = unknown_is_free;
        self
    }

    pub fn unknown_is_free(&self) -> bool {
        self.unknown_is_free
    }

    /// Plan from a known facing, so the first turns count too
    ///
    /// With `facing == None` every heading at `start` is free.
    pub fn plan(
        &self,
        start: Position,
        facing: Option<Orientation>,
        goal: Position,
        grid: &Grid,
    ) -> MazeResult<Path> {
        let no_path = || MazeError::NoPath { from: start, to: goal };

        if !grid.footprint_in_bounds(start) || !grid.footprint_in_bounds(goal) {
            return Err(no_path());
        }
        if start == goal {
            return Ok(Path::default());
        }

        let mut open_set = BinaryHeap::new();
        let mut g_costs: HashMap<(Position, Orientation), f64> = HashMap::new();
        let mut came_from: HashMap<(Position, Orientation), (Position, Orientation)> =
            HashMap::new();

        let headings: Vec<Orientation> = match facing {
            Some(o) => vec![o],
            None => Orientation::ALL.to_vec(),
        };
        for heading in headings {
            let state = (start, heading);
            g_costs.insert(state, 0.0);
            open_set.push(AStarNode {
                state,
                g_cost: 0.0,
                f_cost: start.manhattan(goal) as f64,
            });
        }

        while let Some(current) = open_set.pop() {
            let (position, heading) = current.state;

            if position == goal {
                return Ok(Self::reconstruct(&came_from, current.state));
            }
            if current.g_cost > g_costs.get(&current.state).copied().unwrap_or(f64::INFINITY) {
                continue;
            }

            let forward = position.offset(heading.forward());
            let neighbours = [
                (
                    (forward, heading),
                    1.0,
                    grid.is_traversable(forward, self.unknown_is_free),
                ),
                ((position, heading.left()), self.turn_penalty, true),
                ((position, heading.right()), self.turn_penalty, true),
            ];

            for (next, cost, allowed) in neighbours {
                if !allowed {
                    continue;
                }
                let tentative = current.g_cost + cost;
                if tentative < g_costs.get(&next).copied().unwrap_or(f64::INFINITY) {
                    g_costs.insert(next, tentative);
                    came_from.insert(next, current.state);
                    open_set.push(AStarNode {
                        state: next,
                        g_cost: tentative,
                        f_cost: tentative + next.0.manhattan(goal) as f64,
                    });
                }
            }
        }

        Err(no_path())
    }

    fn reconstruct(
        came_from: &HashMap<(Position, Orientation), (Position, Orientation)>,
        end: (Position, Orientation),
    ) -> Path {
        let mut steps = Vec::new();
        let mut current = end;
        while let Some(previous) = came_from.get(&current) {
            if previous.0 != current.0 {
                steps.push(current.0);
            }
            current = *previous;
        }
        steps.reverse();
        Path::new(steps)
    }
}

impl Default for AStarPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PathPlanner for AStarPlanner {
    fn find_fastest_path(&self, start: Position, goal: Position, grid: &Grid) -> MazeResult<Path> {
        self.plan(start, None, goal, grid)
    }
}
