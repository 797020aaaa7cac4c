use crate::arena::Arena;
use maze_core::core::{CellState, Grid, Pose, Position};

/// Writes sensed cell states into the grid
pub trait Sensor: Send {
    /// Sense around `pose`; returns how many cells changed
    fn sense(&mut self, pose: &Pose, grid: &mut Grid) -> usize;

    /// Cells sensed beyond the footprint centre, in Chebyshev distance
    fn sensing_radius(&self) -> u32;
}

/// Simulated sensor reading the true arena layout
///
/// Sees the square window of radius `1 + range` around the footprint centre,
/// without occlusion.
#[derive(Debug, Clone)]
pub struct ArenaSensor {
    arena: Arena,
    range: u32,
}

impl ArenaSensor {
    pub fn new(arena: Arena, range: u32) -> Self {
        Self {
            arena,
            range: range.max(1),
        }
    }
}

impl Sensor for ArenaSensor {
    fn sense(&mut self, pose: &Pose, grid: &mut Grid) -> usize {
        let r = self.sensing_radius() as i32;
        let mut changed = 0;
        for dy in -r..=r {
            for dx in -r..=r {
                let p: Position = pose.position.offset((dx, dy));
                let state = if self.arena.is_obstacle(p) {
                    CellState::Obstacle
                } else {
                    CellState::Empty
                };
                if grid.cell(p).is_some_and(|c| c != state) && grid.set_cell(p, state) {
                    changed += 1;
                }
            }
        }
        changed
    }

    fn sensing_radius(&self) -> u32 {
        1 + self.range
    }
}
