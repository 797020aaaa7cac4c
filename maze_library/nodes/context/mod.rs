use crate::algorithms::{AStarPlanner, PathPlanner};
use crate::arena::Arena;
use crate::nodes::status_board::StatusBoard;
use maze_core::core::{Grid, PaintSurface, PoseTracker, SharedGrid};
use maze_core::error::MazeResult;
use maze_core::params::SessionConfig;
use maze_core::scheduling::RobotLock;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where motion and sensing come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Sensing reads the loaded layout; the operator sequences sessions
    Simulation,
    /// Sensing comes from the robot; sessions are sequenced by the link
    Hardware,
}

/// Everything the sessions share, built once at startup
///
/// Cloning is cheap and shares all state.
#[derive(Clone)]
pub struct MazeContext {
    pub config: Arc<SessionConfig>,
    pub mode: RunMode,
    pub grid: SharedGrid,
    pub tracker: Arc<PoseTracker>,
    pub status: StatusBoard,
    pub planner: Arc<dyn PathPlanner>,
    /// Layout loaded by the operator, if any
    pub arena: Arc<RwLock<Option<Arena>>>,
    /// One-shot "time threshold reached" flag of the current exploration
    pub time_threshold: Arc<AtomicBool>,
    /// Held by whichever session is moving the robot
    pub robot: RobotLock,
}

impl MazeContext {
    /// Build a context over the reference arena, painting onto `surface`
    pub fn new(
        config: SessionConfig,
        mode: RunMode,
        surface: impl PaintSurface + 'static,
    ) -> MazeResult<Self> {
        config.validate()?;
        let grid = Grid::arena().into_shared();
        let tracker = Arc::new(PoseTracker::new(grid.clone(), surface));
        let planner = AStarPlanner::new().with_turn_penalty(config.turn_penalty);

        Ok(Self {
            config: Arc::new(config),
            mode,
            grid,
            tracker,
            status: StatusBoard::new(),
            planner: Arc::new(planner),
            arena: Arc::new(RwLock::new(None)),
            time_threshold: Arc::new(AtomicBool::new(false)),
            robot: RobotLock::new(),
        })
    }

    /// Swap in another planner implementation
    pub fn with_planner(mut self, planner: Arc<dyn PathPlanner>) -> Self {
        self.planner = planner;
        self
    }

    pub fn is_hardware(&self) -> bool {
        self.mode == RunMode::Hardware
    }

    /// Copy of the loaded layout
    pub fn layout(&self) -> Option<Arena> {
        self.arena.read().clone()
    }

    pub fn has_layout(&self) -> bool {
        self.arena.read().is_some()
    }

    pub fn time_threshold_reached(&self) -> bool {
        self.time_threshold.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_core::core::Canvas;

    #[test]
    fn test_context_rejects_bad_config() {
        let config = SessionConfig {
            hardware_speed: 0,
            ..SessionConfig::default()
        };
        assert!(MazeContext::new(config, RunMode::Simulation, Canvas::new(20, 15)).is_err());
    }

    #[test]
    fn test_clones_share_state() {
        let ctx =
            MazeContext::new(SessionConfig::default(), RunMode::Simulation, Canvas::new(20, 15))
                .unwrap();
        let other = ctx.clone();

        assert!(!other.has_layout());
        *ctx.arena.write() = Some(Arena::empty());
        assert!(other.has_layout());

        ctx.tracker.reset_pose(3, 3).unwrap();
        assert!(other.tracker.pose().is_some());
        assert!(!other.is_hardware());
    }
}
