//! # MAZE Core
//!
//! The core runtime of the MAZE exploration controller.
//!
//! MAZE drives a wheeled robot (or its simulated twin) through an unknown
//! grid maze: explore within a time budget, get back to the start zone before
//! the budget runs out, then run the fastest path to the goal. This crate
//! provides the fundamental building blocks:
//!
//! - **Core**: grid model, robot pose tracker, paint surface
//! - **Scheduling**: one-second countdowns and the one-session-at-a-time gate
//! - **Communication**: line-delimited link to the physical robot
//! - **Params**: runtime parameters persisted as YAML
//!
//! ## Quick Start
//!
//! ```rust
//! use maze_core::{Canvas, Grid, PoseTracker};
//!
//! let grid = Grid::arena().into_shared();
//! let tracker = PoseTracker::new(grid, Canvas::new(20, 15));
//! tracker.reset_pose(3, 3).unwrap();
//! tracker.move_forward().unwrap();
//! ```

pub mod communication;
pub mod core;
pub mod error;
pub mod params;
pub mod scheduling;

// Re-export commonly used types for easy access
pub use communication::LineLink;
pub use core::{
    Canvas, CellState, Grid, LogSummary, Move, Orientation, Paint, PaintSurface, Pose,
    PoseTracker, Position, RenderCell, SharedGrid,
};
pub use error::{MazeError, MazeResult};
pub use params::{OperatorSettings, RuntimeParams, SessionConfig};
pub use scheduling::{
    Countdown, CountdownTick, RobotLock, SessionGate, SessionGuard, SessionState,
};
