//! MAZE session nodes
//!
//! - `StatusBoard` - operator-facing status fields and their event stream
//! - `MazeContext` - shared grid, tracker, planner and layout, built once
//! - `ExplorationNode` - timed exploration with cooperative cancellation
//! - `CoverageSampler` - event-driven coverage reporting
//! - `TimeBudgetMonitor` - return-to-start estimate and threshold flag
//! - `FastestPathNode` - plan once, replay through the tracker
//! - `HardwareLinkNode` - robot handshake over the line link
//! - `MazeController` - the operator controls on top of all of the above
//!
//! # Usage
//!
//! ```rust,no_run
//! use maze_core::{Canvas, SessionConfig};
//! use maze_library::arena::Arena;
//! use maze_library::nodes::{MazeContext, MazeController, RunMode};
//!
//! # async fn run() -> maze_core::MazeResult<()> {
//! let ctx = MazeContext::new(SessionConfig::default(), RunMode::Simulation, Canvas::new(20, 15))?;
//! let controller = MazeController::new(ctx);
//! controller.edit_layout(Arena::random(7, 0.1))?;
//! controller.load_layout()?;
//! controller.set_speed("4")?;
//! controller.reset_robot(2, 2)?;
//!
//! controller.start_exploration()?;
//! controller.wait_exploration().await;
//! controller.find_fastest_path()?;
//! controller.wait_fastest_path().await;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod controller;
pub mod coverage;
pub mod exploration;
pub mod fastest_path;
pub mod hardware_link;
pub mod status_board;
pub mod time_budget;

pub use context::{MazeContext, RunMode};
pub use controller::{MazeController, SensorFactory};
pub use coverage::CoverageSampler;
pub use exploration::{ExplorationNode, ExploreOutcome, ExploreParams};
pub use fastest_path::{FastestPathNode, FastestPathOutcome, FastestPathParams};
pub use hardware_link::{Handshake, HardwareLinkNode};
pub use status_board::StatusBoard;
pub use time_budget::{return_estimate, TimeBudgetMonitor};
