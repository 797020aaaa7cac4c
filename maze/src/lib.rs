//! # MAZE - grid maze exploration and fastest-path controller
//!
//! MAZE drives a 3×3-footprint robot through an unknown grid arena: explore
//! within a time budget, come back to the START zone, then run the fastest
//! path to the GOAL zone. It runs against a simulated arena or a physical
//! robot on a line-based TCP link.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use maze::prelude::*;
//!
//! # async fn run() -> AnyResult<()> {
//! let canvas = Canvas::new(20, 15);
//! let ctx = MazeContext::new(SessionConfig::default(), RunMode::Simulation, canvas.clone())?;
//! let controller = MazeController::new(ctx);
//!
//! controller.edit_layout(Arena::random(42, 0.1))?;
//! controller.load_layout()?;
//! controller.set_speed("8")?;
//! controller.reset_robot(2, 2)?;
//! controller.start_exploration()?;
//! controller.wait_exploration().await;
//!
//! println!("{}", canvas.render_ascii());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Frontier exploration** with a return-to-start time budget
//! - **A\* fastest path** that charges for turns
//! - **Cooperative cancellation** on timeout
//! - **Structured errors** alongside operator status strings

// Re-export core components (avoiding conflicts)
pub use maze_core::{self, *};

// Re-export standard library with alias
pub use maze_library as library;

/// The MAZE prelude - everything you need to get started
pub mod prelude {
    // Core model
    pub use maze_core::core::{
        Canvas, CellState, Grid, LogSummary, Move, Orientation, Paint, PaintSurface, Pose,
        PoseTracker, Position,
    };

    // Scheduling
    pub use maze_core::scheduling::{SessionState, SessionGate};

    // Configuration
    pub use maze_core::params::{OperatorSettings, RuntimeParams, SessionConfig};

    // Error types
    pub use maze_core::error::{MazeError, MazeResult};
    pub type Result<T> = MazeResult<T>;

    // Algorithms, layouts and nodes
    pub use maze_library::algorithms::{AStarPlanner, FrontierExplorer, FrontierSearch, PathPlanner};
    pub use maze_library::arena::Arena;
    pub use maze_library::nodes::{MazeContext, MazeController, RunMode, StatusBoard};

    // Common std types
    pub use std::sync::Arc;
    pub use std::time::Duration;

    // Common traits
    pub use serde::{Deserialize, Serialize};

    // Re-export anyhow for error handling
    pub use anyhow::{anyhow, bail, ensure, Context, Result as AnyResult};

    // Re-export all message types from maze_library for convenience
    pub use maze_library::messages::*;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get MAZE version
pub fn version() -> &'static str {
    VERSION
}
