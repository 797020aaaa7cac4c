//! # MAZE Library
//!
//! Messages, algorithms and session nodes built on `maze_core`.
//!
//! ## Structure
//!
//! ```text
//! maze_library/
//! ── messages/       # Link, progress and status messages
//! ── algorithms/     # A* fastest path, frontier exploration, sensors
//! ── arena/          # Simulated layouts and the map descriptor file
//! ── nodes/          # Session controllers and the operator controller
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use maze_library::{
//!     // Core traits
//!     LogSummary,
//!     // Messages
//!     LinkMessage, StatusEvent,
//!     // Nodes
//!     MazeContext, MazeController, RunMode,
//! };
//!
//! // Or import from specific modules
//! use maze_library::algorithms::{AStarPlanner, FrontierSearch};
//! use maze_library::arena::Arena;
//! ```

pub mod algorithms;
pub mod arena;
pub mod messages;
pub mod nodes;

// Re-export core traits needed for message types
pub use maze_core::core::LogSummary;

// Re-export message types at the crate root for convenience
pub use messages::*;

pub use algorithms::{AStarPlanner, FrontierSearch, Path, PathPlanner};
pub use arena::Arena;
pub use nodes::{
    ExplorationNode, FastestPathNode, HardwareLinkNode, MazeContext, MazeController, RunMode,
    StatusBoard, TimeBudgetMonitor,
};
