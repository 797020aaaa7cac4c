//! Search algorithms for the MAZE controller
//!
//! Pure computation over a [`Grid`](maze_core::core::Grid) snapshot; no I/O,
//! no locks, no timers.
//!
//! - **astar**: fastest path for the 3×3 robot, turn-aware A*
//! - **frontier**: exploration stepper (goal run, frontier sweep, return home)
//!   and the simulated sensor it reads the arena through

pub mod astar;
pub mod frontier;

pub use astar::{AStarPlanner, Path, PathPlanner, Step};
pub use frontier::{ArenaSensor, ExploreView, FrontierExplorer, FrontierSearch, Sensor};
