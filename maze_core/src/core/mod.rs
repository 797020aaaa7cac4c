//! # Core types for the MAZE controller
//!
//! This module contains the fundamental building blocks of the system:
//!
//! - **Grid**: static arena geometry, sensed cell state, START/GOAL zones
//! - **Pose**: robot position + orientation and the move/turn primitives
//! - **Surface**: the paint capability a renderer plugs into
//!
//! ## Pose Lifecycle
//!
//! Every session follows the same lifecycle:
//! 1. **Reset** - `reset_pose()` places the robot facing NORTH
//! 2. **Motion** - `turn_left()`, `turn_right()`, `move_forward()` mutate the pose
//! 3. **Repaint** - every primitive reconciles the surface with the sensed grid

pub mod grid;
pub mod pose;
pub mod surface;

pub use grid::{CellState, Grid, Position, SharedGrid};
pub use pose::{Move, Orientation, Pose, PoseTracker};
pub use surface::{Canvas, Paint, PaintSurface, RenderCell};

/// Trait for providing lightweight logging summaries
///
/// Large values (grids, paths) provide compact string representations for
/// logging instead of their full `Debug` output.
pub trait LogSummary {
    /// Return a compact string representation suitable for logging
    fn log_summary(&self) -> String;
}
