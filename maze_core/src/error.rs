//! Error types for MAZE
//!
//! Every failure the controller can report is a variant of [`MazeError`].
//! Background tasks convert these into status updates at their boundary;
//! none of them is allowed to take the coordination loop down.

use crate::core::grid::Position;
use thiserror::Error;

/// MAZE error type
#[derive(Error, Debug)]
pub enum MazeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A motion primitive was issued before `reset_pose`
    #[error("robot pose not initialized")]
    NotInitialized,

    /// `reset_pose` input outside the interior of the grid (1-indexed input)
    #[error("robot position ({x}, {y}) out of range")]
    PositionOutOfRange { x: i32, y: i32 },

    /// The robot footprint would leave the grid
    #[error("footprint centred on {0} leaves the grid")]
    OutOfBounds(Position),

    /// The robot footprint would overlap a sensed obstacle
    #[error("footprint centred on {0} overlaps an obstacle")]
    Blocked(Position),

    #[error("no path found from {from} to {to}")]
    NoPath { from: Position, to: Position },

    /// A session of this kind is already running
    #[error("{0} session already running")]
    SessionActive(&'static str),

    #[error("no layout loaded yet")]
    NoLayout,

    /// The requested operation is not enabled in the current state
    #[error("not ready: {0}")]
    NotReady(String),

    #[error("operation cancelled")]
    Cancelled,
}

pub type MazeResult<T> = std::result::Result<T, MazeError>;

impl MazeError {
    /// Convenience constructor for configuration errors
    pub fn config(msg: impl Into<String>) -> Self {
        MazeError::Config(msg.into())
    }

    /// Convenience constructor for invalid operator input
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        MazeError::InvalidInput(msg.into())
    }

    /// Convenience constructor for link failures
    pub fn communication(msg: impl Into<String>) -> Self {
        MazeError::Communication(msg.into())
    }
}

impl From<serde_json::Error> for MazeError {
    fn from(e: serde_json::Error) -> Self {
        MazeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for MazeError {
    fn from(e: serde_yaml::Error) -> Self {
        MazeError::Serialization(e.to_string())
    }
}

impl From<std::num::ParseIntError> for MazeError {
    fn from(e: std::num::ParseIntError) -> Self {
        MazeError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MazeError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MazeError::Internal(format!("lock poisoned: {}", e))
    }
}
