//! # MAZE session scheduling
//!
//! Primitives the session controllers are built from:
//!
//! - **Countdown**: one-second wall-clock ticks against a time limit
//! - **SessionGate**: at most one active session of each kind
//! - **RobotLock**: one session among all kinds holding the robot pose
//! - **SessionState**: IDLE → RUNNING → {FINISHED, TIMED_OUT}
//!
//! ## Usage
//!
//! ```rust,ignore
//! use maze_core::scheduling::{Countdown, SessionGate};
//!
//! let gate = SessionGate::new("exploration");
//! let mut guard = gate.try_acquire()?;     // rejected while another run is live
//! let mut countdown = Countdown::new(360);
//! while let Some(tick) = countdown.tick().await {
//!     if tick.expired { guard.set_outcome(SessionState::TimedOut); }
//! }
//! ```

pub mod countdown;
pub mod session;

pub use countdown::{Countdown, CountdownTick};
pub use session::{RobotLock, SessionGate, SessionGuard, SessionInfo, SessionState};
