//! Message types for the MAZE controller
//!
//! - Link: text messages exchanged with the physical robot
//! - Progress: per-step notifications published by the explorer loop
//! - Status: what the operator-facing status surface shows
//!
//! All message types are re-exported at the crate root for convenience.

pub mod link;
pub mod progress;
pub mod status;

pub use link::LinkMessage;
pub use progress::ExploreProgress;
pub use status::{StatusEvent, StatusSnapshot};
