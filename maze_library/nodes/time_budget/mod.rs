//! Return-to-start time budget
//!
//! Every countdown tick the exploration session asks for a fresh estimate of
//! how long the robot needs to get back to START. The estimate runs on the
//! blocking pool against a grid snapshot; the countdown never waits for it.

use crate::algorithms::PathPlanner;
use crate::nodes::context::MazeContext;
use maze_core::core::{LogSummary, PoseTracker, SharedGrid};
use maze_core::error::MazeResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Seconds needed to drive `steps` forward moves at `speed` steps per second,
/// plus the turn-in-place allowance
pub fn return_estimate(steps: usize, speed: u32, buffer_secs: u32) -> f64 {
    steps as f64 * (1.0 / speed.max(1) as f64) + buffer_secs as f64
}

/// Read-only observer of pose and grid that raises the time threshold flag
pub struct TimeBudgetMonitor {
    planner: Arc<dyn PathPlanner>,
    grid: SharedGrid,
    tracker: Arc<PoseTracker>,
    speed: u32,
    buffer_secs: u32,
    flag: Arc<AtomicBool>,
}

impl TimeBudgetMonitor {
    pub fn new(ctx: &MazeContext, speed: u32) -> Self {
        Self {
            planner: ctx.planner.clone(),
            grid: ctx.grid.clone(),
            tracker: ctx.tracker.clone(),
            speed,
            buffer_secs: ctx.config.threshold_buffer_secs,
            flag: ctx.time_threshold.clone(),
        }
    }

    /// Estimated seconds from the current position back to the START anchor
    pub fn estimate_return_secs(&self) -> MazeResult<f64> {
        let pose = self.tracker.require_pose()?;
        let snapshot = self.grid.read().clone();
        let path = self
            .planner
            .find_fastest_path(pose.position, snapshot.start(), &snapshot)?;
        debug!("return path {}", path.log_summary());
        Ok(return_estimate(path.num_steps(), self.speed, self.buffer_secs))
    }

    /// Compare one estimate against the seconds left
    ///
    /// Raises the flag exactly when `remaining <= estimate`; once raised it
    /// stays up until [`reset`](Self::reset). Returns the flag.
    pub fn evaluate(&self, remaining: u32, estimate_secs: f64) -> bool {
        if (remaining as f64) <= estimate_secs && !self.flag.swap(true, Ordering::AcqRel) {
            warn!(
                "time threshold reached: {}s left, return needs {:.1}s",
                remaining, estimate_secs
            );
        }
        self.reached()
    }

    pub fn reached(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Lower the flag; only done when a session starts
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    /// Estimate on the blocking pool and send `(remaining, estimate)` to `tx`
    ///
    /// A failed estimate is dropped; the next tick tries again.
    pub fn spawn_estimate(self: &Arc<Self>, remaining: u32, tx: mpsc::Sender<(u32, f64)>) {
        let monitor = Arc::clone(self);
        tokio::task::spawn_blocking(move || match monitor.estimate_return_secs() {
            Ok(estimate) => {
                // The session may already be over
                let _ = tx.blocking_send((remaining, estimate));
            }
            Err(e) => debug!("return estimate skipped this tick: {}", e),
        });
    }
}
