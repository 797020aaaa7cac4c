//! Exploration session
//!
//! One run is three tasks: the explorer loop (the only writer of the pose),
//! the coverage sampler, and a coordinating task that owns the session
//! guard and selects over explorer completion, countdown ticks and return
//! estimates. The countdown is the authority on timeouts; on expiry it
//! cancels the explorer cooperatively at the next step boundary.

use crate::algorithms::{ExploreView, FrontierExplorer, Sensor};
use crate::messages::ExploreProgress;
use crate::nodes::context::{MazeContext, RunMode};
use crate::nodes::coverage::CoverageSampler;
use crate::nodes::time_budget::TimeBudgetMonitor;
use maze_core::core::{LogSummary, PoseTracker};
use maze_core::error::{MazeError, MazeResult};
use maze_core::scheduling::{Countdown, SessionGate, SessionGuard, SessionState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

type Result<T> = MazeResult<T>;

const PROGRESS_CAPACITY: usize = 64;
const ESTIMATE_CAPACITY: usize = 8;

/// Validated inputs of one exploration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExploreParams {
    /// Steps per second
    pub speed: u32,
    /// Seconds
    pub time_limit: u32,
    /// Percent, 0..=100
    pub coverage_target: u32,
}

impl ExploreParams {
    pub fn validate(&self) -> Result<()> {
        if self.speed == 0 {
            return Err(MazeError::invalid_input("speed must be greater than 0"));
        }
        if self.time_limit == 0 {
            return Err(MazeError::invalid_input(
                "exploration time limit must be greater than 0",
            ));
        }
        if self.coverage_target > 100 {
            return Err(MazeError::invalid_input("target coverage out of range"));
        }
        Ok(())
    }

    /// Delay between two primitives
    pub fn step_delay(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.speed.max(1) as f64)
    }
}

/// How a finished run ended
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreOutcome {
    pub session: Uuid,
    pub state: SessionState,
    pub reached_goal: bool,
    /// Final coverage in percent
    pub coverage: f32,
    /// Primitives applied
    pub steps: u32,
    /// Failure inside the explorer loop, if any
    pub error: Option<String>,
}

impl LogSummary for ExploreOutcome {
    fn log_summary(&self) -> String {
        format!(
            "{:?} after {} steps, {:.1}% covered, goal {}",
            self.state,
            self.steps,
            self.coverage,
            if self.reached_goal { "reached" } else { "missed" }
        )
    }
}

struct ActiveRun {
    id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<ExploreOutcome>,
}

/// Exploration session controller
pub struct ExplorationNode {
    ctx: MazeContext,
    gate: SessionGate,
    active: Mutex<Option<ActiveRun>>,
    last: Arc<Mutex<Option<ExploreOutcome>>>,
}

impl ExplorationNode {
    pub fn new(ctx: MazeContext) -> Self {
        Self {
            gate: SessionGate::new("exploration").with_robot_lock(ctx.robot.clone()),
            ctx,
            active: Mutex::new(None),
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Start a run from the current pose
    ///
    /// Fails with `InvalidInput`, `NotInitialized` or `SessionActive` without
    /// touching any state. Must be called from inside a tokio runtime.
    pub fn start(
        &self,
        params: ExploreParams,
        explorer: Box<dyn FrontierExplorer>,
        sensor: Box<dyn Sensor>,
    ) -> Result<Uuid> {
        params.validate()?;
        let runtime = Handle::try_current()
            .map_err(|e| MazeError::Internal(format!("no async runtime: {}", e)))?;
        self.ctx.tracker.require_pose()?;
        let guard = self.gate.try_acquire()?;
        let id = guard.id();

        let monitor = Arc::new(TimeBudgetMonitor::new(&self.ctx, params.speed));
        monitor.reset();

        let status = &self.ctx.status;
        status.set_triggers(false, false);
        status.set_status("robot exploring");
        status.set_timer(params.time_limit);
        status.set_timer_message("");
        info!(
            "exploration {} started: speed {}, limit {}s, target {}%",
            id, params.speed, params.time_limit, params.coverage_target
        );

        let cancel = CancellationToken::new();
        let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_CAPACITY);

        let explorer_task = runtime.spawn(
            ExploreLoop {
                tracker: self.ctx.tracker.clone(),
                explorer,
                sensor,
                coverage_target: params.coverage_target as f32,
                step_delay: params.step_delay(),
                return_requested: self.ctx.time_threshold.clone(),
                cancel: cancel.clone(),
                progress: progress_tx,
            }
            .run(),
        );
        let sampler_task = runtime.spawn(CoverageSampler::new(status.clone()).run(progress_rx));

        let handle = runtime.spawn(
            Coordinator {
                ctx: self.ctx.clone(),
                guard,
                time_limit: params.time_limit,
                monitor,
                cancel: cancel.clone(),
                last: self.last.clone(),
            }
            .run(explorer_task, sampler_task),
        );

        *self.active.lock() = Some(ActiveRun { id, cancel, handle });
        Ok(id)
    }

    /// Forced stop: the explorer returns at its next step boundary
    ///
    /// Returns `false` when no run is active.
    pub fn stop(&self) -> bool {
        if !self.gate.is_active() {
            return false;
        }
        match self.active.lock().as_ref() {
            Some(run) => {
                info!("exploration {} stop requested", run.id);
                run.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Wait for the most recently started run to end
    pub async fn wait(&self) -> Option<ExploreOutcome> {
        let handle = self.active.lock().take().map(|run| run.handle)?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("exploration coordinator failed: {}", e);
                None
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.gate.is_active()
    }

    pub fn state(&self) -> SessionState {
        self.gate.state()
    }

    pub fn last_outcome(&self) -> Option<ExploreOutcome> {
        self.last.lock().clone()
    }
}

struct LoopReport {
    steps: u32,
    reached_goal: bool,
}

/// The explorer stepping loop
struct ExploreLoop {
    tracker: Arc<PoseTracker>,
    explorer: Box<dyn FrontierExplorer>,
    sensor: Box<dyn Sensor>,
    coverage_target: f32,
    step_delay: Duration,
    return_requested: Arc<AtomicBool>,
    cancel: CancellationToken,
    progress: mpsc::Sender<ExploreProgress>,
}

impl ExploreLoop {
    async fn run(mut self) -> Result<LoopReport> {
        let mut pose = self.tracker.require_pose()?;
        {
            let grid = self.tracker.grid().read();
            self.explorer.begin(&grid, pose);
        }

        let mut steps = 0u32;
        loop {
            if self.cancel.is_cancelled() {
                debug!("explorer cancelled after {} steps", steps);
                break;
            }

            let (next, coverage) = {
                let mut grid = self.tracker.grid().write();
                self.sensor.sense(&pose, &mut grid);
                let coverage = grid.coverage();
                let view = ExploreView {
                    grid: &grid,
                    pose,
                    coverage_target: self.coverage_target,
                    return_requested: self.return_requested.load(Ordering::Acquire),
                };
                (self.explorer.next_move(&view), coverage)
            };
            self.tracker.repaint();
            // The sampler may be gone; progress is best effort
            let _ = self
                .progress
                .send(ExploreProgress::new(steps, pose, coverage))
                .await;

            let Some(mv) = next else {
                break;
            };

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("explorer cancelled after {} steps", steps);
                    break;
                }
                _ = tokio::time::sleep(self.step_delay) => {}
            }

            pose = self.tracker.apply(mv)?;
            steps += 1;
        }

        Ok(LoopReport {
            steps,
            reached_goal: self.explorer.reached_goal(),
        })
    }
}

/// Owns the session guard for the lifetime of one run
struct Coordinator {
    ctx: MazeContext,
    guard: SessionGuard,
    time_limit: u32,
    monitor: Arc<TimeBudgetMonitor>,
    cancel: CancellationToken,
    last: Arc<Mutex<Option<ExploreOutcome>>>,
}

impl Coordinator {
    async fn run(
        mut self,
        mut explorer_task: JoinHandle<Result<LoopReport>>,
        sampler_task: JoinHandle<f32>,
    ) -> ExploreOutcome {
        let status = self.ctx.status.clone();
        let mut countdown = Countdown::new(self.time_limit);
        let (estimate_tx, mut estimates) = mpsc::channel(ESTIMATE_CAPACITY);
        let mut timed_out = false;

        let joined = loop {
            tokio::select! {
                biased;
                joined = &mut explorer_task => break joined,
                Some(tick) = countdown.tick(), if countdown.is_running() => {
                    status.set_timer(tick.remaining);
                    if tick.expired {
                        timed_out = true;
                        self.guard.set_outcome(SessionState::TimedOut);
                        status.set_timer_message("exploration: time out");
                        status.alert("exploration: time out");
                        self.cancel.cancel();
                    } else {
                        self.monitor.spawn_estimate(tick.remaining, estimate_tx.clone());
                    }
                }
                Some((remaining, estimate)) = estimates.recv() => {
                    self.monitor.evaluate(remaining, estimate);
                }
            }
        };
        countdown.stop();

        let (steps, reached_goal, failure) = match joined {
            Ok(Ok(report)) => (report.steps, report.reached_goal, None),
            Ok(Err(e)) => {
                error!("explorer stopped on error: {}", e);
                (0, false, Some(e.to_string()))
            }
            Err(e) => {
                error!("explorer task failed: {}", e);
                (0, false, Some(e.to_string()))
            }
        };

        match sampler_task.await {
            Ok(sampled) => debug!("sampler last saw {:.1}%", sampled),
            Err(e) => error!("coverage sampler failed: {}", e),
        }
        let coverage = self.ctx.grid.read().coverage();
        status.set_coverage(format!("actual coverage (%): {:.1}", coverage));

        if !timed_out {
            self.guard.set_outcome(SessionState::Finished);
            status.set_timer_message("explored within time limit");
        }
        let state = self.guard.outcome().unwrap_or(SessionState::Finished);

        status.set_status(if reached_goal {
            "exploration reaches goal zone"
        } else {
            "exploration not reaches goal zone"
        });
        if self.ctx.mode == RunMode::Simulation {
            status.set_triggers(true, state == SessionState::Finished && reached_goal);
        }

        let outcome = ExploreOutcome {
            session: self.guard.id(),
            state,
            reached_goal,
            coverage,
            steps,
            error: failure,
        };
        info!("exploration {} done: {}", outcome.session, outcome.log_summary());
        *self.last.lock() = Some(outcome.clone());
        outcome
    }
}
