use crate::algorithms::Path;
use crate::nodes::context::{MazeContext, RunMode};
use maze_core::core::{LogSummary, Orientation, Paint, Position};
use maze_core::error::{MazeError, MazeResult};
use maze_core::scheduling::{Countdown, CountdownTick, SessionGate, SessionGuard, SessionState};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

type Result<T> = MazeResult<T>;

/// Validated inputs of one fastest-path run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastestPathParams {
    /// Replay speed, steps per second
    pub speed: u32,
    /// Seconds
    pub time_limit: u32,
}

impl FastestPathParams {
    pub fn validate(&self) -> Result<()> {
        if self.speed == 0 {
            return Err(MazeError::invalid_input("speed must be greater than 0"));
        }
        if self.time_limit == 0 {
            return Err(MazeError::invalid_input(
                "fastest path time limit must be greater than 0",
            ));
        }
        Ok(())
    }

    fn step_delay(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.speed.max(1) as f64)
    }
}

/// How a fastest-path run ended
#[derive(Debug, Clone, PartialEq)]
pub struct FastestPathOutcome {
    pub session: Uuid,
    pub state: SessionState,
    /// `None` when no path exists
    pub path: Option<Path>,
    pub error: Option<String>,
}

struct ActiveRun {
    handle: JoinHandle<FastestPathOutcome>,
}

/// Fastest-path session controller
///
/// Plans START to GOAL once on a grid snapshot, then replays the path
/// through the pose tracker from START facing NORTH. The countdown only
/// reports; an expired budget does not cancel the run.
pub struct FastestPathNode {
    ctx: MazeContext,
    gate: SessionGate,
    active: Mutex<Option<ActiveRun>>,
    last: Arc<Mutex<Option<FastestPathOutcome>>>,
}

impl FastestPathNode {
    pub fn new(ctx: MazeContext) -> Self {
        Self {
            gate: SessionGate::new("fastest path").with_robot_lock(ctx.robot.clone()),
            ctx,
            active: Mutex::new(None),
            last: Arc::new(Mutex::new(None)),
        }
    }

    pub fn start(&self, params: FastestPathParams) -> Result<Uuid> {
        params.validate()?;
        let runtime = Handle::try_current()
            .map_err(|e| MazeError::Internal(format!("no async runtime: {}", e)))?;
        let guard = self.gate.try_acquire()?;
        let id = guard.id();

        let status = &self.ctx.status;
        status.set_triggers(false, false);
        status.set_status("robot finding fastest path");
        status.set_timer(params.time_limit);
        status.set_timer_message("");
        info!(
            "fastest path {} started: speed {}, limit {}s",
            id, params.speed, params.time_limit
        );

        let run = FastestPathRun {
            ctx: self.ctx.clone(),
            guard,
            countdown: Countdown::new(params.time_limit),
            step_delay: params.step_delay(),
            timed_out: false,
        };
        let last = self.last.clone();
        let handle = runtime.spawn(async move {
            let outcome = run.run().await;
            *last.lock() = Some(outcome.clone());
            outcome
        });

        *self.active.lock() = Some(ActiveRun { handle });
        Ok(id)
    }

    /// Wait for the most recently started run to end
    pub async fn wait(&self) -> Option<FastestPathOutcome> {
        let handle = self.active.lock().take().map(|run| run.handle)?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("fastest path task failed: {}", e);
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

    pub fn last_outcome(&self) -> Option<FastestPathOutcome> {
        self.last.lock().clone()
    }
}

struct FastestPathRun {
    ctx: MazeContext,
    guard: SessionGuard,
    countdown: Countdown,
    step_delay: Duration,
    timed_out: bool,
}

impl FastestPathRun {
    async fn run(mut self) -> FastestPathOutcome {
        let snapshot = self.ctx.grid.read().clone();
        let (start, goal) = (snapshot.start(), snapshot.goal());
        let planner = self.ctx.planner.clone();
        let mut planning =
            tokio::task::spawn_blocking(move || planner.find_fastest_path(start, goal, &snapshot));

        let planned = loop {
            tokio::select! {
                biased;
                planned = &mut planning => break planned,
                Some(tick) = self.countdown.tick(), if self.countdown.is_running() => {
                    self.on_tick(tick);
                }
            }
        };

        let result = match planned {
            Ok(result) => result,
            Err(e) => Err(MazeError::Internal(format!("planner task failed: {}", e))),
        };

        let status = self.ctx.status.clone();
        let (path, failure) = match result {
            Ok(path) => {
                info!("fastest path planned: {}", path.log_summary());
                match self.replay(&path, start).await {
                    Ok(()) => (Some(path), None),
                    Err(e) => {
                        error!("fastest path replay failed: {}", e);
                        (None, Some(e.to_string()))
                    }
                }
            }
            Err(MazeError::NoPath { from, to }) => {
                warn!("no fastest path from {} to {}", from, to);
                (None, None)
            }
            Err(e) => {
                error!("fastest path planning failed: {}", e);
                (None, Some(e.to_string()))
            }
        };
        self.countdown.stop();

        if path.is_some() {
            status.set_status("fastest path found");
        } else if failure.is_none() {
            status.set_status("no path found");
        } else {
            status.set_status("fastest path failed");
        }
        if !self.timed_out {
            self.guard.set_outcome(SessionState::Finished);
            status.set_timer_message("fastest path: within time limit");
        }
        if self.ctx.mode == RunMode::Simulation {
            status.set_triggers(true, path.is_some());
        }

        FastestPathOutcome {
            session: self.guard.id(),
            state: self.guard.outcome().unwrap_or(SessionState::Finished),
            path,
            error: failure,
        }
    }

    fn on_tick(&mut self, tick: CountdownTick) {
        let status = &self.ctx.status;
        status.set_timer(tick.remaining);
        status.set_coverage(format!("Time passed (sec): {}", tick.elapsed));
        if tick.expired {
            self.timed_out = true;
            self.guard.set_outcome(SessionState::TimedOut);
            status.set_coverage("");
            status.set_timer_message("fastest path: time out");
            status.alert("fastest path: time out");
        }
    }

    /// Sleep between primitives while keeping the countdown serviced
    async fn pause(&mut self) {
        let sleep = tokio::time::sleep(self.step_delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                biased;
                _ = &mut sleep => return,
                Some(tick) = self.countdown.tick(), if self.countdown.is_running() => {
                    self.on_tick(tick);
                }
            }
        }
    }

    /// Drive the robot along `path` from the START anchor facing NORTH, then
    /// mark every path cell once
    async fn replay(&mut self, path: &Path, start: Position) -> Result<()> {
        let moves = path.moves_from(start, Orientation::North)?;
        let tracker = self.ctx.tracker.clone();
        tracker.reset_pose(start.x + 1, start.y + 1)?;

        for mv in moves {
            self.pause().await;
            tracker.apply(mv)?;
        }
        for step in &path.steps {
            tracker.paint_cell(*step, Paint::FastestPath);
        }
        Ok(())
    }
}
