use crate::error::{MazeError, MazeResult};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Lifecycle of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Finished,
    TimedOut,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Finished | SessionState::TimedOut)
    }
}

/// Record of a session, live or ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub kind: String,
    pub started_at: DateTime<Utc>,
    pub state: SessionState,
}

#[derive(Debug, Default)]
struct GateState {
    active: Option<Uuid>,
    last: Option<SessionInfo>,
}

/// Exclusive use of the robot pose across session kinds
///
/// Gates built over the same lock admit one session among all of them, and
/// pose writes outside a session go through [`RobotLock::with_robot`].
#[derive(Debug, Clone, Default)]
pub struct RobotLock {
    holder: Arc<Mutex<Option<&'static str>>>,
}

impl RobotLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kind of the session holding the robot
    pub fn holder(&self) -> Option<&'static str> {
        *self.holder.lock()
    }

    /// Run `f` while no session can take the robot
    ///
    /// Fails with [`MazeError::SessionActive`] if one already holds it.
    pub fn with_robot<T>(&self, f: impl FnOnce() -> T) -> MazeResult<T> {
        let holder = self.holder.lock();
        if let Some(kind) = *holder {
            return Err(MazeError::SessionActive(kind));
        }
        Ok(f())
    }

    fn claim(&self, kind: &'static str) -> MazeResult<()> {
        let mut holder = self.holder.lock();
        if let Some(other) = *holder {
            return Err(MazeError::SessionActive(other));
        }
        *holder = Some(kind);
        Ok(())
    }

    fn release(&self, kind: &'static str) {
        let mut holder = self.holder.lock();
        if *holder == Some(kind) {
            *holder = None;
        }
    }
}

/// Admits at most one active session of a kind
#[derive(Debug, Clone)]
pub struct SessionGate {
    kind: &'static str,
    state: Arc<Mutex<GateState>>,
    robot: Option<RobotLock>,
}

impl SessionGate {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            state: Arc::new(Mutex::new(GateState::default())),
            robot: None,
        }
    }

    /// Also hold `robot` for the lifetime of each session
    pub fn with_robot_lock(mut self, robot: RobotLock) -> Self {
        self.robot = Some(robot);
        self
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Open a session, or [`MazeError::SessionActive`] if one is live
    pub fn try_acquire(&self) -> MazeResult<SessionGuard> {
        let mut state = self.state.lock();
        if state.active.is_some() {
            return Err(MazeError::SessionActive(self.kind));
        }
        if let Some(robot) = &self.robot {
            robot.claim(self.kind)?;
        }

        let info = SessionInfo {
            id: Uuid::new_v4(),
            kind: self.kind.to_string(),
            started_at: Utc::now(),
            state: SessionState::Running,
        };
        state.active = Some(info.id);
        state.last = Some(info.clone());
        info!("{} session {} started", self.kind, info.id);

        Ok(SessionGuard {
            gate: Arc::clone(&self.state),
            robot: self.robot.clone().map(|lock| (lock, self.kind)),
            info,
            outcome: None,
        })
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// State of the live session, else of the last one, else `Idle`
    pub fn state(&self) -> SessionState {
        let state = self.state.lock();
        if state.active.is_some() {
            SessionState::Running
        } else {
            state.last.as_ref().map_or(SessionState::Idle, |s| s.state)
        }
    }

    pub fn last(&self) -> Option<SessionInfo> {
        self.state.lock().last.clone()
    }
}

/// Holds a gate open; releases it on drop, whatever ended the session
#[derive(Debug)]
pub struct SessionGuard {
    gate: Arc<Mutex<GateState>>,
    robot: Option<(RobotLock, &'static str)>,
    info: SessionInfo,
    outcome: Option<SessionState>,
}

impl SessionGuard {
    pub fn id(&self) -> Uuid {
        self.info.id
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// Record the terminal state; `TimedOut` is sticky
    pub fn set_outcome(&mut self, state: SessionState) {
        if self.outcome != Some(SessionState::TimedOut) {
            self.outcome = Some(state);
        }
    }

    pub fn outcome(&self) -> Option<SessionState> {
        self.outcome
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let final_state = self.outcome.unwrap_or(SessionState::Finished);
        let mut gate = self.gate.lock();
        if gate.active == Some(self.info.id) {
            gate.active = None;
        }
        let mut info = self.info.clone();
        info.state = final_state;
        gate.last = Some(info);
        if let Some((robot, kind)) = &self.robot {
            robot.release(*kind);
        }
        drop(gate);
        info!(
            "{} session {} ended: {:?}",
            self.info.kind, self.info.id, final_state
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_admits_one_session() {
        let gate = SessionGate::new("exploration");
        assert_eq!(gate.state(), SessionState::Idle);

        let guard = gate.try_acquire().unwrap();
        assert!(gate.is_active());
        assert_eq!(gate.state(), SessionState::Running);
        assert!(matches!(
            gate.try_acquire(),
            Err(MazeError::SessionActive("exploration"))
        ));

        drop(guard);
        assert!(!gate.is_active());
        assert_eq!(gate.state(), SessionState::Finished);
        assert!(gate.try_acquire().is_ok());
    }

    #[test]
    fn test_robot_lock_spans_gates() {
        let robot = RobotLock::new();
        let explore = SessionGate::new("exploration").with_robot_lock(robot.clone());
        let fastest = SessionGate::new("fastest path").with_robot_lock(robot.clone());

        let guard = explore.try_acquire().unwrap();
        assert_eq!(robot.holder(), Some("exploration"));
        assert!(matches!(
            fastest.try_acquire(),
            Err(MazeError::SessionActive("exploration"))
        ));
        assert!(!fastest.is_active());
        assert!(matches!(
            robot.with_robot(|| 1),
            Err(MazeError::SessionActive("exploration"))
        ));

        drop(guard);
        assert_eq!(robot.holder(), None);
        assert_eq!(robot.with_robot(|| 1).unwrap(), 1);
        let guard = fastest.try_acquire().unwrap();
        assert!(explore.try_acquire().is_err());
        drop(guard);
    }

    #[test]
    fn test_timed_out_is_sticky() {
        let gate = SessionGate::new("fastest path");
        let mut guard = gate.try_acquire().unwrap();
        guard.set_outcome(SessionState::TimedOut);
        guard.set_outcome(SessionState::Finished);
        drop(guard);
        assert_eq!(gate.state(), SessionState::TimedOut);
    }

    #[test]
    fn test_guard_released_on_panic() {
        let gate = SessionGate::new("exploration");
        let inner = gate.clone();
        let result = std::thread::spawn(move || {
            let _guard = inner.try_acquire().unwrap();
            panic!("explorer failed");
        })
        .join();

        assert!(result.is_err());
        assert!(!gate.is_active());
    }
}
