use serde::{Deserialize, Serialize};

/// One update of the operator-facing status surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusEvent {
    /// Short status line ("robot exploring", "fastest path found", ...)
    Status(String),
    /// Seconds left on the running countdown
    Timer(u32),
    /// Countdown outcome ("exploration: time out", ...)
    TimerMessage(String),
    /// Coverage or elapsed-time line
    Coverage(String),
    /// Audible/visual notification
    Alert(String),
    /// A trigger was enabled or disabled
    Trigger { explore: bool, fastest_path: bool },
}

/// Latest value of every status field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: String,
    pub timer: Option<u32>,
    pub timer_message: String,
    pub coverage: String,
    pub alerts: Vec<String>,
    pub explore_enabled: bool,
    pub ffp_enabled: bool,
}

impl StatusSnapshot {
    /// Fold one event into the snapshot
    pub fn apply(&mut self, event: &StatusEvent) {
        match event {
            StatusEvent::Status(s) => self.status = s.clone(),
            StatusEvent::Timer(t) => self.timer = Some(*t),
            StatusEvent::TimerMessage(m) => self.timer_message = m.clone(),
            StatusEvent::Coverage(c) => self.coverage = c.clone(),
            StatusEvent::Alert(a) => self.alerts.push(a.clone()),
            StatusEvent::Trigger {
                explore,
                fastest_path,
            } => {
                self.explore_enabled = *explore;
                self.ffp_enabled = *fastest_path;
            }
        }
    }
}
