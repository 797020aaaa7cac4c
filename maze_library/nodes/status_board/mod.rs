use crate::messages::{StatusEvent, StatusSnapshot};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

const EVENT_CAPACITY: usize = 256;

/// Operator-facing status surface
///
/// Keeps the latest value of every field and broadcasts each update to
/// subscribers. Cloning shares the same board.
#[derive(Clone)]
pub struct StatusBoard {
    snapshot: Arc<Mutex<StatusSnapshot>>,
    events: broadcast::Sender<StatusEvent>,
}

impl StatusBoard {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let snapshot = StatusSnapshot {
            explore_enabled: true,
            ..StatusSnapshot::default()
        };
        Self {
            snapshot: Arc::new(Mutex::new(snapshot)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.snapshot.lock().clone()
    }

    pub fn publish(&self, event: StatusEvent) {
        match &event {
            StatusEvent::Status(s) => info!("status: {}", s),
            StatusEvent::Timer(t) => info!("timer: {}", t),
            StatusEvent::TimerMessage(m) => info!("timer message: {}", m),
            StatusEvent::Coverage(c) => info!("coverage: {}", c),
            StatusEvent::Alert(a) => warn!("alert: {}", a),
            StatusEvent::Trigger {
                explore,
                fastest_path,
            } => info!("triggers: explore={} fastest_path={}", explore, fastest_path),
        }

        self.snapshot.lock().apply(&event);
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn set_status(&self, status: impl Into<String>) {
        self.publish(StatusEvent::Status(status.into()));
    }

    pub fn set_timer(&self, remaining: u32) {
        self.publish(StatusEvent::Timer(remaining));
    }

    pub fn set_timer_message(&self, message: impl Into<String>) {
        self.publish(StatusEvent::TimerMessage(message.into()));
    }

    pub fn set_coverage(&self, coverage: impl Into<String>) {
        self.publish(StatusEvent::Coverage(coverage.into()));
    }

    pub fn alert(&self, message: impl Into<String>) {
        self.publish(StatusEvent::Alert(message.into()));
    }

    pub fn set_triggers(&self, explore: bool, fastest_path: bool) {
        self.publish(StatusEvent::Trigger {
            explore,
            fastest_path,
        });
    }

    pub fn status(&self) -> String {
        self.snapshot.lock().status.clone()
    }

    pub fn timer_message(&self) -> String {
        self.snapshot.lock().timer_message.clone()
    }

    pub fn explore_enabled(&self) -> bool {
        self.snapshot.lock().explore_enabled
    }

    pub fn ffp_enabled(&self) -> bool {
        self.snapshot.lock().ffp_enabled
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}
