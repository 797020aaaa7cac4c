use crate::messages::ExploreProgress;
use crate::nodes::status_board::StatusBoard;
use maze_core::core::LogSummary;
use tokio::sync::mpsc;
use tracing::debug;

/// Publishes coverage while an exploration runs
///
/// Wakes only on explorer progress and ends when the explorer drops its
/// sender, so a cancelled run never leaves it spinning.
pub struct CoverageSampler {
    status: StatusBoard,
    last_reported: Option<String>,
    latest: f32,
}

impl CoverageSampler {
    pub fn new(status: StatusBoard) -> Self {
        Self {
            status,
            last_reported: None,
            latest: 0.0,
        }
    }

    /// Fold one progress update; publishes only when the one-decimal value changes
    pub fn observe(&mut self, progress: &ExploreProgress) {
        self.latest = progress.coverage;
        let text = format!("coverage (%): {:.1}", progress.coverage);
        if self.last_reported.as_deref() != Some(text.as_str()) {
            self.status.set_coverage(text.clone());
            self.last_reported = Some(text);
        }
    }

    /// Consume progress until the channel closes; returns the last coverage seen
    pub async fn run(mut self, mut progress: mpsc::Receiver<ExploreProgress>) -> f32 {
        while let Some(update) = progress.recv().await {
            debug!("progress {}", update.log_summary());
            self.observe(&update);
        }
        self.latest
    }
}
