use maze_core::core::{LogSummary, Pose};
use serde::{Deserialize, Serialize};

/// Published by the explorer loop after every sensing pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExploreProgress {
    pub stamp_nanos: u64,
    /// Primitives applied so far in this session
    pub step: u32,
    pub pose: Pose,
    /// Grid coverage in percent
    pub coverage: f32,
}

impl ExploreProgress {
    pub fn new(step: u32, pose: Pose, coverage: f32) -> Self {
        Self {
            stamp_nanos: chrono::Utc::now()
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .max(0) as u64,
            step,
            pose,
            coverage,
        }
    }
}

impl LogSummary for ExploreProgress {
    fn log_summary(&self) -> String {
        format!(
            "step {} at {} ({:.1}%)",
            self.step,
            self.pose.log_summary(),
            self.coverage
        )
    }
}
