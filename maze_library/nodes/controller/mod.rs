//! Operator controls
//!
//! [`MazeController`] is what a UI or CLI talks to. Every control answers
//! with a structured result and also publishes a short status string on the
//! [`StatusBoard`], so a plain text surface keeps working.

use crate::algorithms::{ArenaSensor, FrontierSearch, Sensor};
use crate::arena::Arena;
use crate::nodes::context::{MazeContext, RunMode};
use crate::nodes::exploration::{ExplorationNode, ExploreOutcome, ExploreParams};
use crate::nodes::fastest_path::{FastestPathNode, FastestPathOutcome, FastestPathParams};
use crate::nodes::hardware_link::HardwareLinkNode;
use crate::nodes::status_board::StatusBoard;
use maze_core::communication::LineLink;
use maze_core::core::{Pose, Position};
use maze_core::error::{MazeError, MazeResult};
use maze_core::params::OperatorSettings;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

type Result<T> = MazeResult<T>;

/// Builds the sensor for one exploration run
pub type SensorFactory = Arc<dyn Fn() -> Box<dyn Sensor> + Send + Sync>;

pub struct MazeController {
    ctx: MazeContext,
    exploration: ExplorationNode,
    fastest_path: FastestPathNode,
    settings: Mutex<OperatorSettings>,
    /// Layout being edited; becomes the loaded layout on `load_layout`
    editor: Mutex<Arena>,
    sensor_factory: Option<SensorFactory>,
    link: Mutex<Option<LineLink>>,
}

impl MazeController {
    pub fn new(ctx: MazeContext) -> Self {
        Self {
            exploration: ExplorationNode::new(ctx.clone()),
            fastest_path: FastestPathNode::new(ctx.clone()),
            settings: Mutex::new(OperatorSettings::default()),
            editor: Mutex::new(Arena::empty()),
            sensor_factory: None,
            link: Mutex::new(None),
            ctx,
        }
    }

    /// Use `factory` instead of the loaded layout as the sensing source
    pub fn with_sensor_factory(mut self, factory: SensorFactory) -> Self {
        self.sensor_factory = Some(factory);
        self
    }

    pub fn context(&self) -> &MazeContext {
        &self.ctx
    }

    pub fn status(&self) -> &StatusBoard {
        &self.ctx.status
    }

    pub fn exploration(&self) -> &ExplorationNode {
        &self.exploration
    }

    pub fn fastest_path(&self) -> &FastestPathNode {
        &self.fastest_path
    }

    pub fn settings(&self) -> OperatorSettings {
        *self.settings.lock()
    }

    /// Copy of the layout being edited
    pub fn editor_layout(&self) -> Arena {
        self.editor.lock().clone()
    }

    // ---- settings ----

    pub fn set_speed(&self, text: &str) -> Result<u32> {
        let parsed = OperatorSettings::parse_positive("speed", text);
        self.apply_setting(parsed, "robot speed set", "warning: invalid speed", |s, v| {
            s.speed = Some(v)
        })
    }

    pub fn set_coverage(&self, text: &str) -> Result<u32> {
        match OperatorSettings::parse_coverage(text) {
            Ok(value) => {
                self.settings.lock().coverage = Some(value);
                self.ctx.status.set_status("target coverage set");
                Ok(value)
            }
            Err(e) => {
                let status = if text.trim().parse::<u32>().is_ok() {
                    "warning: target coverage out of range"
                } else {
                    "warning: invalid target coverage"
                };
                self.ctx.status.set_status(status);
                Err(e)
            }
        }
    }

    pub fn set_explore_time_limit(&self, text: &str) -> Result<u32> {
        let parsed = OperatorSettings::parse_positive("exploration time limit", text);
        self.apply_setting(
            parsed,
            "time limit for exploring set",
            "warning: invalid time limit for exploring",
            |s, v| s.explore_time_limit = Some(v),
        )
    }

    pub fn set_ffp_time_limit(&self, text: &str) -> Result<u32> {
        let parsed = OperatorSettings::parse_positive("fastest path time limit", text);
        self.apply_setting(
            parsed,
            "time limit for fastest path set",
            "warning: invalid time limit for fastest path",
            |s, v| s.ffp_time_limit = Some(v),
        )
    }

    fn apply_setting(
        &self,
        parsed: Result<u32>,
        ok_status: &str,
        err_status: &str,
        store: impl FnOnce(&mut OperatorSettings, u32),
    ) -> Result<u32> {
        match parsed {
            Ok(value) => {
                store(&mut *self.settings.lock(), value);
                self.ctx.status.set_status(ok_status);
                Ok(value)
            }
            Err(e) => {
                self.ctx.status.set_status(err_status);
                Err(e)
            }
        }
    }

    // ---- layout ----

    /// Replace the layout being edited
    pub fn edit_layout(&self, arena: Arena) -> Result<()> {
        let grid = self.ctx.grid.read();
        if arena.width() != grid.width() || arena.length() != grid.length() {
            return Err(MazeError::invalid_input(format!(
                "layout is {}x{}, arena is {}x{}",
                arena.width(),
                arena.length(),
                grid.width(),
                grid.length()
            )));
        }
        drop(grid);
        *self.editor.lock() = arena;
        Ok(())
    }

    /// Flip one cell of the layout being edited; zone cells cannot change
    pub fn toggle_obstacle(&self, p: Position) -> Result<bool> {
        self.editor.lock().toggle_obstacle(p).ok_or_else(|| {
            MazeError::invalid_input(format!("cell {} cannot hold an obstacle", p))
        })
    }

    /// Make the edited layout the one sensing reads, and write its descriptor
    ///
    /// The sensed grid is forgotten. A failed descriptor write only warns.
    pub fn load_layout(&self) -> Result<()> {
        self.ensure_idle()?;
        let arena = self.editor.lock().clone();
        if let Err(e) = arena.save(&self.ctx.config.descriptor_path) {
            warn!(
                "could not write map descriptor {}: {}",
                self.ctx.config.descriptor_path.display(),
                e
            );
        }
        info!("layout loaded with {} obstacles", arena.obstacle_count());
        self.install_layout(arena)?;
        self.ctx.status.set_status("finished map loading");
        Ok(())
    }

    /// Read a descriptor file into the editor and load it
    pub fn load_descriptor(&self, path: &Path) -> Result<()> {
        let arena = Arena::load(path)?;
        self.edit_layout(arena)?;
        self.load_layout()
    }

    /// Load an empty layout
    pub fn clear_layout(&self) -> Result<()> {
        self.ensure_idle()?;
        self.install_layout(Arena::empty())?;
        self.editor.lock().clear();
        self.ctx.status.set_status("finished map clearing");
        Ok(())
    }

    fn install_layout(&self, arena: Arena) -> Result<()> {
        self.ctx.robot.with_robot(|| {
            *self.ctx.arena.write() = Some(arena);
            self.ctx.grid.write().reset();
            self.ctx.tracker.repaint();
        })
    }

    // ---- robot ----

    /// Place the robot from 1-indexed input
    pub fn reset_robot(&self, x: i32, y: i32) -> Result<Pose> {
        self.ensure_idle()?;
        let tracker = &self.ctx.tracker;
        match self.ctx.robot.with_robot(|| tracker.reset_pose(x, y))? {
            Ok(pose) => {
                self.ctx.status.set_status("robot initial position set");
                Ok(pose)
            }
            Err(e) => {
                self.ctx
                    .status
                    .set_status("warning: robot position out of range");
                Err(e)
            }
        }
    }

    // ---- sessions ----

    pub fn start_exploration(&self) -> Result<Uuid> {
        let result = self.try_start_exploration();
        if let Err(e) = &result {
            warn!("exploration refused: {}", e);
            self.ctx.status.set_status(refusal_status(e, "exploration"));
        }
        result
    }

    fn try_start_exploration(&self) -> Result<Uuid> {
        if self.fastest_path.is_running() {
            return Err(MazeError::SessionActive("fastest path"));
        }
        let config = &self.ctx.config;
        let settings = self.settings();
        let coverage_target = settings.coverage.unwrap_or(config.coverage_target);

        let params = match self.ctx.mode {
            RunMode::Simulation => {
                if !self.ctx.has_layout() {
                    return Err(MazeError::NoLayout);
                }
                ExploreParams {
                    speed: settings
                        .speed
                        .ok_or_else(|| MazeError::invalid_input("speed not set"))?,
                    time_limit: settings
                        .explore_time_limit
                        .unwrap_or(config.explore_time_limit),
                    coverage_target,
                }
            }
            RunMode::Hardware => ExploreParams {
                speed: config.hardware_speed,
                time_limit: config.explore_time_limit,
                coverage_target,
            },
        };
        params.validate()?;

        let sensor = self.sensor()?;
        let explorer = FrontierSearch::new(sensor.sensing_radius())
            .with_turn_penalty(config.turn_penalty);
        self.exploration.start(params, Box::new(explorer), sensor)
    }

    fn sensor(&self) -> Result<Box<dyn Sensor>> {
        if let Some(factory) = &self.sensor_factory {
            return Ok(factory());
        }
        let arena = self.ctx.layout().ok_or(MazeError::NoLayout)?;
        Ok(Box::new(ArenaSensor::new(arena, self.ctx.config.sensor_range)))
    }

    /// Forced stop of the running exploration
    pub fn stop_exploration(&self) -> bool {
        let stopped = self.exploration.stop();
        if stopped {
            self.ctx.status.set_status("stopping exploration");
        }
        stopped
    }

    pub fn find_fastest_path(&self) -> Result<Uuid> {
        let result = self.try_find_fastest_path();
        if let Err(e) = &result {
            warn!("fastest path refused: {}", e);
            self.ctx.status.set_status(refusal_status(e, "fastest path"));
        }
        result
    }

    fn try_find_fastest_path(&self) -> Result<Uuid> {
        if self.exploration.is_running() {
            return Err(MazeError::SessionActive("exploration"));
        }
        let config = &self.ctx.config;
        let params = match self.ctx.mode {
            RunMode::Simulation => {
                if !self.ctx.status.ffp_enabled() {
                    return Err(MazeError::NotReady(
                        "explore to the goal zone first".to_string(),
                    ));
                }
                let settings = self.settings();
                FastestPathParams {
                    speed: settings
                        .speed
                        .ok_or_else(|| MazeError::invalid_input("speed not set"))?,
                    time_limit: settings.ffp_time_limit.unwrap_or(config.ffp_time_limit),
                }
            }
            RunMode::Hardware => FastestPathParams {
                speed: config.hardware_speed,
                time_limit: config.ffp_time_limit,
            },
        };
        self.fastest_path.start(params)
    }

    pub async fn wait_exploration(&self) -> Option<ExploreOutcome> {
        self.exploration.wait().await
    }

    pub async fn wait_fastest_path(&self) -> Option<FastestPathOutcome> {
        self.fastest_path.wait().await
    }

    pub fn has_reached_time_threshold(&self) -> bool {
        self.ctx.time_threshold_reached()
    }

    // ---- hardware ----

    /// Run the robot handshake in the background, then start exploring with
    /// the hardware constants
    ///
    /// Failures are logged and end the task; the operator retries by calling
    /// this again.
    pub fn connect_hardware(self: &Arc<Self>) -> Result<JoinHandle<Result<Uuid>>> {
        let runtime = Handle::try_current()
            .map_err(|e| MazeError::Internal(format!("no async runtime: {}", e)))?;
        if self.ctx.mode != RunMode::Hardware {
            return Err(MazeError::NotReady("not in hardware mode".to_string()));
        }
        self.ensure_idle()?;
        let controller = Arc::clone(self);
        Ok(runtime.spawn(async move {
            let node = HardwareLinkNode::new(&controller.ctx);
            let handshake = node.handshake().await?;
            *controller.link.lock() = Some(handshake.link);
            controller.start_exploration()
        }))
    }

    /// The link left open by the last handshake
    pub fn take_link(&self) -> Option<LineLink> {
        self.link.lock().take()
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.exploration.is_running() {
            return Err(MazeError::SessionActive("exploration"));
        }
        if self.fastest_path.is_running() {
            return Err(MazeError::SessionActive("fastest path"));
        }
        Ok(())
    }
}

/// Status line for a refused session start
fn refusal_status(error: &MazeError, session: &str) -> String {
    match error {
        MazeError::NoLayout => "warning: no layout loaded yet".to_string(),
        MazeError::InvalidInput(_) if session == "exploration" => {
            "invalid input for exploration".to_string()
        }
        MazeError::InvalidInput(_) => "invalid input for finding fastest path".to_string(),
        MazeError::NotInitialized => "warning: robot position not set".to_string(),
        MazeError::SessionActive(kind) => format!("warning: {} already running", kind),
        MazeError::NotReady(_) => format!("warning: {} not available yet", session),
        other => format!("warning: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_core::core::Canvas;
    use maze_core::params::SessionConfig;

    fn controller(dir: &Path) -> MazeController {
        let config = SessionConfig {
            descriptor_path: dir.join("descriptors").join("arena.txt"),
            ..SessionConfig::default()
        };
        let ctx = MazeContext::new(config, RunMode::Simulation, Canvas::new(20, 15)).unwrap();
        MazeController::new(ctx)
    }

    #[test]
    fn test_settings_publish_status() {
        let dir = tempfile::tempdir().unwrap();
        let c = controller(dir.path());

        assert_eq!(c.set_speed("4").unwrap(), 4);
        assert_eq!(c.status().status(), "robot speed set");
        assert!(c.set_speed("fast").is_err());
        assert_eq!(c.status().status(), "warning: invalid speed");
        assert_eq!(c.settings().speed, Some(4));

        assert_eq!(c.set_coverage("80").unwrap(), 80);
        assert_eq!(c.status().status(), "target coverage set");
        assert!(c.set_coverage("101").is_err());
        assert_eq!(c.status().status(), "warning: target coverage out of range");
        assert_eq!(c.settings().coverage, Some(80));

        c.set_explore_time_limit("300").unwrap();
        assert_eq!(c.status().status(), "time limit for exploring set");
        c.set_ffp_time_limit("60").unwrap();
        assert_eq!(c.status().status(), "time limit for fastest path set");
        assert!(c.set_ffp_time_limit("0").is_err());
        assert_eq!(c.settings().ffp_time_limit, Some(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exploration_needs_layout_then_valid_input() {
        let dir = tempfile::tempdir().unwrap();
        let c = controller(dir.path());
        c.reset_robot(3, 3).unwrap();

        assert!(matches!(c.start_exploration(), Err(MazeError::NoLayout)));
        assert_eq!(c.status().status(), "warning: no layout loaded yet");

        c.load_layout().unwrap();
        assert!(matches!(
            c.start_exploration(),
            Err(MazeError::InvalidInput(_))
        ));
        assert_eq!(c.status().status(), "invalid input for exploration");
        assert!(!c.exploration().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fastest_path_disabled_before_exploration() {
        let dir = tempfile::tempdir().unwrap();
        let c = controller(dir.path());
        c.set_speed("1").unwrap();

        assert!(matches!(c.find_fastest_path(), Err(MazeError::NotReady(_))));
        assert_eq!(c.status().status(), "warning: fastest path not available yet");
    }

    #[test]
    fn test_load_layout_writes_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let c = controller(dir.path());

        assert!(c.toggle_obstacle(Position::new(7, 9)).unwrap());
        assert!(c.toggle_obstacle(Position::new(1, 1)).is_err());
        c.load_layout().unwrap();
        assert_eq!(c.status().status(), "finished map loading");

        let written = Arena::load(&dir.path().join("descriptors").join("arena.txt")).unwrap();
        assert!(written.is_obstacle(Position::new(7, 9)));
        assert_eq!(c.context().layout(), Some(written));

        c.clear_layout().unwrap();
        assert_eq!(c.status().status(), "finished map clearing");
        assert_eq!(c.context().layout().unwrap().obstacle_count(), 0);
        assert_eq!(c.editor_layout().obstacle_count(), 0);
    }

    #[test]
    fn test_load_descriptor_rejects_wrong_size() {
        let dir = tempfile::tempdir().unwrap();
        let c = controller(dir.path());
        let path = dir.path().join("small.txt");
        std::fs::write(&path, "000\n000\n000\n").unwrap();

        assert!(matches!(
            c.load_descriptor(&path),
            Err(MazeError::InvalidInput(_))
        ));
        assert!(!c.context().has_layout());
    }

    #[test]
    fn test_reset_robot_reports_range() {
        let dir = tempfile::tempdir().unwrap();
        let c = controller(dir.path());

        c.reset_robot(2, 2).unwrap();
        assert_eq!(c.status().status(), "robot initial position set");
        assert!(c.reset_robot(1, 2).is_err());
        assert_eq!(c.status().status(), "warning: robot position out of range");
        assert!(c.context().tracker.pose().is_none());
    }
}
