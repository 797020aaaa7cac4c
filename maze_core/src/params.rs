//! Simple runtime parameter system for MAZE
//!
//! Provides a straightforward key-value store for runtime configuration,
//! plus [`SessionConfig`], the typed view the session controllers read.

use crate::error::{MazeError, MazeResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Default location of the persisted parameter file
pub const DEFAULT_PARAMS_PATH: &str = ".maze/config/params.yaml";

/// Simple runtime parameter store
pub struct RuntimeParams {
    /// Parameter storage - BTreeMap maintains sorted order
    params: Arc<RwLock<BTreeMap<String, Value>>>,
    /// Optional persistence path
    persist_path: Option<PathBuf>,
}

impl RuntimeParams {
    /// Create new parameter store, loading `.maze/config/params.yaml` if present
    pub fn init() -> MazeResult<Self> {
        Self::init_from(Path::new(DEFAULT_PARAMS_PATH))
    }

    /// Create new parameter store backed by `params_file`
    ///
    /// Keys missing from the file fall back to the built-in defaults.
    pub fn init_from(params_file: &Path) -> MazeResult<Self> {
        let mut initial_params = default_params();

        if params_file.exists() {
            let yaml_str = std::fs::read_to_string(params_file)?;
            let loaded: BTreeMap<String, Value> = serde_yaml::from_str(&yaml_str)?;
            initial_params.extend(loaded);
        }

        Ok(Self {
            params: Arc::new(RwLock::new(initial_params)),
            persist_path: Some(params_file.to_path_buf()),
        })
    }

    /// Create a store holding only the defaults, never touching disk
    pub fn in_memory() -> Self {
        Self {
            params: Arc::new(RwLock::new(default_params())),
            persist_path: None,
        }
    }

    /// Get a parameter value
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let params = self.params.read().ok()?;
        let value = params.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Get parameter with default
    pub fn get_or<T: for<'de> Deserialize<'de>>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Get parameter as f64 with default
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get_or(key, default)
    }

    /// Get parameter as u32 with default
    pub fn get_u32(&self, key: &str, default: u32) -> u32 {
        self.get_or(key, default)
    }

    /// Get parameter as string with default
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get_or(key, default.to_string())
    }

    /// Set a parameter value
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> MazeResult<()> {
        let json_value = serde_json::to_value(value)?;
        let mut params = self.params.write()?;
        params.insert(key.to_string(), json_value);
        Ok(())
    }

    /// Check if a parameter exists
    pub fn has(&self, key: &str) -> bool {
        self.params
            .read()
            .map(|p| p.contains_key(key))
            .unwrap_or(false)
    }

    /// Clear all parameters and reset to defaults
    pub fn reset(&self) -> MazeResult<()> {
        let mut params = self.params.write()?;
        *params = default_params();
        Ok(())
    }

    /// Save parameters to YAML file
    pub fn save_to_disk(&self) -> MazeResult<()> {
        let path = self
            .persist_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PARAMS_PATH));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let params = self.params.read()?;
        let yaml = serde_yaml::to_string(&*params)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}

impl Default for RuntimeParams {
    fn default() -> Self {
        Self::init().unwrap_or_else(|e| {
            tracing::warn!("Failed to initialize RuntimeParams: {}. Using defaults.", e);
            Self::in_memory()
        })
    }
}

fn default_params() -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();

    // Time budget
    params.insert("threshold_buffer_secs".to_string(), Value::from(10));
    params.insert("explore_time_limit".to_string(), Value::from(360));
    params.insert("ffp_time_limit".to_string(), Value::from(120));

    // Motion
    params.insert("hardware_speed".to_string(), Value::from(1));
    params.insert("turn_penalty".to_string(), Value::from(0.001));

    // Exploration
    params.insert("coverage_target".to_string(), Value::from(100));
    params.insert("sensor_range".to_string(), Value::from(2));

    // Storage and link
    params.insert(
        "descriptor_path".to_string(),
        Value::from("map-descriptors/arena.txt"),
    );
    params.insert("link_address".to_string(), Value::from("192.168.16.1:5182"));
    params.insert("start_token".to_string(), Value::from("ES"));

    params
}

/// Typed, validated view of the parameters the controllers use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds added to the return estimate for turn-in-place overhead
    pub threshold_buffer_secs: u32,
    /// Exploration budget used when the operator gives none (and in hardware mode)
    pub explore_time_limit: u32,
    /// Fastest-path budget used when the operator gives none (and in hardware mode)
    pub ffp_time_limit: u32,
    /// Fixed speed (steps per second) for hardware runs
    pub hardware_speed: u32,
    pub turn_penalty: f64,
    pub coverage_target: u32,
    /// Cells sensed beyond the footprint edge
    pub sensor_range: u32,
    pub descriptor_path: PathBuf,
    pub link_address: String,
    pub start_token: String,
}

impl SessionConfig {
    /// Build the typed view, rejecting values the controllers cannot run with
    pub fn from_params(params: &RuntimeParams) -> MazeResult<Self> {
        let config = Self {
            threshold_buffer_secs: params.get_u32("threshold_buffer_secs", 10),
            explore_time_limit: params.get_u32("explore_time_limit", 360),
            ffp_time_limit: params.get_u32("ffp_time_limit", 120),
            hardware_speed: params.get_u32("hardware_speed", 1),
            turn_penalty: params.get_f64("turn_penalty", 0.001),
            coverage_target: params.get_u32("coverage_target", 100),
            sensor_range: params.get_u32("sensor_range", 2),
            descriptor_path: PathBuf::from(
                params.get_string("descriptor_path", "map-descriptors/arena.txt"),
            ),
            link_address: params.get_string("link_address", "192.168.16.1:5182"),
            start_token: params.get_string("start_token", "ES"),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MazeResult<()> {
        if self.hardware_speed == 0 {
            return Err(MazeError::config("hardware_speed must be at least 1"));
        }
        if self.explore_time_limit == 0 || self.ffp_time_limit == 0 {
            return Err(MazeError::config("time limits must be at least 1 second"));
        }
        if self.coverage_target > 100 {
            return Err(MazeError::config("coverage_target must be <= 100"));
        }
        if self.sensor_range == 0 {
            return Err(MazeError::config("sensor_range must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.turn_penalty) {
            return Err(MazeError::config("turn_penalty must be in [0, 1)"));
        }
        if self.start_token.is_empty() {
            return Err(MazeError::config("start_token must not be empty"));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            threshold_buffer_secs: 10,
            explore_time_limit: 360,
            ffp_time_limit: 120,
            hardware_speed: 1,
            turn_penalty: 0.001,
            coverage_target: 100,
            sensor_range: 2,
            descriptor_path: PathBuf::from("map-descriptors/arena.txt"),
            link_address: "192.168.16.1:5182".to_string(),
            start_token: "ES".to_string(),
        }
    }
}

/// Operator-entered settings, parsed from the text the operator typed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatorSettings {
    pub speed: Option<u32>,
    pub coverage: Option<u32>,
    pub explore_time_limit: Option<u32>,
    pub ffp_time_limit: Option<u32>,
}

impl OperatorSettings {
    /// Parse a strictly positive integer field
    pub fn parse_positive(field: &str, text: &str) -> MazeResult<u32> {
        let value: u32 = text
            .trim()
            .parse()
            .map_err(|_| MazeError::invalid_input(format!("{} must be an integer", field)))?;
        if value == 0 {
            return Err(MazeError::invalid_input(format!(
                "{} must be greater than 0",
                field
            )));
        }
        Ok(value)
    }

    /// Parse a coverage percentage, valid range 0..=100
    pub fn parse_coverage(text: &str) -> MazeResult<u32> {
        let value: u32 = text
            .trim()
            .parse()
            .map_err(|_| MazeError::invalid_input("coverage must be an integer"))?;
        if value > 100 {
            return Err(MazeError::invalid_input("target coverage out of range"));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let params = RuntimeParams::in_memory();

        // Test defaults
        assert_eq!(params.get_u32("explore_time_limit", 0), 360);
        assert_eq!(params.get_u32("threshold_buffer_secs", 0), 10);

        // Test set/get
        params.set("test_value", 42.5).unwrap();
        assert_eq!(params.get::<f64>("test_value"), Some(42.5));

        // Test overwrite
        params.set("ffp_time_limit", 60).unwrap();
        assert_eq!(params.get_u32("ffp_time_limit", 0), 60);

        params.reset().unwrap();
        assert!(!params.has("test_value"));
        assert_eq!(params.get_u32("ffp_time_limit", 0), 120);
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config/params.yaml");

        let params = RuntimeParams::init_from(&path).unwrap();
        params.set("explore_time_limit", 90).unwrap();
        params.save_to_disk().unwrap();

        let reloaded = RuntimeParams::init_from(&path).unwrap();
        assert_eq!(reloaded.get_u32("explore_time_limit", 0), 90);
        // Untouched keys keep their defaults
        assert_eq!(reloaded.get_string("start_token", ""), "ES");
    }

    #[test]
    fn test_session_config_validation() {
        let params = RuntimeParams::in_memory();
        let config = SessionConfig::from_params(&params).unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.threshold_buffer_secs, 10);

        params.set("coverage_target", 150).unwrap();
        assert!(matches!(
            SessionConfig::from_params(&params),
            Err(MazeError::Config(_))
        ));
    }

    #[test]
    fn test_operator_settings_parsing() {
        assert_eq!(OperatorSettings::parse_positive("speed", " 4 ").unwrap(), 4);
        assert!(OperatorSettings::parse_positive("speed", "fast").is_err());
        assert!(OperatorSettings::parse_positive("speed", "0").is_err());
        assert!(OperatorSettings::parse_positive("speed", "-2").is_err());

        assert_eq!(OperatorSettings::parse_coverage("100").unwrap(), 100);
        assert!(matches!(
            OperatorSettings::parse_coverage("101"),
            Err(MazeError::InvalidInput(_))
        ));
    }
}
