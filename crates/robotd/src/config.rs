//! Robot configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default location of the configuration file inside the container.
pub const DEFAULT_CONFIG_PATH: &str = "/app/config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in configuration file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("robot_id is required in configuration")]
    MissingRobotId,
    #[error("at least one sensor is required")]
    NoSensors,
}

/// Identity and sensor layout of one robot.
///
/// Sensor entries are kept as raw JSON and echoed back by `/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    pub robot_id: String,
    pub sensors: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawConfig {
    robot_id: Option<String>,
    #[serde(default)]
    sensors: Option<Vec<serde_json::Value>>,
}

impl RobotConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(content)?;
        let robot_id = raw.robot_id.ok_or(ConfigError::MissingRobotId)?;
        let sensors = match raw.sensors {
            Some(sensors) if !sensors.is_empty() => sensors,
            _ => return Err(ConfigError::NoSensors),
        };
        Ok(Self { robot_id, sensors })
    }
}

/// Resolve the config path from `ROBOT_CONFIG`.
pub fn config_path() -> PathBuf {
    std::env::var_os("ROBOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
