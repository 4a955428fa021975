//! fleet.toml configuration parser.

use std::collections::HashSet;
use std::net::Ipv6Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid fleet config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid fleet config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    pub app: AppConfig,
    #[serde(default)]
    pub health: HealthConfig,
    pub robots: Vec<RobotConfig>,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Artifact repository name; tags live under it.
    pub image: String,
    #[serde(default = "default_build_context")]
    pub build_context: PathBuf,
    #[serde(default = "default_compose_file")]
    pub compose_file: PathBuf,
    /// Name of the managed instance set.
    #[serde(default = "default_project")]
    pub project: String,
    /// Environment key carrying the version into each instance.
    #[serde(default = "default_version_env")]
    pub version_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_path")]
    pub path: String,
    /// Per-probe timeout ("2s", "500ms", "1m").
    #[serde(default = "default_probe_timeout")]
    pub timeout: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            path: default_health_path(),
            timeout: default_probe_timeout(),
        }
    }
}

impl HealthConfig {
    pub fn timeout(&self) -> Duration {
        parse_duration(&self.timeout).unwrap_or(Duration::from_secs(2))
    }
}

/// One statically configured robot instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotConfig {
    pub id: String,
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Service name in the compose file, defaults to `id`.
    pub service: Option<String>,
}

impl RobotConfig {
    /// `host:port`, with IPv6 literals bracketed.
    pub fn address(&self) -> String {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.address())
    }

    pub fn service_name(&self) -> &str {
        self.service.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_network_name")]
    pub name: String,
    pub subnet: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: default_network_name(),
            subnet: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub enabled: bool,
    pub grafana_url: Option<String>,
    pub prometheus_url: Option<String>,
}

fn default_build_context() -> PathBuf {
    PathBuf::from("./app")
}

fn default_compose_file() -> PathBuf {
    PathBuf::from("docker-compose.yml")
}

fn default_project() -> String {
    "robot-fleet".to_string()
}

fn default_version_env() -> String {
    "APP_VERSION".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_probe_timeout() -> String {
    "2s".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_network_name() -> String {
    "robot-fleet-net".to_string()
}

impl FleetConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FleetConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.app.image.trim().is_empty() {
            return Err(ConfigError::Invalid("app.image must not be empty".into()));
        }
        if self.robots.is_empty() {
            return Err(ConfigError::Invalid("at least one [[robots]] entry is required".into()));
        }
        if !self.health.path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "health.path must start with '/': {}",
                self.health.path
            )));
        }

        match parse_duration(&self.health.timeout) {
            Some(timeout) if !timeout.is_zero() => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "health.timeout must be a positive duration such as \"2s\" or \"500ms\": {:?}",
                    self.health.timeout
                )));
            }
        }

        let mut ids = HashSet::new();
        let mut ports = HashSet::new();
        for robot in &self.robots {
            if robot.port == 0 {
                return Err(ConfigError::Invalid(format!("robot {} has port 0", robot.id)));
            }
            if !ids.insert(robot.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate robot id: {}", robot.id)));
            }
            if !ports.insert(robot.port) {
                return Err(ConfigError::Invalid(format!("duplicate robot port: {}", robot.port)));
            }
        }
        Ok(())
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
