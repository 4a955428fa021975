pub mod config;
pub mod types;
pub mod version;

pub use config::{ConfigError, FleetConfig, RobotConfig};
pub use types::*;
pub use version::{TagSet, TargetTag, Version, VersionError};
