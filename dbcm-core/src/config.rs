//! Configuration management for dbcm
//!
//! Settings are loaded from:
//! 1. Environment variables (highest priority)
//! 2. Configuration file (TOML format)
//! 3. Default values (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::inspection::DEFAULT_PARALLEL_NUM;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbcmConfig {
    /// Inspection configuration
    pub inspection: InspectionConfig,
    /// Cluster-manager CLI configuration
    pub cm: CmConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Inspection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionConfig {
    /// Maximum number of concurrent probes
    pub parallelism: usize,
    /// Echo requests per address
    pub probe_count: u32,
    /// Seconds to wait for an echo reply
    pub probe_timeout_secs: u64,
    /// Deadline for a whole check
    pub check_timeout_secs: u64,
    /// Ping executable
    pub ping_program: String,
}

/// Cluster-manager CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmConfig {
    /// Path to cm_ctl
    pub cm_ctl_path: PathBuf,
    /// Timeout for a single cm_ctl invocation
    pub command_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Enable file logging
    pub file_logging_enabled: bool,
    /// Log to the console as JSON
    pub json_format: bool,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            parallelism: DEFAULT_PARALLEL_NUM,
            probe_count: 1,
            probe_timeout_secs: 1,
            check_timeout_secs: 60,
            ping_program: "ping".to_string(),
        }
    }
}

impl Default for CmConfig {
    fn default() -> Self {
        Self {
            cm_ctl_path: PathBuf::from("cm_ctl"),
            command_timeout_secs: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("/var/log/dbcm"),
            file_logging_enabled: false,
            json_format: false,
        }
    }
}

impl DbcmConfig {
    /// Load configuration from the first config file found (or defaults) and
    /// apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply environment
    /// overrides
    pub fn load_with_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.clone(), e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            std::env::var("DBCM_CONFIG").ok().map(PathBuf::from),
            Some(PathBuf::from("/etc/dbcm/config.toml")),
            Some(PathBuf::from("./dbcm.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Inspection
        if let Some(n) = var("DBCM_PARALLELISM").and_then(|v| v.parse().ok()) {
            self.inspection.parallelism = n;
        }
        if let Some(n) = var("DBCM_PROBE_COUNT").and_then(|v| v.parse().ok()) {
            self.inspection.probe_count = n;
        }
        if let Some(n) = var("DBCM_PROBE_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.inspection.probe_timeout_secs = n;
        }
        if let Some(n) = var("DBCM_CHECK_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.inspection.check_timeout_secs = n;
        }
        if let Some(program) = var("DBCM_PING_PROGRAM") {
            self.inspection.ping_program = program;
        }

        // Cluster manager
        if let Some(path) = var("DBCM_CM_CTL") {
            self.cm.cm_ctl_path = PathBuf::from(path);
        }
        if let Some(n) = var("DBCM_CM_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.cm.command_timeout_secs = n;
        }

        // Logging
        if let Some(level) = var("DBCM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = var("DBCM_LOG_DIR") {
            self.logging.log_dir = PathBuf::from(dir);
            self.logging.file_logging_enabled = true;
        }
        if let Some(json) = var("DBCM_LOG_JSON") {
            self.logging.json_format = json.parse().unwrap_or(false);
        }
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inspection.parallelism == 0 {
            return Err(ConfigError::Validation(
                "inspection.parallelism must be at least 1".to_string(),
            ));
        }

        if self.inspection.probe_count == 0 {
            return Err(ConfigError::Validation(
                "inspection.probe_count must be at least 1".to_string(),
            ));
        }

        if self.inspection.check_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "inspection.check_timeout_secs cannot be 0".to_string(),
            ));
        }

        if self.inspection.ping_program.is_empty() {
            return Err(ConfigError::Validation("inspection.ping_program cannot be empty".to_string()));
        }

        if self.cm.cm_ctl_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("cm.cm_ctl_path cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Failed to read configuration file
    FileRead(PathBuf, String),
    /// Failed to parse configuration
    Parse(String),
    /// Configuration validation failed
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, err) => {
                write!(f, "Failed to read config file {:?}: {}", path, err)
            }
            ConfigError::Parse(err) => write!(f, "Failed to parse config: {}", err),
            ConfigError::Validation(err) => write!(f, "Config validation failed: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for dbcm_common::Error {
    fn from(err: ConfigError) -> Self {
        dbcm_common::Error::InvalidConfig(err.to_string())
    }
}
