use crate::ports::{InMemoryReferenceData, ReferenceLoadError};
use crate::store::ComplianceSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("Config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    ReferenceData(#[from] ReferenceLoadError),
}

fn default_goal() -> String {
    crate::model::GOAL.to_string()
}

fn default_enabled_true() -> bool {
    true
}

fn default_logging_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, e.g. `info,rail_impact_core::compute=debug`.
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_logging_filter(), json: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_goal")]
    pub goal: String,
    /// Applied when a request does not say which standards it needs.
    #[serde(default)]
    pub compliance: ComplianceSet,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub reference_data: Option<PathBuf>,
    #[serde(default = "default_enabled_true")]
    pub validate_on_build: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            goal: default_goal(),
            compliance: ComplianceSet::new(),
            logging: LoggingConfig::default(),
            reference_data: None,
            validate_on_build: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Self::from_json_str(&json)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.goal.trim().is_empty() {
            return Err(ConfigError::Invalid("goal cannot be empty".into()));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.filter cannot be empty".into()));
        }
        Ok(())
    }

    /// Reads the configured reference tables, if a file is configured.
    pub fn load_reference_data(&self) -> Result<Option<InMemoryReferenceData>, ConfigError> {
        match &self.reference_data {
            Some(path) => Ok(Some(InMemoryReferenceData::load(path)?)),
            None => Ok(None),
        }
    }
}
