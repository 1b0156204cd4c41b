//! Governance configuration
//!
//! Loaded from a JSON file; every field has a default so an empty object is
//! a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event};

/// Net score at which an unverified entity is promoted to verified
pub const VERIFY_THRESHOLD: i64 = 10;

/// Net score at or below which an entity is classified as trash
pub const TRASH_THRESHOLD: i64 = -10;

/// Commit attempts before a vote transaction gives up
pub const DEFAULT_MAX_TRANSACTION_ATTEMPTS: u32 = 5;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Thresholds and retry budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceConfig {
    #[serde(default = "default_verify_threshold")]
    pub verify_threshold: i64,

    #[serde(default = "default_trash_threshold")]
    pub trash_threshold: i64,

    #[serde(default = "default_max_transaction_attempts")]
    pub max_transaction_attempts: u32,
}

fn default_verify_threshold() -> i64 {
    VERIFY_THRESHOLD
}

fn default_trash_threshold() -> i64 {
    TRASH_THRESHOLD
}

fn default_max_transaction_attempts() -> u32 {
    DEFAULT_MAX_TRANSACTION_ATTEMPTS
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            verify_threshold: default_verify_threshold(),
            trash_threshold: default_trash_threshold(),
            max_transaction_attempts: default_max_transaction_attempts(),
        }
    }
}

impl GovernanceConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        let config = Self::from_json(&content)?;
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("verifyThreshold", &config.verify_threshold.to_string()),
                ("trashThreshold", &config.trash_threshold.to_string()),
            ],
        );
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: GovernanceConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Thresholds must leave a neutral band around zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.verify_threshold <= 0 {
            return Err(ConfigError::Invalid(format!(
                "verifyThreshold must be > 0, got {}",
                self.verify_threshold
            )));
        }
        if self.trash_threshold >= 0 {
            return Err(ConfigError::Invalid(format!(
                "trashThreshold must be < 0, got {}",
                self.trash_threshold
            )));
        }
        if self.max_transaction_attempts == 0 {
            return Err(ConfigError::Invalid(
                "maxTransactionAttempts must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
