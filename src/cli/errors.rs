//! CLI error types
//!
//! A CLI error carries a stable code and a human-readable message. Core
//! refusals keep the core code (`AXT_UNAUTHORIZED`, `AXT_CONFLICT`, ...) so
//! scripts can branch on it.

use std::fmt;
use std::io;

use serde_json::{json, Value};

use crate::config::ConfigError;
use crate::errors::CoreError;
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Governance config unreadable or invalid
    Config,
    /// Stdout or snapshot file failure
    Io,
    /// `init` would overwrite an existing snapshot
    AlreadyInitialized,
    /// No snapshot at the data path
    NotInitialized,
    /// A core operation refused the request
    Rejected(&'static str),
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config => "AXT_CLI_CONFIG_ERROR",
            Self::Io => "AXT_CLI_IO_ERROR",
            Self::AlreadyInitialized => "AXT_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "AXT_CLI_NOT_INITIALIZED",
            Self::Rejected(code) => code,
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn already_initialized(path: &str) -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            format!("Snapshot {} already exists. Pass --force to overwrite it.", path),
        )
    }

    pub fn not_initialized(path: &str) -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            format!("Snapshot {} not found. Run 'axiomtree init' first.", path),
        )
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Error envelope written to stderr, mirroring the success envelope
    pub fn to_json(&self) -> Value {
        json!({
            "status": "error",
            "code": self.code_str(),
            "message": self.message,
        })
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::new(CliErrorCode::Io, e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(CliErrorCode::Io, format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(CliErrorCode::Config, e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::new(CliErrorCode::Io, format!("snapshot: {}", e))
    }
}

impl From<CoreError> for CliError {
    fn from(e: CoreError) -> Self {
        Self::new(CliErrorCode::Rejected(e.code()), e.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;
