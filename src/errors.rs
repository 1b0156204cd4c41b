//! Core error taxonomy
//!
//! Every I/O-bound operation returns a [`CoreError`]. All variants are
//! recoverable; a refused vote or blocked delete is an expected outcome.

use thiserror::Error;

use crate::auth::AuthError;
use crate::model::ValidationError;
use crate::store::StoreError;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Referenced entity missing at operation time
    #[error("Not found: {0}")]
    NotFound(String),

    /// Concurrent transactions kept colliding until the retry budget ran out
    #[error("Transaction conflict after {attempts} attempts")]
    Conflict { attempts: u32 },

    /// Delete refused because other records depend on the target
    #[error("{entity} has {dependent_count} dependent record(s)")]
    IntegrityViolation { entity: String, dependent_count: u64 },

    /// Actor lacks the role for the mutation
    #[error("Not authorized to perform this operation")]
    Unauthorized,

    /// No actor supplied
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Input rejected before any write
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Store failure other than a conflict
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl CoreError {
    /// Create a not found error
    pub fn not_found(resource: impl std::fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    /// Get error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "AXT_NOT_FOUND",
            Self::Conflict { .. } => "AXT_CONFLICT",
            Self::IntegrityViolation { .. } => "AXT_INTEGRITY_VIOLATION",
            Self::Unauthorized => "AXT_UNAUTHORIZED",
            Self::AuthenticationRequired => "AXT_AUTH_REQUIRED",
            Self::Validation(_) => "AXT_VALIDATION_FAILED",
            Self::Store(_) => "AXT_STORE_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict { .. } => 409,
            Self::IntegrityViolation { .. } => 409,
            Self::Unauthorized => 403,
            Self::AuthenticationRequired => 401,
            Self::Validation(_) => 400,
            Self::Store(_) => 500,
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Dependent count carried by an integrity violation
    pub fn dependent_count(&self) -> Option<u64> {
        match self {
            Self::IntegrityViolation { dependent_count, .. } => Some(*dependent_count),
            _ => None,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::RetriesExhausted { attempts } => Self::Conflict { attempts },
            other => Self::Store(other),
        }
    }
}

impl From<AuthError> for CoreError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::AuthenticationRequired => Self::AuthenticationRequired,
            AuthError::Unauthorized => Self::Unauthorized,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Store(StoreError::from(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_maps_to_conflict() {
        let err = CoreError::from(StoreError::RetriesExhausted { attempts: 5 });
        assert!(matches!(err, CoreError::Conflict { attempts: 5 }));
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn test_integrity_violation_reports_count() {
        let err = CoreError::IntegrityViolation {
            entity: "axioms/axAssoc".into(),
            dependent_count: 3,
        };
        assert_eq!(err.dependent_count(), Some(3));
        assert_eq!(err.code(), "AXT_INTEGRITY_VIOLATION");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_auth_errors_map() {
        assert!(matches!(
            CoreError::from(AuthError::Unauthorized),
            CoreError::Unauthorized
        ));
        assert_eq!(CoreError::from(AuthError::AuthenticationRequired).status_code(), 401);
    }

    #[test]
    fn test_unauthorized_message_is_generic() {
        assert!(!CoreError::Unauthorized.to_string().contains("found"));
    }
}
