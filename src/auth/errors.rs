//! # Auth Errors
//!
//! Authorization failures. Messages never say whether a record exists.

use thiserror::Error;

/// Result type for auth checks
pub type AuthResult<T> = Result<T, AuthError>;

/// Authorization errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No actor was supplied for a mutating operation
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Actor lacks the role or ownership for this operation
    #[error("Not authorized to perform this operation")]
    Unauthorized,
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::AuthenticationRequired => 401,
            AuthError::Unauthorized => 403,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AuthError::AuthenticationRequired.status_code(), 401);
        assert_eq!(AuthError::Unauthorized.status_code(), 403);
    }

    #[test]
    fn test_error_messages_do_not_leak_info() {
        let message = AuthError::Unauthorized.to_string();
        assert!(!message.contains("not found"));
        assert!(!message.contains("exist"));
    }
}
