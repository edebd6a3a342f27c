//! # Auth Errors
//!
//! Error types for credential verification and account management.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    // ==================
    // Credential Errors
    // ==================

    /// No bearer credential where the caller context requires one
    #[error("Authentication required")]
    MissingCredential,

    /// Credential is malformed or its signature does not verify
    #[error("Invalid credential")]
    InvalidCredential,

    /// Credential expiry is at or before the current instant
    #[error("Credential expired")]
    ExpiredCredential,

    // ==================
    // Account Errors
    // ==================

    /// Login failed (generic - don't leak whether email exists)
    #[error("Invalid email or password")]
    InvalidLogin,

    /// Email already registered
    #[error("Email already registered")]
    EmailAlreadyExists,

    /// Username already taken
    #[error("Username already taken")]
    UsernameAlreadyExists,

    /// Username or email is malformed
    #[error("Invalid account field: {0}")]
    InvalidAccountField(String),

    /// Account password does not meet requirements
    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    // ==================
    // Internal Errors
    // ==================

    /// Password hashing failed
    #[error("Internal error: password hashing failed")]
    HashingFailed,

    /// Token generation failed
    #[error("Internal error: token generation failed")]
    TokenGenerationFailed,

    /// Account storage failed
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::WeakPassword(_) => 400,
            AuthError::InvalidAccountField(_) => 400,

            AuthError::MissingCredential => 401,
            AuthError::InvalidCredential => 401,
            AuthError::ExpiredCredential => 401,
            AuthError::InvalidLogin => 401,

            AuthError::EmailAlreadyExists => 409,
            AuthError::UsernameAlreadyExists => 409,

            AuthError::HashingFailed => 500,
            AuthError::TokenGenerationFailed => 500,
            AuthError::StorageError(_) => 500,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "MISSING_CREDENTIAL",
            AuthError::InvalidCredential => "INVALID_CREDENTIAL",
            AuthError::ExpiredCredential => "EXPIRED_CREDENTIAL",
            AuthError::InvalidLogin => "INVALID_LOGIN",
            AuthError::EmailAlreadyExists => "EMAIL_EXISTS",
            AuthError::UsernameAlreadyExists => "USERNAME_EXISTS",
            AuthError::InvalidAccountField(_) => "INVALID_ACCOUNT_FIELD",
            AuthError::WeakPassword(_) => "WEAK_PASSWORD",
            AuthError::HashingFailed
            | AuthError::TokenGenerationFailed
            | AuthError::StorageError(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this is one of the three bearer-credential failures
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            AuthError::MissingCredential
                | AuthError::InvalidCredential
                | AuthError::ExpiredCredential
        )
    }

    /// Returns whether this error should be logged at warn level
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
