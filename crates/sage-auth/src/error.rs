//! Authentication Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, AuthError>;

/// Authentication and session errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Username/password pair not on the allow-list
    #[error("Invalid username or password.")]
    InvalidCredentials,

    /// No bearer token presented
    #[error("Missing session token")]
    MissingToken,

    /// Token malformed or signature mismatch
    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    /// Token past its expiry
    #[error("Session expired")]
    Expired,

    /// Session ended by logout
    #[error("Session revoked")]
    Revoked,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::InvalidCredentials => "Invalid username or password.",
            Self::MissingToken | Self::InvalidToken(_) | Self::Revoked => "Please log in to continue.",
            Self::Expired => "Your session has expired. Please log in again.",
            Self::Config(_) => "Service configuration error.",
        }
    }

    /// Whether this error means "not logged in" rather than a server fault
    pub const fn is_unauthorized(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}
