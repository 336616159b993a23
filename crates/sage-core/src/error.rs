//! Error Types

use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while talking to a language model
#[derive(Error, Debug)]
pub enum CoreError {
    /// LLM provider returned an error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Model output did not contain the structured data we asked for
    #[error("Parse error: {0}")]
    Parse(String),

    /// Model output parsed but did not match the declared schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited by the provider
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Provider rejected our credentials
    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl CoreError {
    /// Check if error is transient
    ///
    /// Nothing in the analysis path retries; this is informational for logs.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_) | Self::RateLimited(_))
    }
}
