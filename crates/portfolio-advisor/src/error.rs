//! Error Types for the Portfolio Advisor

use sage_core::CoreError;
use thiserror::Error;

use crate::validation::ValidationError;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    /// Form input rejected before any model call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The model call failed, or its answer did not match the declared shape
    #[error("Failed to get analysis from AI. Please try again. Details: {0}")]
    Reasoning(#[from] CoreError),
}

impl AdvisorError {
    /// The message shown to the user
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Whether the caller sent bad input (as opposed to the model failing)
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Failure to recover a result handed between pages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("No analysis data found. Please go back and generate a portfolio.")]
    Missing,

    #[error("Failed to parse analysis results.")]
    Malformed(String),
}
