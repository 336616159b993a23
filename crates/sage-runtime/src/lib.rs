//! # sage-runtime
//!
//! Runtime providers for PortfolioSage.
//!
//! ## Providers
//!
//! - **Ollama** (default): local inference via Ollama's `/api/chat`
//! - **OpenAI-compatible**: any `/v1/chat/completions` endpoint
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sage_runtime::{RuntimeConfig, build_provider};
//!
//! let config = RuntimeConfig::from_env()?;
//! let provider = build_provider(&config)?;
//! ```

pub mod config;
mod http;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

use std::sync::Arc;

pub use config::{OllamaConfig, OpenAiConfig, ProviderKind, RuntimeConfig};
#[cfg(feature = "ollama")]
pub use ollama::OllamaProvider;
#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;

// Re-export core types for convenience
pub use sage_core::{CoreError, LlmProvider, Message, Result, Role};

/// Construct the provider selected by `config.kind`
pub fn build_provider(config: &RuntimeConfig) -> Result<Arc<dyn LlmProvider>> {
    match config.kind {
        #[cfg(feature = "ollama")]
        ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::from_config(
            config.ollama.clone(),
            config.timeout_secs,
        )?)),
        #[cfg(feature = "openai")]
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiProvider::from_config(
            config.openai.clone(),
            config.timeout_secs,
        )?)),
        #[allow(unreachable_patterns)]
        kind => Err(CoreError::Config(format!(
            "provider {kind:?} was not compiled into this build"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_default_provider() {
        let provider = build_provider(&RuntimeConfig::default()).unwrap();
        assert_eq!(provider.name(), "Ollama");
    }

    #[test]
    fn test_build_openai_provider() {
        let config = RuntimeConfig {
            kind: ProviderKind::OpenAi,
            ..Default::default()
        };
        assert_eq!(build_provider(&config).unwrap().name(), "OpenAI-compatible");
    }
}
