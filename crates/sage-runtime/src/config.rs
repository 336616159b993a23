//! Provider Configuration
//!
//! Everything is read from environment variables; `from_lookup` takes any
//! key → value function so tests don't have to touch the process environment.

use sage_core::{CoreError, GenerationOptions, ResponseFormat, Result};

/// Which backend serves completions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Ollama,
    OpenAi,
}

impl ProviderKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "openai-compatible" => Ok(Self::OpenAi),
            other => Err(CoreError::Config(format!("unknown provider '{other}'"))),
        }
    }
}

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
        }
    }
}

impl OllamaConfig {
    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }
}

/// OpenAI-compatible provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Base URL up to and including the version segment
    pub base_url: String,

    /// Bearer token (optional for self-hosted gateways)
    pub api_key: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
        }
    }
}

/// Runtime configuration for the reasoning service
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub kind: ProviderKind,
    pub model: String,
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    pub ollama: OllamaConfig,
    pub openai: OpenAiConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Ollama,
            model: "llama3.2".into(),
            temperature: 0.7,
            timeout_secs: 120,
            ollama: OllamaConfig::default(),
            openai: OpenAiConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let kind = lookup("SAGE_PROVIDER")
            .map(|v| ProviderKind::parse(&v))
            .transpose()?
            .unwrap_or(defaults.kind);

        let temperature = lookup("SAGE_TEMPERATURE")
            .map(|v| {
                v.parse::<f32>()
                    .map_err(|_| CoreError::Config(format!("SAGE_TEMPERATURE is not a number: {v}")))
            })
            .transpose()?
            .unwrap_or(defaults.temperature);

        let timeout_secs = lookup("SAGE_LLM_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        let ollama = OllamaConfig {
            host: lookup("OLLAMA_HOST").unwrap_or(defaults.ollama.host),
            port: lookup("OLLAMA_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.ollama.port),
        };

        let openai = OpenAiConfig {
            base_url: lookup("OPENAI_BASE_URL").unwrap_or(defaults.openai.base_url),
            api_key: lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()),
        };

        Ok(Self {
            kind,
            model: lookup("SAGE_MODEL").unwrap_or(defaults.model),
            temperature,
            timeout_secs,
            ollama,
            openai,
        })
    }

    /// Generation options for structured (JSON) answers
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            response_format: ResponseFormat::Json,
            ..Default::default()
        }
    }
}
