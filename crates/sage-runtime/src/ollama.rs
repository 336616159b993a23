//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference over its
//! `/api/chat` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use sage_core::{
    error::{CoreError, Result},
    message::Message,
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, ResponseFormat, TokenUsage},
};

use crate::config::OllamaConfig;
use crate::http::{build_client, check_status, transport_error};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: WireOptions,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    message: ResponseMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create from configuration
    pub fn from_config(config: OllamaConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            config,
        })
    }

    fn build_request<'a>(messages: &'a [Message], opts: &'a GenerationOptions) -> ChatRequest<'a> {
        ChatRequest {
            model: &opts.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            format: (opts.response_format == ResponseFormat::Json).then_some("json"),
            options: WireOptions {
                temperature: opts.temperature,
                top_p: opts.top_p,
                num_predict: opts.max_tokens,
            },
        }
    }

    fn convert_completion(response: ChatResponse, model: &str) -> Completion {
        let usage = match (response.prompt_eval_count, response.eval_count) {
            (None, None) => None,
            (prompt, eval) => Some(TokenUsage::new(prompt.unwrap_or(0), eval.unwrap_or(0))),
        };

        Completion {
            content: response.message.content,
            model: response.model.unwrap_or_else(|| model.to_string()),
            usage,
            finish_reason: Some(
                response
                    .done_reason
                    .as_deref()
                    .map_or(FinishReason::Stop, FinishReason::from_wire),
            ),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url());
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        let url = format!("{}/api/chat", self.config.base_url());
        let request = Self::build_request(messages, options);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let body: ChatResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Provider(format!("unreadable Ollama response: {e}")))?;

        Ok(Self::convert_completion(body, &options.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let messages = vec![Message::system("You are helpful."), Message::user("Hello")];
        let options = GenerationOptions {
            response_format: ResponseFormat::Json,
            ..Default::default()
        };

        let request = OllamaProvider::build_request(&messages, &options);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["stream"], false);
        assert_eq!(json["format"], "json");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Hello");
        assert_eq!(json["options"]["num_predict"], 2048);
    }

    #[test]
    fn test_text_format_is_omitted() {
        let messages = vec![Message::user("Hello")];
        let options = GenerationOptions::default();
        let json = serde_json::to_value(OllamaProvider::build_request(&messages, &options)).unwrap();
        assert!(json.get("format").is_none());
    }

    #[test]
    fn test_completion_conversion() {
        let raw = r#"{
            "model": "llama3.2",
            "message": {"role": "assistant", "content": "{\"analysis\": \"ok\"}"},
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 120,
            "eval_count": 30
        }"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        let completion = OllamaProvider::convert_completion(response, "fallback");

        assert_eq!(completion.model, "llama3.2");
        assert_eq!(completion.usage.unwrap().total_tokens, 150);
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert!(completion.content.contains("analysis"));
    }
}
