pub mod groq;
pub mod openai;
mod wire;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::{ LlmConfig, LlmType };
use self::groq::GroqChatClient;
use self::openai::OpenAIChatClient;
use crate::models::chat::Turn;

pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Output shape requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Free-form text; replies will usually take the validator's parse-fallback path.
    Text,
    /// Structured JSON object output (`{"type": "json_object"}`).
    #[default]
    JsonObject,
}

impl ResponseFormat {
    pub fn as_wire(&self) -> &'static str {
        match self {
            ResponseFormat::Text => "text",
            ResponseFormat::JsonObject => "json_object",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} client configuration error: {message}")]
    Configuration {
        provider: &'static str,
        message: String,
    },
    #[error("network error talking to {provider}: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} rejected the credentials (HTTP {status}): {body}")]
    Authentication {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} rate limit reached: {body}")]
    RateLimited {
        provider: &'static str,
        body: String,
    },
    #[error("{provider} returned HTTP {status}: {body}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("unexpected response from {provider}: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },
}

/// Opaque turn-sequence to raw-text function backed by a hosted model.
///
/// Implementations make exactly one attempt per call; retrying, timeouts and
/// cancellation belong to the caller.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        turns: &[Turn],
        temperature: f32,
        response_format: ResponseFormat
    ) -> Result<String, ProviderError>;

    fn provider_name(&self) -> &'static str;
    fn get_model(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
    let client: Arc<dyn CompletionProvider> = match config.llm_type {
        LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Groq => {
            let specific_client = GroqChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_picks_requested_provider() {
        let config = LlmConfig {
            llm_type: LlmType::Groq,
            api_key: Some("gsk-test".to_string()),
            completion_model: None,
            base_url: None,
        };
        let client = new_client(&config).unwrap();
        assert_eq!(client.provider_name(), "Groq");
        assert_eq!(client.get_model(), "llama-3.3-70b-versatile");
    }

    #[test]
    fn new_client_without_key_is_a_configuration_error() {
        let config = LlmConfig {
            llm_type: LlmType::OpenAI,
            api_key: None,
            completion_model: None,
            base_url: None,
        };
        assert!(matches!(new_client(&config), Err(ProviderError::Configuration { .. })));
    }
}
