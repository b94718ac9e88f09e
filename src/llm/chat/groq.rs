use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::{ wire, CompletionProvider, ProviderError, ResponseFormat };
use crate::llm::LlmConfig;
use crate::models::chat::Turn;

const PROVIDER: &str = "Groq";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq serves the OpenAI chat-completions format under its own base URL.
pub struct GroqChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
}

impl GroqChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, ProviderError> {
        let http = wire::build_http_client(PROVIDER, &api_key)?;
        Ok(Self {
            http,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ProviderError> {
        let api_key = config.api_key.clone().ok_or_else(|| ProviderError::Configuration {
            provider: PROVIDER,
            message: "Groq API key is required".to_string(),
        })?;

        Self::new(api_key, config.completion_model.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl CompletionProvider for GroqChatClient {
    async fn complete(
        &self,
        turns: &[Turn],
        temperature: f32,
        response_format: ResponseFormat
    ) -> Result<String, ProviderError> {
        wire::chat_completion(
            PROVIDER,
            &self.http,
            &wire::completions_url(&self.base_url),
            &self.model,
            turns,
            temperature,
            response_format
        ).await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
