pub mod console;

use clap::Parser;
use std::num::NonZeroUsize;

use crate::agent::SessionOptions;
use crate::history::HistoryPolicy;
use crate::llm::{ resolve_llm_config, LlmConfig, LlmType };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// Chat provider (openai, groq). Picked from the configured keys when unset, OpenAI first.
    #[arg(long, env = "LLM_TYPE")]
    pub llm_type: Option<LlmType>,

    /// API key for OpenAI.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// API key for Groq.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Model name for chat completion (e.g., gpt-3.5-turbo, llama-3.3-70b-versatile)
    #[arg(long, env = "CHAT_MODEL")] // No default, the provider picks its own
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible API (e.g., https://api.groq.com/openai/v1)
    #[arg(long, env = "CHAT_BASE_URL")]
    pub base_url: Option<String>,

    /// Sampling temperature sent with every request.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.2")]
    pub temperature: f32,

    // --- Agent Args ---
    /// Optional JSON persona file ({"name": ..., "system_prompt": ...}). The built-in advisor is used when unset.
    #[arg(long, env = "PERSONA_PATH")]
    pub persona_path: Option<String>,

    /// Keep only the latest N turns (plus the persona). Unbounded when unset.
    #[arg(long, env = "HISTORY_WINDOW")]
    pub history_window: Option<NonZeroUsize>,

    /// Path of the JSON interaction log.
    #[arg(long, env = "METRICS_PATH", default_value = "metrics/metrics.json")]
    pub metrics_path: String,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

impl Args {
    pub fn llm_config(&self) -> Result<LlmConfig, String> {
        resolve_llm_config(
            self.llm_type,
            self.openai_api_key.as_deref(),
            self.groq_api_key.as_deref(),
            self.model.clone(),
            self.base_url.clone()
        )
    }

    pub fn history_policy(&self) -> HistoryPolicy {
        match self.history_window {
            Some(n) => HistoryPolicy::Window(n),
            None => HistoryPolicy::Unbounded,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            temperature: self.temperature,
            history_policy: self.history_policy(),
            ..SessionOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flags_build_a_groq_config() {
        let args = Args::try_parse_from([
            "advisor-agent",
            "--llm-type",
            "groq",
            "--groq-api-key",
            "gsk-test",
            "--model",
            "mixtral",
            "--temperature",
            "0.5",
            "--history-window",
            "6",
        ]).unwrap();

        let config = args.llm_config().unwrap();
        assert_eq!(config.llm_type, LlmType::Groq);
        assert_eq!(config.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.completion_model.as_deref(), Some("mixtral"));

        let options = args.session_options();
        assert_eq!(options.temperature, 0.5);
        assert_eq!(options.history_policy, HistoryPolicy::Window(NonZeroUsize::new(6).unwrap()));
    }

    fn args_without_provider_type() -> Args {
        Args {
            llm_type: None,
            openai_api_key: Some("sk-test".to_string()),
            groq_api_key: Some("gsk-test".to_string()),
            model: None,
            base_url: None,
            temperature: 0.2,
            persona_path: None,
            history_window: None,
            metrics_path: "metrics/metrics.json".to_string(),
            debug: false,
        }
    }

    #[test]
    fn openai_key_wins_when_both_are_given() {
        let config = args_without_provider_type().llm_config().unwrap();
        assert_eq!(config.llm_type, LlmType::OpenAI);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn groq_is_used_when_only_its_key_is_set() {
        let args = Args { openai_api_key: Some("  ".to_string()), ..args_without_provider_type() };
        assert_eq!(args.llm_config().unwrap().llm_type, LlmType::Groq);
        assert_eq!(args.history_policy(), HistoryPolicy::Unbounded);
    }

    #[test]
    fn zero_history_window_is_rejected() {
        assert!(Args::try_parse_from(["advisor-agent", "--history-window", "0"]).is_err());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(Args::try_parse_from(["advisor-agent", "--llm-type", "ollama"]).is_err());
    }
}
