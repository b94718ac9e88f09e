pub mod chat;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    OpenAI,
    Groq,
}

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmType::OpenAI => f.write_str("OpenAI"),
            LlmType::Groq => f.write_str("Groq"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseLlmTypeError {
    message: String,
}

impl fmt::Display for ParseLlmTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseLlmTypeError {}
impl FromStr for LlmType {
    type Err = ParseLlmTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmType::OpenAI),
            "groq" => Ok(LlmType::Groq),
            _ =>
                Err(ParseLlmTypeError {
                    message: format!("Invalid LLM type: '{}'", s),
                }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
}

/// Picks the provider the way the shop's deployment expects: an explicit
/// type wins, otherwise OpenAI when its key is present, then Groq.
pub fn resolve_llm_config(
    explicit_type: Option<LlmType>,
    openai_api_key: Option<&str>,
    groq_api_key: Option<&str>,
    completion_model: Option<String>,
    base_url: Option<String>
) -> Result<LlmConfig, String> {
    let openai_key = non_empty(openai_api_key);
    let groq_key = non_empty(groq_api_key);

    let (llm_type, api_key) = match explicit_type {
        Some(LlmType::OpenAI) => (LlmType::OpenAI, openai_key),
        Some(LlmType::Groq) => (LlmType::Groq, groq_key),
        None =>
            match (openai_key, groq_key) {
                (Some(key), _) => (LlmType::OpenAI, Some(key)),
                (None, Some(key)) => (LlmType::Groq, Some(key)),
                (None, None) => {
                    return Err(
                        "No API key found. Set OPENAI_API_KEY or GROQ_API_KEY in your .env".to_string()
                    );
                }
            }
    };

    if api_key.is_none() {
        return Err(format!("{} was selected but no API key is configured for it", llm_type));
    }

    Ok(LlmConfig {
        llm_type,
        api_key,
        completion_model,
        base_url,
    })
}

fn non_empty(key: Option<&str>) -> Option<String> {
    key.map(str::trim).filter(|k| !k.is_empty()).map(String::from)
}
