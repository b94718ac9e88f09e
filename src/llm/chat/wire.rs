//! OpenAI-compatible `/chat/completions` wire format, shared by every
//! provider that speaks it.

use log::debug;
use reqwest::{ Client as HttpClient, StatusCode, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };

use super::{ ProviderError, ResponseFormat };
use crate::models::chat::Turn;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    temperature: f32,
    response_format: WireResponseFormat,
}

#[derive(Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub(super) fn build_http_client(
    provider: &'static str,
    api_key: &str
) -> Result<HttpClient, ProviderError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| ProviderError::Configuration {
            provider,
            message: format!("Invalid API key format: {}", e),
        })?
    );

    HttpClient::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| ProviderError::Configuration { provider, message: e.to_string() })
}

pub(super) fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

pub(super) async fn chat_completion(
    provider: &'static str,
    http: &HttpClient,
    url: &str,
    model: &str,
    turns: &[Turn],
    temperature: f32,
    response_format: ResponseFormat
) -> Result<String, ProviderError> {
    let req = ChatRequest {
        model,
        messages: turns,
        temperature,
        response_format: WireResponseFormat { format_type: response_format.as_wire() },
    };

    debug!("Sending {} turn(s) to {} ({})", turns.len(), provider, model);
    let resp = http
        .post(url)
        .json(&req)
        .send().await
        .map_err(|source| ProviderError::Network { provider, source })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN =>
                ProviderError::Authentication { provider, status: status.as_u16(), body },
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { provider, body },
            _ => ProviderError::Http { provider, status: status.as_u16(), body },
        });
    }

    let parsed = resp
        .json::<ChatResponse>().await
        .map_err(|e| ProviderError::InvalidResponse { provider, message: e.to_string() })?;

    parsed.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::InvalidResponse {
            provider,
            message: format!("No response from {} API", provider),
        })
}
