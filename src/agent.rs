use log::{ debug, info, warn };
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::prompt::Persona;
use crate::defense::{ build_request, isolate };
use crate::guardrails::InputGate;
use crate::history::{ ConversationStore, HistoryPolicy };
use crate::llm::chat::{ CompletionProvider, ProviderError, ResponseFormat, DEFAULT_TEMPERATURE };
use crate::models::chat::{ Role, Turn };
use crate::models::response::{ SafetyVerdict, StructuredResponse };
use crate::validator::{ self, SchemaViolation };

#[derive(Debug, Error)]
pub enum AgentError {
    /// The provider call failed; the turn cannot be answered.
    #[error("completion provider failed: {0}")]
    Provider(#[from] ProviderError),
    /// The provider answered with well-formed JSON that breaks the response
    /// contract; the user should rephrase.
    #[error("response failed schema validation: {0}")]
    SchemaViolation(#[from] SchemaViolation),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    Answered(StructuredResponse),
    /// Blocked before any provider call; history is untouched.
    Rejected(SafetyVerdict),
}

/// Options applied when a session is created.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub temperature: f32,
    pub response_format: ResponseFormat,
    pub history_policy: HistoryPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            response_format: ResponseFormat::JsonObject,
            history_policy: HistoryPolicy::Unbounded,
        }
    }
}

/// One conversation with the advisor.
///
/// `ask` takes `&mut self`, so a session can only have one request in flight;
/// callers serving several users need one session each.
pub struct Session {
    id: Uuid,
    gate: InputGate,
    store: ConversationStore,
    provider: Arc<dyn CompletionProvider>,
    options: SessionOptions,
}

pub fn create_session(persona: Persona, provider: Arc<dyn CompletionProvider>) -> Session {
    Session::new(persona, provider)
}

impl Session {
    pub fn new(persona: Persona, provider: Arc<dyn CompletionProvider>) -> Self {
        Self::with_options(persona, provider, InputGate::default(), SessionOptions::default())
    }

    pub fn with_options(
        persona: Persona,
        provider: Arc<dyn CompletionProvider>,
        gate: InputGate,
        options: SessionOptions
    ) -> Self {
        let id = Uuid::new_v4();
        info!(
            "Session {} started: persona={}, provider={} ({}), history={:?}",
            id,
            persona.name,
            provider.provider_name(),
            provider.get_model(),
            options.history_policy
        );
        Self {
            id,
            gate,
            store: ConversationStore::with_policy(Arc::new(persona), options.history_policy),
            provider,
            options,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> Vec<Turn> {
        self.store.snapshot()
    }

    pub fn persona(&self) -> &Persona {
        self.store.persona()
    }

    pub async fn ask(&mut self, raw_input: &str) -> Result<AskOutcome, AgentError> {
        let verdict = self.gate.check(raw_input);
        if !verdict.allowed {
            return Ok(AskOutcome::Rejected(verdict));
        }

        self.store.append(Role::User, isolate(raw_input));
        let request = build_request(&self.store);
        debug!("Session {}: {} chars in, {} turns out", self.id, raw_input.chars().count(), request.len());

        let raw_response = self.provider
            .complete(&request, self.options.temperature, self.options.response_format).await
            .map_err(|e| {
                warn!("Session {}: provider call failed: {}", self.id, e);
                e
            })?;

        self.store.append(Role::Assistant, raw_response.as_str());

        let response = validator::validate(&raw_response)?;
        Ok(AskOutcome::Answered(response))
    }

    pub fn reset(&mut self) {
        self.store.reset();
        info!("Session {}: conversation memory cleared", self.id);
    }
}
