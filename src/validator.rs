//! Turns raw provider text into a [`StructuredResponse`].
//!
//! Two phases with separate outcomes: text that is not JSON at all degrades
//! to a fixed fallback answer, while JSON that breaks the schema (missing
//! fields, invented categories, out-of-range confidence) is a
//! [`SchemaViolation`] the caller must handle.

use log::{ error, warn };
use serde_json::{ Map, Value as JsonValue };
use thiserror::Error;

use crate::models::response::{ AdvisorAction, Intent, StructuredResponse };

pub const FALLBACK_ANSWER: &str = "There was an internal error processing your request.";
pub const FALLBACK_REASONING: &str = "The model returned an invalid format.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaViolation {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field 'answer' must not be empty")]
    EmptyAnswer,
    #[error("confidence_score {0} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),
    #[error("intent '{0}' is not an allowed category")]
    UnknownIntent(String),
    #[error("recommended_actions[{index}] '{value}' is not an allowed action")]
    UnknownAction {
        index: usize,
        value: String,
    },
}

/// Response returned whenever the provider's text cannot be decoded.
pub fn parse_fallback() -> StructuredResponse {
    StructuredResponse {
        answer: FALLBACK_ANSWER.to_string(),
        confidence_score: 0.0,
        intent: Intent::Error,
        recommended_actions: vec![AdvisorAction::EscalateToHuman],
        reasoning: Some(FALLBACK_REASONING.to_string()),
    }
}

pub fn validate(raw_text: &str) -> Result<StructuredResponse, SchemaViolation> {
    let value = match serde_json::from_str::<JsonValue>(raw_text) {
        Ok(value) => value,
        Err(e) => {
            warn!("Provider output is not valid JSON ({}); using safe fallback", e);
            return Ok(parse_fallback());
        }
    };

    check_schema(&value).map_err(|violation| {
        error!("Provider output violates response schema: {}", violation);
        violation
    })
}

fn check_schema(value: &JsonValue) -> Result<StructuredResponse, SchemaViolation> {
    let object = value.as_object().ok_or(SchemaViolation::NotAnObject(json_kind(value)))?;

    let answer = required_str(object, "answer")?;
    if answer.trim().is_empty() {
        return Err(SchemaViolation::EmptyAnswer);
    }

    let confidence_score = required(object, "confidence_score")?
        .as_f64()
        .ok_or(SchemaViolation::WrongType { field: "confidence_score", expected: "a number" })?;
    if !(0.0..=1.0).contains(&confidence_score) {
        return Err(SchemaViolation::ConfidenceOutOfRange(confidence_score));
    }

    let intent_name = required_str(object, "intent")?;
    let intent = intent_name
        .parse::<Intent>()
        .map_err(|_| SchemaViolation::UnknownIntent(intent_name.to_string()))?;

    let raw_actions = required(object, "recommended_actions")?
        .as_array()
        .ok_or(SchemaViolation::WrongType {
            field: "recommended_actions",
            expected: "an array of strings",
        })?;
    let recommended_actions = raw_actions
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let name = item.as_str().ok_or(SchemaViolation::WrongType {
                field: "recommended_actions",
                expected: "an array of strings",
            })?;
            name.parse::<AdvisorAction>().map_err(|_| SchemaViolation::UnknownAction {
                index,
                value: name.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let reasoning = match object.get("reasoning") {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(text)) => Some(text.clone()),
        Some(_) => {
            return Err(SchemaViolation::WrongType {
                field: "reasoning",
                expected: "a string or null",
            });
        }
    };

    Ok(StructuredResponse {
        answer: answer.to_string(),
        confidence_score,
        intent,
        recommended_actions,
        reasoning,
    })
}

fn required<'a>(
    object: &'a Map<String, JsonValue>,
    field: &'static str
) -> Result<&'a JsonValue, SchemaViolation> {
    match object.get(field) {
        None | Some(JsonValue::Null) => Err(SchemaViolation::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(
    object: &'a Map<String, JsonValue>,
    field: &'static str
) -> Result<&'a str, SchemaViolation> {
    required(object, field)?
        .as_str()
        .ok_or(SchemaViolation::WrongType { field, expected: "a string" })
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
