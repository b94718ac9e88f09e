//! Per-request accounting and the persisted interaction log.

use chrono::Local;
use log::{ debug, warn };
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fs;
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };
use std::sync::OnceLock;
use std::time::{ Duration, Instant };
use thiserror::Error;

use crate::models::response::StructuredResponse;

/// Reference prices (USD per 1K tokens, gpt-3.5-turbo).
pub const COST_PER_1K_INPUT: f64 = 0.0015;
pub const COST_PER_1K_OUTPUT: f64 = 0.002;

pub const QUERY_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write interaction log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize interaction log: {0}")]
    Serialize(#[from] serde_json::Error),
}

static CL100K_BASE: OnceLock<Option<tiktoken_rs::CoreBPE>> = OnceLock::new();

/// Counts tokens with cl100k_base, falling back to a 4-chars-per-token
/// estimate if the encoder cannot be loaded.
pub fn count_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let bpe = CL100K_BASE.get_or_init(|| {
        tiktoken_rs::cl100k_base()
            .map_err(|e| warn!("cl100k_base unavailable, estimating token counts: {}", e))
            .ok()
    });
    match bpe {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => text.chars().count().div_ceil(4),
    }
}

pub fn calculate_cost(input_tokens: usize, output_tokens: usize) -> f64 {
    let input_cost = (input_tokens as f64 / 1000.0) * COST_PER_1K_INPUT;
    let output_cost = (output_tokens as f64 / 1000.0) * COST_PER_1K_OUTPUT;
    round_to(input_cost + output_cost, 6)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn query_preview(query: &str) -> String {
    if query.chars().count() > QUERY_PREVIEW_CHARS {
        let head: String = query.chars().take(QUERY_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        query.to_string()
    }
}

#[derive(Debug, Default)]
pub struct MetricsTracker {
    started: Option<Instant>,
    elapsed: Duration,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.elapsed = Duration::ZERO;
    }

    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed = started.elapsed();
        }
    }

    pub fn latency_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// Input tokens are counted on the raw query, output tokens on the
    /// serialized structured response.
    pub fn measure(&self, query: &str, response: &StructuredResponse) -> InteractionMetrics {
        let output_json = serde_json::to_string(response).unwrap_or_default();
        let input_tokens = count_tokens(query);
        let output_tokens = count_tokens(&output_json);
        let metrics = InteractionMetrics {
            latency_ms: self.latency_ms(),
            cost_usd: calculate_cost(input_tokens, output_tokens),
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        };
        debug!(
            "latency={}ms tokens={} (in {} / out {}) cost=${:.6}",
            metrics.latency_ms,
            metrics.total_tokens,
            metrics.input_tokens,
            metrics.output_tokens,
            metrics.cost_usd
        );
        metrics
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionMetrics {
    pub latency_ms: u64,
    pub cost_usd: f64,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    timestamp: String,
    query_preview: String,
    metrics: &'a InteractionMetrics,
    response_data: &'a StructuredResponse,
}

/// Append-only JSON array of interactions on disk.
#[derive(Debug, Clone)]
pub struct InteractionLog {
    path: PathBuf,
}

impl InteractionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(
        &self,
        query: &str,
        response: &StructuredResponse,
        metrics: &InteractionMetrics
    ) -> Result<(), MetricsError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| MetricsError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let mut history = self.load_existing();
        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            query_preview: query_preview(query),
            metrics,
            response_data: response,
        };
        history.push(serde_json::to_value(&entry)?);

        let text = serde_json::to_string_pretty(&history)?;
        fs::write(&self.path, text).map_err(|source| MetricsError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Missing, unreadable or corrupt logs all start over as empty.
    fn load_existing(&self) -> Vec<JsonValue> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Vec::new();
            }
            Err(e) => {
                warn!("Interaction log {} unreadable ({}); starting a new one", self.path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<JsonValue>>(&text) {
            Ok(history) => history,
            Err(e) => {
                warn!("Interaction log {} is corrupt ({}); starting a new one", self.path.display(), e);
                Vec::new()
            }
        }
    }
}
