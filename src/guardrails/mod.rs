//! Pre-flight input filter.
//!
//! Runs before anything reaches the history or the completion provider, so a
//! rejected message costs nothing and leaves no trace in the conversation.

pub mod deny_list;

use log::warn;
use regex::Regex;

use crate::models::response::SafetyVerdict;
use self::deny_list::{ DenyCategory, DenyEntry, DEFAULT_DENY_LIST };

pub const MAX_INPUT_CHARS: usize = 1000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenyMatch {
    pub phrase: String,
    pub category: DenyCategory,
}

/// Finds a forbidden phrase in already lower-cased input.
pub trait DenyMatcher: Send + Sync {
    fn find(&self, normalized: &str) -> Option<DenyMatch>;
}

/// Plain substring search, first listed phrase wins.
#[derive(Clone, Debug)]
pub struct SubstringMatcher {
    entries: Vec<DenyEntry>,
}

impl SubstringMatcher {
    pub fn new(entries: Vec<DenyEntry>) -> Self {
        Self { entries }
    }
}

impl Default for SubstringMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DENY_LIST.to_vec())
    }
}

impl DenyMatcher for SubstringMatcher {
    fn find(&self, normalized: &str) -> Option<DenyMatch> {
        self.entries
            .iter()
            .find(|entry| normalized.contains(entry.phrase))
            .map(|entry| DenyMatch {
                phrase: entry.phrase.to_string(),
                category: entry.category,
            })
    }
}

/// Same deny-list, but tolerant of repeated or unusual whitespace between
/// words ("ignore   previous\tinstructions").
#[derive(Clone, Debug)]
pub struct RegexMatcher {
    patterns: Vec<(Regex, DenyEntry)>,
}

impl RegexMatcher {
    pub fn from_entries(entries: &[DenyEntry]) -> Result<Self, regex::Error> {
        let patterns = entries
            .iter()
            .map(|entry| {
                let pattern = entry.phrase
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+");
                Regex::new(&pattern).map(|re| (re, *entry))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

impl DenyMatcher for RegexMatcher {
    fn find(&self, normalized: &str) -> Option<DenyMatch> {
        self.patterns
            .iter()
            .find(|(re, _)| re.is_match(normalized))
            .map(|(_, entry)| DenyMatch {
                phrase: entry.phrase.to_string(),
                category: entry.category,
            })
    }
}

pub struct InputGate {
    max_chars: usize,
    matcher: Box<dyn DenyMatcher>,
}

impl Default for InputGate {
    fn default() -> Self {
        Self::new(Box::new(SubstringMatcher::default()))
    }
}

impl InputGate {
    pub fn new(matcher: Box<dyn DenyMatcher>) -> Self {
        Self { max_chars: MAX_INPUT_CHARS, matcher }
    }

    /// Rules in order: length bound, then deny-list. First match wins.
    pub fn check(&self, raw: &str) -> SafetyVerdict {
        let char_count = raw.chars().count();
        if char_count > self.max_chars {
            warn!("Input rejected: {} characters exceeds limit of {}", char_count, self.max_chars);
            return SafetyVerdict::reject(
                format!("input too long (max {} characters)", self.max_chars)
            );
        }

        let normalized = raw.to_lowercase();
        if let Some(found) = self.matcher.find(&normalized) {
            warn!("Input rejected: category={} phrase='{}'", found.category.as_str(), found.phrase);
            return SafetyVerdict::reject(
                format!("blocked by safety policy: '{}' detected", found.phrase)
            );
        }

        SafetyVerdict::allow()
    }
}
