//! Intent parsing: free text in, structured search directives out.

mod openai;

pub use openai::OpenAiIntentParser;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured output of intent parsing: an ordered, non-empty list of
/// track-search queries, optionally carrying field filters such as
/// `artist:"Queen"` or `year:1980-1989`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedIntent {
    pub search_queries: Vec<String>,
}

/// Errors that can occur when parsing intent through the language model.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,
}

/// Trait for intent parsing backends.
///
/// The production implementation talks to an OpenAI-compatible chat
/// completions API; tests substitute canned parsers.
#[async_trait]
pub trait IntentParser: Send + Sync {
    /// Parse the music preferences expressed in `transcript` into search
    /// queries. Missing, malformed, or empty query lists are hard errors,
    /// never silently defaulted.
    async fn parse_intent(&self, transcript: &str) -> Result<ParsedIntent, IntentError>;
}

impl ParsedIntent {
    /// Parse and validate the model's raw text output.
    ///
    /// Tolerates markdown code fences around the JSON payload. Rejects a
    /// missing `search_queries` field, a non-array field, an empty array,
    /// and blank query strings.
    pub fn from_model_output(raw: &str) -> Result<Self, IntentError> {
        let content = strip_code_fences(raw.trim());

        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| IntentError::InvalidResponse(format!("not valid JSON: {}", e)))?;

        let queries = value
            .get("search_queries")
            .ok_or_else(|| {
                IntentError::InvalidResponse("missing required 'search_queries' field".to_string())
            })?
            .as_array()
            .ok_or_else(|| {
                IntentError::InvalidResponse("'search_queries' must be an array".to_string())
            })?;

        if queries.is_empty() {
            return Err(IntentError::InvalidResponse(
                "'search_queries' array is empty".to_string(),
            ));
        }

        let mut search_queries = Vec::with_capacity(queries.len());
        for query in queries {
            match query.as_str() {
                Some(s) if !s.trim().is_empty() => search_queries.push(s.to_string()),
                _ => {
                    return Err(IntentError::InvalidResponse(
                        "'search_queries' entries must be non-empty strings".to_string(),
                    ))
                }
            }
        }

        Ok(Self { search_queries })
    }
}

/// Strips a surrounding markdown code fence, with or without a language tag.
fn strip_code_fences(content: &str) -> &str {
    let mut content = content;
    if let Some(rest) = content.strip_prefix("```json") {
        content = rest;
    } else if let Some(rest) = content.strip_prefix("```") {
        content = rest;
    }
    if let Some(rest) = content.strip_suffix("```") {
        content = rest;
    }
    content.trim()
}
