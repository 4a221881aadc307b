//! OpenAI-compatible intent parser implementation.
//!
//! Works with OpenAI and any other service implementing the OpenAI chat
//! completions API.

use super::{IntentError, IntentParser, ParsedIntent};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 500;

const SYSTEM_PROMPT: &str = r#"Generate 2-3 search queries for Spotify based on the user's request.

Use field filters when relevant:
- artist:"name" for artists
- track:"name" for songs
- year:YYYY or year:YYYY-YYYY for time periods
- genre:"name" for genres

Examples:
- "romantic pop year:1980-1989"
- "artist:Queen rock"
- "track:Bohemian Rhapsody"
- "genre:jazz year:1950-1960"

Return ONLY valid JSON:
{
  "search_queries": ["query1", "query2", "query3"]
}"#;

/// Intent parser backed by an OpenAI-compatible chat completions API.
pub struct OpenAiIntentParser {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiIntentParser {
    /// Create a new parser.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the API (e.g., "https://api.openai.com/v1").
    /// * `model` - Model to use (e.g., "gpt-3.5-turbo").
    /// * `api_key` - API key for authentication.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn user_prompt(transcript: &str) -> String {
        format!(
            "Please analyze this user request and extract the music preferences:\n\n\
             \"{}\"\n\n\
             Return only a valid JSON object with the extracted information.",
            transcript
        )
    }
}

#[async_trait]
impl IntentParser for OpenAiIntentParser {
    async fn parse_intent(&self, transcript: &str) -> Result<ParsedIntent, IntentError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_prompt(transcript),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!(
            model = %self.model,
            transcript_len = transcript.len(),
            "Sending intent parsing request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IntentError::Timeout
                } else {
                    IntentError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(IntentError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntentError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            IntentError::InvalidResponse(format!("Failed to parse completion response: {}", e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| IntentError::InvalidResponse("No choices in response".to_string()))?;

        let intent = ParsedIntent::from_model_output(&content)?;

        debug!(queries = ?intent.search_queries, "Parsed intent from transcript");
        Ok(intent)
    }
}

// Chat completions API types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
