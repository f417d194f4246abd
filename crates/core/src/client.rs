//! Protocol adapter for the Gemini `generateContent` endpoint.
//!
//! Builds the request envelope (system instruction + conversation turns),
//! retries transport failures under an injected [`RetryPolicy`], classifies
//! HTTP and parse failures, and extracts the first usable text from the
//! response body.

use crate::retry::RetryPolicy;
use crate::transcript::Turn;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Model queried when no override is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";

/// Hosted endpoint root. Tests point this at a local listener instead.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const MAX_OUTPUT_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Cap on raw-body excerpts embedded in diagnostic messages.
const SNIPPET_CHARS: usize = 500;
const STATUS_BODY_CHARS: usize = 300;

/// Failure taxonomy for a generation call.
///
/// Every variant is a value returned to the caller; nothing here is fatal to
/// the process and a failed call leaves the session retryable.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// No credential configured. Surfaced before any request is sent.
    #[error("API key is missing. Set the GEMINI_API_KEY environment variable.")]
    MissingCredential,
    /// Connect error or timeout that survived the whole retry budget.
    #[error("error connecting to the model after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    /// The service answered, but not with a usable response envelope.
    #[error("API error: {detail}")]
    Protocol { status: Option<u16>, detail: String },
    /// A well-formed response from which no text could be extracted.
    #[error("could not extract content from the API response; raw response snippet: {snippet}")]
    Extraction { snippet: String },
}

impl GenerateError {
    fn bad_request(body: &str) -> Self {
        GenerateError::Protocol {
            status: Some(400),
            detail: format!("HTTP 400 Bad Request: {}", head_chars(body, STATUS_BODY_CHARS)),
        }
    }

    fn not_found(model: &str) -> Self {
        GenerateError::Protocol {
            status: Some(404),
            detail: format!("HTTP 404 Not Found: model '{model}' unavailable at endpoint"),
        }
    }

    fn non_json(body: &str) -> Self {
        GenerateError::Protocol {
            status: None,
            detail: format!("non-JSON response: {}", head_chars(body, SNIPPET_CHARS)),
        }
    }
}

/// A client that turns a system instruction plus conversation turns into one
/// generated text reply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// True when a credential is available for outbound calls.
    fn is_configured(&self) -> bool;

    /// Generates a single text completion for the given conversation.
    async fn generate(
        &self,
        system_instruction: &str,
        turns: &[Turn],
    ) -> Result<String, GenerateError>;
}

/// [`GenerationClient`] implementation over the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// Client for the hosted endpoint with the default model and retry schedule.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_options(api_key, DEFAULT_MODEL, DEFAULT_BASE_URL, RetryPolicy::default())
    }

    /// Fully parameterized constructor; `base_url` must not end with a slash.
    pub fn with_options(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");
        Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            retry,
        }
    }

    /// The model this client queries.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<String, GenerateError> {
        let status = response.status();
        let body = response.text().await.map_err(|err| GenerateError::Protocol {
            status: Some(status.as_u16()),
            detail: format!("failed to read response body: {err}"),
        })?;

        match status {
            StatusCode::BAD_REQUEST => return Err(GenerateError::bad_request(&body)),
            StatusCode::NOT_FOUND => return Err(GenerateError::not_found(&self.model)),
            _ => {}
        }

        let parsed: GenerateContentResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) => return Err(GenerateError::non_json(&body)),
        };

        extract_text(&parsed).ok_or_else(|| GenerateError::Extraction {
            snippet: head_chars(&body, SNIPPET_CHARS).to_string(),
        })
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    async fn generate(
        &self,
        system_instruction: &str,
        turns: &[Turn],
    ) -> Result<String, GenerateError> {
        let key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(GenerateError::MissingCredential)?;

        let payload = GenerateContentRequest::new(system_instruction, turns);
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);

        let mut attempt = 0u32;
        let response = loop {
            attempt += 1;
            debug!(model = %self.model, attempt, "dispatching generateContent request");
            match self
                .http
                .post(&url)
                .query(&[("key", key)])
                .json(&payload)
                .send()
                .await
            {
                Ok(response) => break response,
                Err(source) if attempt >= self.retry.max_attempts => {
                    error!(attempts = attempt, error = %source, "generation request failed; retry budget exhausted");
                    return Err(GenerateError::Transport {
                        attempts: attempt,
                        source,
                    });
                }
                Err(source) => {
                    let delay = self.retry.backoff(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %source, "generation request failed; backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        };

        self.handle_response(response).await
    }
}

// --- Wire Types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: InstructionContent,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn new(system_instruction: &str, turns: &[Turn]) -> Self {
        let contents = if turns.is_empty() {
            // The endpoint rejects empty content lists; send one synthetic turn.
            vec![Content {
                role: "user",
                parts: vec![Part {
                    text: "Start.".to_string(),
                }],
            }]
        } else {
            turns
                .iter()
                .map(|turn| Content {
                    role: turn.role.as_str(),
                    parts: vec![Part {
                        text: turn.text.clone(),
                    }],
                })
                .collect()
        };

        Self {
            system_instruction: InstructionContent {
                parts: vec![Part {
                    text: system_instruction.to_string(),
                }],
            },
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct InstructionContent {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    output_text: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// First usable text in the response.
///
/// Primary path: every non-empty `candidates[].content.parts[].text`, joined
/// with a blank line. A candidate content without parts falls back to its own
/// `text` field. When no candidate yields anything, the top-level
/// `outputText` and `text` fields are tried in that order.
fn extract_text(response: &GenerateContentResponse) -> Option<String> {
    let mut fragments: Vec<&str> = Vec::new();
    for candidate in &response.candidates {
        let Some(content) = &candidate.content else {
            continue;
        };
        for part in &content.parts {
            if let Some(text) = part.text.as_deref().filter(|text| !text.is_empty()) {
                fragments.push(text);
            }
        }
        if content.parts.is_empty() {
            if let Some(text) = content.text.as_deref().filter(|text| !text.is_empty()) {
                fragments.push(text);
            }
        }
    }
    if !fragments.is_empty() {
        return Some(fragments.join("\n\n"));
    }

    if let Some(text) = response.output_text.as_deref().filter(|text| !text.is_empty()) {
        return Some(text.to_string());
    }
    response
        .text
        .as_deref()
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// First `max_chars` characters of `s`, never splitting a code point.
fn head_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((index, _)) => &s[..index],
        None => s,
    }
}
