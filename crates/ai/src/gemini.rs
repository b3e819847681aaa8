//! Gemini `generateContent` client.
//!
//! Sends the instruction payload as a single user turn and returns the text of
//! the first candidate. Nothing here interprets that text; see [`crate::parser`].

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::{IntelligenceClient, UpstreamError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Reply used when the provider answers successfully but without any text.
const EMPTY_REPLY: &str = "[]";

/// Upper bound on how much of an error body ends up in logs.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Long-lived handle to the Gemini API (connection pool inside `reqwest::Client`).
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn upstream_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.config.timeout)
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err.without_url().to_string())
        }
    }
}

#[async_trait::async_trait]
impl IntelligenceClient for GeminiClient {
    async fn query(&self, payload: &str) -> Result<String, UpstreamError> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: payload }],
            }],
        };

        let res = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.upstream_error(e))?;

        let status = res.status();
        if !status.is_success() {
            let mut message = res.text().await.unwrap_or_default();
            truncate_on_char_boundary(&mut message, MAX_ERROR_BODY);
            return Err(UpstreamError::Status {
                status_code: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = res.json().await.map_err(|e| self.upstream_error(e))?;
        match parsed.first_text() {
            Some(text) => {
                debug!(model = %self.config.model, bytes = text.len(), "gemini reply received");
                Ok(text)
            }
            None => {
                warn!(model = %self.config.model, "gemini reply had no candidate text; treating as empty batch");
                Ok(EMPTY_REPLY.to_string())
            }
        }
    }
}

fn truncate_on_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
