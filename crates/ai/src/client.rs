use std::time::Duration;

use thiserror::Error;

/// A source of candidate tinkers.
///
/// One call per cycle: implementations issue exactly one outbound request and
/// return the provider's raw text. Retries are not this layer's business.
#[async_trait::async_trait]
pub trait IntelligenceClient: Send + Sync {
    async fn query(&self, payload: &str) -> Result<String, UpstreamError>;
}

/// Transport or non-success failure talking to the intelligence provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream returned HTTP {status_code}: {message}")]
    Status { status_code: u16, message: String },

    #[error("upstream transport failed: {0}")]
    Transport(String),

    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}
