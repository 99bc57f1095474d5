use async_trait::async_trait;
use thiserror::Error;

/// Abstraction over the external text-classification capability.
///
/// One call sends a fixed system instruction plus a per-artist user prompt
/// and returns the raw reply text. Anything that prevents a usable reply
/// (transport failure, non-2xx status, missing content) is a [`ModelError`];
/// interpreting the reply is the classifier's job.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError>;
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
}
