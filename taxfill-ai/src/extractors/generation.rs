//! Generation capability boundary
//!
//! The extraction adapter only needs "prompt (+ optional inline bytes) in,
//! free text out". Concrete clients live beside this trait.

use async_trait::async_trait;
use thiserror::Error;

/// Binary content sent inline with the prompt
#[derive(Debug, Clone, Copy)]
pub struct InlineContent<'a> {
    pub mime_type: &'a str,
    pub data: &'a [u8],
}

/// Generation capability failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Quota or rate limit exhausted
    #[error("Quota exceeded: {0}")]
    Quota(String),

    /// Request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Network failure or server-side error worth retrying
    #[error("Transient error: {0}")]
    Transient(String),

    /// Credentials rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Reply arrived but carried no text
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// Only timeouts and transient failures are retried
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Timeout(_) | GenerationError::Transient(_))
    }
}

/// Text generation capability
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Provider identifier for logging
    fn name(&self) -> &'static str;

    /// Generate free-form text for `prompt`, optionally with inline content
    async fn generate(
        &self,
        prompt: &str,
        inline: Option<InlineContent<'_>>,
    ) -> Result<String, GenerationError>;
}
