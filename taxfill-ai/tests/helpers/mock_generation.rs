//! Scripted generation client
//!
//! Replies are chosen by a marker string found in the prompt (text
//! documents are embedded there) or in the inline bytes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use taxfill_ai::extractors::{GenerationClient, GenerationError, InlineContent};

pub struct ScriptedGenerationClient {
    rules: Vec<(String, Result<String, GenerationError>)>,
    default_reply: String,
    calls: AtomicUsize,
}

impl ScriptedGenerationClient {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default_reply: "```json\n{}\n```".to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Reply with `reply` when `marker` appears in the document
    pub fn reply_when(mut self, marker: &str, reply: &str) -> Self {
        self.rules.push((marker.to_string(), Ok(reply.to_string())));
        self
    }

    /// Fail with `error` when `marker` appears in the document
    pub fn fail_when(mut self, marker: &str, error: GenerationError) -> Self {
        self.rules.push((marker.to_string(), Err(error)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for ScriptedGenerationClient {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    async fn generate(
        &self,
        prompt: &str,
        inline: Option<InlineContent<'_>>,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let inline_text = inline
            .map(|c| String::from_utf8_lossy(c.data).into_owned())
            .unwrap_or_default();

        self.rules
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()) || inline_text.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Ok(self.default_reply.clone()))
    }
}
