//! Document extractor
//!
//! Turns one RawDocument into one ExtractedFieldSet via the generation
//! capability. Never returns an error: every failure becomes a marker on
//! the returned set.

use crate::extractors::generation::{GenerationClient, InlineContent};
use crate::extractors::prompt::extraction_prompt;
use crate::extractors::reply_parser::parse_model_reply;
use crate::extractors::FieldExtractor;
use crate::types::{ExtractedFieldSet, FailureKind, RawDocument};
use crate::utils::retry::{retry_transient, RetryPolicy};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

const OCTET_STREAM: &str = "application/octet-stream";

/// How document bytes reach the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentMode {
    /// Sent as an inline binary part with this MIME type
    Inline(String),
    /// Decoded as UTF-8 and embedded in the prompt
    Embedded,
}

/// Decide how to send a document, sniffing the MIME type when unknown
pub fn content_mode(document: &RawDocument) -> ContentMode {
    let declared = essence(&document.mime_type);

    let mime = if declared.is_empty() || declared == OCTET_STREAM {
        match infer::get(&document.content) {
            Some(kind) => kind.mime_type().to_string(),
            None if std::str::from_utf8(&document.content).is_ok() => {
                return ContentMode::Embedded;
            }
            None => OCTET_STREAM.to_string(),
        }
    } else {
        declared
    };

    if mime.starts_with("text/") || mime == "application/json" {
        ContentMode::Embedded
    } else {
        ContentMode::Inline(mime)
    }
}

/// Lowercased MIME type without parameters
fn essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Extraction adapter backed by a generation client
pub struct DocumentExtractor {
    client: Arc<dyn GenerationClient>,
    retry: RetryPolicy,
}

impl DocumentExtractor {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl FieldExtractor for DocumentExtractor {
    async fn extract(&self, document: &RawDocument) -> ExtractedFieldSet {
        let mode = content_mode(document);
        debug!(
            document_id = %document.id,
            client = self.client.name(),
            mode = ?mode,
            bytes = document.content.len(),
            "Extracting document"
        );

        let (prompt, inline) = match &mode {
            ContentMode::Embedded => {
                let text = String::from_utf8_lossy(&document.content);
                (extraction_prompt(Some(&text)), None)
            }
            ContentMode::Inline(mime) => (
                extraction_prompt(None),
                Some(InlineContent {
                    mime_type: mime.as_str(),
                    data: &document.content,
                }),
            ),
        };

        let reply = retry_transient(&document.id, self.retry, || {
            self.client.generate(&prompt, inline)
        })
        .await;

        match reply {
            Ok(text) => parse_model_reply(&document.id, &text),
            Err(e) => {
                warn!(
                    document_id = %document.id,
                    client = self.client.name(),
                    error = %e,
                    "Generation failed for document"
                );
                ExtractedFieldSet::failed(
                    &document.id,
                    FailureKind::Generation,
                    format!("{} generation failed: {}", self.client.name(), e),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::generation::GenerationError;
    use crate::types::{ExtractionOutcome, FieldName};
    use std::sync::Mutex;

    /// Records each call and replays scripted replies
    struct ScriptedClient {
        replies: Mutex<Vec<Result<String, GenerationError>>>,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<String, GenerationError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        fn name(&self) -> &'static str {
            "Scripted"
        }

        async fn generate(
            &self,
            prompt: &str,
            inline: Option<InlineContent<'_>>,
        ) -> Result<String, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), inline.map(|c| c.mime_type.to_string())));
            self.replies.lock().unwrap().remove(0)
        }
    }

    #[test]
    fn test_content_mode_by_mime() {
        let pdf = RawDocument::new("a", "application/pdf", b"%PDF-1.4".to_vec());
        assert_eq!(content_mode(&pdf), ContentMode::Inline("application/pdf".into()));

        let text = RawDocument::new("b", "text/plain; charset=utf-8", b"Wages 10".to_vec());
        assert_eq!(content_mode(&text), ContentMode::Embedded);

        let json = RawDocument::new("c", "Application/JSON", b"{}".to_vec());
        assert_eq!(content_mode(&json), ContentMode::Embedded);
    }

    #[test]
    fn test_content_mode_sniffs_unknown_mime() {
        let png_header = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let png = RawDocument::new("scan", "", png_header);
        assert_eq!(content_mode(&png), ContentMode::Inline("image/png".into()));

        let text = RawDocument::new("notes", OCTET_STREAM, b"Interest: 120.00".to_vec());
        assert_eq!(content_mode(&text), ContentMode::Embedded);
    }

    #[tokio::test]
    async fn test_pdf_sent_inline_and_parsed() {
        let client = ScriptedClient::new(vec![Ok("```json\n{\"wages\": 75000}\n```".into())]);
        let extractor = DocumentExtractor::new(client.clone());

        let doc = RawDocument::new("w2.pdf", "application/pdf", b"%PDF-1.7".to_vec());
        let set = extractor.extract(&doc).await;

        assert!(set.get(FieldName::Wages).is_some());
        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn test_text_document_embedded_in_prompt() {
        let client = ScriptedClient::new(vec![Ok("{\"interest\": 120}".into())]);
        let extractor = DocumentExtractor::new(client.clone());

        let doc = RawDocument::new("1099.txt", "text/plain", b"Box 1 Interest 120.00".to_vec());
        extractor.extract(&doc).await;

        let calls = client.calls.lock().unwrap();
        assert!(calls[0].0.contains("Box 1 Interest 120.00"));
        assert_eq!(calls[0].1, None);
    }

    #[tokio::test]
    async fn test_generation_failure_is_marked_not_empty() {
        let client = ScriptedClient::new(vec![Err(GenerationError::Quota("429".into()))]);
        let extractor = DocumentExtractor::new(client);

        let doc = RawDocument::new("w2.pdf", "application/pdf", b"%PDF".to_vec());
        let set = extractor.extract(&doc).await;

        match &set.outcome {
            ExtractionOutcome::Failed { kind, reason } => {
                assert_eq!(*kind, FailureKind::Generation);
                assert!(reason.contains("Quota"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transient_failure_retried_when_configured() {
        let client = ScriptedClient::new(vec![
            Err(GenerationError::Transient("502".into())),
            Ok("{\"city\": \"Austin\"}".into()),
        ]);
        let extractor = DocumentExtractor::new(client.clone()).with_retry(
            RetryPolicy::new(2).with_initial_backoff(std::time::Duration::ZERO),
        );

        let doc = RawDocument::new("d", "image/jpeg", vec![0xFF, 0xD8, 0xFF]);
        let set = extractor.extract(&doc).await;

        assert!(set.get(FieldName::City).is_some());
        assert_eq!(client.calls.lock().unwrap().len(), 2);
    }
}
