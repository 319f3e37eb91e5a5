//! Extraction Adapter
//!
//! One RawDocument in, one ExtractedFieldSet out.
//!
//! # Stages
//! 1. **prompt** - fixed instructions naming the field vocabulary
//! 2. **generation** - capability boundary (`GenerationClient`); the
//!    reference implementation is **gemini_client**
//! 3. **json_block** - locate one JSON object in the free-text reply
//! 4. **reply_parser** - coerce it into the vocabulary, or mark it Unparsed
//!
//! # Error Isolation
//! Extraction never fails the batch. Generation errors, unparseable replies
//! and (in the pipeline) fetch errors are carried as markers on the
//! document's own ExtractedFieldSet.

pub mod document_extractor;
pub mod gemini_client;
pub mod generation;
pub mod json_block;
pub mod prompt;
pub mod reply_parser;

use crate::types::{ExtractedFieldSet, RawDocument};

pub use document_extractor::{content_mode, ContentMode, DocumentExtractor};
pub use gemini_client::GeminiClient;
pub use generation::{GenerationClient, GenerationError, InlineContent};
pub use reply_parser::parse_model_reply;

/// Per-document field extraction
///
/// Implementations must return a value for every document; failures are
/// reported through the set's outcome, never by panicking.
#[async_trait::async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract(&self, document: &RawDocument) -> ExtractedFieldSet;
}
