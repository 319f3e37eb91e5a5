//! Field extractor with per-document delays
//!
//! Lets tests force a completion order different from the request order.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use taxfill_ai::extractors::FieldExtractor;
use taxfill_ai::{ExtractedFieldSet, FieldSet, RawDocument};

#[derive(Default)]
pub struct DelayedExtractor {
    scripted: HashMap<String, (Duration, FieldSet)>,
    started: AtomicUsize,
}

impl DelayedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `fields` for `document_id` after `delay_ms`
    pub fn with(mut self, document_id: &str, delay_ms: u64, fields: FieldSet) -> Self {
        self.scripted.insert(
            document_id.to_string(),
            (Duration::from_millis(delay_ms), fields),
        );
        self
    }

    /// Number of extractions that actually started
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FieldExtractor for DelayedExtractor {
    async fn extract(&self, document: &RawDocument) -> ExtractedFieldSet {
        self.started.fetch_add(1, Ordering::SeqCst);
        let (delay, fields) = self
            .scripted
            .get(&document.id)
            .cloned()
            .unwrap_or_default();
        tokio::time::sleep(delay).await;
        ExtractedFieldSet::parsed(&document.id, fields)
    }
}
