//! Return pipeline
//!
//! Fan-out / fan-in driver for one batch:
//! 1. **Authorize** - ask the registry which requested ids the owner holds
//! 2. **Extract** - fetch and extract each document concurrently
//! 3. **Reconcile** - merge results in caller order once all have finished
//! 4. **Compute / Assemble** - only when no required field is missing
//!
//! Every requested document produces exactly one ExtractedFieldSet at its
//! original index, whatever order the workers finish in.

use crate::assembler::{assemble, RenderableReturn};
use crate::error::PipelineError;
use crate::extractors::FieldExtractor;
use crate::fusion::{reconcile, FieldConflict};
use crate::record::TaxRecord;
use crate::tax::compute;
use crate::types::{
    ExtractedFieldSet, ExtractionOutcome, FailureKind, FieldName, FieldSet, MissingFieldSet,
    RawDocument,
};
use crate::workflow::storage::{DocumentRef, DocumentRegistry, ObjectStore};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use taxfill_common::config::DEFAULT_MAX_CONCURRENT_EXTRACTIONS;
use taxfill_common::events::{EventBus, TaxfillEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Reason recorded for documents the registry did not return
pub const NOT_AUTHORIZED_REASON: &str = "not found or not authorized";

/// Reason recorded for documents cut short by cancellation
pub const CANCELLED_REASON: &str = "cancelled";

// ============================================================================
// Outcome types
// ============================================================================

/// What went wrong with one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentIssueKind {
    /// Model replied without usable JSON
    Unparsed,
    Generation,
    Fetch,
    Cancelled,
    NotAuthorized,
}

/// Extraction problem reported back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentIssue {
    pub document_id: String,
    /// Position in the caller's request
    pub index: usize,
    pub kind: DocumentIssueKind,
    pub reason: String,
}

impl DocumentIssue {
    /// Issue for an error-marked set; `None` for parsed sets
    pub fn from_field_set(index: usize, set: &ExtractedFieldSet) -> Option<Self> {
        let (kind, reason) = match &set.outcome {
            ExtractionOutcome::Parsed { .. } => return None,
            ExtractionOutcome::Unparsed { reason, .. } => (DocumentIssueKind::Unparsed, reason),
            ExtractionOutcome::Failed { kind, reason } => {
                let kind = match kind {
                    FailureKind::Generation => DocumentIssueKind::Generation,
                    FailureKind::Fetch => DocumentIssueKind::Fetch,
                    FailureKind::Cancelled => DocumentIssueKind::Cancelled,
                    FailureKind::NotAuthorized => DocumentIssueKind::NotAuthorized,
                };
                (kind, reason)
            }
        };
        Some(Self {
            document_id: set.document_id.clone(),
            index,
            kind,
            reason: reason.clone(),
        })
    }
}

/// A computed record and its rendered form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedReturn {
    pub record: TaxRecord,
    pub rendered: RenderableReturn,
}

/// Compute and assemble a complete record
pub fn finalize(record: &TaxRecord) -> Result<CompletedReturn, PipelineError> {
    let record = compute(record)?;
    let rendered = assemble(&record)?;
    Ok(CompletedReturn { record, rendered })
}

/// Result of preparing one batch
///
/// `document_issues` (extraction problems) and `missing` (information the
/// user must still supply) are deliberately separate lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedReturn {
    pub batch_id: Uuid,
    pub record: TaxRecord,
    pub missing: MissingFieldSet,
    pub provenance: BTreeMap<FieldName, usize>,
    pub conflicts: Vec<FieldConflict>,
    pub document_issues: Vec<DocumentIssue>,
    /// Present once no required field is missing
    pub completed: Option<CompletedReturn>,
}

impl PreparedReturn {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// New outcome with the user's answers applied
    ///
    /// Computes and assembles if the answers complete the record.
    pub fn with_answers(&self, answers: &FieldSet) -> Result<PreparedReturn, PipelineError> {
        let record = self.record.with_answers(answers);
        let missing = record.missing_fields();
        let completed = if missing.is_empty() {
            Some(finalize(&record)?)
        } else {
            None
        };

        Ok(PreparedReturn {
            record,
            missing,
            completed,
            ..self.clone()
        })
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Work item for one requested document
enum Job {
    Stored(DocumentRef),
    Raw(RawDocument),
    Unauthorized(String),
}

impl Job {
    fn document_id(&self) -> &str {
        match self {
            Job::Stored(doc) => &doc.id,
            Job::Raw(doc) => &doc.id,
            Job::Unauthorized(id) => id,
        }
    }
}

/// Batch driver over the storage boundaries and an extractor
pub struct ReturnPipeline {
    registry: Arc<dyn DocumentRegistry>,
    store: Arc<dyn ObjectStore>,
    extractor: Arc<dyn FieldExtractor>,
    max_concurrent: usize,
    event_bus: Option<EventBus>,
}

impl ReturnPipeline {
    pub fn new(
        registry: Arc<dyn DocumentRegistry>,
        store: Arc<dyn ObjectStore>,
        extractor: Arc<dyn FieldExtractor>,
    ) -> Self {
        Self {
            registry,
            store,
            extractor,
            max_concurrent: DEFAULT_MAX_CONCURRENT_EXTRACTIONS,
            event_bus: None,
        }
    }

    /// Bound on in-flight extractions (minimum 1)
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Report progress on `event_bus`
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    fn emit(&self, event: TaxfillEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }

    /// Authorize, extract and reconcile the owner's documents
    ///
    /// Only a registry failure fails the whole batch; per-document problems
    /// are reported in `document_issues`.
    pub async fn prepare(
        &self,
        owner: &str,
        document_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<PreparedReturn, PipelineError> {
        let batch_id = Uuid::new_v4();
        info!(
            batch_id = %batch_id,
            documents = document_ids.len(),
            "Preparing return"
        );

        let authorized = self
            .registry
            .authorized_documents(owner, document_ids)
            .await?;
        let by_id: HashMap<String, DocumentRef> = authorized
            .into_iter()
            .map(|doc| (doc.id.clone(), doc))
            .collect();

        let jobs = document_ids
            .iter()
            .map(|id| match by_id.get(id) {
                Some(doc) => Job::Stored(doc.clone()),
                None => {
                    warn!(batch_id = %batch_id, document_id = %id, "Document not authorized for owner");
                    Job::Unauthorized(id.clone())
                }
            })
            .collect::<Vec<_>>();

        let field_sets = self.run_batch(batch_id, jobs, cancel).await;
        self.reconcile_batch(batch_id, &field_sets)
    }

    /// Extract already-loaded documents, preserving input order
    pub async fn extract_documents(
        &self,
        documents: Vec<RawDocument>,
        cancel: &CancellationToken,
    ) -> Vec<ExtractedFieldSet> {
        let jobs = documents.into_iter().map(Job::Raw).collect();
        self.run_batch(Uuid::new_v4(), jobs, cancel).await
    }

    /// Apply answers to a prepared return, reporting completion on the bus
    pub fn apply_answers(
        &self,
        prepared: &PreparedReturn,
        answers: &FieldSet,
    ) -> Result<PreparedReturn, PipelineError> {
        let next = prepared.with_answers(answers)?;
        if let Some(completed) = &next.completed {
            self.emit_computed(next.batch_id, completed);
        }
        Ok(next)
    }

    fn emit_computed(&self, batch_id: Uuid, completed: &CompletedReturn) {
        let estimated_tax = completed.rendered.estimated_tax().whole_units();
        info!(batch_id = %batch_id, estimated_tax, "Return computed");
        self.emit(TaxfillEvent::ReturnComputed {
            batch_id,
            estimated_tax,
            timestamp: chrono::Utc::now(),
        });
    }

    fn reconcile_batch(
        &self,
        batch_id: Uuid,
        field_sets: &[ExtractedFieldSet],
    ) -> Result<PreparedReturn, PipelineError> {
        let document_issues: Vec<DocumentIssue> = field_sets
            .iter()
            .enumerate()
            .filter_map(|(index, set)| DocumentIssue::from_field_set(index, set))
            .collect();

        let reconciliation = reconcile(field_sets);

        self.emit(TaxfillEvent::ReconciliationCompleted {
            batch_id,
            missing_fields: reconciliation.missing.names(),
            conflicts: reconciliation.conflicts.len(),
            timestamp: chrono::Utc::now(),
        });

        let completed = if reconciliation.missing.is_empty() {
            let completed = finalize(&reconciliation.record)?;
            self.emit_computed(batch_id, &completed);
            Some(completed)
        } else {
            info!(
                batch_id = %batch_id,
                missing = %reconciliation.missing,
                "Return incomplete, answers required"
            );
            None
        };

        Ok(PreparedReturn {
            batch_id,
            record: reconciliation.record,
            missing: reconciliation.missing,
            provenance: reconciliation.provenance,
            conflicts: reconciliation.conflicts,
            document_issues,
            completed,
        })
    }

    /// Run every job to an outcome and return them in job order
    async fn run_batch(
        &self,
        batch_id: Uuid,
        jobs: Vec<Job>,
        cancel: &CancellationToken,
    ) -> Vec<ExtractedFieldSet> {
        let total = jobs.len();
        self.emit(TaxfillEvent::ExtractionStarted {
            batch_id,
            document_count: total,
            timestamp: chrono::Utc::now(),
        });

        let results: Vec<(usize, ExtractedFieldSet)> = stream::iter(jobs.into_iter().enumerate())
            .map(|(index, job)| async move {
                let document_id = job.document_id().to_string();
                let set = if cancel.is_cancelled() {
                    cancelled(&document_id)
                } else {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => cancelled(&document_id),
                        set = self.run_job(job) => set,
                    }
                };
                self.report(batch_id, index, &set);
                (index, set)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        // Completion order is arbitrary; restore request order by index
        let mut slots: Vec<Option<ExtractedFieldSet>> = vec![None; total];
        for (index, set) in results {
            slots[index] = Some(set);
        }
        slots.into_iter().flatten().collect()
    }

    async fn run_job(&self, job: Job) -> ExtractedFieldSet {
        match job {
            Job::Unauthorized(id) => {
                ExtractedFieldSet::failed(id, FailureKind::NotAuthorized, NOT_AUTHORIZED_REASON)
            }
            Job::Raw(document) => self.extractor.extract(&document).await,
            Job::Stored(doc) => match self.store.fetch(&doc.location).await {
                Ok((content, mime_type)) => {
                    let document = RawDocument::new(doc.id, mime_type, content);
                    self.extractor.extract(&document).await
                }
                Err(e) => {
                    warn!(document_id = %doc.id, error = %e, "Failed to fetch document");
                    ExtractedFieldSet::failed(doc.id, FailureKind::Fetch, e.to_string())
                }
            },
        }
    }

    fn report(&self, batch_id: Uuid, index: usize, set: &ExtractedFieldSet) {
        match set.fields() {
            Some(fields) => {
                debug!(
                    batch_id = %batch_id,
                    document_id = %set.document_id,
                    index,
                    fields_found = fields.len(),
                    "Document extracted"
                );
                self.emit(TaxfillEvent::DocumentExtracted {
                    batch_id,
                    document_id: set.document_id.clone(),
                    index,
                    fields_found: fields.len(),
                    timestamp: chrono::Utc::now(),
                });
            }
            None => {
                let reason = set.error().unwrap_or_default().to_string();
                debug!(
                    batch_id = %batch_id,
                    document_id = %set.document_id,
                    index,
                    reason = %reason,
                    "Document produced no fields"
                );
                self.emit(TaxfillEvent::DocumentFailed {
                    batch_id,
                    document_id: set.document_id.clone(),
                    index,
                    reason,
                    timestamp: chrono::Utc::now(),
                });
            }
        }
    }
}

fn cancelled(document_id: &str) -> ExtractedFieldSet {
    ExtractedFieldSet::failed(document_id, FailureKind::Cancelled, CANCELLED_REASON)
}
