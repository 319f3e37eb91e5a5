//! Event types for the taxfill event system
//!
//! Provides the shared event definitions and the EventBus used to report
//! batch progress to whoever is listening (a UI, a log sink, tests).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Taxfill event types
///
/// Events never carry extracted field values; identity data such as SSNs
/// must not leave the core through this channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaxfillEvent {
    /// A batch of documents entered extraction
    ExtractionStarted {
        batch_id: Uuid,
        /// Number of documents requested by the caller
        document_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One document produced a parsed field set
    DocumentExtracted {
        batch_id: Uuid,
        document_id: String,
        /// Caller-supplied position of the document
        index: usize,
        /// Number of non-null fields found
        fields_found: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One document ended with an error marker
    DocumentFailed {
        batch_id: Uuid,
        document_id: String,
        index: usize,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// All extractions finished and were merged
    ReconciliationCompleted {
        batch_id: Uuid,
        /// Required fields still unanswered, canonical order
        missing_fields: Vec<String>,
        conflicts: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A complete record was computed and assembled
    ReturnComputed {
        batch_id: Uuid,
        /// Estimated tax in whole currency units
        estimated_tax: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl TaxfillEvent {
    /// Batch the event belongs to
    pub fn batch_id(&self) -> Uuid {
        match self {
            TaxfillEvent::ExtractionStarted { batch_id, .. }
            | TaxfillEvent::DocumentExtracted { batch_id, .. }
            | TaxfillEvent::DocumentFailed { batch_id, .. }
            | TaxfillEvent::ReconciliationCompleted { batch_id, .. }
            | TaxfillEvent::ReturnComputed { batch_id, .. } => *batch_id,
        }
    }

    /// Event type name, as used in the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            TaxfillEvent::ExtractionStarted { .. } => "ExtractionStarted",
            TaxfillEvent::DocumentExtracted { .. } => "DocumentExtracted",
            TaxfillEvent::DocumentFailed { .. } => "DocumentFailed",
            TaxfillEvent::ReconciliationCompleted { .. } => "ReconciliationCompleted",
            TaxfillEvent::ReturnComputed { .. } => "ReturnComputed",
        }
    }
}

/// Broadcast channel for taxfill events
///
/// Cloning is cheap; all clones share one channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TaxfillEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow receivers lag
    ///
    /// # Examples
    ///
    /// ```
    /// use taxfill_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<TaxfillEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: TaxfillEvent,
    ) -> Result<usize, broadcast::error::SendError<TaxfillEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Progress events are all non-critical.
    pub fn emit_lossy(&self, event: TaxfillEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
