//! Error types for taxfill-ai
//!
//! Per-document problems never appear here; they travel as markers on the
//! document's ExtractedFieldSet. These enums cover caller-level failures.

use crate::types::MissingFieldSet;
use crate::workflow::storage::RegistryError;
use thiserror::Error;

/// Computation precondition failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputationError {
    /// Required fields still absent; the list is in canonical order
    #[error("Cannot compute return, missing required fields: {0}")]
    MissingFields(MissingFieldSet),

    /// An intermediate amount does not fit in cents
    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),
}

/// Assembly precondition failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// Record has no derived amounts
    #[error("Return has not been computed")]
    NotComputed,
}

/// Batch-level pipeline failure
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Registry lookup failed for the whole batch
    #[error("Document registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Computation(#[from] ComputationError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    /// taxfill-common error
    #[error("Common error: {0}")]
    Common(#[from] taxfill_common::Error),
}
