//! taxfill-ai library interface
//!
//! Document extraction, reconciliation, tax computation and return assembly.
//!
//! # Stages
//! - **extractors:** RawDocument → ExtractedFieldSet via a generation client
//! - **fusion:** ExtractedFieldSet[] → TaxRecord + MissingFieldSet (first wins)
//! - **tax:** complete TaxRecord → TaxRecord with derived amounts
//! - **assembler:** computed TaxRecord → RenderableReturn
//! - **workflow:** concurrent batch driver over the storage boundaries

pub mod assembler;
pub mod config;
pub mod error;
pub mod extractors;
pub mod fusion;
pub mod money;
pub mod record;
pub mod tax;
pub mod types;
pub mod utils;
pub mod workflow;

pub use crate::assembler::{assemble, LineItem, RenderableReturn};
pub use crate::error::{AssemblyError, ComputationError, PipelineError};
pub use crate::fusion::{reconcile, Reconciliation};
pub use crate::money::Money;
pub use crate::record::{DeductionKind, DerivedAmounts, TaxRecord};
pub use crate::tax::compute;
pub use crate::types::{
    ExtractedFieldSet, ExtractionOutcome, FailureKind, FieldName, FieldSet, FieldValue,
    FilingStatus, MissingFieldSet, RawDocument,
};
