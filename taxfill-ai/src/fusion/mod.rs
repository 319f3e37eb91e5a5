//! Reconciliation
//!
//! Merges the per-document field sets of one batch into a single candidate
//! TaxRecord. Caller order is the only tie-break: the first document to
//! supply a non-null value for a field wins, and later disagreement is
//! reported as a conflict without changing the result.

pub mod reconciler;

pub use reconciler::{reconcile, FieldConflict, Reconciliation};
