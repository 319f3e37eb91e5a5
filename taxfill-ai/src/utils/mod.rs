//! Utility modules for taxfill-ai

pub mod retry;

pub use retry::{retry_transient, RetryPolicy};
