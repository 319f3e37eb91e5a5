//! Common error types for taxfill

use thiserror::Error;

/// Common result type for taxfill operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across taxfill crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    ///
    /// Missing credentials for the generation capability or storage land
    /// here. Never retried; raised before any extraction starts.
    #[error("Configuration error: {0}")]
    Config(String),
}
