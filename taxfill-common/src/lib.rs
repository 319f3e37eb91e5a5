//! # Taxfill Common Library
//!
//! Shared code for the taxfill crates:
//! - Error type and result alias
//! - TOML / environment configuration loading
//! - Event types (TaxfillEvent enum) and the broadcast EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
