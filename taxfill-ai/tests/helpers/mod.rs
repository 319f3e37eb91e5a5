//! Test Helper Utilities
//!
//! Shared mocks and fixtures for taxfill-ai integration tests. Not every
//! test binary uses every helper.
#![allow(dead_code)]

pub mod mock_extractor;
pub mod mock_generation;

pub use mock_extractor::DelayedExtractor;
pub use mock_generation::ScriptedGenerationClient;

use taxfill_ai::{FieldName, FieldSet, FieldValue, FilingStatus, Money};

pub fn text(value: &str) -> FieldValue {
    FieldValue::Text(value.to_string())
}

pub fn dollars(units: i64) -> FieldValue {
    FieldValue::Amount(Money::from_whole(units))
}

/// Identity, filing status and address for a single filer
pub fn identity_fields() -> FieldSet {
    FieldSet::new()
        .with(FieldName::FirstName, text("John"))
        .with(FieldName::LastName, text("Smith"))
        .with(FieldName::Ssn, text("123456789"))
        .with(FieldName::FilingStatus, FieldValue::Status(FilingStatus::Single))
        .with(FieldName::Address, text("100 Main St"))
        .with(FieldName::City, text("Austin"))
        .with(FieldName::State, text("TX"))
        .with(FieldName::Zip, text("73301"))
}

/// Identity plus every required income field
pub fn complete_fields(wages: i64) -> FieldSet {
    identity_fields()
        .with(FieldName::Wages, dollars(wages))
        .with(FieldName::Interest, dollars(0))
        .with(FieldName::Dividends, dollars(0))
        .with(FieldName::CapitalGains, dollars(0))
}
