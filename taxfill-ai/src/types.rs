//! Core Types for taxfill-ai
//!
//! Defines the fixed field vocabulary and the values that flow between the
//! pipeline stages:
//! - **Extraction:** RawDocument → ExtractedFieldSet
//! - **Reconciliation:** ExtractedFieldSet[] → TaxRecord + MissingFieldSet
//! - **Computation / Assembly:** see `tax` and `assembler`
//!
//! Everything here is an immutable value once built; stages hand copies to
//! each other instead of sharing mutable state.

use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Field vocabulary
// ============================================================================

/// The fixed field vocabulary
///
/// Declaration order is the canonical order used for iteration and for
/// missing-field reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    FirstName,
    LastName,
    Ssn,
    FilingStatus,
    Address,
    City,
    State,
    Zip,
    Wages,
    Interest,
    Dividends,
    CapitalGains,
    OtherIncome,
    Adjustments,
    Deductions,
}

/// Value type a field carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Money,
    FilingStatus,
}

impl FieldName {
    /// All fields in canonical order
    pub const ALL: [FieldName; 15] = [
        FieldName::FirstName,
        FieldName::LastName,
        FieldName::Ssn,
        FieldName::FilingStatus,
        FieldName::Address,
        FieldName::City,
        FieldName::State,
        FieldName::Zip,
        FieldName::Wages,
        FieldName::Interest,
        FieldName::Dividends,
        FieldName::CapitalGains,
        FieldName::OtherIncome,
        FieldName::Adjustments,
        FieldName::Deductions,
    ];

    /// Fields whose absence blocks computation, in reporting order
    pub const REQUIRED: [FieldName; 12] = [
        FieldName::FirstName,
        FieldName::LastName,
        FieldName::Ssn,
        FieldName::FilingStatus,
        FieldName::Address,
        FieldName::City,
        FieldName::State,
        FieldName::Zip,
        FieldName::Wages,
        FieldName::Interest,
        FieldName::Dividends,
        FieldName::CapitalGains,
    ];

    /// Vocabulary key as it appears in model JSON
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::FirstName => "firstName",
            FieldName::LastName => "lastName",
            FieldName::Ssn => "ssn",
            FieldName::FilingStatus => "filingStatus",
            FieldName::Address => "address",
            FieldName::City => "city",
            FieldName::State => "state",
            FieldName::Zip => "zip",
            FieldName::Wages => "wages",
            FieldName::Interest => "interest",
            FieldName::Dividends => "dividends",
            FieldName::CapitalGains => "capitalGains",
            FieldName::OtherIncome => "otherIncome",
            FieldName::Adjustments => "adjustments",
            FieldName::Deductions => "deductions",
        }
    }

    /// Look up a JSON key, accepting camelCase and snake_case spellings
    pub fn from_key(key: &str) -> Option<FieldName> {
        let normalized: String = key
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        FieldName::ALL
            .into_iter()
            .find(|f| f.as_str().to_ascii_lowercase() == normalized)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            FieldName::Wages
            | FieldName::Interest
            | FieldName::Dividends
            | FieldName::CapitalGains
            | FieldName::OtherIncome
            | FieldName::Adjustments
            | FieldName::Deductions => FieldKind::Money,
            FieldName::FilingStatus => FieldKind::FilingStatus,
            _ => FieldKind::Text,
        }
    }

    pub fn is_required(self) -> bool {
        FieldName::REQUIRED.contains(&self)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Filing status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedJoint,
    MarriedSeparate,
    HeadOfHousehold,
    QualifyingWidow,
}

impl FilingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedJoint => "married_joint",
            FilingStatus::MarriedSeparate => "married_separate",
            FilingStatus::HeadOfHousehold => "head_of_household",
            FilingStatus::QualifyingWidow => "qualifying_widow",
        }
    }

    /// Label printed on the rendered return
    pub fn label(self) -> &'static str {
        match self {
            FilingStatus::Single => "Single",
            FilingStatus::MarriedJoint => "Married Filing Jointly",
            FilingStatus::MarriedSeparate => "Married Filing Separately",
            FilingStatus::HeadOfHousehold => "Head of Household",
            FilingStatus::QualifyingWidow => "Qualifying Widow(er)",
        }
    }

    /// Parse canonical values and the common form labels, case-insensitively
    pub fn parse_loose(raw: &str) -> Option<FilingStatus> {
        let normalized: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let status = match normalized.as_str() {
            "single" => FilingStatus::Single,
            "married joint" | "married filing jointly" | "married jointly" | "mfj" => {
                FilingStatus::MarriedJoint
            }
            "married separate" | "married filing separately" | "married separately" | "mfs" => {
                FilingStatus::MarriedSeparate
            }
            "head of household" | "hoh" => FilingStatus::HeadOfHousehold,
            "qualifying widow" | "qualifying widow er" | "qualifying widower"
            | "qualifying surviving spouse" => FilingStatus::QualifyingWidow,
            _ => return None,
        };
        Some(status)
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Field values
// ============================================================================

/// A typed, non-null field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Status(FilingStatus),
    Amount(Money),
    Text(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Amount(_) => FieldKind::Money,
            FieldValue::Status(_) => FieldKind::FilingStatus,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_money(&self) -> Option<Money> {
        match self {
            FieldValue::Amount(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_filing_status(&self) -> Option<FilingStatus> {
        match self {
            FieldValue::Status(s) => Some(*s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Amount(m) => write!(f, "{}", m),
            FieldValue::Status(s) => write!(f, "{}", s),
        }
    }
}

impl FieldValue {
    /// Coerce a loosely-typed JSON value into the field's kind
    ///
    /// Wrong types become `None` (null). Integers are accepted for `zip` and
    /// `ssn`, with the leading zeros a number cannot carry restored.
    pub fn coerce(name: FieldName, value: &serde_json::Value) -> Option<FieldValue> {
        use serde_json::Value;

        match (name.kind(), value) {
            (FieldKind::Money, v) => Money::parse_amount(v).map(FieldValue::Amount),
            (FieldKind::FilingStatus, Value::String(s)) => {
                FilingStatus::parse_loose(s).map(FieldValue::Status)
            }
            (FieldKind::Text, Value::String(s)) => Some(FieldValue::Text(s.clone())),
            (FieldKind::Text, Value::Number(n)) => {
                let digits = n.as_u64()?.to_string();
                match name {
                    FieldName::Zip if digits.len() <= 5 => Some(FieldValue::Text(format!("{:0>5}", digits))),
                    FieldName::Ssn if digits.len() <= 9 => Some(FieldValue::Text(format!("{:0>9}", digits))),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Strip an SSN down to digits; `None` unless exactly nine remain
pub fn normalize_ssn(raw: &str) -> Option<String> {
    let mut digits = String::with_capacity(9);
    for c in raw.trim().chars() {
        match c {
            '0'..='9' => digits.push(c),
            '-' | ' ' => {}
            _ => return None,
        }
    }
    (digits.len() == 9).then_some(digits)
}

/// Non-null values keyed by vocabulary field
///
/// A field that is not present is "null": not found in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldSet {
    values: BTreeMap<FieldName, FieldValue>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, rejecting kinds that do not match the field
    ///
    /// SSNs are normalized to nine digits; blank text is treated as null.
    /// Returns whether the value was stored.
    pub fn insert(&mut self, name: FieldName, value: FieldValue) -> bool {
        if value.kind() != name.kind() {
            return false;
        }

        let value = match value {
            FieldValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return false;
                }
                if name == FieldName::Ssn {
                    match normalize_ssn(trimmed) {
                        Some(ssn) => FieldValue::Text(ssn),
                        None => return false,
                    }
                } else {
                    FieldValue::Text(trimmed.to_string())
                }
            }
            FieldValue::Amount(m) if m.is_negative() => return false,
            other => other,
        };

        self.values.insert(name, value);
        true
    }

    /// Builder-style insert; invalid values are dropped
    pub fn with(mut self, name: FieldName, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: FieldName) -> Option<&FieldValue> {
        self.values.get(&name)
    }

    pub fn contains(&self, name: FieldName) -> bool {
        self.values.contains_key(&name)
    }

    /// Non-null entries in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &FieldValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build from a JSON object, keeping only vocabulary keys
    ///
    /// Unknown keys are dropped and mistyped values become null. Returns
    /// `None` if `value` is not an object.
    pub fn from_json_object(value: &serde_json::Value) -> Option<FieldSet> {
        let object = value.as_object()?;
        let mut set = FieldSet::new();
        for (key, raw) in object {
            let Some(name) = FieldName::from_key(key) else {
                continue;
            };
            if let Some(value) = FieldValue::coerce(name, raw) {
                set.insert(name, value);
            }
        }
        Some(set)
    }
}

/// Deserialized through the same coercion as model output
impl<'de> Deserialize<'de> for FieldSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        FieldSet::from_json_object(&value)
            .ok_or_else(|| serde::de::Error::custom("field set must be a JSON object"))
    }
}

// ============================================================================
// Documents and extraction outcomes
// ============================================================================

/// One uploaded document, borrowed for the duration of an extraction call
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Originating identifier (registry id or location token)
    pub id: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            mime_type: mime_type.into(),
            content,
        }
    }
}

/// Why a document produced no fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Generation capability failed (timeout, network, quota)
    Generation,
    /// Object store could not return the bytes
    Fetch,
    /// The batch was cancelled before this document finished
    Cancelled,
    /// Registry did not return the document for this owner
    NotAuthorized,
}

/// Tagged result of extracting one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// JSON found and parsed into the vocabulary
    Parsed { fields: FieldSet },
    /// Model replied, but no usable JSON object was found in the text
    Unparsed { raw_text: String, reason: String },
    /// No reply to parse
    Failed { kind: FailureKind, reason: String },
}

/// Per-document extraction result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFieldSet {
    pub document_id: String,
    pub outcome: ExtractionOutcome,
}

impl ExtractedFieldSet {
    pub fn parsed(document_id: impl Into<String>, fields: FieldSet) -> Self {
        Self {
            document_id: document_id.into(),
            outcome: ExtractionOutcome::Parsed { fields },
        }
    }

    pub fn unparsed(
        document_id: impl Into<String>,
        raw_text: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            outcome: ExtractionOutcome::Unparsed {
                raw_text: raw_text.into(),
                reason: reason.into(),
            },
        }
    }

    pub fn failed(document_id: impl Into<String>, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            outcome: ExtractionOutcome::Failed {
                kind,
                reason: reason.into(),
            },
        }
    }

    /// Parsed fields, or `None` when the set carries an error marker
    pub fn fields(&self) -> Option<&FieldSet> {
        match &self.outcome {
            ExtractionOutcome::Parsed { fields } => Some(fields),
            _ => None,
        }
    }

    /// Value of one field; null for error-marked sets
    pub fn get(&self, name: FieldName) -> Option<&FieldValue> {
        self.fields().and_then(|f| f.get(name))
    }

    /// Error marker text, if extraction did not succeed
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ExtractionOutcome::Parsed { .. } => None,
            ExtractionOutcome::Unparsed { reason, .. } => Some(reason),
            ExtractionOutcome::Failed { reason, .. } => Some(reason),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }
}

// ============================================================================
// Missing fields
// ============================================================================

/// Required fields still unanswered, in required-list order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissingFieldSet(Vec<FieldName>);

impl MissingFieldSet {
    /// Build from any iterator; output follows `FieldName::REQUIRED` order
    pub fn from_fields(fields: impl IntoIterator<Item = FieldName>) -> Self {
        let present: Vec<FieldName> = fields.into_iter().collect();
        Self(
            FieldName::REQUIRED
                .into_iter()
                .filter(|f| present.contains(f))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: FieldName) -> bool {
        self.0.contains(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[FieldName] {
        &self.0
    }

    /// Vocabulary keys, for display or events
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|f| f.as_str().to_string()).collect()
    }
}

impl fmt::Display for MissingFieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name_from_key_accepts_both_spellings() {
        assert_eq!(FieldName::from_key("capitalGains"), Some(FieldName::CapitalGains));
        assert_eq!(FieldName::from_key("capital_gains"), Some(FieldName::CapitalGains));
        assert_eq!(FieldName::from_key("FIRST_NAME"), Some(FieldName::FirstName));
        assert_eq!(FieldName::from_key("employerName"), None);
    }

    #[test]
    fn test_required_is_prefix_of_all() {
        assert_eq!(&FieldName::ALL[..12], &FieldName::REQUIRED[..]);
        assert!(!FieldName::OtherIncome.is_required());
        assert!(FieldName::CapitalGains.is_required());
    }

    #[test]
    fn test_filing_status_parse_loose() {
        assert_eq!(FilingStatus::parse_loose("married_joint"), Some(FilingStatus::MarriedJoint));
        assert_eq!(
            FilingStatus::parse_loose("Married Filing Jointly"),
            Some(FilingStatus::MarriedJoint)
        );
        assert_eq!(
            FilingStatus::parse_loose("Qualifying Widow(er)"),
            Some(FilingStatus::QualifyingWidow)
        );
        assert_eq!(FilingStatus::parse_loose("HEAD OF HOUSEHOLD"), Some(FilingStatus::HeadOfHousehold));
        assert_eq!(FilingStatus::parse_loose("divorced"), None);
    }

    #[test]
    fn test_field_set_rejects_mismatched_kinds() {
        let mut set = FieldSet::new();
        assert!(!set.insert(FieldName::Wages, FieldValue::Text("lots".into())));
        assert!(!set.insert(FieldName::City, FieldValue::Amount(Money::from_whole(1))));
        assert!(!set.insert(FieldName::Wages, FieldValue::Amount(Money::from_cents(-1))));
        assert!(!set.insert(FieldName::City, FieldValue::Text("   ".into())));
        assert!(set.is_empty());
    }

    #[test]
    fn test_field_set_normalizes_ssn() {
        let mut set = FieldSet::new();
        assert!(set.insert(FieldName::Ssn, FieldValue::Text("123-45-6789".into())));
        assert_eq!(set.get(FieldName::Ssn), Some(&FieldValue::Text("123456789".into())));

        assert!(!set.insert(FieldName::Ssn, FieldValue::Text("12345".into())));
        assert!(!set.insert(FieldName::Ssn, FieldValue::Text("XXX-XX-6789".into())));
    }

    #[test]
    fn test_coerce_restores_leading_zeros() {
        let zip = FieldValue::coerce(FieldName::Zip, &serde_json::json!(2134));
        assert_eq!(zip, Some(FieldValue::Text("02134".into())));
        let ssn = FieldValue::coerce(FieldName::Ssn, &serde_json::json!(12345678));
        assert_eq!(ssn, Some(FieldValue::Text("012345678".into())));
        assert_eq!(FieldValue::coerce(FieldName::City, &serde_json::json!(7)), None);
    }

    #[test]
    fn test_field_set_deserializes_via_coercion() {
        let set: FieldSet = serde_json::from_value(serde_json::json!({
            "firstName": "Jane",
            "zip": "90210",
            "wages": "52,000.10",
            "filing_status": "Head of Household",
            "dividends": "unknown",
            "employer": "Acme"
        }))
        .unwrap();

        assert_eq!(set.get(FieldName::Zip), Some(&FieldValue::Text("90210".into())));
        assert_eq!(
            set.get(FieldName::Wages),
            Some(&FieldValue::Amount(Money::from_cents(5_200_010)))
        );
        assert_eq!(
            set.get(FieldName::FilingStatus),
            Some(&FieldValue::Status(FilingStatus::HeadOfHousehold))
        );
        assert!(set.get(FieldName::Dividends).is_none());
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_error_marked_set_has_no_fields() {
        let set = ExtractedFieldSet::unparsed("doc-1", "no json here", "no JSON object found");
        assert!(set.is_error());
        assert!(set.fields().is_none());
        assert!(set.get(FieldName::Wages).is_none());
        assert_eq!(set.error(), Some("no JSON object found"));
    }

    #[test]
    fn test_missing_field_set_uses_canonical_order() {
        let missing = MissingFieldSet::from_fields([
            FieldName::CapitalGains,
            FieldName::Ssn,
            FieldName::OtherIncome, // not required, dropped
            FieldName::FirstName,
        ]);
        assert_eq!(
            missing.as_slice(),
            &[FieldName::FirstName, FieldName::Ssn, FieldName::CapitalGains]
        );
        assert_eq!(missing.to_string(), "firstName, ssn, capitalGains");
    }
}
