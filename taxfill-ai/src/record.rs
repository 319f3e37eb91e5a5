//! TaxRecord: the candidate / computed return
//!
//! A TaxRecord is a persistent value. The reconciler builds it, answers to
//! missing fields produce a new record, and the tax engine returns a new
//! record with the derived amounts filled in. Nothing mutates one in place
//! once it has been handed out.

use crate::money::Money;
use crate::types::{FieldName, FieldSet, FieldValue, FilingStatus, MissingFieldSet};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;

/// Which deduction the computation applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionKind {
    Standard,
    Itemized,
}

impl DeductionKind {
    pub fn label(self) -> &'static str {
        match self {
            DeductionKind::Standard => "Standard deduction",
            DeductionKind::Itemized => "Itemized deduction",
        }
    }
}

/// Amounts produced by the tax engine; never supplied by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedAmounts {
    pub total_income: Money,
    /// May be negative when adjustments exceed income
    pub adjusted_gross_income: Money,
    pub deduction_applied: Money,
    pub deduction_kind: DeductionKind,
    /// Never negative
    pub taxable_income: Money,
    /// Rounded to whole currency units
    pub estimated_tax: Money,
}

/// Reconciled tax return
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxRecord {
    first_name: Option<String>,
    last_name: Option<String>,
    ssn: Option<String>,
    filing_status: Option<FilingStatus>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,

    wages: Money,
    interest: Money,
    dividends: Money,
    capital_gains: Money,
    other_income: Money,
    adjustments: Money,
    deductions: Money,

    /// Money fields some document or answer actually supplied
    supplied: BTreeSet<FieldName>,

    derived: Option<DerivedAmounts>,
}

impl TaxRecord {
    /// Empty record: text fields absent, money fields 0 and unsupplied
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a single field set
    pub fn from_fields(fields: &FieldSet) -> Self {
        Self::new().with_answers(fields)
    }

    /// New record with `answers` applied on top of this one
    ///
    /// Answers are the user's word and replace existing values. Derived
    /// amounts are cleared because their inputs may have changed.
    pub fn with_answers(&self, answers: &FieldSet) -> TaxRecord {
        let mut next = self.clone();
        for (name, value) in answers.iter() {
            next.set(name, value.clone());
        }
        next.derived = None;
        next
    }

    /// Store one value; the FieldSet already guarantees kind and shape
    pub(crate) fn set(&mut self, name: FieldName, value: FieldValue) {
        match value {
            FieldValue::Text(text) => {
                let slot = match name {
                    FieldName::FirstName => &mut self.first_name,
                    FieldName::LastName => &mut self.last_name,
                    FieldName::Ssn => &mut self.ssn,
                    FieldName::Address => &mut self.address,
                    FieldName::City => &mut self.city,
                    FieldName::State => &mut self.state,
                    FieldName::Zip => &mut self.zip,
                    _ => return,
                };
                *slot = Some(text);
            }
            FieldValue::Status(status) => {
                if name == FieldName::FilingStatus {
                    self.filing_status = Some(status);
                }
            }
            FieldValue::Amount(amount) => {
                let slot = match name {
                    FieldName::Wages => &mut self.wages,
                    FieldName::Interest => &mut self.interest,
                    FieldName::Dividends => &mut self.dividends,
                    FieldName::CapitalGains => &mut self.capital_gains,
                    FieldName::OtherIncome => &mut self.other_income,
                    FieldName::Adjustments => &mut self.adjustments,
                    FieldName::Deductions => &mut self.deductions,
                    _ => return,
                };
                *slot = amount;
                self.supplied.insert(name);
            }
        }
    }

    pub(crate) fn with_derived(&self, derived: DerivedAmounts) -> TaxRecord {
        let mut next = self.clone();
        next.derived = Some(derived);
        next
    }

    /// Current value of a field; `None` means absent
    ///
    /// Money fields nobody supplied read as absent even though their
    /// numeric value defaults to 0.
    pub fn value(&self, name: FieldName) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        match name {
            FieldName::FirstName => text(&self.first_name),
            FieldName::LastName => text(&self.last_name),
            FieldName::Ssn => text(&self.ssn),
            FieldName::FilingStatus => self.filing_status.map(FieldValue::Status),
            FieldName::Address => text(&self.address),
            FieldName::City => text(&self.city),
            FieldName::State => text(&self.state),
            FieldName::Zip => text(&self.zip),
            _ => self
                .supplied
                .contains(&name)
                .then(|| FieldValue::Amount(self.amount(name))),
        }
    }

    pub fn is_present(&self, name: FieldName) -> bool {
        self.value(name).is_some()
    }

    /// Required fields still absent, canonical order
    pub fn missing_fields(&self) -> MissingFieldSet {
        MissingFieldSet::from_fields(
            FieldName::REQUIRED
                .into_iter()
                .filter(|f| !self.is_present(*f)),
        )
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Numeric value of a money field (0 when unsupplied or not money)
    pub fn amount(&self, name: FieldName) -> Money {
        match name {
            FieldName::Wages => self.wages,
            FieldName::Interest => self.interest,
            FieldName::Dividends => self.dividends,
            FieldName::CapitalGains => self.capital_gains,
            FieldName::OtherIncome => self.other_income,
            FieldName::Adjustments => self.adjustments,
            FieldName::Deductions => self.deductions,
            _ => Money::ZERO,
        }
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Full SSN; display code must mask it
    pub fn ssn(&self) -> Option<&str> {
        self.ssn.as_deref()
    }

    pub fn filing_status(&self) -> Option<FilingStatus> {
        self.filing_status
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn zip(&self) -> Option<&str> {
        self.zip.as_deref()
    }

    pub fn wages(&self) -> Money {
        self.wages
    }

    pub fn interest(&self) -> Money {
        self.interest
    }

    pub fn dividends(&self) -> Money {
        self.dividends
    }

    pub fn capital_gains(&self) -> Money {
        self.capital_gains
    }

    pub fn other_income(&self) -> Money {
        self.other_income
    }

    pub fn adjustments(&self) -> Money {
        self.adjustments
    }

    pub fn deductions(&self) -> Money {
        self.deductions
    }

    /// Derived amounts, present only after computation
    pub fn derived(&self) -> Option<&DerivedAmounts> {
        self.derived.as_ref()
    }
}

/// Wire view of a record: SSN omitted, unsupplied amounts as `null`
#[derive(Serialize)]
struct RecordView<'a> {
    first_name: Option<&'a str>,
    last_name: Option<&'a str>,
    filing_status: Option<FilingStatus>,
    address: Option<&'a str>,
    city: Option<&'a str>,
    state: Option<&'a str>,
    zip: Option<&'a str>,
    wages: Option<Money>,
    interest: Option<Money>,
    dividends: Option<Money>,
    capital_gains: Option<Money>,
    other_income: Option<Money>,
    adjustments: Option<Money>,
    deductions: Option<Money>,
    derived: Option<&'a DerivedAmounts>,
}

impl Serialize for TaxRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let supplied = |name: FieldName| {
            self.supplied.contains(&name).then(|| self.amount(name))
        };
        RecordView {
            first_name: self.first_name(),
            last_name: self.last_name(),
            filing_status: self.filing_status,
            address: self.address(),
            city: self.city(),
            state: self.state(),
            zip: self.zip(),
            wages: supplied(FieldName::Wages),
            interest: supplied(FieldName::Interest),
            dividends: supplied(FieldName::Dividends),
            capital_gains: supplied(FieldName::CapitalGains),
            other_income: supplied(FieldName::OtherIncome),
            adjustments: supplied(FieldName::Adjustments),
            deductions: supplied(FieldName::Deductions),
            derived: self.derived(),
        }
        .serialize(serializer)
    }
}
