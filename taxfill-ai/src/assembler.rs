//! Return Assembler
//!
//! Projects a computed TaxRecord into display order. No arithmetic happens
//! here; every amount is read from the record or its derived amounts.

use crate::error::AssemblyError;
use crate::money::Money;
use crate::record::TaxRecord;
use serde::Serialize;

/// Mask an SSN down to its last four digits: `***-**-1234`
pub fn mask_ssn(ssn: &str) -> String {
    let digits: Vec<char> = ssn.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return "***-**-****".to_string();
    }
    let last_four: String = digits[digits.len() - 4..].iter().collect();
    format!("***-**-{}", last_four)
}

/// One printed amount line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    /// Stable key for templates
    pub key: &'static str,
    /// Human-readable label
    pub label: &'static str,
    pub amount: Money,
}

fn item(key: &'static str, label: &'static str, amount: Money) -> LineItem {
    LineItem { key, label, amount }
}

/// Display-ready return
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderableReturn {
    pub first_name: String,
    pub last_name: String,
    pub ssn_masked: String,
    pub filing_status: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub line_items: Vec<LineItem>,
}

impl RenderableReturn {
    pub fn line(&self, key: &str) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.key == key)
    }

    pub fn estimated_tax(&self) -> Money {
        self.line("estimated_tax")
            .map(|item| item.amount)
            .unwrap_or(Money::ZERO)
    }
}

/// Build the renderable return for a computed record
pub fn assemble(record: &TaxRecord) -> Result<RenderableReturn, AssemblyError> {
    let derived = record.derived().ok_or(AssemblyError::NotComputed)?;

    let text = |value: Option<&str>| value.unwrap_or_default().to_string();

    let line_items = vec![
        item("wages", "Wages, salaries, tips", record.wages()),
        item("interest", "Taxable interest", record.interest()),
        item("dividends", "Ordinary dividends", record.dividends()),
        item("capital_gains", "Capital gain or (loss)", record.capital_gains()),
        item("other_income", "Other income", record.other_income()),
        item("total_income", "Total income", derived.total_income),
        item("adjustments", "Adjustments to income", record.adjustments()),
        item("adjusted_gross_income", "Adjusted gross income", derived.adjusted_gross_income),
        item("deduction", derived.deduction_kind.label(), derived.deduction_applied),
        item("taxable_income", "Taxable income", derived.taxable_income),
        item("estimated_tax", "Estimated tax", derived.estimated_tax),
    ];

    Ok(RenderableReturn {
        first_name: text(record.first_name()),
        last_name: text(record.last_name()),
        ssn_masked: record.ssn().map(mask_ssn).unwrap_or_default(),
        filing_status: record
            .filing_status()
            .map(|s| s.label().to_string())
            .unwrap_or_default(),
        address: text(record.address()),
        city: text(record.city()),
        state: text(record.state()),
        zip: text(record.zip()),
        line_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::compute;
    use crate::types::{FieldName, FieldSet, FieldValue, FilingStatus};

    fn computed(deductions: i64) -> TaxRecord {
        let fields = FieldSet::new()
            .with(FieldName::FirstName, FieldValue::Text("Alan".into()))
            .with(FieldName::LastName, FieldValue::Text("Turing".into()))
            .with(FieldName::Ssn, FieldValue::Text("555-12-3456".into()))
            .with(FieldName::FilingStatus, FieldValue::Status(FilingStatus::MarriedSeparate))
            .with(FieldName::Address, FieldValue::Text("7 Bletchley Rd".into()))
            .with(FieldName::City, FieldValue::Text("Princeton".into()))
            .with(FieldName::State, FieldValue::Text("NJ".into()))
            .with(FieldName::Zip, FieldValue::Text("08540".into()))
            .with(FieldName::Wages, FieldValue::Amount(Money::from_whole(50_000)))
            .with(FieldName::Interest, FieldValue::Amount(Money::from_whole(100)))
            .with(FieldName::Dividends, FieldValue::Amount(Money::ZERO))
            .with(FieldName::CapitalGains, FieldValue::Amount(Money::ZERO))
            .with(FieldName::Deductions, FieldValue::Amount(Money::from_whole(deductions)));
        compute(&TaxRecord::from_fields(&fields)).unwrap()
    }

    #[test]
    fn test_mask_ssn() {
        assert_eq!(mask_ssn("123456789"), "***-**-6789");
        assert_eq!(mask_ssn("123-45-6789"), "***-**-6789");
        assert_eq!(mask_ssn("12"), "***-**-****");
    }

    #[test]
    fn test_uncomputed_record_rejected() {
        assert_eq!(assemble(&TaxRecord::new()), Err(AssemblyError::NotComputed));
    }

    #[test]
    fn test_line_items_in_fixed_order() {
        let rendered = assemble(&computed(0)).unwrap();
        let keys: Vec<&str> = rendered.line_items.iter().map(|i| i.key).collect();
        assert_eq!(
            keys,
            [
                "wages",
                "interest",
                "dividends",
                "capital_gains",
                "other_income",
                "total_income",
                "adjustments",
                "adjusted_gross_income",
                "deduction",
                "taxable_income",
                "estimated_tax",
            ]
        );
        assert_eq!(rendered.ssn_masked, "***-**-3456");
        assert_eq!(rendered.filing_status, "Married Filing Separately");
        assert_eq!(rendered.zip, "08540");
        assert_eq!(rendered.line("deduction").unwrap().label, "Standard deduction");
    }

    #[test]
    fn test_itemized_label() {
        let rendered = assemble(&computed(20_000)).unwrap();
        let deduction = rendered.line("deduction").unwrap();
        assert_eq!(deduction.label, "Itemized deduction");
        assert_eq!(deduction.amount, Money::from_whole(20_000));
        // 50 100 - 20 000 = 30 100 taxable
        assert_eq!(rendered.line("taxable_income").unwrap().amount, Money::from_whole(30_100));
    }

    #[test]
    fn test_serialized_return_has_no_full_ssn() {
        let json = serde_json::to_string(&assemble(&computed(0)).unwrap()).unwrap();
        assert!(!json.contains("555123456"));
        assert!(json.contains("***-**-3456"));
    }
}
