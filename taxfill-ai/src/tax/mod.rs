//! Tax Computation Engine
//!
//! Pure, deterministic: a complete TaxRecord in, the same record with its
//! derived amounts out. All arithmetic is in integer cents.
//!
//! ```text
//! total_income   = wages + interest + dividends + capital_gains + other_income
//! AGI            = total_income - adjustments          (may be negative)
//! deduction      = deductions if > 0, else standard deduction for status
//! taxable_income = max(0, AGI - deduction)
//! estimated_tax  = progressive brackets, rounded to whole units
//! ```

pub mod brackets;

use crate::error::ComputationError;
use crate::money::Money;
use crate::record::{DeductionKind, DerivedAmounts, TaxRecord};
use crate::types::FilingStatus;
use tracing::debug;

pub use brackets::{estimated_tax, standard_deduction, Bracket, BRACKETS};

/// Compute derived amounts for a complete record
///
/// Fails with `MissingFields` if any required field is absent and with
/// `AmountOverflow` if the inputs are too large to sum in cents. Running it
/// again on its own output yields an identical record.
pub fn compute(record: &TaxRecord) -> Result<TaxRecord, ComputationError> {
    let missing = record.missing_fields();
    if !missing.is_empty() {
        return Err(ComputationError::MissingFields(missing));
    }

    // Presence of filing status is guaranteed by the missing-field check
    let status = record.filing_status().unwrap_or(FilingStatus::Single);
    let derived = derive(record, status)?;

    debug!(
        filing_status = %status,
        deduction_kind = ?derived.deduction_kind,
        taxable_income = %derived.taxable_income,
        estimated_tax = %derived.estimated_tax,
        "Computed return"
    );

    Ok(record.with_derived(derived))
}

fn derive(record: &TaxRecord, status: FilingStatus) -> Result<DerivedAmounts, ComputationError> {
    let total_income = [
        record.wages(),
        record.interest(),
        record.dividends(),
        record.capital_gains(),
        record.other_income(),
    ]
    .into_iter()
    .try_fold(Money::ZERO, Money::checked_add)
    .ok_or(ComputationError::AmountOverflow("total income"))?;

    let adjusted_gross_income = total_income
        .checked_sub(record.adjustments())
        .ok_or(ComputationError::AmountOverflow("adjusted gross income"))?;

    let (deduction_applied, deduction_kind) = if record.deductions() > Money::ZERO {
        (record.deductions(), DeductionKind::Itemized)
    } else {
        (standard_deduction(status), DeductionKind::Standard)
    };

    let taxable_income = adjusted_gross_income
        .checked_sub(deduction_applied)
        .ok_or(ComputationError::AmountOverflow("taxable income"))?
        .max(Money::ZERO);

    Ok(DerivedAmounts {
        total_income,
        adjusted_gross_income,
        deduction_applied,
        deduction_kind,
        taxable_income,
        estimated_tax: estimated_tax(taxable_income),
    })
}
