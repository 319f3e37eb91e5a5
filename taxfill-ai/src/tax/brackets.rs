//! Rate tables
//!
//! One progressive schedule is applied to every filing status; only the
//! standard deduction varies by status.

use crate::money::Money;
use crate::types::FilingStatus;

/// One bracket: income above `lower` (up to `upper`) taxed at `rate_percent`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub lower: Money,
    /// `None` for the top bracket
    pub upper: Option<Money>,
    pub rate_percent: i64,
}

const fn bracket(lower: i64, upper: Option<i64>, rate_percent: i64) -> Bracket {
    Bracket {
        lower: Money::from_whole(lower),
        upper: match upper {
            Some(u) => Some(Money::from_whole(u)),
            None => None,
        },
        rate_percent,
    }
}

pub const BRACKETS: [Bracket; 7] = [
    bracket(0, Some(10_275), 10),
    bracket(10_275, Some(41_775), 12),
    bracket(41_775, Some(89_075), 22),
    bracket(89_075, Some(170_050), 24),
    bracket(170_050, Some(215_950), 32),
    bracket(215_950, Some(539_900), 35),
    bracket(539_900, None, 37),
];

pub fn standard_deduction(status: FilingStatus) -> Money {
    match status {
        FilingStatus::Single | FilingStatus::MarriedSeparate => Money::from_whole(12_950),
        FilingStatus::HeadOfHousehold => Money::from_whole(19_400),
        FilingStatus::MarriedJoint | FilingStatus::QualifyingWidow => Money::from_whole(25_900),
    }
}

/// Tax on `taxable` in units of cent-percent (1/10000 of a currency unit)
///
/// Exact: each bracket's share is an integer number of cents times an
/// integer rate.
fn tax_cent_percent(taxable: Money) -> i128 {
    let taxable = taxable.cents().max(0);
    BRACKETS
        .iter()
        .map(|b| {
            let top = b.upper.map_or(taxable, |u| taxable.min(u.cents()));
            let portion = (top - b.lower.cents()).max(0);
            i128::from(portion) * i128::from(b.rate_percent)
        })
        .sum()
}

/// Progressive tax on `taxable`, rounded to whole units half away from zero
pub fn estimated_tax(taxable: Money) -> Money {
    let whole = (tax_cent_percent(taxable) + 5_000) / 10_000;
    Money::from_whole(i64::try_from(whole).unwrap_or(i64::MAX / 100))
}

/// Unrounded tax in cents (half-cent and up rounds up)
pub fn exact_tax(taxable: Money) -> Money {
    let cents = (tax_cent_percent(taxable) + 50) / 100;
    Money::from_cents(i64::try_from(cents).unwrap_or(i64::MAX))
}
