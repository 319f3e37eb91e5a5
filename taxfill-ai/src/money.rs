//! Money in integer minor units
//!
//! Every currency amount in the crate is a count of cents. Model output and
//! user answers are parsed digit-by-digit so binary floating point never
//! touches an amount that reaches the tax computation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Amount in cents
///
/// Signed so that AGI can go negative when adjustments exceed income.
/// Arithmetic is checked only; there are no operator impls that could wrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest amount accepted from model output or answers: one trillion units
    pub const MAX_PARSED: Money = Money(100_000_000_000_000);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Whole currency units (dollars)
    pub const fn from_whole(units: i64) -> Self {
        Money(units * 100)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn max(self, other: Money) -> Money {
        Money(self.0.max(other.0))
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    fn within_parse_bounds(self) -> bool {
        self.0.unsigned_abs() <= Money::MAX_PARSED.0.unsigned_abs()
    }

    /// Round to whole units, half away from zero
    pub fn whole_units(self) -> i64 {
        let units = self.0 / 100;
        let rem = self.0 % 100;
        if rem >= 50 {
            units + 1
        } else if rem <= -50 {
            units - 1
        } else {
            units
        }
    }

    /// Round to whole units and keep the result as Money
    pub fn round_to_whole(self) -> Money {
        Money::from_whole(self.whole_units())
    }

    /// Parse a user- or model-supplied amount
    ///
    /// Accepts JSON numbers and numeric strings such as `"$1,234.56"`.
    /// Returns `None` for negative amounts, non-numeric values and anything
    /// above [`Money::MAX_PARSED`].
    pub fn parse_amount(value: &serde_json::Value) -> Option<Money> {
        let money = match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Money(i.checked_mul(100)?)
                } else {
                    parse_decimal_str(&n.to_string())
                        .or_else(|| n.as_f64().and_then(money_from_f64))?
                }
            }
            serde_json::Value::String(s) => parse_decimal_str(s)?,
            _ => return None,
        };

        (!money.is_negative() && money.within_parse_bounds()).then_some(money)
    }
}

fn money_from_f64(f: f64) -> Option<Money> {
    if !f.is_finite() {
        return None;
    }
    let cents = (f * 100.0).round();
    if cents.abs() > i64::MAX as f64 {
        return None;
    }
    Some(Money(cents as i64))
}

/// Parse `[-]digits[.digits]` after stripping `$`, `,`, `_` and whitespace
///
/// Fractional digits beyond the second round half up on the third digit.
fn parse_decimal_str(raw: &str) -> Option<Money> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '_') && !c.is_whitespace())
        .collect();

    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    if body.is_empty() {
        return None;
    }

    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };

    let mut frac_digits = frac_part.bytes().map(|b| (b - b'0') as i64);
    let tenths = frac_digits.next().unwrap_or(0);
    let hundredths = frac_digits.next().unwrap_or(0);
    let round_up = frac_digits.next().map(|d| d >= 5).unwrap_or(false);

    let cents = whole
        .checked_mul(100)?
        .checked_add(tenths * 10 + hundredths + i64::from(round_up))?;

    Some(Money(if negative { -cents } else { cents }))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Serialized as a decimal string ("1234.50") to keep exactness on the wire
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let parsed = match &value {
            serde_json::Value::String(s) => {
                parse_decimal_str(s).filter(|m| m.within_parse_bounds())
            }
            serde_json::Value::Number(_) => Money::parse_amount(&value),
            _ => None,
        };
        parsed.ok_or_else(|| serde::de::Error::custom(format!("invalid money amount: {}", value)))
    }
}
