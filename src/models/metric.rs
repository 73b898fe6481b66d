//! Journal impact metrics.

use serde::{Deserialize, Serialize};

/// Impact figure for one journal
///
/// `impact` is the journal's 2-year mean citedness, rounded to one decimal.
/// A journal that was found but has no figure keeps `impact: None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalMetric {
    /// Journal name as reported by the metadata service
    pub display_name: String,

    /// 2-year mean citedness
    pub impact: Option<f64>,
}

impl JournalMetric {
    pub fn new(display_name: impl Into<String>, impact: Option<f64>) -> Self {
        Self {
            display_name: display_name.into(),
            impact,
        }
    }

    /// Same metric with the impact rounded to one decimal place
    pub fn rounded(self) -> Self {
        Self {
            impact: self.impact.map(round_one_decimal),
            ..self
        }
    }
}

/// Round to one decimal place, ties to even
///
/// The decision is made on the exact binary value, so 4.25 (exactly
/// representable) rounds to 4.2 while 0.45 (stored slightly above) rounds
/// to 0.5.
pub fn round_one_decimal(value: f64) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }

    // |value| = mantissa * 2^exponent
    let bits = value.abs().to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    if exponent >= 0 {
        return value;
    }

    let shift = exponent.unsigned_abs();
    let tenths = if shift > 100 {
        0
    } else {
        let scaled = u128::from(mantissa) * 10;
        let quotient = scaled >> shift;
        let remainder = scaled - (quotient << shift);
        let half = 1u128 << (shift - 1);
        if remainder > half || (remainder == half && quotient % 2 == 1) {
            quotient + 1
        } else {
            quotient
        }
    };

    let rounded = tenths as f64 / 10.0;
    if value.is_sign_negative() {
        -rounded
    } else {
        rounded
    }
}
