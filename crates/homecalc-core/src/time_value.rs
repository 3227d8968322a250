use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::CalcError;
use crate::types::{Money, Percent, Rate};
use crate::CalcResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Convert an annual percentage (15 = 15%) to a monthly decimal rate.
pub fn monthly_rate(annual_rate_pct: Percent) -> Rate {
    annual_rate_pct / dec!(100) / MONTHS_PER_YEAR
}

/// Present value of 1 due in `periods` periods: (1 + r)^-n.
///
/// Computed by raising 1/(1+r) rather than dividing by (1+r)^n, so long terms
/// shrink toward zero instead of overflowing the 128-bit decimal.
pub fn discount_factor(rate: Rate, periods: u32) -> Decimal {
    let v = Decimal::ONE / (Decimal::ONE + rate);
    v.checked_powi(i64::from(periods)).unwrap_or(Decimal::ZERO)
}

/// Level payment that amortizes `principal` over `periods` at `rate` per period.
///
/// Equivalent to P·r(1+r)^n / ((1+r)^n − 1), evaluated as P·r / (1 − (1+r)^−n).
/// A zero rate, or one too small to move the discount factor off 1, falls back
/// to the limiting case P / n.
pub fn level_payment(principal: Money, rate: Rate, periods: u32) -> CalcResult<Money> {
    if periods == 0 {
        return Err(CalcError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if rate < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "rate".into(),
            reason: "Periodic rate cannot be negative".into(),
        });
    }

    let n = Decimal::from(periods);
    if rate.is_zero() {
        return Ok(principal / n);
    }

    let denominator = Decimal::ONE - discount_factor(rate, periods);
    if denominator <= Decimal::ZERO {
        return Ok(principal / n);
    }

    principal
        .checked_mul(rate)
        .and_then(|interest| interest.checked_div(denominator))
        .ok_or_else(|| CalcError::InvalidInput {
            field: "principal".into(),
            reason: "Payment exceeds the representable range".into(),
        })
}
