use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::loan::amortization::{generate_amortization_schedule, AmortizationPeriod};
use crate::time_value::{level_payment, monthly_rate};
use crate::types::*;
use crate::CalcResult;

/// Input for a fixed-rate, monthly-amortizing loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanParameters {
    pub principal: Money,
    /// Annual rate as a percentage (15 = 15%)
    pub annual_interest_rate_pct: Percent,
    pub term_months: u32,
    #[serde(default)]
    pub extra_monthly_payment: Money,
}

/// Plain loan calculator output: level payment, totals, level schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub principal: Money,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub term_months: u32,
    pub schedule: Vec<AmortizationPeriod>,
}

impl LoanSummary {
    /// Copy with every displayed amount rounded to `decimal_places`.
    pub fn rounded(&self, decimal_places: u32) -> Self {
        LoanSummary {
            principal: round_for_display(self.principal, decimal_places),
            monthly_payment: round_for_display(self.monthly_payment, decimal_places),
            total_payment: round_for_display(self.total_payment, decimal_places),
            total_interest: round_for_display(self.total_interest, decimal_places),
            term_months: self.term_months,
            schedule: self
                .schedule
                .iter()
                .map(|p| p.rounded(decimal_places))
                .collect(),
        }
    }
}

/// Fixed level monthly payment for an amortizing loan.
pub fn calculate_loan_payment(
    principal: Money,
    annual_interest_rate_pct: Percent,
    term_months: u32,
) -> CalcResult<Money> {
    validate_loan_terms(principal, annual_interest_rate_pct, term_months)?;
    level_payment(principal, monthly_rate(annual_interest_rate_pct), term_months)
}

/// Loan calculator: level payment, payment × term, interest and level schedule.
///
/// Extra payments are ignored here; use `amortization::amortize` for payoff
/// acceleration.
pub fn summarize_loan(input: &LoanParameters) -> CalcResult<ComputationOutput<LoanSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let monthly_payment = calculate_loan_payment(
        input.principal,
        input.annual_interest_rate_pct,
        input.term_months,
    )?;

    if !input.extra_monthly_payment.is_zero() {
        warnings.push(
            "extra_monthly_payment is ignored by the loan summary; run the amortization schedule to see its effect"
                .into(),
        );
    }
    if input.annual_interest_rate_pct.is_zero() {
        warnings.push("Zero interest rate: payment is principal divided evenly over the term".into());
    }

    let total_payment = monthly_payment * Decimal::from(input.term_months);
    let total_interest = total_payment - input.principal;

    let schedule = generate_amortization_schedule(
        input.principal,
        input.annual_interest_rate_pct,
        input.term_months,
        Decimal::ZERO,
    )?
    .schedule;

    let output = LoanSummary {
        principal: input.principal,
        monthly_payment,
        total_payment,
        total_interest,
        term_months: input.term_months,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment annuity (reducing balance, monthly compounding)",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_interest_rate_pct": input.annual_interest_rate_pct.to_string(),
            "term_months": input.term_months,
        }),
        warnings,
        elapsed,
        output,
    ))
}

pub(crate) fn validate_loan_terms(
    principal: Money,
    annual_interest_rate_pct: Percent,
    term_months: u32,
) -> CalcResult<()> {
    if principal <= Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if annual_interest_rate_pct < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "annual_interest_rate_pct".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if term_months == 0 {
        return Err(CalcError::InvalidInput {
            field: "term_months".into(),
            reason: "Term must be at least 1 month".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_loan() -> LoanParameters {
        LoanParameters {
            principal: dec!(500000),
            annual_interest_rate_pct: dec!(15),
            term_months: 36,
            extra_monthly_payment: Decimal::ZERO,
        }
    }

    #[test]
    fn test_payment_known_answer() {
        let pmt = calculate_loan_payment(dec!(1000000), dec!(15), 60).unwrap();
        assert!((pmt - dec!(23789.93)).abs() < dec!(1), "got {pmt}");
    }

    #[test]
    fn test_zero_rate_is_exact_division() {
        let pmt = calculate_loan_payment(dec!(500000), Decimal::ZERO, 36).unwrap();
        assert_eq!(pmt, dec!(500000) / dec!(36));
    }

    #[test]
    fn test_zero_principal_rejected() {
        assert!(calculate_loan_payment(Decimal::ZERO, dec!(10), 12).is_err());
    }

    #[test]
    fn test_negative_principal_rejected() {
        assert!(calculate_loan_payment(dec!(-1), dec!(10), 12).is_err());
    }

    #[test]
    fn test_zero_term_rejected() {
        match calculate_loan_payment(dec!(1000), dec!(10), 0) {
            Err(CalcError::InvalidInput { field, .. }) => assert_eq!(field, "term_months"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_rate_rejected() {
        assert!(calculate_loan_payment(dec!(1000), dec!(-0.5), 12).is_err());
    }

    #[test]
    fn test_summary_totals() {
        let out = summarize_loan(&sample_loan()).unwrap();
        let s = &out.result;
        assert_eq!(s.total_payment, s.monthly_payment * dec!(36));
        assert_eq!(s.total_interest, s.total_payment - dec!(500000));
        assert_eq!(s.schedule.len(), 36);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_summary_warns_on_ignored_extra_payment() {
        let mut input = sample_loan();
        input.extra_monthly_payment = dec!(5000);
        let out = summarize_loan(&input).unwrap();
        assert_eq!(out.result.schedule.len(), 36);
        assert!(out.warnings.iter().any(|w| w.contains("extra_monthly_payment")));
    }

    #[test]
    fn test_summary_rounded_for_display() {
        let out = summarize_loan(&sample_loan()).unwrap();
        let rounded = out.result.rounded(0);
        assert_eq!(rounded.monthly_payment.scale(), 0);
        assert!(rounded.schedule.iter().all(|p| p.interest.scale() == 0));
    }
}
