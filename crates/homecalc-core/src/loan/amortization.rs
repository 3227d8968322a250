use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::loan::payment::{calculate_loan_payment, validate_loan_terms, LoanParameters};
use crate::time_value::monthly_rate;
use crate::types::*;
use crate::CalcResult;

/// Remaining balances below this fraction of the principal are swept into the
/// current period.
const BALANCE_DUST_RATIO: Decimal = dec!(0.000000000001);

/// Upper bound on the up-front schedule allocation; longer runs grow on demand.
const SCHEDULE_RESERVE_MONTHS: u32 = 1200;

/// A single month in the amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationPeriod {
    pub month: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub balance: Money,
    pub cumulative_principal: Money,
    pub cumulative_interest: Money,
}

impl AmortizationPeriod {
    pub fn rounded(&self, decimal_places: u32) -> Self {
        AmortizationPeriod {
            month: self.month,
            payment: round_for_display(self.payment, decimal_places),
            principal: round_for_display(self.principal, decimal_places),
            interest: round_for_display(self.interest, decimal_places),
            balance: round_for_display(self.balance, decimal_places),
            cumulative_principal: round_for_display(self.cumulative_principal, decimal_places),
            cumulative_interest: round_for_display(self.cumulative_interest, decimal_places),
        }
    }
}

/// Full amortization output, including savings against the no-extra baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationResult {
    pub principal: Money,
    /// Level payment before extra payments
    pub base_payment: Money,
    pub extra_payment: Money,
    /// base_payment + extra_payment
    pub effective_payment: Money,
    pub total_interest: Money,
    pub total_payment: Money,
    pub requested_term_months: u32,
    pub actual_term_months: u32,
    pub months_saved: u32,
    pub interest_saved: Money,
    pub schedule: Vec<AmortizationPeriod>,
}

impl AmortizationResult {
    /// Copy with every displayed amount rounded to `decimal_places`.
    pub fn rounded(&self, decimal_places: u32) -> Self {
        AmortizationResult {
            principal: round_for_display(self.principal, decimal_places),
            base_payment: round_for_display(self.base_payment, decimal_places),
            extra_payment: round_for_display(self.extra_payment, decimal_places),
            effective_payment: round_for_display(self.effective_payment, decimal_places),
            total_interest: round_for_display(self.total_interest, decimal_places),
            total_payment: round_for_display(self.total_payment, decimal_places),
            requested_term_months: self.requested_term_months,
            actual_term_months: self.actual_term_months,
            months_saved: self.months_saved,
            interest_saved: round_for_display(self.interest_saved, decimal_places),
            schedule: self
                .schedule
                .iter()
                .map(|p| p.rounded(decimal_places))
                .collect(),
        }
    }
}

struct ScheduleRun {
    periods: Vec<AmortizationPeriod>,
    total_principal: Money,
    total_interest: Money,
}

impl ScheduleRun {
    fn months(&self) -> u32 {
        self.periods.len() as u32
    }
}

/// Build the month-by-month reducing-balance schedule.
///
/// With a positive extra payment the schedule is also run without it, and the
/// difference in months and interest is reported as the saving.
pub fn generate_amortization_schedule(
    principal: Money,
    annual_interest_rate_pct: Percent,
    term_months: u32,
    extra_monthly_payment: Money,
) -> CalcResult<AmortizationResult> {
    validate_loan_terms(principal, annual_interest_rate_pct, term_months)?;
    if extra_monthly_payment < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "extra_monthly_payment".into(),
            reason: "Extra payment cannot be negative".into(),
        });
    }

    let base_payment = calculate_loan_payment(principal, annual_interest_rate_pct, term_months)?;
    let rate = monthly_rate(annual_interest_rate_pct);
    let effective_payment = base_payment
        .checked_add(extra_monthly_payment)
        .ok_or_else(|| CalcError::InvalidInput {
            field: "extra_monthly_payment".into(),
            reason: "Extra payment is too large".into(),
        })?;

    let run = run_schedule(principal, rate, base_payment, extra_monthly_payment, term_months)?;

    // Without the extra payment the level payment runs the full term, paying
    // base_payment * term in total.
    let (months_saved, interest_saved) = if extra_monthly_payment.is_zero() {
        (0, Decimal::ZERO)
    } else {
        let baseline_interest = base_payment
            .checked_mul(Decimal::from(term_months))
            .map(|paid| paid - principal)
            .ok_or_else(|| CalcError::InvalidInput {
                field: "term_months".into(),
                reason: "Total repayment exceeds the representable range".into(),
            })?;
        (
            term_months.saturating_sub(run.months()),
            baseline_interest - run.total_interest,
        )
    };

    Ok(AmortizationResult {
        principal,
        base_payment,
        extra_payment: extra_monthly_payment,
        effective_payment,
        total_interest: run.total_interest,
        total_payment: run.total_principal + run.total_interest,
        requested_term_months: term_months,
        actual_term_months: run.months(),
        months_saved,
        interest_saved,
        schedule: run.periods,
    })
}

/// Amortization schedule wrapped in the standard output envelope.
pub fn amortize(input: &LoanParameters) -> CalcResult<ComputationOutput<AmortizationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = generate_amortization_schedule(
        input.principal,
        input.annual_interest_rate_pct,
        input.term_months,
        input.extra_monthly_payment,
    )?;

    if input.extra_monthly_payment >= input.principal {
        warnings.push("Extra payment covers the whole principal; the loan is retired in month 1".into());
    }
    if input.term_months > 1200 {
        warnings.push(format!(
            "Term of {} months exceeds 100 years; schedule holds {} rows",
            input.term_months,
            result.schedule.len()
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Reducing-balance amortization with extra-payment payoff simulation",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_interest_rate_pct": input.annual_interest_rate_pct.to_string(),
            "term_months": input.term_months,
            "extra_monthly_payment": input.extra_monthly_payment.to_string(),
            "savings_baseline": "identical loan without extra payments",
        }),
        warnings,
        elapsed,
        result,
    ))
}

fn run_schedule(
    principal: Money,
    rate: Rate,
    base_payment: Money,
    extra: Money,
    term_months: u32,
) -> CalcResult<ScheduleRun> {
    let overflow = || CalcError::InvalidInput {
        field: "extra_monthly_payment".into(),
        reason: "Schedule amounts exceed the representable range".into(),
    };

    let mut periods = Vec::with_capacity(term_months.min(SCHEDULE_RESERVE_MONTHS) as usize);
    let dust = principal * BALANCE_DUST_RATIO;
    let mut balance = principal;
    let mut cumulative_principal = Decimal::ZERO;
    let mut cumulative_interest = Decimal::ZERO;

    for month in 1..=term_months {
        if balance <= Decimal::ZERO {
            break;
        }

        let interest = balance * rate;
        let mut principal_part = (base_payment - interest)
            .checked_add(extra)
            .ok_or_else(overflow)?;

        // Overpayment, rounding residue and the final month all retire the
        // balance; the period's payment becomes principal + interest.
        if month == term_months || balance - principal_part < dust {
            principal_part = balance;
        }

        balance = (balance - principal_part).max(Decimal::ZERO);
        cumulative_principal = cumulative_principal
            .checked_add(principal_part)
            .ok_or_else(overflow)?;
        cumulative_interest = cumulative_interest
            .checked_add(interest)
            .ok_or_else(overflow)?;

        periods.push(AmortizationPeriod {
            month,
            payment: principal_part.checked_add(interest).ok_or_else(overflow)?,
            principal: principal_part,
            interest,
            balance,
            cumulative_principal,
            cumulative_interest,
        });
    }

    Ok(ScheduleRun {
        periods,
        total_principal: cumulative_principal,
        total_interest: cumulative_interest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const EPS: Decimal = dec!(0.0000001);

    #[test]
    fn test_reference_loan() {
        let r = generate_amortization_schedule(dec!(1000000), dec!(15), 60, Decimal::ZERO).unwrap();
        assert!((r.base_payment - dec!(23789.93)).abs() < dec!(1));
        assert!((r.total_interest - dec!(427395.81)).abs() < dec!(1), "got {}", r.total_interest);
        assert_eq!(r.actual_term_months, 60);
        assert_eq!(r.months_saved, 0);
        assert_eq!(r.interest_saved, Decimal::ZERO);
        assert_eq!(r.schedule.last().unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn test_zero_rate_schedule() {
        let r = generate_amortization_schedule(dec!(500000), Decimal::ZERO, 36, Decimal::ZERO).unwrap();
        assert_eq!(r.base_payment, dec!(500000) / dec!(36));
        assert_eq!(r.total_interest, Decimal::ZERO);
        assert!(r.schedule.iter().all(|p| p.interest.is_zero()));
        assert_eq!(r.schedule.len(), 36);
        assert_eq!(r.schedule[35].balance, Decimal::ZERO);
    }

    #[test]
    fn test_single_month_term() {
        let r = generate_amortization_schedule(dec!(10000), dec!(12), 1, Decimal::ZERO).unwrap();
        assert_eq!(r.schedule.len(), 1);
        let p = &r.schedule[0];
        assert_eq!(p.principal, dec!(10000));
        assert_eq!(p.interest, dec!(10000) * dec!(0.01));
        assert_eq!(p.balance, Decimal::ZERO);
        assert_eq!(p.payment, p.principal + p.interest);
    }

    #[test]
    fn test_period_components_sum_to_payment() {
        let r = generate_amortization_schedule(dec!(250000), dec!(9.5), 48, dec!(1500)).unwrap();
        for p in &r.schedule {
            assert_eq!(p.principal + p.interest, p.payment);
        }
    }

    #[test]
    fn test_balance_strictly_decreasing() {
        let r = generate_amortization_schedule(dec!(800000), dec!(13), 120, dec!(2500)).unwrap();
        let mut prev = dec!(800000);
        for p in &r.schedule {
            assert!(p.balance < prev, "month {} balance did not fall", p.month);
            assert!(p.balance >= Decimal::ZERO);
            prev = p.balance;
        }
        assert_eq!(prev, Decimal::ZERO);
    }

    #[test]
    fn test_extra_payment_shortens_term_and_saves_interest() {
        let r = generate_amortization_schedule(dec!(1000000), dec!(15), 60, dec!(5000)).unwrap();
        assert!(r.actual_term_months < 60);
        assert_eq!(r.months_saved, 60 - r.actual_term_months);
        assert!(r.interest_saved > Decimal::ZERO);
        assert_eq!(r.effective_payment, r.base_payment + dec!(5000));
        assert_eq!(r.schedule.len() as u32, r.actual_term_months);
    }

    #[test]
    fn test_final_extra_payment_is_partial() {
        let r = generate_amortization_schedule(dec!(100000), dec!(10), 24, dec!(3000)).unwrap();
        let last = r.schedule.last().unwrap();
        assert!(last.payment < r.effective_payment);
        assert_eq!(last.payment, last.principal + last.interest);
        assert_eq!(last.balance, Decimal::ZERO);
    }

    #[test]
    fn test_extra_payment_exceeding_principal_retires_in_one_month() {
        let input = LoanParameters {
            principal: dec!(50000),
            annual_interest_rate_pct: dec!(12),
            term_months: 12,
            extra_monthly_payment: dec!(60000),
        };
        let out = amortize(&input).unwrap();
        assert_eq!(out.result.actual_term_months, 1);
        assert_eq!(out.result.months_saved, 11);
        assert_eq!(out.result.schedule[0].principal, dec!(50000));
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_totals_reconcile() {
        let r = generate_amortization_schedule(dec!(320000), dec!(11), 84, dec!(750)).unwrap();
        assert!((r.total_payment - (r.total_interest + dec!(320000))).abs() < EPS);
        let last = r.schedule.last().unwrap();
        assert_eq!(last.cumulative_interest, r.total_interest);
    }

    #[test]
    fn test_huge_term_retired_by_extra_payment() {
        let r = generate_amortization_schedule(dec!(1000), dec!(10), 1_000_000_000, dec!(1000000))
            .unwrap();
        assert_eq!(r.actual_term_months, 1);
        assert_eq!(r.schedule.len(), 1);
        assert_eq!(r.schedule[0].balance, Decimal::ZERO);
        assert_eq!(r.months_saved, 999_999_999);
    }

    #[test]
    fn test_extra_payment_at_decimal_max_is_an_error() {
        let err = generate_amortization_schedule(dec!(1000), dec!(10), 12, Decimal::MAX).unwrap_err();
        assert!(
            matches!(err, CalcError::InvalidInput { ref field, .. } if field == "extra_monthly_payment")
        );
    }

    #[test]
    fn test_tiny_principal_runs_full_term() {
        for pct in [Decimal::ZERO, dec!(10)] {
            let r = generate_amortization_schedule(dec!(0.00006), pct, 60, Decimal::ZERO).unwrap();
            assert_eq!(r.actual_term_months, 60, "rate {pct}");
            assert!(r.schedule[..59].iter().all(|p| p.balance > Decimal::ZERO));
            assert_eq!(r.schedule.last().unwrap().balance, Decimal::ZERO);
        }
    }

    #[test]
    fn test_negative_extra_payment_rejected() {
        assert!(generate_amortization_schedule(dec!(1000), dec!(5), 12, dec!(-1)).is_err());
    }

    #[test]
    fn test_rounded_copy_leaves_original_untouched() {
        let r = generate_amortization_schedule(dec!(1000000), dec!(15), 60, Decimal::ZERO).unwrap();
        let shown = r.rounded(0);
        assert_eq!(shown.base_payment, dec!(23790));
        assert_ne!(r.base_payment, shown.base_payment);
        assert_eq!(shown.schedule.len(), r.schedule.len());
    }
}
