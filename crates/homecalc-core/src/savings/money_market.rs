use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::time_value::monthly_rate;
use crate::types::*;
use crate::CalcResult;

/// Withholding tax on fund interest when the input names none
pub const DEFAULT_WITHHOLDING_TAX_RATE: Rate = dec!(0.15);

/// Savings-account rate the fund is compared against by default
pub const DEFAULT_BENCHMARK_RATE_PCT: Percent = dec!(5);

/// Snapshots reserved up front; longer horizons grow on demand.
const SNAPSHOT_RESERVE: u32 = 101;

fn default_withholding_tax_rate() -> Rate {
    DEFAULT_WITHHOLDING_TAX_RATE
}

fn default_benchmark_rate_pct() -> Percent {
    DEFAULT_BENCHMARK_RATE_PCT
}

fn balance_overflow() -> CalcError {
    CalcError::InvalidInput {
        field: "initial_amount".into(),
        reason: "Projected balance exceeds the representable range".into(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyMarketInput {
    pub initial_amount: Money,
    /// Added at the start of every month after the first
    #[serde(default)]
    pub monthly_contribution: Money,
    pub annual_rate_pct: Percent,
    pub years: u32,
    /// Tax withheld from each month's interest (0.15 = 15%)
    #[serde(default = "default_withholding_tax_rate")]
    pub withholding_tax_rate: Rate,
    /// Savings-account rate the fund is compared against
    #[serde(default = "default_benchmark_rate_pct")]
    pub benchmark_rate_pct: Percent,
}

/// Fund position after a given month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundSnapshot {
    pub month: u32,
    pub year: u32,
    pub balance: Money,
    pub total_contributions: Money,
    pub total_interest_gross: Money,
    pub total_interest_net: Money,
    pub total_tax: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyMarketOutput {
    pub final_balance: Money,
    pub total_contributions: Money,
    pub total_interest_gross: Money,
    pub total_interest_net: Money,
    pub total_tax: Money,
    /// Net growth over contributions for the whole horizon, in percent
    pub effective_return_pct: Percent,
    /// effective_return_pct averaged per year (simple, not compounded)
    pub effective_annual_return_pct: Percent,
    /// Headline rate after withholding tax
    pub net_annual_rate_pct: Percent,
    pub snapshots: Vec<FundSnapshot>,
    pub benchmark_final_balance: Money,
    pub advantage_over_benchmark: Money,
}

/// Project a money-market fund with monthly compounding of after-tax interest.
pub fn project_money_market(
    input: &MoneyMarketInput,
) -> CalcResult<ComputationOutput<MoneyMarketOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_money_market_input(input)?;

    let months = input
        .years
        .checked_mul(12)
        .ok_or_else(|| CalcError::InvalidInput {
            field: "years".into(),
            reason: "Horizon is too long to express in months".into(),
        })?;
    let rate = monthly_rate(input.annual_rate_pct);

    let mut balance = input.initial_amount;
    let mut total_contributions = input.initial_amount;
    let mut total_interest_gross = Decimal::ZERO;
    let mut total_interest_net = Decimal::ZERO;
    let mut snapshots = Vec::with_capacity(input.years.min(SNAPSHOT_RESERVE) as usize + 1);

    for month in 1..=months {
        if month > 1 {
            balance = balance
                .checked_add(input.monthly_contribution)
                .ok_or_else(balance_overflow)?;
            total_contributions = total_contributions
                .checked_add(input.monthly_contribution)
                .ok_or_else(balance_overflow)?;
        }

        let gross_interest = balance.checked_mul(rate).ok_or_else(balance_overflow)?;
        let net_interest = gross_interest - gross_interest * input.withholding_tax_rate;

        balance = balance.checked_add(net_interest).ok_or_else(balance_overflow)?;
        total_interest_gross = total_interest_gross
            .checked_add(gross_interest)
            .ok_or_else(balance_overflow)?;
        total_interest_net += net_interest;

        if month == 1 || month % 12 == 0 {
            snapshots.push(FundSnapshot {
                month,
                year: month.div_ceil(12),
                balance,
                total_contributions,
                total_interest_gross,
                total_interest_net,
                total_tax: total_interest_gross - total_interest_net,
            });
        }
    }

    let benchmark_final_balance = benchmark_balance(input, months)?;

    let effective_return_pct = ((balance - total_contributions) / total_contributions)
        .checked_mul(dec!(100))
        .ok_or_else(balance_overflow)?;
    let effective_annual_return_pct = effective_return_pct / Decimal::from(input.years);

    if input.annual_rate_pct < input.benchmark_rate_pct {
        warnings.push(format!(
            "Fund rate of {}% is below the {}% benchmark savings rate",
            input.annual_rate_pct, input.benchmark_rate_pct
        ));
    }

    let output = MoneyMarketOutput {
        final_balance: balance,
        total_contributions,
        total_interest_gross,
        total_interest_net,
        total_tax: total_interest_gross - total_interest_net,
        effective_return_pct,
        effective_annual_return_pct,
        net_annual_rate_pct: input.annual_rate_pct * (Decimal::ONE - input.withholding_tax_rate),
        snapshots,
        benchmark_final_balance,
        advantage_over_benchmark: balance - benchmark_final_balance,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly compounding of interest net of withholding tax",
        &serde_json::json!({
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "withholding_tax_rate": input.withholding_tax_rate.to_string(),
            "benchmark_rate_pct": input.benchmark_rate_pct.to_string(),
            "contribution_timing": "start of each month after the first",
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Untaxed savings account: interest on the opening balance, then the deposit.
fn benchmark_balance(input: &MoneyMarketInput, months: u32) -> CalcResult<Money> {
    let rate = monthly_rate(input.benchmark_rate_pct);
    let mut balance = input.initial_amount;
    for month in 1..=months {
        balance = balance
            .checked_mul(rate)
            .and_then(|interest| balance.checked_add(interest))
            .ok_or_else(balance_overflow)?;
        if month > 1 {
            balance = balance
                .checked_add(input.monthly_contribution)
                .ok_or_else(balance_overflow)?;
        }
    }
    Ok(balance)
}

fn validate_money_market_input(input: &MoneyMarketInput) -> CalcResult<()> {
    if input.initial_amount < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "initial_amount".into(),
            reason: "Initial amount cannot be negative".into(),
        });
    }
    if input.monthly_contribution < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "monthly_contribution".into(),
            reason: "Monthly contribution cannot be negative".into(),
        });
    }
    if input.initial_amount.is_zero() && input.monthly_contribution.is_zero() {
        return Err(CalcError::InvalidInput {
            field: "initial_amount".into(),
            reason: "Either an initial amount or a monthly contribution is required".into(),
        });
    }
    if input.annual_rate_pct < Decimal::ZERO || input.benchmark_rate_pct < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason: "Rates cannot be negative".into(),
        });
    }
    if input.years == 0 {
        return Err(CalcError::InvalidInput {
            field: "years".into(),
            reason: "Horizon must be at least 1 year".into(),
        });
    }
    if input.withholding_tax_rate < Decimal::ZERO || input.withholding_tax_rate > Decimal::ONE {
        return Err(CalcError::InvalidInput {
            field: "withholding_tax_rate".into(),
            reason: "Withholding tax rate must be between 0 and 1".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lump_sum() -> MoneyMarketInput {
        MoneyMarketInput {
            initial_amount: dec!(100000),
            monthly_contribution: Decimal::ZERO,
            annual_rate_pct: dec!(12),
            years: 1,
            withholding_tax_rate: Decimal::ZERO,
            benchmark_rate_pct: dec!(5),
        }
    }

    #[test]
    fn test_lump_sum_compounds_monthly() {
        let out = project_money_market(&lump_sum()).unwrap().result;
        // 100,000 × 1.01^12
        assert!((out.final_balance - dec!(112682.50)).abs() < dec!(0.01));
        assert_eq!(out.total_tax, Decimal::ZERO);
        assert_eq!(out.total_contributions, dec!(100000));
    }

    #[test]
    fn test_benchmark_comparison() {
        let out = project_money_market(&lump_sum()).unwrap().result;
        assert!((out.benchmark_final_balance - dec!(105116.19)).abs() < dec!(0.01));
        assert!(out.advantage_over_benchmark > Decimal::ZERO);
    }

    #[test]
    fn test_withholding_tax_reduces_growth() {
        let mut input = lump_sum();
        input.withholding_tax_rate = dec!(0.15);
        let out = project_money_market(&input).unwrap().result;
        // Net monthly rate 0.85%
        assert!((out.final_balance - dec!(110690.62)).abs() < dec!(0.01), "got {}", out.final_balance);
        assert_eq!(out.total_tax, out.total_interest_gross - out.total_interest_net);
        assert_eq!(out.net_annual_rate_pct, dec!(10.2));
    }

    #[test]
    fn test_contributions_start_in_month_two() {
        let input = MoneyMarketInput {
            initial_amount: dec!(100000),
            monthly_contribution: dec!(10000),
            annual_rate_pct: dec!(13.5),
            years: 5,
            withholding_tax_rate: dec!(0.15),
            benchmark_rate_pct: dec!(5),
        };
        let out = project_money_market(&input).unwrap().result;
        assert_eq!(out.total_contributions, dec!(100000) + dec!(10000) * dec!(59));
        assert!(out.final_balance > out.total_contributions);
    }

    #[test]
    fn test_snapshot_months() {
        let mut input = lump_sum();
        input.years = 3;
        let out = project_money_market(&input).unwrap().result;
        let months: Vec<u32> = out.snapshots.iter().map(|s| s.month).collect();
        assert_eq!(months, vec![1, 12, 24, 36]);
        let years: Vec<u32> = out.snapshots.iter().map(|s| s.year).collect();
        assert_eq!(years, vec![1, 1, 2, 3]);
    }

    #[test]
    fn test_low_rate_warns() {
        let mut input = lump_sum();
        input.annual_rate_pct = dec!(3);
        let out = project_money_market(&input).unwrap();
        assert!(out.result.advantage_over_benchmark < Decimal::ZERO);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_empty_investment_rejected() {
        let mut input = lump_sum();
        input.initial_amount = Decimal::ZERO;
        assert!(project_money_market(&input).is_err());
    }

    #[test]
    fn test_zero_years_rejected() {
        let mut input = lump_sum();
        input.years = 0;
        assert!(project_money_market(&input).is_err());
    }

    #[test]
    fn test_horizon_overflowing_months_rejected() {
        let mut input = lump_sum();
        input.years = u32::MAX;
        let err = project_money_market(&input).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { ref field, .. } if field == "years"));
    }

    #[test]
    fn test_balance_beyond_decimal_range_is_an_error() {
        let mut input = lump_sum();
        input.initial_amount = Decimal::MAX / dec!(2);
        input.annual_rate_pct = dec!(1200);
        assert!(matches!(
            project_money_market(&input),
            Err(CalcError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_defaults_from_json() {
        let input: MoneyMarketInput = serde_json::from_str(
            r#"{"initial_amount": "50000", "annual_rate_pct": "10", "years": 2}"#,
        )
        .unwrap();
        assert_eq!(input.withholding_tax_rate, DEFAULT_WITHHOLDING_TAX_RATE);
        assert_eq!(input.benchmark_rate_pct, DEFAULT_BENCHMARK_RATE_PCT);
        assert_eq!(DEFAULT_WITHHOLDING_TAX_RATE, dec!(0.15));
        assert_eq!(DEFAULT_BENCHMARK_RATE_PCT, dec!(5));
        assert_eq!(input.monthly_contribution, Decimal::ZERO);
    }
}
