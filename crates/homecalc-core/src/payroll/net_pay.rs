use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::payroll::tables::{PayrollSchedule, TaxBand};
use crate::types::*;
use crate::CalcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollParameters {
    pub gross_monthly_salary: Money,
    /// Personal pension contribution, deducted before tax up to the schedule's cap
    #[serde(default)]
    pub voluntary_pension_contribution: Money,
    /// Rate tables to apply; the reference Kenyan schedule when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<PayrollSchedule>,
}

/// Tax charged within a single band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTax {
    pub lower_bound: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<Money>,
    pub rate: Rate,
    pub taxable_amount: Money,
    pub tax: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollResult {
    pub gross_salary: Money,
    pub statutory_pension_deduction: Money,
    pub pension_tier_one: Money,
    pub pension_tier_two: Money,
    /// Voluntary contribution after the schedule's cap
    #[serde(default)]
    pub voluntary_pension_deduction: Money,
    pub taxable_income: Money,
    pub gross_tax_before_relief: Money,
    pub tax_by_band: Vec<BandTax>,
    pub personal_relief: Money,
    pub net_income_tax: Money,
    pub health_levy: Money,
    pub housing_levy: Money,
    pub total_deductions: Money,
    pub net_salary: Money,
    /// total_deductions / gross_salary (0 for a zero salary)
    pub effective_deduction_rate: Rate,
}

/// Net monthly pay under the reference schedule.
pub fn calculate_net_salary(gross_monthly_salary: Money) -> CalcResult<PayrollResult> {
    net_salary_with_schedule(gross_monthly_salary, &PayrollSchedule::kenya_2025())
}

/// Net monthly pay under any validated schedule.
pub fn net_salary_with_schedule(
    gross_monthly_salary: Money,
    schedule: &PayrollSchedule,
) -> CalcResult<PayrollResult> {
    net_salary_with_voluntary_pension(gross_monthly_salary, Decimal::ZERO, schedule)
}

/// Net monthly pay with a voluntary pension contribution on top of the
/// statutory one.
///
/// Order is fixed: pensions, taxable income, band tax, relief, health levy,
/// housing levy, totals. The contribution is clamped to the schedule's cap,
/// reduces taxable income (floored at zero) and is paid out of net pay.
pub fn net_salary_with_voluntary_pension(
    gross_monthly_salary: Money,
    voluntary_pension_contribution: Money,
    schedule: &PayrollSchedule,
) -> CalcResult<PayrollResult> {
    if gross_monthly_salary < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "gross_monthly_salary".into(),
            reason: "Gross salary cannot be negative".into(),
        });
    }
    if voluntary_pension_contribution < Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "voluntary_pension_contribution".into(),
            reason: "Pension contribution cannot be negative".into(),
        });
    }
    schedule.validate()?;

    let gross = gross_monthly_salary;

    let pension = schedule.pension.contribution(gross);
    let voluntary_pension = schedule.allowed_voluntary_pension(voluntary_pension_contribution);
    let taxable_income = (gross - pension.total - voluntary_pension).max(Decimal::ZERO);

    let tax_by_band = tax_bands_applied(&schedule.tax_bands, taxable_income);
    let gross_tax_before_relief: Money = tax_by_band.iter().map(|b| b.tax).sum();
    let net_income_tax = (gross_tax_before_relief - schedule.personal_relief).max(Decimal::ZERO);

    let health_levy = schedule.health_levy.fee(gross);
    let housing_levy = schedule.housing_levy.levy(gross);

    let total_deductions =
        pension.total + voluntary_pension + net_income_tax + health_levy + housing_levy;
    let net_salary = gross - total_deductions;

    let effective_deduction_rate = if gross > Decimal::ZERO {
        total_deductions / gross
    } else {
        Decimal::ZERO
    };

    Ok(PayrollResult {
        gross_salary: gross,
        statutory_pension_deduction: pension.total,
        pension_tier_one: pension.tier_one,
        pension_tier_two: pension.tier_two,
        voluntary_pension_deduction: voluntary_pension,
        taxable_income,
        gross_tax_before_relief,
        tax_by_band,
        personal_relief: schedule.personal_relief,
        net_income_tax,
        health_levy,
        housing_levy,
        total_deductions,
        net_salary,
        effective_deduction_rate,
    })
}

/// Net pay wrapped in the standard output envelope.
pub fn calculate_payroll(input: &PayrollParameters) -> CalcResult<ComputationOutput<PayrollResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = input.schedule.clone().unwrap_or_default();
    let result = net_salary_with_voluntary_pension(
        input.gross_monthly_salary,
        input.voluntary_pension_contribution,
        &schedule,
    )?;

    if result.net_salary < Decimal::ZERO {
        warnings.push(format!(
            "Deductions of {} exceed gross salary of {}; fixed levies dominate at this income",
            result.total_deductions, result.gross_salary
        ));
    }
    if result.voluntary_pension_deduction < input.voluntary_pension_contribution {
        warnings.push(format!(
            "Voluntary pension contribution of {} exceeds the deductible limit; {} applied",
            input.voluntary_pension_contribution, result.voluntary_pension_deduction
        ));
    }
    if result.gross_tax_before_relief > Decimal::ZERO && result.net_income_tax.is_zero() {
        warnings.push("Personal relief fully offsets income tax at this salary".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Progressive marginal income tax with statutory pension, health and housing levies",
        &serde_json::json!({
            "schedule": schedule.name,
            "gross_monthly_salary": input.gross_monthly_salary.to_string(),
            "voluntary_pension_contribution": input.voluntary_pension_contribution.to_string(),
            "personal_relief": schedule.personal_relief.to_string(),
            "tax_bands": schedule.tax_bands.len(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

fn tax_bands_applied(tax_bands: &[TaxBand], taxable_income: Money) -> Vec<BandTax> {
    tax_bands
        .iter()
        .filter(|band| taxable_income > band.lower_bound)
        .map(|band| {
            let top = match band.upper_bound {
                Some(upper) => taxable_income.min(upper),
                None => taxable_income,
            };
            let taxable_amount = top - band.lower_bound;
            BandTax {
                lower_bound: band.lower_bound,
                upper_bound: band.upper_bound,
                rate: band.rate,
                taxable_amount,
                tax: taxable_amount * band.rate,
            }
        })
        .collect()
}
