use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::loan::payment::calculate_loan_payment;
use crate::types::*;
use crate::CalcResult;

/// Transaction costs charged on a mortgaged purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageFeeSchedule {
    /// Lender processing fee, as a rate on the loan amount
    pub processing_fee_rate: Rate,
    /// Stamp duty, as a rate on the property value
    pub stamp_duty_rate: Rate,
    /// Stamp duty applies only to property values strictly above this
    pub stamp_duty_threshold: Money,
    pub legal_fee_rate: Rate,
    pub valuation_fee_rate: Rate,
}

impl Default for MortgageFeeSchedule {
    fn default() -> Self {
        MortgageFeeSchedule {
            processing_fee_rate: dec!(0.01),
            stamp_duty_rate: dec!(0.04),
            stamp_duty_threshold: dec!(1000000),
            legal_fee_rate: dec!(0.0075),
            valuation_fee_rate: dec!(0.005),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageInput {
    pub property_value: Money,
    /// Deposit as a percentage of the property value (15 = 15%)
    pub down_payment_pct: Percent,
    pub annual_interest_rate_pct: Percent,
    pub tenure_years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<MortgageFeeSchedule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageFees {
    pub processing_fee: Money,
    pub stamp_duty: Money,
    pub legal_fees: Money,
    pub valuation_fee: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageOutput {
    pub property_value: Money,
    pub down_payment: Money,
    pub loan_amount: Money,
    pub term_months: u32,
    pub monthly_payment: Money,
    /// monthly_payment × term_months
    pub total_amount: Money,
    pub total_interest: Money,
    pub fees: MortgageFees,
    pub total_fees: Money,
    /// Cash needed at completion: down payment plus fees
    pub upfront_cash: Money,
}

/// Cost a mortgaged property purchase: deposit, loan payment and completion fees.
pub fn calculate_mortgage(input: &MortgageInput) -> CalcResult<ComputationOutput<MortgageOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_mortgage_input(input)?;
    let fee_schedule = input.fees.clone().unwrap_or_default();

    let down_payment = input.property_value * input.down_payment_pct / dec!(100);
    let loan_amount = input.property_value - down_payment;
    let term_months = input
        .tenure_years
        .checked_mul(12)
        .ok_or_else(|| CalcError::InvalidInput {
            field: "tenure_years".into(),
            reason: "Tenure is too long to express in months".into(),
        })?;

    let monthly_payment =
        calculate_loan_payment(loan_amount, input.annual_interest_rate_pct, term_months)?;
    let total_amount = monthly_payment
        .checked_mul(Decimal::from(term_months))
        .ok_or_else(|| CalcError::InvalidInput {
            field: "property_value".into(),
            reason: "Total repayment exceeds the representable range".into(),
        })?;
    let total_interest = total_amount - loan_amount;

    let stamp_duty = if input.property_value > fee_schedule.stamp_duty_threshold {
        input.property_value * fee_schedule.stamp_duty_rate
    } else {
        Decimal::ZERO
    };
    let fees = MortgageFees {
        processing_fee: loan_amount * fee_schedule.processing_fee_rate,
        stamp_duty,
        legal_fees: input.property_value * fee_schedule.legal_fee_rate,
        valuation_fee: input.property_value * fee_schedule.valuation_fee_rate,
    };
    let total_fees = fees.processing_fee + fees.stamp_duty + fees.legal_fees + fees.valuation_fee;

    if input.down_payment_pct < dec!(10) {
        warnings.push(format!(
            "Down payment of {}% is below the 10% most lenders require",
            input.down_payment_pct
        ));
    }
    if input.tenure_years > 25 {
        warnings.push(format!(
            "Tenure of {} years exceeds the usual 25-year maximum",
            input.tenure_years
        ));
    }

    let output = MortgageOutput {
        property_value: input.property_value,
        down_payment,
        loan_amount,
        term_months,
        monthly_payment,
        total_amount,
        total_interest,
        fees,
        total_fees,
        upfront_cash: down_payment + total_fees,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment mortgage with completion fees",
        &serde_json::json!({
            "property_value": input.property_value.to_string(),
            "down_payment_pct": input.down_payment_pct.to_string(),
            "annual_interest_rate_pct": input.annual_interest_rate_pct.to_string(),
            "tenure_years": input.tenure_years,
            "fees": fee_schedule,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_mortgage_input(input: &MortgageInput) -> CalcResult<()> {
    if input.property_value <= Decimal::ZERO {
        return Err(CalcError::InvalidInput {
            field: "property_value".into(),
            reason: "Property value must be positive".into(),
        });
    }
    if input.down_payment_pct < Decimal::ZERO || input.down_payment_pct >= dec!(100) {
        return Err(CalcError::InvalidInput {
            field: "down_payment_pct".into(),
            reason: "Down payment must be at least 0% and below 100%".into(),
        });
    }
    if input.tenure_years == 0 {
        return Err(CalcError::InvalidInput {
            field: "tenure_years".into(),
            reason: "Tenure must be at least 1 year".into(),
        });
    }
    if let Some(fees) = &input.fees {
        let rates = [
            ("fees.processing_fee_rate", fees.processing_fee_rate),
            ("fees.stamp_duty_rate", fees.stamp_duty_rate),
            ("fees.legal_fee_rate", fees.legal_fee_rate),
            ("fees.valuation_fee_rate", fees.valuation_fee_rate),
            ("fees.stamp_duty_threshold", fees.stamp_duty_threshold),
        ];
        for (field, value) in rates {
            if value < Decimal::ZERO {
                return Err(CalcError::InvalidInput {
                    field: field.into(),
                    reason: "Fee parameters cannot be negative".into(),
                });
            }
        }
    }
    Ok(())
}
