use napi::Result as NapiResult;
use napi_derive::napi;

use homecalc_core::construction::estimate::{self, ConstructionInput};
use homecalc_core::loan::amortization;
use homecalc_core::loan::payment::{self, LoanParameters};
use homecalc_core::mortgage::purchase::{self, MortgageInput};
use homecalc_core::payroll::net_pay::{self, PayrollParameters};
use homecalc_core::payroll::tables::PayrollSchedule;
use homecalc_core::savings::money_market::{self, MoneyMarketInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

/// Level monthly payment only; `extra_monthly_payment` is ignored.
#[napi]
pub fn loan_payment(input_json: String) -> NapiResult<String> {
    let input: LoanParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let monthly_payment = payment::calculate_loan_payment(
        input.principal,
        input.annual_interest_rate_pct,
        input.term_months,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({ "monthly_payment": monthly_payment }))
        .map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::amortize(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn loan_summary(input_json: String) -> NapiResult<String> {
    let input: LoanParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = payment::summarize_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Payroll
// ---------------------------------------------------------------------------

#[napi]
pub fn net_salary(input_json: String) -> NapiResult<String> {
    let input: PayrollParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = net_pay::calculate_payroll(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Built-in rate table by name, for editing and passing back as `schedule`.
#[napi]
pub fn payroll_preset(name: String) -> NapiResult<String> {
    let schedule = PayrollSchedule::preset(&name)
        .ok_or_else(|| to_napi_error(format!("Unknown payroll preset '{name}'")))?;
    serde_json::to_string(&schedule).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Property and savings
// ---------------------------------------------------------------------------

#[napi]
pub fn mortgage_costs(input_json: String) -> NapiResult<String> {
    let input: MortgageInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = purchase::calculate_mortgage(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn money_market_projection(input_json: String) -> NapiResult<String> {
    let input: MoneyMarketInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = money_market::project_money_market(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn construction_estimate(input_json: String) -> NapiResult<String> {
    let input: ConstructionInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = estimate::estimate_construction(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
