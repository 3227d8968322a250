use clap::Args;
use log::debug;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use homecalc_core::loan::amortization;
use homecalc_core::loan::payment::{self, LoanParameters};
use homecalc_core::round_for_display;

use crate::input;

/// Arguments for the level monthly payment
#[derive(Args)]
pub struct LoanPaymentArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 15 for 15%)
    #[arg(long, alias = "rate")]
    pub annual_rate: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "months")]
    pub term: Option<u32>,

    /// Round displayed amounts to this many decimal places
    #[arg(long)]
    pub decimals: Option<u32>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long, alias = "rate")]
    pub annual_rate: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "months")]
    pub term: Option<u32>,

    /// Extra amount paid towards principal every month
    #[arg(long, default_value = "0")]
    pub extra: Decimal,

    /// Round displayed amounts to this many decimal places
    #[arg(long)]
    pub decimals: Option<u32>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the loan calculator summary
#[derive(Args)]
pub struct LoanSummaryArgs {
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long, alias = "rate")]
    pub annual_rate: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "months")]
    pub term: Option<u32>,

    /// Round displayed amounts to this many decimal places
    #[arg(long)]
    pub decimals: Option<u32>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

fn loan_from_flags(
    principal: Option<Decimal>,
    annual_rate: Option<Decimal>,
    term: Option<u32>,
    extra: Decimal,
) -> Result<LoanParameters, Box<dyn std::error::Error>> {
    Ok(LoanParameters {
        principal: principal.ok_or("--principal is required (or provide --input)")?,
        annual_interest_rate_pct: annual_rate
            .ok_or("--annual-rate is required (or provide --input)")?,
        term_months: term.ok_or("--term is required (or provide --input)")?,
        extra_monthly_payment: extra,
    })
}

pub fn run_loan_payment(args: LoanPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan: LoanParameters = input::resolve(args.input.as_deref(), || {
        loan_from_flags(args.principal, args.annual_rate, args.term, Decimal::ZERO)
    })?;
    debug!(
        "loan payment: principal={} rate={}% term={}",
        loan.principal, loan.annual_interest_rate_pct, loan.term_months
    );

    let mut monthly_payment = payment::calculate_loan_payment(
        loan.principal,
        loan.annual_interest_rate_pct,
        loan.term_months,
    )?;
    if let Some(dp) = args.decimals {
        monthly_payment = round_for_display(monthly_payment, dp);
    }

    Ok(json!({
        "result": {
            "monthly_payment": monthly_payment,
            "principal": loan.principal,
            "annual_interest_rate_pct": loan.annual_interest_rate_pct,
            "term_months": loan.term_months,
        }
    }))
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan: LoanParameters = input::resolve(args.input.as_deref(), || {
        loan_from_flags(args.principal, args.annual_rate, args.term, args.extra)
    })?;

    let mut output = amortization::amortize(&loan)?;
    debug!(
        "schedule ran {} of {} months",
        output.result.actual_term_months, output.result.requested_term_months
    );
    if let Some(dp) = args.decimals {
        output.result = output.result.rounded(dp);
    }
    Ok(serde_json::to_value(output)?)
}

pub fn run_loan_summary(args: LoanSummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan: LoanParameters = input::resolve(args.input.as_deref(), || {
        loan_from_flags(args.principal, args.annual_rate, args.term, Decimal::ZERO)
    })?;

    let mut output = payment::summarize_loan(&loan)?;
    if let Some(dp) = args.decimals {
        output.result = output.result.rounded(dp);
    }
    Ok(serde_json::to_value(output)?)
}
