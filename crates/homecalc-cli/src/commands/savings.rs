use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use homecalc_core::savings::money_market::{
    self, MoneyMarketInput, DEFAULT_BENCHMARK_RATE_PCT, DEFAULT_WITHHOLDING_TAX_RATE,
};

use crate::input;

/// Arguments for the money-market fund projection
#[derive(Args)]
pub struct MoneyMarketArgs {
    /// Opening investment
    #[arg(long, default_value = "0")]
    pub initial: Decimal,

    /// Amount added every month from month two
    #[arg(long, alias = "monthly", default_value = "0")]
    pub contribution: Decimal,

    /// Fund's annual yield in percent
    #[arg(long, alias = "rate")]
    pub annual_rate: Option<Decimal>,

    /// Projection horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Withholding tax on interest (0.15 for 15%)
    #[arg(long)]
    pub withholding_tax: Option<Decimal>,

    /// Savings-account rate to compare against, in percent
    #[arg(long)]
    pub benchmark_rate: Option<Decimal>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

fn money_market_from_flags(
    args: &MoneyMarketArgs,
) -> Result<MoneyMarketInput, Box<dyn std::error::Error>> {
    Ok(MoneyMarketInput {
        initial_amount: args.initial,
        monthly_contribution: args.contribution,
        annual_rate_pct: args
            .annual_rate
            .ok_or("--annual-rate is required (or provide --input)")?,
        years: args.years.ok_or("--years is required (or provide --input)")?,
        withholding_tax_rate: args.withholding_tax.unwrap_or(DEFAULT_WITHHOLDING_TAX_RATE),
        benchmark_rate_pct: args.benchmark_rate.unwrap_or(DEFAULT_BENCHMARK_RATE_PCT),
    })
}

pub fn run_money_market(args: MoneyMarketArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mm_input: MoneyMarketInput =
        input::resolve(args.input.as_deref(), || money_market_from_flags(&args))?;

    let result = money_market::project_money_market(&mm_input)?;
    Ok(serde_json::to_value(result)?)
}
