use clap::Args;
use log::debug;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use homecalc_core::construction::estimate::{self, ConstructionInput};
use homecalc_core::mortgage::purchase::{self, MortgageInput};

use crate::input;

/// Arguments for mortgage purchase costing
#[derive(Args)]
pub struct MortgageArgs {
    /// Purchase price of the property
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Deposit in percent of the property value
    #[arg(long, alias = "deposit", default_value = "10")]
    pub down_payment: Decimal,

    /// Annual interest rate in percent
    #[arg(long, alias = "rate")]
    pub annual_rate: Option<Decimal>,

    /// Repayment period in years
    #[arg(long, alias = "years")]
    pub tenure: Option<u32>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the construction estimate
#[derive(Args)]
pub struct ConstructionArgs {
    /// Built-up floor area in square metres
    #[arg(long, alias = "area")]
    pub floor_area: Option<Decimal>,

    /// Size the house from a bedroom count (1 to 5) instead of an area
    #[arg(long)]
    pub bedrooms: Option<u32>,

    /// nairobi-central, coast, western, nyanza, eastern, rift-valley or north-eastern
    #[arg(long, default_value = "nairobi-central")]
    pub region: String,

    /// budget, standard or luxury
    #[arg(long, default_value = "standard")]
    pub standard: String,

    /// iron_sheets, clay_tiles or concrete_tiles
    #[arg(long, default_value = "iron_sheets")]
    pub roofing: String,

    /// tiles or screed
    #[arg(long, default_value = "tiles")]
    pub flooring: String,

    /// Contingency in percent of the subtotal
    #[arg(long)]
    pub contingency: Option<Decimal>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_mortgage(args: MortgageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mortgage_input: MortgageInput = input::resolve(args.input.as_deref(), || {
        Ok(MortgageInput {
            property_value: args
                .property_value
                .ok_or("--property-value is required (or provide --input)")?,
            down_payment_pct: args.down_payment,
            annual_interest_rate_pct: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            tenure_years: args.tenure.ok_or("--tenure is required (or provide --input)")?,
            fees: None,
        })
    })?;

    let result = purchase::calculate_mortgage(&mortgage_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_construction(args: ConstructionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let construction_input: ConstructionInput = input::resolve(args.input.as_deref(), || {
        // Enum flags go through serde so the CLI accepts the same names as input files
        let from_flags = json!({
            "floor_area_sqm": args.floor_area.map(|v| v.to_string()),
            "bedrooms": args.bedrooms,
            "region": args.region,
            "build_standard": args.standard,
            "roofing": args.roofing,
            "flooring": args.flooring,
            "contingency_pct": args.contingency.map(|v| v.to_string()),
        });
        serde_json::from_value(from_flags).map_err(|e| format!("Invalid option: {e}").into())
    })?;
    debug!(
        "construction: region={:?} standard={:?}",
        construction_input.region, construction_input.build_standard
    );

    let result = estimate::estimate_construction(&construction_input)?;
    Ok(serde_json::to_value(result)?)
}
