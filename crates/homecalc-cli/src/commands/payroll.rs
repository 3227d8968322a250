use clap::{Args, ValueEnum};
use log::{debug, info};
use rust_decimal::Decimal;
use serde_json::Value;

use homecalc_core::payroll::net_pay::{self, PayrollParameters};
use homecalc_core::payroll::tables::PayrollSchedule;

use crate::input;

/// Built-in statutory rate tables
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchedulePreset {
    /// NSSF capped at 2,160, tiered NHIF, uncapped housing levy
    #[value(name = "kenya-2025")]
    Kenya2025,
    /// Tiered NSSF, SHIF at 2.75%, five tax bands, capped housing levy
    #[value(name = "kenya-shif-2025")]
    KenyaShif2025,
}

impl SchedulePreset {
    fn schedule(self) -> PayrollSchedule {
        match self {
            SchedulePreset::Kenya2025 => PayrollSchedule::kenya_2025(),
            SchedulePreset::KenyaShif2025 => PayrollSchedule::kenya_shif_2025(),
        }
    }
}

/// Arguments for net pay
#[derive(Args)]
pub struct NetPayArgs {
    /// Gross monthly salary
    #[arg(long, alias = "salary")]
    pub gross: Option<Decimal>,

    /// Monthly voluntary pension contribution, deductible up to the schedule's cap
    #[arg(long, alias = "pension", default_value = "0")]
    pub voluntary_pension: Decimal,

    /// Built-in rate table to apply
    #[arg(long, conflicts_with = "schedule")]
    pub preset: Option<SchedulePreset>,

    /// Rate table file (.json, .yaml or .yml)
    #[arg(long)]
    pub schedule: Option<String>,

    /// Path to JSON or YAML input file (overrides --gross)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_net_pay(args: NetPayArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut params: PayrollParameters = input::resolve(args.input.as_deref(), || {
        Ok(PayrollParameters {
            gross_monthly_salary: args
                .gross
                .ok_or("--gross is required (or provide --input)")?,
            voluntary_pension_contribution: args.voluntary_pension,
            schedule: None,
        })
    })?;

    // Flags override any schedule embedded in the input
    if let Some(path) = args.schedule.as_deref() {
        let schedule: PayrollSchedule = input::file::read_input(path)?;
        info!("using rate table '{}' from {}", schedule.name, path);
        params.schedule = Some(schedule);
    } else if let Some(preset) = args.preset {
        params.schedule = Some(preset.schedule());
    }

    debug!(
        "net pay: gross={} voluntary pension={} schedule={}",
        params.gross_monthly_salary,
        params.voluntary_pension_contribution,
        params
            .schedule
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("kenya-2025")
    );

    let result = net_pay::calculate_payroll(&params)?;
    Ok(serde_json::to_value(result)?)
}
