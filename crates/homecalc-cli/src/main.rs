mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::{debug, info};
use std::process;

use commands::loan::{AmortizeArgs, LoanPaymentArgs, LoanSummaryArgs};
use commands::payroll::NetPayArgs;
use commands::property::{ConstructionArgs, MortgageArgs};
use commands::savings::MoneyMarketArgs;

/// Home-buyer and household finance calculations
#[derive(Parser)]
#[command(
    name = "homecalc",
    version,
    about = "Loan, amortization, payroll and property-purchase calculations",
    long_about = "A CLI for the calculators behind a real-estate site, with decimal \
                  precision: level loan payments, amortization schedules with extra \
                  payments, Kenyan net pay, mortgage completion costs, money-market \
                  projections and construction estimates."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Level monthly payment for a fixed-rate loan
    LoanPayment(LoanPaymentArgs),
    /// Month-by-month amortization schedule, with optional extra payments
    Amortize(AmortizeArgs),
    /// Loan calculator: payment, totals and level schedule
    LoanSummary(LoanSummaryArgs),
    /// Net monthly pay after pension, income tax and levies
    NetPay(NetPayArgs),
    /// Mortgage payment and completion costs for a property purchase
    Mortgage(MortgageArgs),
    /// Money-market fund projection against a savings account
    MoneyMarket(MoneyMarketArgs),
    /// House construction cost estimate
    Construction(ConstructionArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::LoanPayment(args) => commands::loan::run_loan_payment(args),
        Commands::Amortize(args) => commands::loan::run_amortize(args),
        Commands::LoanSummary(args) => commands::loan::run_loan_summary(args),
        Commands::NetPay(args) => commands::payroll::run_net_pay(args),
        Commands::Mortgage(args) => commands::property::run_mortgage(args),
        Commands::MoneyMarket(args) => commands::savings::run_money_market(args),
        Commands::Construction(args) => commands::property::run_construction(args),
        Commands::Version => {
            println!("homecalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            if let Some(us) = value.pointer("/metadata/computation_time_us") {
                debug!("computed in {us}us");
            }
            if let Some(serde_json::Value::Array(warnings)) = value.get("warnings") {
                for w in warnings.iter().filter_map(|w| w.as_str()) {
                    info!("warning: {w}");
                }
            }
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
