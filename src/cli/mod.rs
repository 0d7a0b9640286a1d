pub mod bill;
pub mod config;
pub mod runs;
pub mod status;

use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::engine::days_in_month;
use crate::error::{BillingError, Result};

/// Resolve the reporting period label and month length.
///
/// `period` is `YYYY-MM`; without it the month of `today` is used. An explicit
/// `days` wins over the calendar.
pub(crate) fn resolve_period(
    period: Option<&str>,
    days: Option<u32>,
    today: NaiveDate,
) -> Result<(String, u32)> {
    let (year, month) = match period {
        Some(p) => parse_month(p).ok_or_else(|| {
            BillingError::Configuration(format!("period must be YYYY-MM, got '{p}'"))
        })?,
        None => (today.year(), today.month()),
    };
    let calendar_days = days_in_month(year, month).ok_or_else(|| {
        BillingError::Configuration(format!("invalid period {year:04}-{month:02}"))
    })?;
    let days = match days {
        Some(0) => {
            return Err(BillingError::Configuration(
                "days in month must be at least 1".to_string(),
            ))
        }
        Some(d) => d,
        None => calendar_days,
    };
    Ok((format!("{year:04}-{month:02}"), days))
}

fn parse_month(raw: &str) -> Option<(i32, u32)> {
    let (y, m) = raw.trim().split_once('-')?;
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    if (1..=12).contains(&month) {
        Some((year, month))
    } else {
        None
    }
}

#[derive(Parser)]
#[command(name = "tracbill", about = "Prorated monthly billing for vehicle-telemetry terminals.")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Price one or more terminal reports (CSV/XLSX).
    Bill(BillArgs),
    /// List recorded billing runs.
    Runs {
        /// Only runs for this client
        #[arg(long)]
        client: Option<String>,
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Show settings and run-log summary.
    Status,
}

#[derive(Args, Debug, Clone)]
pub struct BillArgs {
    /// Report files exported by the telemetry platform
    #[arg(required = true)]
    pub files: Vec<String>,
    /// Client the reports belong to
    #[arg(long)]
    pub client: Option<String>,
    /// Billing month: YYYY-MM (default: current month)
    #[arg(long)]
    pub period: Option<String>,
    /// Override the number of days in the billing month
    #[arg(long)]
    pub days: Option<u32>,
    /// Monthly rate for GPRS terminals
    #[arg(long = "gprs-rate")]
    pub gprs_rate: Option<Decimal>,
    /// Monthly rate for satellite terminals
    #[arg(long = "satellite-rate")]
    pub satellite_rate: Option<Decimal>,
    /// Non-blank rows above the header line
    #[arg(long = "header-row")]
    pub header_row: Option<usize>,
    /// Write the priced table to this CSV file (single report only)
    #[arg(long)]
    pub output: Option<String>,
    /// Record a billing run in the run log
    #[arg(long)]
    pub save: bool,
    /// Recompute every report even if identical data was already billed
    #[arg(long = "no-cache")]
    pub no_cache: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print current settings.
    Show,
    /// Update settings.
    Set {
        #[arg(long = "gprs-rate")]
        gprs_rate: Option<Decimal>,
        #[arg(long = "satellite-rate")]
        satellite_rate: Option<Decimal>,
        /// Non-blank rows above the header line
        #[arg(long = "header-row")]
        header_row: Option<usize>,
        /// Directory for the run log
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Default client name
        #[arg(long)]
        client: Option<String>,
        /// Result cache lifetime in seconds
        #[arg(long = "cache-ttl")]
        cache_ttl: Option<u64>,
    },
}
