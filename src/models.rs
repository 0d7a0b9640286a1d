use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// One terminal row of a monthly report, after schema mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalRecord {
    pub terminal_id: String,
    pub equipment_code: String,
    pub active_days: u32,
    pub suspended_days: u32,
    /// Informational only; never consulted by the engine.
    pub deactivation_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminalKind {
    Gprs,
    Satellite,
}

impl TerminalKind {
    /// Satellite terminals carry 8-character codes; everything else is GPRS.
    pub fn classify(equipment_code: &str) -> Self {
        if equipment_code.trim().chars().count() == 8 {
            Self::Satellite
        } else {
            Self::Gprs
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Gprs => "GPRS",
            Self::Satellite => "SATELLITE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Full,
    Prorated,
}

impl Partition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Prorated => "prorated",
        }
    }
}

/// A terminal with its classification and charge for the period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BilledTerminal {
    pub record: TerminalRecord,
    pub kind: TerminalKind,
    pub unit_rate: Decimal,
    pub billable_days: u32,
    /// Full precision; round only for display.
    pub amount_due: Decimal,
    pub partition: Partition,
}

/// Raw report contents before schema mapping: trimmed header and data cells.
#[derive(Debug, Clone, Default)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Typed records produced from a `ReportTable`, with data-quality counters.
#[derive(Debug, Clone, Default)]
pub struct MappedReport {
    pub records: Vec<TerminalRecord>,
    pub dropped_rows: usize,
    pub degraded_rows: usize,
}

/// Summary of a billing run, ready to be written to the run log.
#[derive(Debug, Clone)]
pub struct NewBillingRun {
    pub client_name: String,
    pub period: String,
    pub source_file: String,
    pub checksum: Option<String>,
    pub days_in_month: u32,
    pub gprs_rate: Decimal,
    pub satellite_rate: Decimal,
    pub full_total: Decimal,
    pub prorated_total: Decimal,
    pub grand_total: Decimal,
    pub gprs_count: usize,
    pub satellite_count: usize,
    pub full_count: usize,
    pub prorated_count: usize,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct BillingRun {
    pub id: i64,
    pub client_name: String,
    pub period: String,
    pub source_file: String,
    pub checksum: Option<String>,
    pub days_in_month: u32,
    pub gprs_rate: Decimal,
    pub satellite_rate: Decimal,
    pub full_total: Decimal,
    pub prorated_total: Decimal,
    pub grand_total: Decimal,
    pub gprs_count: i64,
    pub satellite_count: i64,
    pub full_count: i64,
    pub prorated_count: i64,
    pub created_at: String,
}
