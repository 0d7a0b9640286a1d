//! Billing proration engine.
//!
//! Pure computation: typed terminal records plus two monthly rates and the
//! length of the billing month in, classified and priced terminals out.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{BillingError, Result};
use crate::models::{BilledTerminal, Partition, TerminalKind, TerminalRecord};

/// Validated monthly rates. Construction fails unless both are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateConfig {
    gprs: Decimal,
    satellite: Decimal,
}

impl RateConfig {
    pub fn new(gprs: Option<Decimal>, satellite: Option<Decimal>) -> Result<Self> {
        let gprs = require_positive("GPRS", gprs)?;
        let satellite = require_positive("satellite", satellite)?;
        Ok(Self { gprs, satellite })
    }

    pub fn gprs(&self) -> Decimal {
        self.gprs
    }

    pub fn satellite(&self) -> Decimal {
        self.satellite
    }

    pub fn rate_for(&self, kind: TerminalKind) -> Decimal {
        match kind {
            TerminalKind::Gprs => self.gprs,
            TerminalKind::Satellite => self.satellite,
        }
    }
}

fn require_positive(name: &str, rate: Option<Decimal>) -> Result<Decimal> {
    match rate {
        None => Err(BillingError::Configuration(format!(
            "{name} monthly rate is not set"
        ))),
        Some(r) if r <= Decimal::ZERO => Err(BillingError::Configuration(format!(
            "{name} monthly rate must be positive, got {r}"
        ))),
        Some(r) => Ok(r),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillingResult {
    pub full: Vec<BilledTerminal>,
    pub prorated: Vec<BilledTerminal>,
    pub full_total: Decimal,
    pub prorated_total: Decimal,
    pub grand_total: Decimal,
    pub gprs_count: usize,
    pub satellite_count: usize,
    pub days_in_month: u32,
    pub rates: RateConfig,
}

impl BillingResult {
    pub fn terminal_count(&self) -> usize {
        self.full.len() + self.prorated.len()
    }

    /// Every billed terminal, full partition first.
    pub fn iter(&self) -> impl Iterator<Item = &BilledTerminal> {
        self.full.iter().chain(self.prorated.iter())
    }
}

pub fn billable_days(active_days: u32, suspended_days: u32) -> u32 {
    active_days.saturating_sub(suspended_days)
}

/// Charge for `billable_days` out of `days_in_month` at `unit_rate`.
///
/// Multiplies before dividing so a full month comes out at exactly the
/// unit rate. Fails when the product leaves the decimal range or the
/// month has no days.
pub fn prorate(unit_rate: Decimal, billable_days: u32, days_in_month: u32) -> Result<Decimal> {
    unit_rate
        .checked_mul(Decimal::from(billable_days))
        .and_then(|v| v.checked_div(Decimal::from(days_in_month)))
        .ok_or_else(|| {
            BillingError::Configuration(format!(
                "rate {unit_rate} for {billable_days} of {days_in_month} days is out of range"
            ))
        })
}

fn checked_total<'a>(terminals: impl IntoIterator<Item = &'a BilledTerminal>, label: &str) -> Result<Decimal> {
    terminals
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t.amount_due))
        .ok_or_else(|| BillingError::Other(format!("{label} total is out of range")))
}

pub fn bill_record(record: &TerminalRecord, rates: &RateConfig, days_in_month: u32) -> Result<BilledTerminal> {
    let kind = TerminalKind::classify(&record.equipment_code);
    let unit_rate = rates.rate_for(kind);
    let billable_days = billable_days(record.active_days, record.suspended_days);
    let amount_due = prorate(unit_rate, billable_days, days_in_month)?;
    let partition = if billable_days >= days_in_month {
        Partition::Full
    } else {
        Partition::Prorated
    };
    Ok(BilledTerminal {
        record: record.clone(),
        kind,
        unit_rate,
        billable_days,
        amount_due,
        partition,
    })
}

pub fn compute(
    records: &[TerminalRecord],
    rates: &RateConfig,
    days_in_month: u32,
) -> Result<BillingResult> {
    if days_in_month == 0 {
        return Err(BillingError::Configuration(
            "days in month must be at least 1".to_string(),
        ));
    }

    let mut full = Vec::new();
    let mut prorated = Vec::new();
    let mut gprs_count = 0usize;
    let mut satellite_count = 0usize;

    for record in records {
        let billed = bill_record(record, rates, days_in_month)?;
        match billed.kind {
            TerminalKind::Gprs => gprs_count += 1,
            TerminalKind::Satellite => satellite_count += 1,
        }
        match billed.partition {
            Partition::Full => full.push(billed),
            Partition::Prorated => prorated.push(billed),
        }
    }

    let full_total = checked_total(&full, "full")?;
    let prorated_total = checked_total(&prorated, "prorated")?;
    let grand_total = full_total
        .checked_add(prorated_total)
        .ok_or_else(|| BillingError::Other("grand total is out of range".to_string()))?;

    debug!(
        terminals = records.len(),
        full = full.len(),
        prorated = prorated.len(),
        days_in_month,
        "computed billing"
    );

    Ok(BillingResult {
        full,
        prorated,
        full_total,
        prorated_total,
        grand_total,
        gprs_count,
        satellite_count,
        days_in_month,
        rates: *rates,
    })
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}
