use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::engine::BillingResult;
use crate::error::Result;
use crate::fmt::plain;

#[derive(Serialize)]
struct PricedRow<'a> {
    terminal_id: &'a str,
    equipment_code: &'a str,
    kind: &'static str,
    active_days: u32,
    suspended_days: u32,
    billable_days: u32,
    deactivation_date: Option<String>,
    partition: &'static str,
    unit_rate: String,
    amount_due: String,
}

/// Write every billed terminal as CSV, full partition first. Amounts are rounded to cents.
pub fn write_priced_csv<W: Write>(w: W, result: &BillingResult) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    for t in result.iter() {
        wtr.serialize(PricedRow {
            terminal_id: &t.record.terminal_id,
            equipment_code: &t.record.equipment_code,
            kind: t.kind.label(),
            active_days: t.record.active_days,
            suspended_days: t.record.suspended_days,
            billable_days: t.billable_days,
            deactivation_date: t.record.deactivation_date.map(|d| d.format("%Y-%m-%d").to_string()),
            partition: t.partition.label(),
            unit_rate: plain(t.unit_rate),
            amount_due: plain(t.amount_due),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_priced_csv(path: &Path, result: &BillingResult) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_priced_csv(std::io::BufWriter::new(file), result)
}
