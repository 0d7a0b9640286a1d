use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::engine::BillingResult;
use crate::fmt::money;
use crate::models::{BilledTerminal, BillingRun, MappedReport};

// ---------------------------------------------------------------------------
// Pure formatting functions (billing data → String)
// ---------------------------------------------------------------------------

pub fn format_terminals(title: &str, terminals: &[BilledTerminal]) -> String {
    if terminals.is_empty() {
        return format!("{title}\nNo terminals.");
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Terminal", "Code", "Kind", "Active", "Suspended", "Billable", "Rate", "Amount", "Deactivated",
    ]);
    for t in terminals {
        let deactivated = t
            .record
            .deactivation_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&t.record.terminal_id),
            Cell::new(&t.record.equipment_code),
            Cell::new(t.kind.label()),
            Cell::new(t.record.active_days),
            Cell::new(t.record.suspended_days),
            Cell::new(t.billable_days),
            Cell::new(money(t.unit_rate)),
            Cell::new(money(t.amount_due)),
            Cell::new(deactivated),
        ]);
    }
    format!("{title} ({})\n{table}", terminals.len())
}

pub fn format_summary(result: &BillingResult, mapped: &MappedReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Item", "Value"]);
    table.add_row(vec![Cell::new("Days in month"), Cell::new(result.days_in_month)]);
    table.add_row(vec![Cell::new("GPRS rate"), Cell::new(money(result.rates.gprs()))]);
    table.add_row(vec![Cell::new("Satellite rate"), Cell::new(money(result.rates.satellite()))]);
    table.add_row(vec![Cell::new("GPRS terminals"), Cell::new(result.gprs_count)]);
    table.add_row(vec![Cell::new("Satellite terminals"), Cell::new(result.satellite_count)]);
    table.add_row(vec![
        Cell::new(format!("Full billing ({})", result.full.len())),
        Cell::new(money(result.full_total)),
    ]);
    table.add_row(vec![
        Cell::new(format!("Prorated billing ({})", result.prorated.len())),
        Cell::new(money(result.prorated_total)),
    ]);
    table.add_row(vec![
        Cell::new("TOTAL".green().bold()),
        Cell::new(money(result.grand_total)),
    ]);

    let mut out = format!("Billing Summary\n{table}");
    if mapped.dropped_rows > 0 {
        out.push_str(&format!(
            "\n{}",
            format!("{} rows without a terminal id were skipped", mapped.dropped_rows).yellow()
        ));
    }
    if mapped.degraded_rows > 0 {
        out.push_str(&format!(
            "\n{}",
            format!(
                "Warning: {} rows had unreadable fields and were billed with defaults",
                mapped.degraded_rows
            )
            .yellow()
        ));
    }
    out
}

pub fn format_runs(runs: &[BillingRun]) -> String {
    if runs.is_empty() {
        return "No billing runs recorded.".to_string();
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Client", "Period", "File", "GPRS", "Satellite", "Full", "Prorated", "Total", "Recorded",
    ]);
    for r in runs {
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(&r.client_name),
            Cell::new(&r.period),
            Cell::new(&r.source_file),
            Cell::new(r.gprs_count),
            Cell::new(r.satellite_count),
            Cell::new(money(r.full_total)),
            Cell::new(money(r.prorated_total)),
            Cell::new(money(r.grand_total)),
            Cell::new(&r.created_at),
        ]);
    }
    format!("Billing Runs ({})\n{table}", runs.len())
}
