//! Maps a raw report table onto typed `TerminalRecord`s.
//!
//! Column resolution happens once, against a fixed alias list per field.
//! Cell values that fail to parse fall back to defaults and are counted,
//! never raised.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{BillingError, Result};
use crate::models::{MappedReport, ReportTable, TerminalRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    TerminalId,
    EquipmentCode,
    ActiveDays,
    SuspendedDays,
    DeactivationDate,
}

struct ColumnSpec {
    field: Field,
    name: &'static str,
    aliases: &'static [&'static str],
    required: bool,
}

const COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        field: Field::TerminalId,
        name: "terminal_id",
        aliases: &["terminal_id", "terminal", "id terminal", "serial"],
        required: true,
    },
    ColumnSpec {
        field: Field::EquipmentCode,
        name: "equipment_code",
        aliases: &["equipment_code", "equipamento", "codigo equipamento", "código equipamento"],
        required: true,
    },
    ColumnSpec {
        field: Field::ActiveDays,
        name: "active_days",
        aliases: &["active_days", "dias ativos", "dias ativo"],
        required: true,
    },
    ColumnSpec {
        field: Field::SuspendedDays,
        name: "suspended_days",
        aliases: &["suspended_days", "dias suspensos", "dias suspenso"],
        required: true,
    },
    ColumnSpec {
        field: Field::DeactivationDate,
        name: "deactivation_date",
        aliases: &["deactivation_date", "data desativacao", "data desativação"],
        required: false,
    },
];

pub fn required_columns() -> Vec<String> {
    COLUMNS
        .iter()
        .filter(|c| c.required)
        .map(|c| c.name.to_string())
        .collect()
}

/// Resolved positions of each field in the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    terminal_id: usize,
    equipment_code: usize,
    active_days: usize,
    suspended_days: usize,
    deactivation_date: Option<usize>,
}

fn normalize_header(header: &str) -> String {
    header.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl ColumnMap {
    pub fn resolve(headers: &[String]) -> Result<Self> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let position = |spec: &ColumnSpec| {
            normalized
                .iter()
                .position(|h| spec.aliases.contains(&h.as_str()))
        };

        let mut missing = Vec::new();
        let mut found = |field: Field| -> Option<usize> {
            let spec = COLUMNS.iter().find(|c| c.field == field)?;
            let idx = position(spec);
            if idx.is_none() && spec.required {
                missing.push(spec.name.to_string());
            }
            idx
        };

        let terminal_id = found(Field::TerminalId);
        let equipment_code = found(Field::EquipmentCode);
        let active_days = found(Field::ActiveDays);
        let suspended_days = found(Field::SuspendedDays);
        let deactivation_date = found(Field::DeactivationDate);

        match (terminal_id, equipment_code, active_days, suspended_days) {
            (Some(terminal_id), Some(equipment_code), Some(active_days), Some(suspended_days)) => {
                Ok(Self {
                    terminal_id,
                    equipment_code,
                    active_days,
                    suspended_days,
                    deactivation_date,
                })
            }
            _ => Err(BillingError::Schema { missing }),
        }
    }
}

/// Parse a day count. `None` means the cell was blank, malformed or negative.
pub fn parse_days(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    // Spreadsheet exports sometimes write whole numbers as "30.0" or "30,00".
    let (whole, frac) = s.split_once(&['.', ','][..])?;
    let is_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if is_digits(whole) && is_digits(frac) && frac.bytes().all(|b| b == b'0') {
        whole.parse().ok()
    } else {
        None
    }
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.trunc() as i64))
}

/// Accepts `dd/mm/yyyy`, `yyyy-mm-dd` (optionally with a time part) and Excel serials.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return Some(d);
    }
    let date_part = s.split(&['T', ' '][..]).next().unwrap_or(s);
    if let Ok(d) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Some(d);
    }
    let serial: f64 = s.parse().ok()?;
    if serial > 0.0 && serial < 2_958_466.0 {
        excel_serial_to_date(serial)
    } else {
        None
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

pub fn map_table(table: &ReportTable) -> Result<MappedReport> {
    let columns = ColumnMap::resolve(&table.headers)?;
    debug!(?columns, rows = table.rows.len(), "resolved report columns");

    let mut report = MappedReport::default();
    for (i, row) in table.rows.iter().enumerate() {
        let terminal_id = cell(row, columns.terminal_id);
        if terminal_id.is_empty() {
            report.dropped_rows += 1;
            continue;
        }

        let mut degraded = false;
        let mut days = |idx: usize| {
            parse_days(cell(row, idx)).unwrap_or_else(|| {
                degraded = true;
                0
            })
        };
        let active_days = days(columns.active_days);
        let suspended_days = days(columns.suspended_days);

        let deactivation_date = columns.deactivation_date.and_then(|idx| {
            let raw = cell(row, idx);
            if raw.is_empty() {
                return None;
            }
            let parsed = parse_date(raw);
            if parsed.is_none() {
                degraded = true;
            }
            parsed
        });

        if degraded {
            warn!(row = i + 1, terminal = terminal_id, "row has unparseable fields, defaulted");
            report.degraded_rows += 1;
        }

        report.records.push(TerminalRecord {
            terminal_id: terminal_id.to_string(),
            equipment_code: cell(row, columns.equipment_code).to_string(),
            active_days,
            suspended_days,
            deactivation_date,
        });
    }

    Ok(report)
}
