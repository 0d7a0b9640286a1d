use std::path::Path;
use std::str::FromStr;

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{BillingRun, NewBillingRun};

// Decimals are stored as TEXT so totals round-trip exactly.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS billing_runs (
    id INTEGER PRIMARY KEY,
    client_name TEXT NOT NULL,
    period TEXT NOT NULL,
    source_file TEXT NOT NULL,
    checksum TEXT,
    days_in_month INTEGER NOT NULL,
    gprs_rate TEXT NOT NULL,
    satellite_rate TEXT NOT NULL,
    full_total TEXT NOT NULL,
    prorated_total TEXT NOT NULL,
    grand_total TEXT NOT NULL,
    gprs_count INTEGER NOT NULL,
    satellite_count INTEGER NOT NULL,
    full_count INTEGER NOT NULL,
    prorated_count INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_billing_runs_client ON billing_runs (client_name, period);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Open the run log at `db_path`, creating the schema if needed.
pub fn open(db_path: &Path) -> Result<Connection> {
    let conn = get_connection(db_path)?;
    init_db(&conn)?;
    Ok(conn)
}

pub fn record_run(conn: &Connection, run: &NewBillingRun) -> Result<i64> {
    conn.execute(
        "INSERT INTO billing_runs (client_name, period, source_file, checksum, days_in_month, \
         gprs_rate, satellite_rate, full_total, prorated_total, grand_total, \
         gprs_count, satellite_count, full_count, prorated_count) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        rusqlite::params![
            run.client_name,
            run.period,
            run.source_file,
            run.checksum,
            run.days_in_month,
            run.gprs_rate.to_string(),
            run.satellite_rate.to_string(),
            run.full_total.to_string(),
            run.prorated_total.to_string(),
            run.grand_total.to_string(),
            run.gprs_count as i64,
            run.satellite_count as i64,
            run.full_count as i64,
            run.prorated_count as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn decimal_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub fn list_runs(conn: &Connection, client: Option<&str>, limit: usize) -> Result<Vec<BillingRun>> {
    let mut stmt = conn.prepare(
        "SELECT id, client_name, period, source_file, checksum, days_in_month, \
         gprs_rate, satellite_rate, full_total, prorated_total, grand_total, \
         gprs_count, satellite_count, full_count, prorated_count, created_at \
         FROM billing_runs \
         WHERE ?1 IS NULL OR client_name = ?1 \
         ORDER BY id DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(rusqlite::params![client, limit as i64], |row| {
        Ok(BillingRun {
            id: row.get(0)?,
            client_name: row.get(1)?,
            period: row.get(2)?,
            source_file: row.get(3)?,
            checksum: row.get(4)?,
            days_in_month: row.get(5)?,
            gprs_rate: decimal_column(row, 6)?,
            satellite_rate: decimal_column(row, 7)?,
            full_total: decimal_column(row, 8)?,
            prorated_total: decimal_column(row, 9)?,
            grand_total: decimal_column(row, 10)?,
            gprs_count: row.get(11)?,
            satellite_count: row.get(12)?,
            full_count: row.get(13)?,
            prorated_count: row.get(14)?,
            created_at: row.get(15)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn count_runs(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT count(*) FROM billing_runs", [], |r| r.get(0))?)
}
