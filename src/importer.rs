use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{BillingError, Result};
use crate::models::ReportTable;
use crate::schema::required_columns;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

pub fn source_name(file_path: &Path) -> String {
    file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string()
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Split non-blank rows into header and data, the header sitting at `header_row`.
fn into_table(rows: Vec<Vec<String>>, header_row: usize) -> Result<ReportTable> {
    let mut rows = rows.into_iter().filter(|r| !is_blank(r));
    let Some(headers) = rows.nth(header_row) else {
        return Err(BillingError::Schema {
            missing: required_columns(),
        });
    };
    Ok(ReportTable {
        headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
        rows: rows
            .map(|r| r.into_iter().map(|c| c.trim().to_string()).collect())
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// Report kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportFormat {
    Csv,
    #[cfg(feature = "xlsx")]
    Workbook,
}

impl ReportFormat {
    pub fn detect(file_path: &Path) -> Result<Self> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            #[cfg(feature = "xlsx")]
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Workbook),
            #[cfg(not(feature = "xlsx"))]
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Err(BillingError::Other(format!(
                "Spreadsheet support is not enabled; export {} as CSV",
                file_path.display()
            ))),
            _ => Ok(Self::Csv),
        }
    }

    pub fn read(&self, file_path: &Path, header_row: usize) -> Result<ReportTable> {
        match self {
            Self::Csv => read_csv(file_path, header_row),
            #[cfg(feature = "xlsx")]
            Self::Workbook => read_workbook(file_path, header_row),
        }
    }
}

pub fn read_report(file_path: &Path, header_row: usize) -> Result<ReportTable> {
    let format = ReportFormat::detect(file_path)?;
    let table = format.read(file_path, header_row)?;
    debug!(
        file = %file_path.display(),
        ?format,
        columns = table.headers.len(),
        rows = table.rows.len(),
        "read report"
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV reports
// ---------------------------------------------------------------------------

fn detect_delimiter(content: &str, header_row: usize) -> u8 {
    let line = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .nth(header_row)
        .unwrap_or("");
    if line.matches(';').count() > line.matches(',').count() {
        b';'
    } else {
        b','
    }
}

fn read_csv(file_path: &Path, header_row: usize) -> Result<ReportTable> {
    let content = std::fs::read_to_string(file_path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(detect_delimiter(content, header_row))
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    into_table(rows, header_row)
}

// ---------------------------------------------------------------------------
// Workbook reports (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) => s.clone(),
        _ => String::new(),
    }
}

#[cfg(feature = "xlsx")]
fn read_workbook(file_path: &Path, header_row: usize) -> Result<ReportTable> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| BillingError::Spreadsheet(format!("Failed to open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| BillingError::Spreadsheet("Workbook has no sheets".to_string()))?
        .map_err(|e| BillingError::Spreadsheet(format!("Failed to read first sheet: {e}")))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    into_table(rows, header_row)
}
