use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::info;

use crate::cache::{Biller, BillingCache};
use crate::cli::{resolve_period, BillArgs};
use crate::db;
use crate::engine::{BillingResult, RateConfig};
use crate::error::{BillingError, Result};
use crate::export::export_priced_csv;
use crate::importer::{compute_checksum, read_report, source_name};
use crate::models::NewBillingRun;
use crate::reports::{format_summary, format_terminals};
use crate::schema::map_table;
use crate::settings::{load_settings, Settings};

pub fn run(args: &BillArgs) -> Result<()> {
    let settings = load_settings();
    run_with(args, &settings, chrono::Local::now().date_naive())
}

pub(crate) fn run_with(args: &BillArgs, settings: &Settings, today: chrono::NaiveDate) -> Result<()> {
    let rates = RateConfig::new(
        args.gprs_rate.or(settings.gprs_rate),
        args.satellite_rate.or(settings.satellite_rate),
    )?;
    let (period, days) = resolve_period(args.period.as_deref(), args.days, today)?;

    if args.output.is_some() && args.files.len() > 1 {
        return Err(BillingError::Other(
            "--output takes a single report; bill files one at a time to export them".to_string(),
        ));
    }

    let client = args.client.clone().unwrap_or_else(|| settings.client_name.clone());
    let conn = if args.save {
        if client.is_empty() {
            return Err(BillingError::Other(
                "--save needs a client name (--client or `tracbill config set --client`)".to_string(),
            ));
        }
        Some(db::open(&settings.db_path())?)
    } else {
        None
    };

    let header_row = args.header_row.unwrap_or(settings.header_row);
    let biller = Biller::new(BillingCache::new(settings.cache_ttl()));

    for file in &args.files {
        let path = PathBuf::from(file);
        let table = read_report(&path, header_row)?;
        let mapped = map_table(&table)?;
        if args.no_cache {
            biller.cache().clear();
        }
        let result = biller.bill(&mapped.records, &rates, days)?;
        info!(
            file = %path.display(),
            terminals = result.terminal_count(),
            grand_total = %result.grand_total,
            "billed report"
        );

        println!("{}", heading(&path, &client, &period));
        println!("{}\n", format_terminals("Full Billing", &result.full));
        println!("{}\n", format_terminals("Prorated Billing", &result.prorated));
        println!("{}", format_summary(&result, &mapped));

        if let Some(output) = &args.output {
            let out_path = PathBuf::from(output);
            export_priced_csv(&out_path, &result)?;
            println!("Wrote {}", out_path.display());
        }

        if let Some(conn) = &conn {
            let run = new_run(&client, &period, &path, &result)?;
            let id = db::record_run(conn, &run)?;
            info!(id, client = %client, period = %period, "recorded billing run");
            println!("Recorded billing run #{id}");
        }
        println!();
    }
    Ok(())
}

fn heading(path: &Path, client: &str, period: &str) -> String {
    let mut title = format!("{} \u{2014} {period}", source_name(path));
    if !client.is_empty() {
        title = format!("{client} \u{2014} {title}");
    }
    title.bold().to_string()
}

fn new_run(client: &str, period: &str, path: &Path, result: &BillingResult) -> Result<NewBillingRun> {
    Ok(NewBillingRun {
        client_name: client.to_string(),
        period: period.to_string(),
        source_file: source_name(path),
        checksum: Some(compute_checksum(path)?),
        days_in_month: result.days_in_month,
        gprs_rate: result.rates.gprs(),
        satellite_rate: result.rates.satellite(),
        full_total: result.full_total,
        prorated_total: result.prorated_total,
        grand_total: result.grand_total,
        gprs_count: result.gprs_count,
        satellite_count: result.satellite_count,
        full_count: result.full.len(),
        prorated_count: result.prorated.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const REPORT: &str = "\
Terminal,Equipamento,Dias Ativos,Dias Suspensos
T1,1234567,30,0
T2,12345678,30,10
";

    fn setup() -> (tempfile::TempDir, Settings, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("junho.csv");
        std::fs::write(&report, REPORT).unwrap();
        let settings = Settings {
            data_dir: dir.path().join("data").to_string_lossy().to_string(),
            gprs_rate: Some(dec!(80.88)),
            satellite_rate: Some(dec!(193.80)),
            ..Settings::default()
        };
        (dir, settings, report)
    }

    fn args(file: &Path) -> BillArgs {
        BillArgs {
            files: vec![file.to_string_lossy().to_string()],
            client: Some("Transportes Exemplo".to_string()),
            period: Some("2025-06".to_string()),
            days: None,
            gprs_rate: None,
            satellite_rate: None,
            header_row: None,
            output: None,
            save: false,
            no_cache: false,
        }
    }

    fn today() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
    }

    #[test]
    fn test_save_records_run() {
        let (_dir, settings, report) = setup();
        let mut a = args(&report);
        a.save = true;
        run_with(&a, &settings, today()).unwrap();

        let conn = db::open(&settings.db_path()).unwrap();
        let runs = db::list_runs(&conn, None, 10).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].client_name, "Transportes Exemplo");
        assert_eq!(runs[0].period, "2025-06");
        assert_eq!(runs[0].source_file, "junho.csv");
        assert_eq!(runs[0].grand_total, dec!(210.08));
        assert_eq!(runs[0].satellite_count, 1);
        assert_eq!(runs[0].checksum.as_ref().map(|c| c.len()), Some(64));
    }

    #[test]
    fn test_cli_rates_override_settings() {
        let (_dir, settings, report) = setup();
        let mut a = args(&report);
        a.save = true;
        a.gprs_rate = Some(dec!(60));
        run_with(&a, &settings, today()).unwrap();

        let conn = db::open(&settings.db_path()).unwrap();
        let run = &db::list_runs(&conn, None, 1).unwrap()[0];
        assert_eq!(run.gprs_rate, dec!(60));
        assert_eq!(run.full_total, dec!(60));
    }

    #[test]
    fn test_missing_rate_fails_before_reading() {
        let (dir, mut settings, _report) = setup();
        settings.satellite_rate = None;
        let a = args(&dir.path().join("does-not-exist.csv"));
        let err = run_with(&a, &settings, today()).unwrap_err();
        assert!(matches!(err, BillingError::Configuration(_)));
    }

    #[test]
    fn test_save_without_client_is_rejected() {
        let (_dir, settings, report) = setup();
        let mut a = args(&report);
        a.client = None;
        a.save = true;
        assert!(matches!(run_with(&a, &settings, today()), Err(BillingError::Other(_))));
    }

    #[test]
    fn test_output_writes_priced_csv() {
        let (dir, settings, report) = setup();
        let mut a = args(&report);
        let out = dir.path().join("priced.csv");
        a.output = Some(out.to_string_lossy().to_string());
        a.days = Some(30);
        run_with(&a, &settings, today()).unwrap();
        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.contains("T2,12345678,SATELLITE,30,10,20,,prorated,193.80,129.20"));
    }

    #[test]
    fn test_output_with_several_files_is_rejected() {
        let (dir, settings, report) = setup();
        let mut a = args(&report);
        a.files.push(a.files[0].clone());
        a.output = Some(dir.path().join("x.csv").to_string_lossy().to_string());
        assert!(run_with(&a, &settings, today()).is_err());
    }

    #[test]
    fn test_schema_error_surfaces() {
        let (dir, settings, _report) = setup();
        let bad = dir.path().join("bad.csv");
        std::fs::write(&bad, "Terminal,Equipamento\nT1,1234567\n").unwrap();
        let err = run_with(&args(&bad), &settings, today()).unwrap_err();
        assert!(matches!(err, BillingError::Schema { .. }));
    }
}
