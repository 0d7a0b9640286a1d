use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const REPORT: &str = "\
Relatorio de Terminais - Junho/2025
Terminal,Equipamento,Dias Ativos,Dias Suspensos,Data Desativação
T1,1234567,30,0,
T2,12345678,30,10,
T3,7654321,5,8,15/06/2025
,1234567,30,0,
T4,1234567,n/a,0,
";

fn tracbill(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tracbill").unwrap();
    cmd.env("HOME", home).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn setup() -> (tempfile::TempDir, PathBuf) {
    let home = tempfile::tempdir().unwrap();
    let report = home.path().join("junho.csv");
    std::fs::write(&report, REPORT).unwrap();
    (home, report)
}

fn configure(home: &Path) {
    let data_dir = home.join("data");
    tracbill(home)
        .args(["config", "set", "--gprs-rate", "80.88", "--satellite-rate", "193.80", "--header-row", "1"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("R$ 193,80"));
}

#[test]
fn bill_prints_partitions_and_totals() {
    let (home, report) = setup();
    configure(home.path());

    tracbill(home.path())
        .arg("bill")
        .arg(&report)
        .args(["--period", "2025-06"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Full Billing (1)"))
        .stdout(predicate::str::contains("Prorated Billing (3)"))
        .stdout(predicate::str::contains("R$ 129,20"))
        .stdout(predicate::str::contains("R$ 210,08"))
        .stdout(predicate::str::contains("1 rows without a terminal id were skipped"))
        .stdout(predicate::str::contains("1 rows had unreadable fields"));
}

#[test]
fn bill_without_rates_is_a_configuration_error() {
    let (home, report) = setup();

    tracbill(home.path())
        .arg("bill")
        .arg(&report)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn bill_with_zero_rate_is_rejected() {
    let (home, report) = setup();

    tracbill(home.path())
        .arg("bill")
        .arg(&report)
        .args(["--gprs-rate", "0", "--satellite-rate", "193.80"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GPRS monthly rate must be positive"));
}

#[test]
fn bill_reports_missing_columns() {
    let (home, _report) = setup();
    configure(home.path());
    let bad = home.path().join("bad.csv");
    std::fs::write(&bad, "titulo\nTerminal,Equipamento\nT1,1234567\n").unwrap();

    tracbill(home.path())
        .arg("bill")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required columns: active_days, suspended_days"));
}

#[test]
fn saved_runs_are_listed() {
    let (home, report) = setup();
    configure(home.path());

    tracbill(home.path())
        .arg("bill")
        .arg(&report)
        .args(["--period", "2025-06", "--client", "Transportes Exemplo", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded billing run #1"));

    tracbill(home.path())
        .args(["runs", "--client", "Transportes Exemplo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Billing Runs (1)"))
        .stdout(predicate::str::contains("2025-06"))
        .stdout(predicate::str::contains("R$ 210,08"));

    tracbill(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Billing runs:    1"));
}

#[test]
fn output_writes_priced_csv() {
    let (home, report) = setup();
    configure(home.path());
    let out = home.path().join("exports").join("priced.csv");

    tracbill(home.path())
        .arg("bill")
        .arg(&report)
        .args(["--days", "30", "--output"])
        .arg(&out)
        .assert()
        .success();

    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.contains("T1,1234567,GPRS,30,0,30,,full,80.88,80.88"));
    assert!(content.contains("T3,7654321,GPRS,5,8,0,2025-06-15,prorated,80.88,0.00"));
    assert!(content.contains("T4,1234567,GPRS,0,0,0,,prorated,80.88,0.00"));
}

#[cfg(feature = "xlsx")]
#[test]
fn bill_reads_workbook_reports() {
    let home = tempfile::tempdir().unwrap();
    configure(home.path());
    let workbook = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/terminais.xlsx");

    tracbill(home.path())
        .arg("bill")
        .arg(&workbook)
        .args(["--period", "2025-06"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Full Billing (1)"))
        .stdout(predicate::str::contains("Prorated Billing (1)"))
        .stdout(predicate::str::contains("15/06/2025"))
        .stdout(predicate::str::contains("R$ 210,08"));
}

#[test]
fn runs_without_log_says_so() {
    let home = tempfile::tempdir().unwrap();
    tracbill(home.path())
        .arg("runs")
        .assert()
        .success()
        .stdout(predicate::str::contains("No billing runs recorded."));
}
