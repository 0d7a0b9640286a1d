use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::cache::MAX_TTL;
use crate::error::{BillingError, Result};
use crate::fmt::money;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path, Settings};

pub(crate) fn rate_label(rate: Option<Decimal>) -> String {
    rate.map(money).unwrap_or_else(|| "(not set)".to_string())
}

pub fn format_settings(settings: &Settings) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec![Cell::new("Client"), Cell::new(if settings.client_name.is_empty() {
        "(not set)"
    } else {
        settings.client_name.as_str()
    })]);
    table.add_row(vec![Cell::new("GPRS rate"), Cell::new(rate_label(settings.gprs_rate))]);
    table.add_row(vec![Cell::new("Satellite rate"), Cell::new(rate_label(settings.satellite_rate))]);
    table.add_row(vec![Cell::new("Header row"), Cell::new(settings.header_row)]);
    table.add_row(vec![Cell::new("Cache TTL (s)"), Cell::new(settings.cache_ttl_secs)]);
    table.add_row(vec![Cell::new("Data dir"), Cell::new(&settings.data_dir)]);
    format!("Settings\n{table}")
}

pub fn show() -> Result<()> {
    println!("{}", format_settings(&load_settings()));
    println!("File: {}", settings_path().display());
    Ok(())
}

fn check_rate(name: &str, rate: Option<Decimal>) -> Result<Option<Decimal>> {
    match rate {
        Some(r) if r <= Decimal::ZERO => Err(BillingError::Configuration(format!(
            "{name} monthly rate must be positive, got {r}"
        ))),
        other => Ok(other),
    }
}

fn check_cache_ttl(secs: Option<u64>) -> Result<Option<u64>> {
    match secs {
        Some(t) if t > MAX_TTL.as_secs() => Err(BillingError::Configuration(format!(
            "cache TTL must be at most {} seconds, got {t}",
            MAX_TTL.as_secs()
        ))),
        other => Ok(other),
    }
}

#[derive(Debug, Default)]
pub struct SettingsUpdate {
    pub gprs_rate: Option<Decimal>,
    pub satellite_rate: Option<Decimal>,
    pub header_row: Option<usize>,
    pub data_dir: Option<String>,
    pub client: Option<String>,
    pub cache_ttl: Option<u64>,
}

pub fn apply(settings: &mut Settings, update: SettingsUpdate) -> Result<bool> {
    let gprs_rate = check_rate("GPRS", update.gprs_rate)?;
    let satellite_rate = check_rate("satellite", update.satellite_rate)?;
    let cache_ttl = check_cache_ttl(update.cache_ttl)?;
    let mut changed = false;

    if let Some(r) = gprs_rate {
        settings.gprs_rate = Some(r);
        changed = true;
    }
    if let Some(r) = satellite_rate {
        settings.satellite_rate = Some(r);
        changed = true;
    }
    if let Some(h) = update.header_row {
        settings.header_row = h;
        changed = true;
    }
    if let Some(d) = update.data_dir {
        settings.data_dir = shellexpand_path(&d);
        changed = true;
    }
    if let Some(c) = update.client {
        settings.client_name = c.trim().to_string();
        changed = true;
    }
    if let Some(t) = cache_ttl {
        settings.cache_ttl_secs = t;
        changed = true;
    }
    Ok(changed)
}

pub fn set(update: SettingsUpdate) -> Result<()> {
    let mut settings = load_settings();
    if !apply(&mut settings, update)? {
        println!("Nothing to change. See `tracbill config set --help`.");
        return Ok(());
    }
    save_settings(&settings)?;
    println!("{}", format_settings(&settings));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_apply_updates_only_given_fields() {
        let mut s = Settings::default();
        let changed = apply(&mut s, SettingsUpdate {
            gprs_rate: Some(dec!(80.88)),
            header_row: Some(4),
            ..SettingsUpdate::default()
        })
        .unwrap();
        assert!(changed);
        assert_eq!(s.gprs_rate, Some(dec!(80.88)));
        assert_eq!(s.satellite_rate, None);
        assert_eq!(s.header_row, 4);
        assert_eq!(s.cache_ttl_secs, 900);
    }

    #[test]
    fn test_apply_rejects_non_positive_rates() {
        let mut s = Settings::default();
        let err = apply(&mut s, SettingsUpdate {
            satellite_rate: Some(dec!(0)),
            ..SettingsUpdate::default()
        })
        .unwrap_err();
        assert!(matches!(err, BillingError::Configuration(_)));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_apply_rejects_oversized_cache_ttl() {
        let mut s = Settings::default();
        let err = apply(&mut s, SettingsUpdate {
            header_row: Some(2),
            cache_ttl: Some(40_000_000_000),
            ..SettingsUpdate::default()
        })
        .unwrap_err();
        assert!(matches!(err, BillingError::Configuration(_)));
        assert_eq!(s, Settings::default());

        assert!(apply(&mut s, SettingsUpdate {
            cache_ttl: Some(MAX_TTL.as_secs()),
            ..SettingsUpdate::default()
        })
        .unwrap());
    }

    #[test]
    fn test_apply_with_nothing_is_unchanged() {
        let mut s = Settings::default();
        assert!(!apply(&mut s, SettingsUpdate::default()).unwrap());
    }

    #[test]
    fn test_format_settings() {
        let s = Settings {
            gprs_rate: Some(dec!(80.88)),
            ..Settings::default()
        };
        let out = format_settings(&s);
        assert!(out.contains("R$ 80,88"));
        assert!(out.contains("(not set)"));
    }
}
