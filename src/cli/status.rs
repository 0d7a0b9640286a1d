use crate::cli::config::rate_label;
use crate::db;
use crate::error::Result;
use crate::fmt::money;
use crate::settings::{load_settings, settings_path};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Settings:        {}", settings_path().display());
    println!("Client:          {}", if settings.client_name.is_empty() { "(not set)" } else { settings.client_name.as_str() });
    println!("GPRS rate:       {}", rate_label(settings.gprs_rate));
    println!("Satellite rate:  {}", rate_label(settings.satellite_rate));
    println!("Run log:         {}", db_path.display());

    if db_path.exists() {
        let conn = db::open(&db_path)?;
        let runs = db::count_runs(&conn)?;
        println!();
        println!("Billing runs:    {runs}");
        if let Some(last) = db::list_runs(&conn, None, 1)?.first() {
            println!(
                "Last run:        #{} {} {} ({})",
                last.id,
                last.client_name,
                last.period,
                money(last.grand_total)
            );
        }
    } else {
        println!();
        println!("No run log yet. Use `tracbill bill --save` to record one.");
    }

    Ok(())
}
