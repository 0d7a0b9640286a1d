use crate::db;
use crate::error::Result;
use crate::reports::format_runs;
use crate::settings::load_settings;

pub fn list(client: Option<&str>, limit: usize) -> Result<()> {
    let db_path = load_settings().db_path();
    if !db_path.exists() {
        println!("No billing runs recorded.");
        return Ok(());
    }
    let conn = db::open(&db_path)?;
    let runs = db::list_runs(&conn, client, limit)?;
    println!("{}", format_runs(&runs));
    Ok(())
}
