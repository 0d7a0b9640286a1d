mod cache;
mod cli;
mod db;
mod engine;
mod error;
mod export;
mod fmt;
mod importer;
mod models;
mod reports;
mod schema;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::config::SettingsUpdate;
use cli::{Cli, Commands, ConfigCommands};

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Bill(args) => cli::bill::run(&args),
        Commands::Runs { client, limit } => cli::runs::list(client.as_deref(), limit),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::Set {
                gprs_rate,
                satellite_rate,
                header_row,
                data_dir,
                client,
                cache_ttl,
            } => cli::config::set(SettingsUpdate {
                gprs_rate,
                satellite_rate,
                header_row,
                data_dir,
                client,
                cache_ttl,
            }),
        },
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_level(0), "warn");
        assert_eq!(default_level(1), "info");
        assert_eq!(default_level(2), "debug");
        assert_eq!(default_level(5), "debug");
    }
}
