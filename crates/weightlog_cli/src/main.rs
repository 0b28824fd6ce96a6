//! Weightlog interactive CLI.
//!
//! # Responsibility
//! - Resolve configuration and start file logging.
//! - Run the interactive session over stdin/stdout against the CSV store.

mod chart;
mod config;
mod session;

use config::AppConfig;
use log::info;
use session::Session;
use std::io;
use weightlog_core::{core_version, init_logging, CsvRecordStore};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }
    info!(
        "event=cli_start module=cli status=ok core_version={} trend_scope={}",
        core_version(),
        config.trend_scope.as_str()
    );

    let store = CsvRecordStore::new(&config.data_file);
    let stdin = io::stdin();
    let stdout = io::stdout();
    Session::new(stdin.lock(), stdout.lock(), &store, config.trend_scope).run()?;
    Ok(())
}
