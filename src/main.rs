mod config;
mod db;
mod error;
mod format;
mod identity;
mod models;
mod report;
mod run;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let args = run::Cli::parse();
    let config = config::Config::from_env()?.with_overrides(args.user.clone(), args.db.clone());
    init_tracing(config.log_filter());

    let db_path = config.resolve_db_path()?;
    let db = db::Database::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    let ctx = run::AppContext::new(config, db);

    Ok(run::as_cli(&args, &ctx))
}

/// Logs go to stderr so stdout stays parseable with `--json`.
/// `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
