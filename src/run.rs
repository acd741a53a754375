mod cli;

use chrono::{Local, NaiveDateTime};
use std::io::{self, Write};
use std::process::ExitCode;

use crate::config::Config;
use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::identity::{ConfiguredIdentity, IdentityProvider};
use crate::models::UserId;

pub(crate) use cli::Cli;

/// Everything a command needs, built once in `main` and passed down.
pub(crate) struct AppContext {
    pub config: Config,
    pub db: Database,
    identity: Box<dyn IdentityProvider>,
}

impl AppContext {
    pub(crate) fn new(config: Config, db: Database) -> Self {
        let identity = Box::new(ConfiguredIdentity::new(config.user.clone()));
        Self {
            config,
            db,
            identity,
        }
    }

    pub(crate) fn current_user(&self) -> Result<UserId> {
        self.identity.current_user()
    }
}

/// Run one parsed command against stdout and turn failures into an exit code.
pub(crate) fn as_cli(args: &Cli, ctx: &AppContext) -> ExitCode {
    let mut stdout = io::stdout().lock();
    match cli::dispatch(args, ctx, now(), &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, args.json, &mut stdout);
            ExitCode::from(err.exit_code())
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Internal failures are logged in full; the caller only sees the public message.
fn report_error(err: &TrackerError, json: bool, out: &mut impl Write) {
    let status = err.status_code();
    if err.is_internal() {
        tracing::error!(status, error = %err, "command failed");
    } else {
        tracing::warn!(status, error = %err, "command rejected");
    }

    let message = err.public_message();
    if json {
        let body = serde_json::json!({ "error": message });
        if let Err(write_err) = writeln!(out, "{body}") {
            tracing::warn!(error = %write_err, "failed to write error body");
        }
    } else {
        eprintln!("Error: {message}");
    }
}
