use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::report::DuplicateBudgets;

pub(crate) const DEFAULT_LOG_FILTER: &str = "expense_tracker=info";

pub(crate) const ENV_DB: &str = "EXPENSE_TRACKER_DB";
pub(crate) const ENV_USER: &str = "EXPENSE_TRACKER_USER";
pub(crate) const ENV_LOG: &str = "EXPENSE_TRACKER_LOG";
pub(crate) const ENV_MERGE_BUDGETS: &str = "EXPENSE_TRACKER_MERGE_BUDGETS";

/// Settings for one run. Built from defaults, then the environment, then
/// command-line flags, each layer overriding the previous one.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Config {
    /// `None` means the per-user data directory.
    pub db_path: Option<PathBuf>,
    pub user: Option<String>,
    pub log_filter: Option<String>,
    pub duplicate_budgets: DuplicateBudgets,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Environment layer over the defaults. `lookup` stands in for
    /// `std::env::var` so the layering can be tested.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let duplicate_budgets = match non_blank(ENV_MERGE_BUDGETS) {
            Some(value) => parse_merge_flag(&value)
                .with_context(|| format!("Invalid {ENV_MERGE_BUDGETS} value: {value:?}"))?,
            None => DuplicateBudgets::default(),
        };

        Ok(Self {
            db_path: non_blank(ENV_DB).map(PathBuf::from),
            user: non_blank(ENV_USER),
            log_filter: non_blank(ENV_LOG),
            duplicate_budgets,
        })
    }

    /// Command-line layer. Only flags that were given override.
    pub(crate) fn with_overrides(mut self, user: Option<String>, db_path: Option<PathBuf>) -> Self {
        if user.is_some() {
            self.user = user;
        }
        if db_path.is_some() {
            self.db_path = db_path;
        }
        self
    }

    pub(crate) fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Configured database file, or `expense-tracker.db` in the data directory.
    pub(crate) fn resolve_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }
}

fn parse_merge_flag(value: &str) -> Result<DuplicateBudgets> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "merge" => Ok(DuplicateBudgets::Merge),
        "0" | "false" | "no" | "separate" => Ok(DuplicateBudgets::Separate),
        _ => anyhow::bail!("expected true/false or merge/separate"),
    }
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "expense-tracker", "ExpenseTracker")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("expense-tracker.db"))
}
