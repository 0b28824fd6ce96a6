//! Runtime configuration resolved from environment variables.
//!
//! The CLI takes no flags; every knob has a default that works from the
//! current directory.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use weightlog_core::{default_log_level, LogLevel, TrendScope};

pub const DATA_FILE_VAR: &str = "WEIGHTLOG_DATA_FILE";
pub const LOG_DIR_VAR: &str = "WEIGHTLOG_LOG_DIR";
pub const LOG_LEVEL_VAR: &str = "WEIGHTLOG_LOG_LEVEL";
pub const TREND_SCOPE_VAR: &str = "WEIGHTLOG_TREND_SCOPE";

const DEFAULT_DATA_FILE: &str = "projeto_peso.csv";
const DEFAULT_LOG_SUBDIR: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// CSV table holding the project.
    pub data_file: PathBuf,
    /// Absolute directory for rotating log files.
    pub log_dir: PathBuf,
    pub log_level: LogLevel,
    pub trend_scope: TrendScope,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::resolve(|key| std::env::var(key).ok(), &cwd)
    }

    /// Resolves configuration from `lookup`, anchoring relative paths at `cwd`.
    pub fn resolve<F>(lookup: F, cwd: &Path) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_file =
            cwd.join(value(DATA_FILE_VAR).unwrap_or_else(|| DEFAULT_DATA_FILE.to_string()));
        let log_dir = match value(LOG_DIR_VAR) {
            Some(dir) => cwd.join(dir),
            None => data_file.parent().unwrap_or(cwd).join(DEFAULT_LOG_SUBDIR),
        };
        let log_level = match value(LOG_LEVEL_VAR) {
            Some(level) => {
                LogLevel::parse(&level).map_err(|err| anyhow!("{LOG_LEVEL_VAR}: {err}"))?
            }
            None => default_log_level(),
        };
        let trend_scope = match value(TREND_SCOPE_VAR) {
            Some(scope) => TrendScope::parse(&scope).ok_or_else(|| {
                anyhow!("{TREND_SCOPE_VAR}: unsupported value `{scope}`; expected measurements|all")
            })?,
            None => TrendScope::default(),
        };

        Ok(Self {
            data_file,
            log_dir,
            log_level,
            trend_scope,
        })
    }
}
