use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::Parser;
use memlog_core::format;

use crate::config::default_log_dir;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("one of --start or --lookback-secs is required")]
    MissingWindow,

    #[error("--start and --lookback-secs are mutually exclusive")]
    ConflictingWindow,

    #[error("--lookback-secs must be a positive number of seconds")]
    InvalidLookback,
}

#[derive(Parser, Debug, Clone)]
pub struct PlotArgs {
    #[arg(
        long,
        value_parser = parse_cli_timestamp,
        help = "Window end, e.g. 20260831_120000 (defaults to now)"
    )]
    pub end: Option<NaiveDateTime>,

    #[arg(
        long,
        value_parser = parse_cli_timestamp,
        help = "Window start (mutually exclusive with --lookback-secs)"
    )]
    pub start: Option<NaiveDateTime>,

    #[arg(
        long,
        help = "Window length in seconds, counted back from the end"
    )]
    pub lookback_secs: Option<f64>,

    #[arg(
        long,
        env = "MEMLOG_DIR",
        default_value_os_t = default_log_dir(),
        value_hint = clap::ValueHint::DirPath,
        help = "Directory holding the logged segments"
    )]
    pub log_dir: PathBuf,

    #[arg(
        long,
        value_hint = clap::ValueHint::FilePath,
        help = "Write the merged series here instead of stdout"
    )]
    pub out: Option<PathBuf>,
}

/// Resolved query window, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl PlotArgs {
    /// Resolves the window arguments, rejecting invalid combinations before
    /// any I/O happens.
    pub fn window(&self, now: NaiveDateTime) -> Result<QueryWindow, ConfigError> {
        let end = self.end.unwrap_or(now);
        let start = match (self.start, self.lookback_secs) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingWindow),
            (None, None) => return Err(ConfigError::MissingWindow),
            (Some(start), None) => start,
            (None, Some(lookback_secs)) => {
                if !lookback_secs.is_finite() || lookback_secs <= 0.0 {
                    return Err(ConfigError::InvalidLookback);
                }
                end - chrono::Duration::milliseconds((lookback_secs * 1000.0) as i64)
            }
        };
        Ok(QueryWindow { start, end })
    }
}

fn parse_cli_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    format::parse_timestamp(value).map_err(|error| error.to_string())
}
