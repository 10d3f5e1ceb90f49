//! CLI argument structs, validated at construction.

mod cli;
mod log;
mod plot;

pub use cli::{Cli, Commands};
pub use log::LogArgs;
pub use plot::PlotArgs;

use std::path::PathBuf;

/// Default segment directory, shared by the log and plot subcommands.
pub(crate) fn default_log_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("logged_memory_usage")
}
