use clap::{Parser, Subcommand};

use crate::config::log::LogArgs;
use crate::config::plot::PlotArgs;

/// Log host memory usage to durable per-run segments and query it back out.
#[derive(Parser)]
#[command(about, long_about = None, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Periodically sample system and gpu memory into an append-only segment
    Log(LogArgs),
    /// Merge logged segments over a time window and export the series
    Plot(PlotArgs),
}
