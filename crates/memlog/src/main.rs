mod cmd;
mod config;
mod logging;
mod render;
mod sampler;

use anyhow::Result;
use clap::Parser;

use crate::config::{Cli, Commands};

fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Log(log_args) => cmd::log::run(log_args),
        Commands::Plot(plot_args) => cmd::plot::run(plot_args),
    }
}
