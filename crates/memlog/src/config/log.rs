use std::path::PathBuf;

use clap::Parser;

use crate::config::default_log_dir;

#[derive(Parser, Debug, Clone)]
pub struct LogArgs {
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Seconds between samples (drift from sampling latency is accepted, no catch-up)"
    )]
    pub period_secs: f64,

    #[arg(
        long,
        env = "MEMLOG_DIR",
        default_value_os_t = default_log_dir(),
        value_hint = clap::ValueHint::DirPath,
        help = "Directory holding one segment file per writer run"
    )]
    pub log_dir: PathBuf,

    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        help = "Echo each record line to stdout"
    )]
    pub echo: bool,
}
