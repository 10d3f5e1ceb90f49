use anyhow::{ensure, Context, Result};
use memlog_core::{load_series, Clock, SystemClock};

use crate::config::PlotArgs;
use crate::render;

pub fn run(args: PlotArgs) -> Result<()> {
    let window = args.window(SystemClock.now())?;
    ensure!(
        args.log_dir.is_dir(),
        "log directory {} does not exist",
        args.log_dir.display()
    );

    let series = load_series(&args.log_dir, window.start, window.end)?;
    tracing::info!(
        samples = series.samples().len(),
        device_count = series.max_device_count(),
        "merged series loaded"
    );

    render::write_series(&series, args.out.as_deref()).context("failed to write series")
}
