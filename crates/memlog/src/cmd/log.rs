use std::sync::mpsc;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use memlog_core::{record_samples, Clock, MemorySampler, SegmentWriter, SystemClock};

use crate::config::LogArgs;
use crate::sampler::HostSampler;

pub fn run(args: LogArgs) -> Result<()> {
    ensure!(
        args.period_secs.is_finite() && args.period_secs > 0.0,
        "--period-secs must be positive"
    );

    let clock = SystemClock;
    let mut sampler = HostSampler::init();
    let mut writer = SegmentWriter::create(&args.log_dir, clock.now(), sampler.device_count())
        .context("failed to start log segment")?;

    tracing::info!(
        path = %writer.path().display(),
        device_count = writer.device_count(),
        "logging memory usage"
    );
    if args.echo {
        println!("Logging to {}", writer.path().display());
    }

    // The loop runs until the process is killed; the channel is the
    // cancellation seam and nothing ever sends on it here.
    let (_shutdown_tx, shutdown_rx) = mpsc::channel();
    let appended = record_samples(
        &mut writer,
        &mut sampler,
        &clock,
        Duration::from_secs_f64(args.period_secs),
        args.echo,
        &shutdown_rx,
    )?;
    tracing::info!(appended, "writer stopped");
    Ok(())
}
