//! Sample types and the sampling/clock seams.

use std::fmt;

use chrono::NaiveDateTime;

/// Used/total memory for one device, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl Reading {
    pub fn new(used_bytes: u64, total_bytes: u64) -> Self {
        Self {
            used_bytes,
            total_bytes,
        }
    }

    /// A reading with used > total came back bogus from the platform; callers
    /// log it and keep going, it is never fatal.
    pub fn is_plausible(&self) -> bool {
        self.used_bytes <= self.total_bytes
    }
}

/// One fully captured reading set: system memory plus every gpu, at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub cpu: Reading,
    pub gpus: Vec<Reading>,
}

/// Produces memory readings for the host and its accelerator devices.
///
/// The device count is fixed for the lifetime of one sampler. A record is only
/// written when the cpu reading and all `device_count()` gpu readings succeed,
/// so a flaky device query can never produce a partial record.
pub trait MemorySampler {
    type Error: fmt::Debug + fmt::Display + Send + Sync + 'static;

    fn device_count(&self) -> usize;

    fn sample_cpu(&mut self) -> Result<Reading, Self::Error>;

    fn sample_gpu(&mut self, index: usize) -> Result<Reading, Self::Error>;
}

/// Trait for getting current wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Production system clock source.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Captures one complete sample, or fails without side effects if any single
/// device query fails.
pub fn capture<S: MemorySampler>(
    sampler: &mut S,
    timestamp: NaiveDateTime,
) -> Result<Sample, S::Error> {
    let cpu = sampler.sample_cpu()?;
    let device_count = sampler.device_count();
    let mut gpus = Vec::with_capacity(device_count);
    for index in 0..device_count {
        gpus.push(sampler.sample_gpu(index)?);
    }
    Ok(Sample {
        timestamp,
        cpu,
        gpus,
    })
}
