//! Production samplers behind the core `MemorySampler` seam.

mod nvml;
mod system;

pub use nvml::NvmlSampler;
pub use system::SystemMemorySampler;

use memlog_core::{MemorySampler, Reading};

/// System RAM plus every NVML device visible at startup.
///
/// The device count is fixed when the sampler is built and holds for the whole
/// writer run. Hosts without a working NVIDIA driver still log system memory;
/// a failed NVML init just means zero gpu columns for this run.
pub struct HostSampler {
    system: SystemMemorySampler,
    nvml: Option<NvmlSampler>,
}

impl HostSampler {
    pub fn init() -> Self {
        let nvml = match NvmlSampler::init() {
            Ok(sampler) => Some(sampler),
            Err(error) => {
                tracing::warn!(%error, "NVML unavailable, logging system memory only");
                None
            }
        };
        Self {
            system: SystemMemorySampler::new(),
            nvml,
        }
    }
}

impl MemorySampler for HostSampler {
    type Error = anyhow::Error;

    fn device_count(&self) -> usize {
        self.nvml.as_ref().map_or(0, NvmlSampler::device_count)
    }

    fn sample_cpu(&mut self) -> Result<Reading, Self::Error> {
        Ok(self.system.read())
    }

    fn sample_gpu(&mut self, index: usize) -> Result<Reading, Self::Error> {
        match &self.nvml {
            Some(nvml) => nvml.read(index),
            None => Err(anyhow::anyhow!("no NVML devices available")),
        }
    }
}
