//! GPU memory readings via NVML.

use anyhow::Context;
use memlog_core::Reading;
use nvml_wrapper::Nvml;

pub struct NvmlSampler {
    nvml: Nvml,
    device_count: usize,
}

impl NvmlSampler {
    /// Initializes NVML and fixes the device count for this run.
    pub fn init() -> Result<Self, anyhow::Error> {
        let nvml = Nvml::init().context("Failed to initialize NVML")?;
        let device_count = nvml
            .device_count()
            .context("Failed to query device count")? as usize;
        Ok(Self { nvml, device_count })
    }

    pub fn device_count(&self) -> usize {
        self.device_count
    }

    pub fn read(&self, index: usize) -> Result<Reading, anyhow::Error> {
        let device = self
            .nvml
            .device_by_index(index as u32)
            .context("Failed to get device by index")?;
        let memory = device
            .memory_info()
            .context("Failed to query device memory")?;
        Ok(Reading::new(memory.used, memory.total))
    }
}
