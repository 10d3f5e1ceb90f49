//! System RAM readings via sysinfo.

use memlog_core::Reading;
use sysinfo::System;

pub struct SystemMemorySampler {
    system: System,
}

impl SystemMemorySampler {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    pub fn read(&mut self) -> Reading {
        self.system.refresh_memory();
        Reading::new(self.system.used_memory(), self.system.total_memory())
    }
}

impl Default for SystemMemorySampler {
    fn default() -> Self {
        Self::new()
    }
}
