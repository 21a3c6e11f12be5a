// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! sysinfo-based implementation of the [`HardwareProvider`] trait.

use lumen_core::platform::{HardwareProvider, HardwareSnapshot};
use std::sync::Mutex;
use sysinfo::System;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Reads logical CPUs and total memory through `sysinfo`.
pub struct SysinfoHardwareProvider {
    system: Mutex<System>,
    has_touch: bool,
}

impl SysinfoHardwareProvider {
    /// Creates a provider and performs the initial CPU and memory refresh.
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
            has_touch: cfg!(any(target_os = "android", target_os = "ios")),
        }
    }

    /// Overrides touch detection, for hosts that know better than the target OS.
    pub fn with_touch(mut self, has_touch: bool) -> Self {
        self.has_touch = has_touch;
        self
    }
}

impl HardwareProvider for SysinfoHardwareProvider {
    fn snapshot(&self) -> HardwareSnapshot {
        let is_mobile = cfg!(any(target_os = "android", target_os = "ios"));
        match self.system.lock() {
            Ok(mut system) => {
                system.refresh_memory();
                let total = system.total_memory();
                HardwareSnapshot {
                    logical_cores: system.cpus().len() as u32,
                    total_memory_mb: (total > 0).then_some(total / BYTES_PER_MB),
                    is_mobile,
                    has_touch: self.has_touch,
                }
            }
            Err(_) => {
                log::warn!("SysinfoHardwareProvider: system lock poisoned, reporting unknown hardware.");
                HardwareSnapshot {
                    logical_cores: 0,
                    total_memory_mb: None,
                    is_mobile,
                    has_touch: self.has_touch,
                }
            }
        }
    }
}

impl Default for SysinfoHardwareProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reports_this_host() {
        let snapshot = SysinfoHardwareProvider::new().snapshot();
        assert!(snapshot.logical_cores >= 1);
        assert_eq!(
            snapshot.is_mobile,
            cfg!(any(target_os = "android", target_os = "ios"))
        );
    }

    #[test]
    fn test_touch_override() {
        let snapshot = SysinfoHardwareProvider::new().with_touch(true).snapshot();
        assert!(snapshot.has_touch);
    }
}
