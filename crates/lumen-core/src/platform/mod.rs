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

//! Host capability description produced by the device benchmark.

use crate::control::QualityLevel;
use serde::{Deserialize, Serialize};

/// Coarse device capability classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceTier {
    /// Weak device.
    Low,
    /// Mid-range device.
    Medium,
    /// Capable device.
    High,
    /// No benchmark result is available.
    #[default]
    Unknown,
}

impl DeviceTier {
    /// The tier one step below, used to cap mobile and touch devices.
    pub fn capped_one_below(self) -> Self {
        match self {
            DeviceTier::High => DeviceTier::Medium,
            DeviceTier::Medium | DeviceTier::Low => DeviceTier::Low,
            DeviceTier::Unknown => DeviceTier::Unknown,
        }
    }

    /// The quality level the policy starts from on a device of this tier.
    pub fn initial_level(self) -> QualityLevel {
        match self {
            DeviceTier::High => QualityLevel::High,
            DeviceTier::Medium => QualityLevel::Medium,
            DeviceTier::Low | DeviceTier::Unknown => QualityLevel::Low,
        }
    }
}

/// Declared hardware characteristics of the host.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HardwareSnapshot {
    /// Number of logical CPU cores.
    pub logical_cores: u32,
    /// Total system memory, when the platform exposes it.
    pub total_memory_mb: Option<u64>,
    /// Whether the host is a mobile device.
    pub is_mobile: bool,
    /// Whether the host has a touch screen.
    pub has_touch: bool,
}

/// A source of [`HardwareSnapshot`]s.
pub trait HardwareProvider: Send + Sync {
    /// Reads the current hardware characteristics.
    fn snapshot(&self) -> HardwareSnapshot;
}

/// Capabilities reported by an off-screen rendering context.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GpuCapabilities {
    /// Adapter or renderer name.
    pub adapter_name: String,
    /// Whether the context supports the modern graphics API level.
    pub modern_api: bool,
    /// Number of supported extensions.
    pub extension_count: u32,
    /// Maximum texture edge length in pixels.
    pub max_texture_size: u32,
}

/// How a benchmark run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// The benchmark ran to completion.
    Completed,
    /// No off-screen context could be created. 3D content must not be built.
    Unsupported,
    /// The run was cancelled. The partial result was discarded and a retry is allowed.
    Interrupted,
}

/// Raw measurements of a completed benchmark.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Trimmed mean of the sampled FPS values.
    pub windowed_fps: f32,
    /// Number of FPS samples taken.
    pub raw_samples: usize,
    /// Number of samples left after trimming.
    pub kept_samples: usize,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
    /// Frames rendered during the run.
    pub frames_rendered: u64,
}

/// Static plus measured capability of the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// The resulting tier.
    pub tier: DeviceTier,
    /// How the benchmark ended.
    pub status: ProbeStatus,
    /// Declared hardware.
    pub hardware: HardwareSnapshot,
    /// GPU capabilities, when a context was created.
    pub gpu: Option<GpuCapabilities>,
    /// Benchmark measurements, when the run completed.
    pub benchmark: Option<BenchmarkResult>,
    /// Hardware sub-score in `[0, 100]`.
    pub hardware_score: f32,
    /// Combined score in `[0, 100]`.
    pub score: f32,
}

impl DeviceProfile {
    /// A profile for a host without any off-screen rendering support.
    pub fn unsupported(hardware: HardwareSnapshot) -> Self {
        Self {
            tier: DeviceTier::Unknown,
            status: ProbeStatus::Unsupported,
            hardware,
            gpu: None,
            benchmark: None,
            hardware_score: 0.0,
            score: 0.0,
        }
    }

    /// A profile for a cancelled run.
    pub fn interrupted(hardware: HardwareSnapshot, gpu: Option<GpuCapabilities>) -> Self {
        Self {
            tier: DeviceTier::Unknown,
            status: ProbeStatus::Interrupted,
            hardware,
            gpu,
            benchmark: None,
            hardware_score: 0.0,
            score: 0.0,
        }
    }

    /// Whether 3D rendering is available at all.
    pub fn is_supported(&self) -> bool {
        self.status != ProbeStatus::Unsupported
    }
}
