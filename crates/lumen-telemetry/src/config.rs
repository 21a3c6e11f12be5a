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

//! Configuration of the metrics collector.

use lumen_core::config::ConfigError;
use lumen_core::renderer::RendererInfo;
use serde::{Deserialize, Serialize};

/// Upper bound of the instantaneous FPS window.
pub const MAX_FPS_WINDOW: usize = 60;

/// Limits past which a sample raises a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningThresholds {
    /// Minimum acceptable FPS.
    pub min_fps: f32,
    /// Maximum acceptable frame time in milliseconds.
    pub max_frame_time_ms: f32,
    /// Maximum acceptable memory in megabytes.
    pub max_memory_mb: f32,
    /// Maximum acceptable draw calls per frame.
    pub max_draw_calls: u32,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self {
            min_fps: 30.0,
            max_frame_time_ms: 33.3,
            max_memory_mb: 512.0,
            max_draw_calls: 500,
        }
    }
}

impl WarningThresholds {
    /// Every threshold must be strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("min_fps", self.min_fps as f64, f64::MIN_POSITIVE, 1000.0)?;
        ConfigError::check_range(
            "max_frame_time_ms",
            self.max_frame_time_ms as f64,
            f64::MIN_POSITIVE,
            60_000.0,
        )?;
        ConfigError::check_range(
            "max_memory_mb",
            self.max_memory_mb as f64,
            f64::MIN_POSITIVE,
            f64::MAX,
        )?;
        ConfigError::check_range("max_draw_calls", self.max_draw_calls as f64, 1.0, f64::MAX)
    }
}

/// Linear memory model used when the host exposes no heap-size API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryEstimateModel {
    /// Fixed baseline in megabytes.
    pub base_mb: f32,
    /// Megabytes per live geometry.
    pub per_geometry_mb: f32,
    /// Megabytes per live texture.
    pub per_texture_mb: f32,
    /// Megabytes per compiled program.
    pub per_program_mb: f32,
}

impl Default for MemoryEstimateModel {
    fn default() -> Self {
        Self {
            base_mb: 16.0,
            per_geometry_mb: 0.25,
            per_texture_mb: 1.0,
            per_program_mb: 0.1,
        }
    }
}

impl MemoryEstimateModel {
    /// Estimates memory from the renderer's live object counts.
    pub fn estimate(&self, info: &RendererInfo) -> f32 {
        self.base_mb
            + info.geometries as f32 * self.per_geometry_mb
            + info.textures as f32 * self.per_texture_mb
            + info.programs as f32 * self.per_program_mb
    }
}

/// Configuration of [`crate::MetricsCollector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Capacity of the sample history (3600 is one hour at 1Hz).
    pub history_capacity: usize,
    /// Capacity of the instantaneous FPS buffer, at most 60.
    pub fps_window: usize,
    /// Warning thresholds.
    pub warning_thresholds: WarningThresholds,
    /// Memory estimate used without a heap-size API.
    pub memory_estimate: MemoryEstimateModel,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 3600,
            fps_window: MAX_FPS_WINDOW,
            warning_thresholds: WarningThresholds::default(),
            memory_estimate: MemoryEstimateModel::default(),
        }
    }
}

impl CollectorConfig {
    /// Validates capacities and thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range(
            "history_capacity",
            self.history_capacity as f64,
            1.0,
            1_000_000.0,
        )?;
        ConfigError::check_range(
            "fps_window",
            self.fps_window as f64,
            1.0,
            MAX_FPS_WINDOW as f64,
        )?;
        self.warning_thresholds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(CollectorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_fps_window_is_bounded() {
        let config = CollectorConfig {
            fps_window: 61,
            ..CollectorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "fps_window", .. })
        ));
    }

    #[test]
    fn test_memory_estimate_is_linear() {
        let model = MemoryEstimateModel::default();
        let info = RendererInfo {
            geometries: 8,
            textures: 4,
            programs: 10,
            ..RendererInfo::default()
        };
        assert!((model.estimate(&info) - (16.0 + 2.0 + 4.0 + 1.0)).abs() < 1e-4);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: CollectorConfig =
            serde_json::from_str(r#"{ "history_capacity": 10 }"#).expect("valid json");
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.fps_window, MAX_FPS_WINDOW);
    }
}
