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

use lumen_agents::FrameSkipConfig;
use lumen_control::{ComplexityConfig, PolicyConfig};
use lumen_core::control::StrategyPresets;
use lumen_core::ConfigError;
use lumen_telemetry::CollectorConfig;
use serde::{Deserialize, Serialize};

/// Every tunable of the controller.
///
/// Missing keys in a JSON document take their default, so a host only writes
/// what it overrides:
///
/// ```
/// let config = lumen_sdk::ControllerConfig::from_json_str(
///     r#"{ "policy": { "target_fps": 30.0 } }"#,
/// ).unwrap();
/// assert_eq!(config.policy.target_fps, 30.0);
/// assert_eq!(config.sample_rate_ms, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Interval between two metric samples.
    pub sample_rate_ms: u64,
    /// Complexity analysis runs on the first tick and every this many ticks.
    pub analysis_every_ticks: u64,
    /// Number of recent samples the policy averages over.
    pub summary_window: usize,
    /// Metric history and warning thresholds.
    pub collector: CollectorConfig,
    /// Complexity weights, ceilings and level thresholds.
    pub complexity: ComplexityConfig,
    /// Target FPS, rate limits, hysteresis and migration speed.
    pub policy: PolicyConfig,
    /// Frame-skip tuning.
    pub frame_skip: FrameSkipConfig,
    /// Per-level strategy presets.
    pub presets: StrategyPresets,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sample_rate_ms: 1000,
            analysis_every_ticks: 30,
            summary_window: 5,
            collector: CollectorConfig::default(),
            complexity: ComplexityConfig::default(),
            policy: PolicyConfig::default(),
            frame_skip: FrameSkipConfig::default(),
            presets: StrategyPresets::default(),
        }
    }
}

impl ControllerConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("sample_rate_ms", self.sample_rate_ms as f64, 16.0, 60_000.0)?;
        ConfigError::check_range(
            "analysis_every_ticks",
            self.analysis_every_ticks as f64,
            1.0,
            10_000.0,
        )?;
        ConfigError::check_range(
            "summary_window",
            self.summary_window as f64,
            1.0,
            self.collector.history_capacity as f64,
        )?;
        self.collector.validate()?;
        self.complexity.validate()?;
        self.policy.validate()?;
        self.frame_skip.validate()?;
        self.presets.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ControllerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ControllerConfig::from_json_str(
            r#"{ "sample_rate_ms": 500, "policy": { "cooldown_period_ms": 8000 } }"#,
        )
        .expect("valid document");
        assert_eq!(config.sample_rate_ms, 500);
        assert_eq!(config.policy.cooldown_period_ms, 8000);
        assert_eq!(config.policy.min_adjustment_interval_ms, 2000);
        assert_eq!(config.analysis_every_ticks, 30);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            ControllerConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let err = ControllerConfig::from_json_str(
            r#"{ "complexity": { "weights": { "particles": 0.9 } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::WeightsDoNotSumToOne { .. }));
    }
}
