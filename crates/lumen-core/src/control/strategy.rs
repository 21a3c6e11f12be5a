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

use super::{QualityLevel, ShadowQuality};
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// A bundle of render-quality knobs applied to the live renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationStrategy {
    /// Maximum number of particles the scene should build.
    pub particle_budget: u32,
    /// Edge resolution of field/grid visualizations.
    pub field_resolution: u32,
    /// Fraction of the canvas size used for the drawing buffer, in `(0, 1]`.
    pub render_scale: f32,
    /// Shadow-map quality.
    pub shadow_quality: ShadowQuality,
    /// Requested pixel ratio, capped by the device pixel ratio when applied.
    pub pixel_ratio: f32,
    /// FPS under which frame skipping may kick in. 0 disables skipping.
    pub frame_skip_threshold: f32,
    /// Whether scene code should build level-of-detail variants.
    pub enable_lod: bool,
    /// Whether scene code should cull off-screen objects.
    pub enable_culling: bool,
}

impl OptimizationStrategy {
    /// The built-in preset for a quality level.
    pub fn preset(level: QualityLevel) -> Self {
        match level {
            QualityLevel::Low => Self {
                particle_budget: 1000,
                field_resolution: 32,
                render_scale: 0.6,
                shadow_quality: ShadowQuality::Off,
                pixel_ratio: 1.0,
                frame_skip_threshold: 30.0,
                enable_lod: true,
                enable_culling: true,
            },
            QualityLevel::Medium => Self {
                particle_budget: 3000,
                field_resolution: 64,
                render_scale: 0.8,
                shadow_quality: ShadowQuality::Low,
                pixel_ratio: 1.5,
                frame_skip_threshold: 20.0,
                enable_lod: true,
                enable_culling: true,
            },
            QualityLevel::High => Self {
                particle_budget: 8000,
                field_resolution: 128,
                render_scale: 1.0,
                shadow_quality: ShadowQuality::High,
                pixel_ratio: 2.0,
                frame_skip_threshold: 0.0,
                enable_lod: false,
                enable_culling: true,
            },
        }
    }

    /// Checks every numeric field against `limits`.
    pub fn validate(&self, limits: &StrategyLimits) -> Result<(), ConfigError> {
        ConfigError::check_range(
            "particle_budget",
            self.particle_budget as f64,
            limits.particle_budget.0 as f64,
            limits.particle_budget.1 as f64,
        )?;
        ConfigError::check_range(
            "field_resolution",
            self.field_resolution as f64,
            limits.field_resolution.0 as f64,
            limits.field_resolution.1 as f64,
        )?;
        ConfigError::check_range(
            "render_scale",
            self.render_scale as f64,
            limits.render_scale.0 as f64,
            limits.render_scale.1 as f64,
        )?;
        ConfigError::check_range(
            "pixel_ratio",
            self.pixel_ratio as f64,
            limits.pixel_ratio.0 as f64,
            limits.pixel_ratio.1 as f64,
        )?;
        ConfigError::check_range(
            "frame_skip_threshold",
            self.frame_skip_threshold as f64,
            limits.frame_skip_threshold.0 as f64,
            limits.frame_skip_threshold.1 as f64,
        )
    }

    /// Returns a copy with every numeric field clamped into `limits`.
    pub fn clamped(&self, limits: &StrategyLimits) -> Self {
        let clamp_f = |v: f32, (lo, hi): (f32, f32)| {
            if v.is_nan() {
                lo
            } else {
                v.clamp(lo, hi)
            }
        };
        Self {
            particle_budget: self
                .particle_budget
                .clamp(limits.particle_budget.0, limits.particle_budget.1),
            field_resolution: self
                .field_resolution
                .clamp(limits.field_resolution.0, limits.field_resolution.1),
            render_scale: clamp_f(self.render_scale, limits.render_scale),
            pixel_ratio: clamp_f(self.pixel_ratio, limits.pixel_ratio),
            frame_skip_threshold: clamp_f(self.frame_skip_threshold, limits.frame_skip_threshold),
            ..self.clone()
        }
    }
}

impl Default for OptimizationStrategy {
    fn default() -> Self {
        Self::preset(QualityLevel::Medium)
    }
}

/// Inclusive `(min, max)` bounds for each numeric strategy field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyLimits {
    /// Bounds for [`OptimizationStrategy::particle_budget`].
    pub particle_budget: (u32, u32),
    /// Bounds for [`OptimizationStrategy::field_resolution`].
    pub field_resolution: (u32, u32),
    /// Bounds for [`OptimizationStrategy::render_scale`].
    pub render_scale: (f32, f32),
    /// Bounds for [`OptimizationStrategy::pixel_ratio`].
    pub pixel_ratio: (f32, f32),
    /// Bounds for [`OptimizationStrategy::frame_skip_threshold`].
    pub frame_skip_threshold: (f32, f32),
}

impl Default for StrategyLimits {
    fn default() -> Self {
        Self {
            particle_budget: (100, 20_000),
            field_resolution: (8, 256),
            render_scale: (0.25, 1.0),
            pixel_ratio: (0.5, 3.0),
            frame_skip_threshold: (0.0, 60.0),
        }
    }
}

/// The three per-level presets, overridable through configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyPresets {
    /// Preset for [`QualityLevel::Low`].
    pub low: OptimizationStrategy,
    /// Preset for [`QualityLevel::Medium`].
    pub medium: OptimizationStrategy,
    /// Preset for [`QualityLevel::High`].
    pub high: OptimizationStrategy,
    /// Bounds every preset must respect.
    pub limits: StrategyLimits,
}

impl StrategyPresets {
    /// Returns the preset for `level`.
    pub fn for_level(&self, level: QualityLevel) -> &OptimizationStrategy {
        match level {
            QualityLevel::Low => &self.low,
            QualityLevel::Medium => &self.medium,
            QualityLevel::High => &self.high,
        }
    }

    /// Validates every preset against the limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (lo, hi) = self.limits.render_scale;
        if lo <= 0.0 || lo > hi {
            return Err(ConfigError::UnorderedThresholds(format!(
                "render_scale limits ({lo}, {hi}) must satisfy 0 < min <= max"
            )));
        }
        for level in QualityLevel::ALL {
            self.for_level(level).validate(&self.limits)?;
        }
        Ok(())
    }
}

impl Default for StrategyPresets {
    fn default() -> Self {
        Self {
            low: OptimizationStrategy::preset(QualityLevel::Low),
            medium: OptimizationStrategy::preset(QualityLevel::Medium),
            high: OptimizationStrategy::preset(QualityLevel::High),
            limits: StrategyLimits::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_presets_are_valid() {
        assert!(StrategyPresets::default().validate().is_ok());
    }

    #[test]
    fn test_presets_are_ordered_by_cost() {
        let presets = StrategyPresets::default();
        let low = presets.for_level(QualityLevel::Low);
        let high = presets.for_level(QualityLevel::High);
        assert!(low.particle_budget < high.particle_budget);
        assert!(low.render_scale < high.render_scale);
        assert!(low.shadow_quality < high.shadow_quality);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut presets = StrategyPresets::default();
        presets.high.render_scale = 1.5;
        match presets.validate() {
            Err(ConfigError::OutOfRange { field, .. }) => assert_eq!(field, "render_scale"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_clamped_brings_fields_into_range() {
        let limits = StrategyLimits::default();
        let wild = OptimizationStrategy {
            particle_budget: 1_000_000,
            field_resolution: 1,
            render_scale: f32::NAN,
            pixel_ratio: 9.0,
            ..OptimizationStrategy::default()
        };
        let clamped = wild.clamped(&limits);
        assert_eq!(clamped.particle_budget, 20_000);
        assert_eq!(clamped.field_resolution, 8);
        assert_eq!(clamped.render_scale, 0.25);
        assert_eq!(clamped.pixel_ratio, 3.0);
        assert!(clamped.validate(&limits).is_ok());
    }
}
