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

//! Scene complexity scoring.
//!
//! Every raw count from [`SceneStats`] is normalized against a reference ceiling
//! into a sub-score in `[0, 100]`. The final score is the weighted sum of the
//! sub-scores. Sub-scores above the dominant threshold are reported as
//! contributing factors, and each dominant factor maps to fixed recommendations.

use lumen_core::config::ConfigError;
use lumen_core::scene::{LightCounts, SceneStats};
use lumen_core::RingBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capacity of the score history used for trend detection.
pub const SCORE_HISTORY: usize = 30;

/// Tolerance on the sum of the weights.
const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

/// Coarse complexity classification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    /// Score below the medium threshold.
    #[default]
    Low,
    /// Score below the high threshold.
    Medium,
    /// Score below the very-high threshold.
    High,
    /// Everything else.
    VeryHigh,
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComplexityLevel::Low => "low",
            ComplexityLevel::Medium => "medium",
            ComplexityLevel::High => "high",
            ComplexityLevel::VeryHigh => "very_high",
        })
    }
}

/// A scored aspect of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityFactor {
    /// Point-cloud particles.
    Particles,
    /// Field or grid resolution.
    FieldResolution,
    /// Triangle count.
    Geometry,
    /// Draw-call and material count.
    DrawCalls,
    /// Weighted lights and shadow casters.
    Lighting,
}

impl ComplexityFactor {
    /// Every factor, in reporting order.
    pub const ALL: [ComplexityFactor; 5] = [
        ComplexityFactor::Particles,
        ComplexityFactor::FieldResolution,
        ComplexityFactor::Geometry,
        ComplexityFactor::DrawCalls,
        ComplexityFactor::Lighting,
    ];

    /// Fixed recommendations for a dominant factor, most effective first.
    pub fn recommendations(self) -> &'static [Recommendation] {
        match self {
            ComplexityFactor::Particles => &[Recommendation::ReduceParticleBudget],
            ComplexityFactor::FieldResolution => &[Recommendation::LowerFieldResolution],
            ComplexityFactor::Geometry => &[Recommendation::EnableLod],
            ComplexityFactor::DrawCalls => {
                &[Recommendation::EnableCulling, Recommendation::MergeDrawCalls]
            }
            ComplexityFactor::Lighting => &[
                Recommendation::ReduceShadowQuality,
                Recommendation::ReduceLightCount,
            ],
        }
    }
}

impl fmt::Display for ComplexityFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComplexityFactor::Particles => "high particle count",
            ComplexityFactor::FieldResolution => "high field resolution",
            ComplexityFactor::Geometry => "complex geometry",
            ComplexityFactor::DrawCalls => "many draw calls",
            ComplexityFactor::Lighting => "expensive lighting",
        })
    }
}

/// An optimization suggested by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Build fewer particles.
    ReduceParticleBudget,
    /// Sample fields on a coarser grid.
    LowerFieldResolution,
    /// Use level-of-detail meshes.
    EnableLod,
    /// Cull off-screen objects.
    EnableCulling,
    /// Merge geometries sharing a material.
    MergeDrawCalls,
    /// Lower or disable shadow maps.
    ReduceShadowQuality,
    /// Remove secondary lights.
    ReduceLightCount,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::ReduceParticleBudget => "reduce particle budget",
            Recommendation::LowerFieldResolution => "lower field resolution",
            Recommendation::EnableLod => "enable level of detail",
            Recommendation::EnableCulling => "enable frustum culling",
            Recommendation::MergeDrawCalls => "merge geometries sharing a material",
            Recommendation::ReduceShadowQuality => "reduce shadow quality",
            Recommendation::ReduceLightCount => "reduce light count",
        })
    }
}

/// Weight of each factor in the final score. Must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityWeights {
    /// Weight of [`ComplexityFactor::Particles`].
    pub particles: f32,
    /// Weight of [`ComplexityFactor::FieldResolution`].
    pub field_resolution: f32,
    /// Weight of [`ComplexityFactor::Geometry`].
    pub geometry: f32,
    /// Weight of [`ComplexityFactor::DrawCalls`].
    pub draw_calls: f32,
    /// Weight of [`ComplexityFactor::Lighting`].
    pub lighting: f32,
}

impl Default for ComplexityWeights {
    fn default() -> Self {
        Self {
            particles: 0.30,
            field_resolution: 0.25,
            geometry: 0.20,
            draw_calls: 0.15,
            lighting: 0.10,
        }
    }
}

impl ComplexityWeights {
    fn get(&self, factor: ComplexityFactor) -> f32 {
        match factor {
            ComplexityFactor::Particles => self.particles,
            ComplexityFactor::FieldResolution => self.field_resolution,
            ComplexityFactor::Geometry => self.geometry,
            ComplexityFactor::DrawCalls => self.draw_calls,
            ComplexityFactor::Lighting => self.lighting,
        }
    }

    /// Rejects negative weights and weights not summing to 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("particles", self.particles),
            ("field_resolution", self.field_resolution),
            ("geometry", self.geometry),
            ("draw_calls", self.draw_calls),
            ("lighting", self.lighting),
        ];
        if let Some((factor, value)) = named.iter().find(|(_, w)| *w < 0.0 || w.is_nan()) {
            return Err(ConfigError::NegativeWeight {
                factor: *factor,
                value: *value,
            });
        }
        let sum: f32 = named.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne { sum });
        }
        Ok(())
    }
}

/// Counts at which each raw value saturates its sub-score at 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityCeilings {
    /// Particles.
    pub particles: f32,
    /// Field edge resolution.
    pub field_resolution: f32,
    /// Triangles.
    pub triangles: f32,
    /// Draw-call objects or distinct materials, whichever is higher.
    pub draw_calls: f32,
    /// Type-weighted lights.
    pub weighted_lights: f32,
    /// Shadow casters.
    pub shadow_casters: f32,
}

impl Default for ComplexityCeilings {
    fn default() -> Self {
        Self {
            particles: 10_000.0,
            field_resolution: 128.0,
            triangles: 500_000.0,
            draw_calls: 200.0,
            weighted_lights: 8.0,
            shadow_casters: 32.0,
        }
    }
}

/// Cost weight of each light type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightWeights {
    /// Ambient lights.
    pub ambient: f32,
    /// Hemisphere lights.
    pub hemisphere: f32,
    /// Directional lights.
    pub directional: f32,
    /// Point lights.
    pub point: f32,
    /// Spot lights.
    pub spot: f32,
}

impl Default for LightWeights {
    fn default() -> Self {
        Self {
            ambient: 0.25,
            hemisphere: 0.5,
            directional: 1.0,
            point: 1.0,
            spot: 1.5,
        }
    }
}

impl LightWeights {
    /// Type-weighted light count.
    pub fn weigh(&self, lights: &LightCounts) -> f32 {
        lights.ambient as f32 * self.ambient
            + lights.hemisphere as f32 * self.hemisphere
            + lights.directional as f32 * self.directional
            + lights.point as f32 * self.point
            + lights.spot as f32 * self.spot
    }
}

/// Lower bounds of the medium, high and very-high levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelThresholds {
    /// Scores at or above are at least medium.
    pub medium: f32,
    /// Scores at or above are at least high.
    pub high: f32,
    /// Scores at or above are very high.
    pub very_high: f32,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            medium: 30.0,
            high: 60.0,
            very_high: 85.0,
        }
    }
}

impl LevelThresholds {
    /// Classifies a score.
    pub fn classify(&self, score: f32) -> ComplexityLevel {
        if score < self.medium {
            ComplexityLevel::Low
        } else if score < self.high {
            ComplexityLevel::Medium
        } else if score < self.very_high {
            ComplexityLevel::High
        } else {
            ComplexityLevel::VeryHigh
        }
    }
}

/// Configuration of [`ComplexityScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityConfig {
    /// Factor weights.
    pub weights: ComplexityWeights,
    /// Normalization ceilings.
    pub ceilings: ComplexityCeilings,
    /// Light type weights.
    pub light_weights: LightWeights,
    /// Level thresholds.
    pub thresholds: LevelThresholds,
    /// Sub-scores above this value are reported as contributing factors.
    pub dominant_threshold: f32,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            weights: ComplexityWeights::default(),
            ceilings: ComplexityCeilings::default(),
            light_weights: LightWeights::default(),
            thresholds: LevelThresholds::default(),
            dominant_threshold: 50.0,
        }
    }
}

impl ComplexityConfig {
    /// Validates weights, ceilings and thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        let c = &self.ceilings;
        for (field, value) in [
            ("ceilings.particles", c.particles),
            ("ceilings.field_resolution", c.field_resolution),
            ("ceilings.triangles", c.triangles),
            ("ceilings.draw_calls", c.draw_calls),
            ("ceilings.weighted_lights", c.weighted_lights),
            ("ceilings.shadow_casters", c.shadow_casters),
        ] {
            ConfigError::check_range(field, value as f64, f64::MIN_POSITIVE, f64::MAX)?;
        }
        let t = &self.thresholds;
        if !(0.0 < t.medium && t.medium < t.high && t.high < t.very_high && t.very_high <= 100.0) {
            return Err(ConfigError::UnorderedThresholds(format!(
                "complexity levels must satisfy 0 < {} < {} < {} <= 100",
                t.medium, t.high, t.very_high
            )));
        }
        ConfigError::check_range("dominant_threshold", self.dominant_threshold as f64, 0.0, 100.0)
    }
}

/// Per-factor sub-scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplexityBreakdown {
    /// Particle sub-score.
    pub particles: f32,
    /// Field resolution sub-score.
    pub field_resolution: f32,
    /// Geometry sub-score.
    pub geometry: f32,
    /// Draw-call sub-score.
    pub draw_calls: f32,
    /// Lighting sub-score.
    pub lighting: f32,
}

impl ComplexityBreakdown {
    /// Sub-score of `factor`.
    pub fn get(&self, factor: ComplexityFactor) -> f32 {
        match factor {
            ComplexityFactor::Particles => self.particles,
            ComplexityFactor::FieldResolution => self.field_resolution,
            ComplexityFactor::Geometry => self.geometry,
            ComplexityFactor::DrawCalls => self.draw_calls,
            ComplexityFactor::Lighting => self.lighting,
        }
    }
}

/// Result of scoring a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityAnalysis {
    /// Coarse level.
    pub level: ComplexityLevel,
    /// Weighted score in `[0, 100]`.
    pub score: f32,
    /// Sub-scores.
    pub breakdown: ComplexityBreakdown,
    /// Dominant factors, in [`ComplexityFactor::ALL`] order.
    pub factors: Vec<ComplexityFactor>,
    /// Recommendations derived from the dominant factors, without duplicates.
    pub recommendations: Vec<Recommendation>,
}

impl ComplexityAnalysis {
    /// Human-readable contributing factors.
    pub fn describe_factors(&self) -> Vec<String> {
        self.factors
            .iter()
            .map(|f| format!("{f} ({:.0})", self.breakdown.get(*f)))
            .collect()
    }
}

impl Default for ComplexityAnalysis {
    fn default() -> Self {
        Self {
            level: ComplexityLevel::Low,
            score: 0.0,
            breakdown: ComplexityBreakdown::default(),
            factors: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

fn normalize(value: f32, ceiling: f32) -> f32 {
    if ceiling <= 0.0 {
        return 0.0;
    }
    (value / ceiling * 100.0).clamp(0.0, 100.0)
}

/// Scores scene complexity and keeps a short history of scores.
#[derive(Debug)]
pub struct ComplexityScorer {
    config: ComplexityConfig,
    history: RingBuffer<f32>,
    latest: Option<ComplexityAnalysis>,
}

impl ComplexityScorer {
    /// Creates a scorer. The configuration is expected to be validated.
    pub fn new(config: ComplexityConfig) -> Self {
        Self {
            config,
            history: RingBuffer::new(SCORE_HISTORY),
            latest: None,
        }
    }

    /// Scores `stats`. Pure: identical stats always give an identical analysis.
    pub fn analyze(&self, stats: &SceneStats) -> ComplexityAnalysis {
        let cfg = &self.config;
        let ceilings = &cfg.ceilings;

        // ── Sub-scores ───────────────────────────────────────────────────
        let lights = cfg.light_weights.weigh(&stats.lights);
        let light_ratio = normalize(lights, ceilings.weighted_lights);
        let shadow_ratio = normalize(stats.shadow_casters as f32, ceilings.shadow_casters);
        let breakdown = ComplexityBreakdown {
            particles: normalize(stats.particle_count as f32, ceilings.particles),
            field_resolution: normalize(stats.field_resolution as f32, ceilings.field_resolution),
            geometry: normalize(stats.triangle_count as f32, ceilings.triangles),
            draw_calls: normalize(
                stats.draw_call_objects.max(stats.material_count) as f32,
                ceilings.draw_calls,
            ),
            lighting: 0.5 * light_ratio + 0.5 * shadow_ratio,
        };

        // ── Weighted score ───────────────────────────────────────────────
        let score = ComplexityFactor::ALL
            .iter()
            .map(|f| breakdown.get(*f) * cfg.weights.get(*f))
            .sum::<f32>()
            .clamp(0.0, 100.0);
        let level = cfg.thresholds.classify(score);

        // ── Dominant factors and recommendations ─────────────────────────
        let factors: Vec<ComplexityFactor> = ComplexityFactor::ALL
            .into_iter()
            .filter(|f| breakdown.get(*f) > cfg.dominant_threshold)
            .collect();
        let mut recommendations = Vec::new();
        for rec in factors.iter().flat_map(|f| f.recommendations()) {
            if !recommendations.contains(rec) {
                recommendations.push(*rec);
            }
        }

        ComplexityAnalysis {
            level,
            score,
            breakdown,
            factors,
            recommendations,
        }
    }

    /// Scores `stats` and records the score for trend detection.
    pub fn observe(&mut self, stats: &SceneStats) -> ComplexityAnalysis {
        let analysis = self.analyze(stats);
        if let Some(previous) = &self.latest {
            if previous.level != analysis.level {
                log::debug!(
                    "ComplexityScorer: level {} -> {} (score {:.1}, factors: {:?})",
                    previous.level,
                    analysis.level,
                    analysis.score,
                    analysis.describe_factors()
                );
            }
        }
        self.history.push(analysis.score);
        self.latest = Some(analysis.clone());
        analysis
    }

    /// The most recent observed analysis.
    pub fn latest(&self) -> Option<&ComplexityAnalysis> {
        self.latest.as_ref()
    }

    /// Score trend over the history, positive when the scene is getting heavier.
    pub fn trend(&self) -> f32 {
        self.history.trend()
    }

    /// Number of recorded scores.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Forgets the history and the latest analysis.
    pub fn clear(&mut self) {
        self.history.clear();
        self.latest = None;
    }

    /// Current configuration.
    pub fn config(&self) -> &ComplexityConfig {
        &self.config
    }

    /// Replaces the configuration, keeping the history.
    pub fn update_config(&mut self, config: ComplexityConfig) {
        self.config = config;
    }
}

impl Default for ComplexityScorer {
    fn default() -> Self {
        Self::new(ComplexityConfig::default())
    }
}
