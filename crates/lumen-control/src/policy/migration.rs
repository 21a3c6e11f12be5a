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

//! Gradual interpolation between strategies.

use lumen_core::control::OptimizationStrategy;
use serde::{Deserialize, Serialize};

/// Lowest accepted adaptation speed.
pub const MIN_ADAPTATION_SPEED: f32 = 0.01;

/// Distance under which a numeric field snaps to its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapEpsilon {
    /// Particle budget.
    pub particle_budget: u32,
    /// Field resolution.
    pub field_resolution: u32,
    /// Render scale.
    pub render_scale: f32,
    /// Pixel ratio.
    pub pixel_ratio: f32,
}

impl Default for SnapEpsilon {
    fn default() -> Self {
        Self {
            particle_budget: 5,
            field_resolution: 1,
            render_scale: 0.05,
            pixel_ratio: 0.05,
        }
    }
}

fn approach_u32(current: u32, target: u32, speed: f32, epsilon: u32) -> u32 {
    let diff = target as i64 - current as i64;
    if diff.unsigned_abs() <= epsilon as u64 {
        return target;
    }
    let mut step = (diff as f64 * speed as f64).round() as i64;
    if step == 0 {
        step = diff.signum();
    }
    let next = current as i64 + step;
    if (target as i64 - next).unsigned_abs() <= epsilon as u64 {
        target
    } else {
        next as u32
    }
}

fn approach_f32(current: f32, target: f32, speed: f32, epsilon: f32) -> f32 {
    if (target - current).abs() <= epsilon || !current.is_finite() {
        return target;
    }
    let next = current + (target - current) * speed;
    if (target - next).abs() <= epsilon {
        target
    } else {
        next
    }
}

/// Moves a live strategy toward a target over successive ticks.
///
/// Numeric fields move by `speed` of the remaining distance per tick and snap
/// once within epsilon. Shadow quality, frame-skip threshold, LOD and culling
/// switch together, and only once every numeric field has snapped.
#[derive(Debug, Clone)]
pub struct StrategyMigration {
    current: OptimizationStrategy,
    target: OptimizationStrategy,
    speed: f32,
    epsilon: SnapEpsilon,
    ticks: u32,
}

impl StrategyMigration {
    /// Creates a settled migration at `start`.
    pub fn new(start: OptimizationStrategy, speed: f32, epsilon: SnapEpsilon) -> Self {
        Self {
            target: start.clone(),
            current: start,
            speed: speed.clamp(MIN_ADAPTATION_SPEED, 1.0),
            epsilon,
            ticks: 0,
        }
    }

    /// Starts moving toward `target` from the current live values.
    ///
    /// Any migration in flight is abandoned; partial states are never merged.
    pub fn restart(&mut self, target: OptimizationStrategy) {
        self.target = target;
        self.ticks = 0;
    }

    /// Jumps straight to `strategy`.
    pub fn snap_to(&mut self, strategy: OptimizationStrategy) {
        self.current = strategy.clone();
        self.target = strategy;
        self.ticks = 0;
    }

    /// Advances one tick. Returns `true` once the live strategy equals the target.
    pub fn apply_gradual_adjustment(&mut self) -> bool {
        if self.is_complete() {
            return true;
        }
        self.ticks += 1;

        let (c, t, e, s) = (&mut self.current, &self.target, &self.epsilon, self.speed);
        c.particle_budget = approach_u32(c.particle_budget, t.particle_budget, s, e.particle_budget);
        c.field_resolution =
            approach_u32(c.field_resolution, t.field_resolution, s, e.field_resolution);
        c.render_scale = approach_f32(c.render_scale, t.render_scale, s, e.render_scale);
        c.pixel_ratio = approach_f32(c.pixel_ratio, t.pixel_ratio, s, e.pixel_ratio);

        if self.numeric_settled() {
            let c = &mut self.current;
            c.shadow_quality = self.target.shadow_quality;
            c.frame_skip_threshold = self.target.frame_skip_threshold;
            c.enable_lod = self.target.enable_lod;
            c.enable_culling = self.target.enable_culling;
            log::trace!(
                "StrategyMigration: reached target after {} ticks.",
                self.ticks
            );
        }
        self.is_complete()
    }

    /// Whether every numeric field equals its target.
    pub fn numeric_settled(&self) -> bool {
        let (c, t) = (&self.current, &self.target);
        c.particle_budget == t.particle_budget
            && c.field_resolution == t.field_resolution
            && c.render_scale == t.render_scale
            && c.pixel_ratio == t.pixel_ratio
    }

    /// Whether the live strategy equals the target.
    pub fn is_complete(&self) -> bool {
        self.current == self.target
    }

    /// The live strategy.
    pub fn current(&self) -> &OptimizationStrategy {
        &self.current
    }

    /// The strategy being moved toward.
    pub fn target(&self) -> &OptimizationStrategy {
        &self.target
    }

    /// Ticks spent on the current migration.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Adaptation speed in `[0.01, 1]`.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Changes the adaptation speed without restarting.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(MIN_ADAPTATION_SPEED, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::control::{QualityLevel, ShadowQuality};

    fn migration(from: QualityLevel, to: QualityLevel, speed: f32) -> StrategyMigration {
        let mut m = StrategyMigration::new(
            OptimizationStrategy::preset(from),
            speed,
            SnapEpsilon::default(),
        );
        m.restart(OptimizationStrategy::preset(to));
        m
    }

    #[test]
    fn test_integer_step_moves_at_least_one() {
        assert_eq!(approach_u32(100, 110, 0.01, 1), 101);
        assert_eq!(approach_u32(110, 100, 0.01, 1), 109);
        assert_eq!(approach_u32(100, 104, 0.5, 5), 104);
    }

    #[test]
    fn test_discrete_fields_wait_for_numeric_snap() {
        let mut m = migration(QualityLevel::Low, QualityLevel::High, 0.1);
        m.apply_gradual_adjustment();
        assert_eq!(m.current().shadow_quality, ShadowQuality::Off);
        assert!(m.current().particle_budget > 1000);

        while !m.numeric_settled() {
            assert_eq!(m.current().shadow_quality, ShadowQuality::Off);
            m.apply_gradual_adjustment();
        }
        assert_eq!(m.current().shadow_quality, ShadowQuality::High);
        assert!(m.is_complete());
        assert_eq!(m.current(), &OptimizationStrategy::preset(QualityLevel::High));
    }

    #[test]
    fn test_restart_continues_from_live_values() {
        let mut m = migration(QualityLevel::Low, QualityLevel::High, 0.5);
        m.apply_gradual_adjustment();
        let live = m.current().particle_budget;
        m.restart(OptimizationStrategy::preset(QualityLevel::Medium));
        assert_eq!(m.current().particle_budget, live);
        assert_eq!(m.ticks(), 0);
        while !m.apply_gradual_adjustment() {}
        assert_eq!(m.current(), &OptimizationStrategy::preset(QualityLevel::Medium));
    }

    #[test]
    fn test_speed_is_clamped() {
        let m = migration(QualityLevel::Low, QualityLevel::High, 0.0);
        assert_eq!(m.speed(), MIN_ADAPTATION_SPEED);
        let mut m = migration(QualityLevel::Low, QualityLevel::High, 1.0);
        assert!(m.apply_gradual_adjustment());
    }
}
