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

//! The strategy policy: a hysteresis state machine over quality levels.
//!
//! The policy evaluates at most once per `min_adjustment_interval_ms` and never
//! within `cooldown_period_ms` of the previous switch. When an evaluation finds
//! the controller eligible to move, the new level comes from a fixed lookup on
//! (complexity level, FPS band), so identical inputs always give identical
//! decisions.

pub mod migration;

use crate::complexity::ComplexityLevel;
use lumen_core::config::ConfigError;
use lumen_core::control::{
    ModeTransition, OptimizationStrategy, PerformanceMode, QualityLevel, StrategyPresets,
    MANUAL_TRIGGER,
};
use lumen_core::platform::DeviceProfile;
use lumen_core::RingBuffer;
use lumen_telemetry::PerformanceSummary;
use migration::{SnapEpsilon, StrategyMigration};
use serde::{Deserialize, Serialize};

/// FPS ratios separating the FPS bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    /// Below `downgrade_ratio * target_fps` a downgrade is always allowed.
    pub downgrade_ratio: f32,
    /// Above `upgrade_ratio * target_fps` an upgrade is allowed.
    pub upgrade_ratio: f32,
    /// Below `critical_ratio * target_fps` the FPS band is critical.
    pub critical_ratio: f32,
    /// Upgrades are held back while the instantaneous FPS coefficient of
    /// variation is above this value.
    pub max_upgrade_instability: f32,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            downgrade_ratio: 0.8,
            upgrade_ratio: 1.2,
            critical_ratio: 0.5,
            max_upgrade_instability: 0.3,
        }
    }
}

/// Configuration of [`StrategyPolicy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// FPS the policy aims for.
    pub target_fps: f32,
    /// Minimum time between two evaluations.
    pub min_adjustment_interval_ms: u64,
    /// Minimum time between a switch and the next evaluation.
    pub cooldown_period_ms: u64,
    /// Fraction of the remaining distance covered per migration tick.
    pub adaptation_speed: f32,
    /// Capacity of the transition history.
    pub transition_history: usize,
    /// FPS band ratios.
    pub hysteresis: HysteresisConfig,
    /// Snap distances of the migration.
    pub snap_epsilon: SnapEpsilon,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            target_fps: 45.0,
            min_adjustment_interval_ms: 2000,
            cooldown_period_ms: 5000,
            adaptation_speed: 0.1,
            transition_history: 20,
            hysteresis: HysteresisConfig::default(),
            snap_epsilon: SnapEpsilon::default(),
        }
    }
}

impl PolicyConfig {
    /// Validates ranges and the ordering of the hysteresis ratios.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("target_fps", self.target_fps as f64, 1.0, 240.0)?;
        ConfigError::check_range("adaptation_speed", self.adaptation_speed as f64, 0.01, 1.0)?;
        ConfigError::check_range(
            "transition_history",
            self.transition_history as f64,
            1.0,
            10_000.0,
        )?;
        let h = &self.hysteresis;
        let ordered = 0.0 < h.critical_ratio
            && h.critical_ratio <= h.downgrade_ratio
            && h.downgrade_ratio < 1.0
            && h.upgrade_ratio > 1.0;
        if !ordered {
            return Err(ConfigError::UnorderedThresholds(format!(
                "hysteresis ratios must satisfy 0 < critical ({}) <= downgrade ({}) < 1 < upgrade ({})",
                h.critical_ratio, h.downgrade_ratio, h.upgrade_ratio
            )));
        }
        Ok(())
    }
}

/// Where the average FPS sits relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FpsBand {
    /// Below the critical ratio.
    Critical,
    /// Below the downgrade ratio.
    Below,
    /// Between the downgrade and upgrade ratios.
    OnTarget,
    /// Above the upgrade ratio.
    Above,
}

impl FpsBand {
    /// Classifies `avg_fps` against `target_fps`.
    pub fn classify(avg_fps: f32, target_fps: f32, h: &HysteresisConfig) -> Self {
        if avg_fps < h.critical_ratio * target_fps {
            FpsBand::Critical
        } else if avg_fps < h.downgrade_ratio * target_fps {
            FpsBand::Below
        } else if avg_fps > h.upgrade_ratio * target_fps {
            FpsBand::Above
        } else {
            FpsBand::OnTarget
        }
    }
}

/// The fixed decision table.
pub fn lookup(complexity: ComplexityLevel, band: FpsBand) -> QualityLevel {
    use ComplexityLevel as C;
    use FpsBand as B;
    use QualityLevel::{High, Low, Medium};
    match (complexity, band) {
        (_, B::Critical) => Low,
        (C::Low, B::Below) => Medium,
        (_, B::Below) => Low,
        (C::Low, B::OnTarget) => High,
        (C::Medium | C::High, B::OnTarget) => Medium,
        (C::VeryHigh, B::OnTarget) => Low,
        (C::Low | C::Medium, B::Above) => High,
        (C::High | C::VeryHigh, B::Above) => Medium,
    }
}

/// The closed set of strategy states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveStrategy {
    /// The live strategy equals the preset of the level.
    Settled(QualityLevel),
    /// The live strategy is interpolating toward the preset of `target`.
    Migrating {
        /// Level being moved toward.
        target: QualityLevel,
    },
    /// A strategy set by the host, outside of the presets.
    Custom,
}

impl ActiveStrategy {
    /// The level the strategy belongs to, `None` for custom strategies.
    pub fn level(self) -> Option<QualityLevel> {
        match self {
            ActiveStrategy::Settled(level) | ActiveStrategy::Migrating { target: level } => {
                Some(level)
            }
            ActiveStrategy::Custom => None,
        }
    }
}

/// Inputs of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyInputs {
    /// Average FPS from the metrics summary.
    pub avg_fps: f32,
    /// Number of samples the average covers.
    pub sample_count: usize,
    /// Latest complexity level.
    pub complexity: ComplexityLevel,
    /// Coefficient of variation of the instantaneous FPS.
    pub stability: f32,
}

impl PolicyInputs {
    /// Builds inputs from the collector and scorer outputs.
    pub fn from_summary(
        summary: &PerformanceSummary,
        complexity: ComplexityLevel,
        stability: f32,
    ) -> Self {
        Self {
            avg_fps: summary.avg_fps,
            sample_count: summary.sample_count,
            complexity,
            stability,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Down,
    Up,
}

/// How the policy was seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedState {
    /// No device profile; started from medium.
    Unprofiled,
    /// A benchmark is running; holding the safe default.
    BenchmarkPending,
    /// Seeded from a device profile.
    Profiled,
    /// The device cannot render 3D content; pinned to low.
    Unsupported,
}

/// The hysteresis state machine and the migration it drives.
#[derive(Debug)]
pub struct StrategyPolicy {
    config: PolicyConfig,
    presets: StrategyPresets,
    mode: PerformanceMode,
    level: QualityLevel,
    active: ActiveStrategy,
    migration: StrategyMigration,
    seed: SeedState,
    reference_complexity: Option<ComplexityLevel>,
    last_evaluation_ms: Option<u64>,
    last_switch_ms: Option<u64>,
    history: RingBuffer<ModeTransition>,
}

impl StrategyPolicy {
    /// Creates a policy in `auto` mode, settled on the medium preset.
    pub fn new(config: PolicyConfig, presets: StrategyPresets) -> Self {
        let level = QualityLevel::Medium;
        let migration = StrategyMigration::new(
            presets.for_level(level).clone(),
            config.adaptation_speed,
            config.snap_epsilon.clone(),
        );
        Self {
            history: RingBuffer::new(config.transition_history),
            config,
            presets,
            mode: PerformanceMode::Auto,
            level,
            active: ActiveStrategy::Settled(level),
            migration,
            seed: SeedState::Unprofiled,
            reference_complexity: None,
            last_evaluation_ms: None,
            last_switch_ms: None,
        }
    }

    // ── Seeding ──────────────────────────────────────────────────────────

    /// Holds the safe low preset while a benchmark is in flight.
    pub fn begin_benchmark(&mut self) {
        log::info!("StrategyPolicy: benchmark in flight, holding the low preset.");
        self.seed = SeedState::BenchmarkPending;
        self.snap_to_level(QualityLevel::Low);
    }

    /// Seeds the starting level from a device profile.
    ///
    /// Unknown tiers start from low. Unsupported devices are pinned to low.
    pub fn seed_from_profile(&mut self, profile: &DeviceProfile) {
        if !profile.is_supported() {
            log::warn!("StrategyPolicy: 3D rendering unsupported, pinning the low preset.");
            self.seed = SeedState::Unsupported;
            self.snap_to_level(QualityLevel::Low);
            return;
        }
        self.seed = SeedState::Profiled;
        let level = self
            .mode
            .fixed_level()
            .unwrap_or_else(|| profile.tier.initial_level());
        log::info!(
            "StrategyPolicy: seeded from tier {:?} (score {:.1}), starting at {level}.",
            profile.tier,
            profile.score
        );
        self.snap_to_level(level);
    }

    fn snap_to_level(&mut self, level: QualityLevel) {
        self.level = level;
        self.active = ActiveStrategy::Settled(level);
        self.migration.snap_to(self.presets.for_level(level).clone());
        self.reference_complexity = None;
    }

    // ── Evaluation ───────────────────────────────────────────────────────

    /// Runs one rate-limited evaluation. Returns the executed transition, if any.
    pub fn evaluate(&mut self, now_ms: u64, inputs: &PolicyInputs) -> Option<ModeTransition> {
        if self.mode != PerformanceMode::Auto || self.active == ActiveStrategy::Custom {
            return None;
        }
        if self.holds_safe_default() {
            return None;
        }
        if inputs.sample_count == 0 {
            return None;
        }
        if let Some(last) = self.last_evaluation_ms {
            if now_ms.saturating_sub(last) < self.config.min_adjustment_interval_ms {
                return None;
            }
        }
        if let Some(last) = self.last_switch_ms {
            if now_ms.saturating_sub(last) < self.config.cooldown_period_ms {
                log::trace!("StrategyPolicy: in cooldown, skipping evaluation.");
                return None;
            }
        }

        self.last_evaluation_ms = Some(now_ms);
        let previous = self.reference_complexity.replace(inputs.complexity);
        let target_fps = self.config.target_fps;
        let h = &self.config.hysteresis;
        let band = FpsBand::classify(inputs.avg_fps, target_fps, h);

        let mut triggers = Vec::new();
        let direction = if inputs.avg_fps < h.downgrade_ratio * target_fps {
            triggers.push(format!(
                "average fps {:.1} below {:.1}",
                inputs.avg_fps,
                h.downgrade_ratio * target_fps
            ));
            Some(Direction::Down)
        } else if let Some(prev) = previous.filter(|p| inputs.complexity > *p) {
            triggers.push(format!("complexity increased {prev} -> {}", inputs.complexity));
            Some(Direction::Down)
        } else if let Some(prev) = previous.filter(|p| inputs.complexity < *p) {
            if inputs.avg_fps > h.upgrade_ratio * target_fps
                && inputs.stability <= h.max_upgrade_instability
            {
                triggers.push(format!("complexity decreased {prev} -> {}", inputs.complexity));
                triggers.push(format!(
                    "average fps {:.1} above {:.1}",
                    inputs.avg_fps,
                    h.upgrade_ratio * target_fps
                ));
                Some(Direction::Up)
            } else {
                None
            }
        } else {
            None
        };

        let candidate = lookup(inputs.complexity, band);
        log::debug!(
            "StrategyPolicy: evaluated at {now_ms}ms: {:.1} fps ({band:?}), complexity {}, current {}, lookup {candidate}, direction {direction:?}",
            inputs.avg_fps,
            inputs.complexity,
            self.level
        );

        let moves = match direction {
            Some(Direction::Down) => candidate < self.level,
            Some(Direction::Up) => candidate > self.level,
            None => false,
        };
        if !moves {
            return None;
        }
        Some(self.transition_to(now_ms, candidate, triggers))
    }

    fn transition_to(
        &mut self,
        now_ms: u64,
        to: QualityLevel,
        triggers: Vec<String>,
    ) -> ModeTransition {
        let transition = ModeTransition {
            at_ms: now_ms,
            from: self.level,
            to,
            triggers,
        };
        log::info!(
            "StrategyPolicy: {} -> {} at {now_ms}ms ({}).",
            transition.from,
            transition.to,
            transition.triggers.join("; ")
        );
        self.level = to;
        self.active = ActiveStrategy::Migrating { target: to };
        self.migration.restart(self.presets.for_level(to).clone());
        self.last_switch_ms = Some(now_ms);
        self.history.push(transition.clone());
        transition
    }

    // ── Migration ────────────────────────────────────────────────────────

    /// Advances the migration by one tick and returns the live strategy.
    pub fn step(&mut self) -> &OptimizationStrategy {
        let complete = self.migration.apply_gradual_adjustment();
        if let (true, ActiveStrategy::Migrating { target }) = (complete, self.active) {
            log::debug!("StrategyPolicy: settled on {target}.");
            self.active = ActiveStrategy::Settled(target);
        }
        self.migration.current()
    }

    // ── Host setters ─────────────────────────────────────────────────────

    /// Selects a mode by hand. A pinned mode migrates to its preset and records
    /// a transition; every call restarts the cooldown.
    ///
    /// While the low preset is held (benchmark in flight, unsupported device) the
    /// mode is only remembered; seeding picks it up once a profile arrives.
    pub fn set_mode(&mut self, now_ms: u64, mode: PerformanceMode) -> Option<ModeTransition> {
        log::info!("StrategyPolicy: mode set to {mode:?}.");
        self.mode = mode;
        self.last_switch_ms = Some(now_ms);
        self.reference_complexity = None;

        if self.holds_safe_default() {
            log::warn!(
                "StrategyPolicy: holding the low preset ({:?}), mode deferred.",
                self.seed
            );
            return None;
        }
        let target = match mode.fixed_level() {
            Some(level) => level,
            None => {
                if self.active == ActiveStrategy::Custom {
                    self.active = ActiveStrategy::Migrating { target: self.level };
                    self.migration.restart(self.presets.for_level(self.level).clone());
                }
                return None;
            }
        };
        if target == self.level && self.active != ActiveStrategy::Custom {
            return None;
        }
        Some(self.transition_to(now_ms, target, vec![MANUAL_TRIGGER.to_string()]))
    }

    /// Starts migrating toward a host-provided strategy, clamped into the limits.
    ///
    /// Ignored while the low preset is held. Returns whether the strategy was taken.
    pub fn set_custom_strategy(&mut self, strategy: OptimizationStrategy) -> bool {
        if self.holds_safe_default() {
            log::warn!(
                "StrategyPolicy: holding the low preset ({:?}), custom strategy ignored.",
                self.seed
            );
            return false;
        }
        log::info!("StrategyPolicy: custom strategy set.");
        self.active = ActiveStrategy::Custom;
        self.migration.restart(strategy.clamped(&self.presets.limits));
        true
    }

    /// Replaces the configuration and presets without resetting timers.
    ///
    /// An in-flight migration is re-targeted to the new preset of its level.
    pub fn update_config(&mut self, config: PolicyConfig, presets: StrategyPresets) {
        self.history.set_capacity(config.transition_history);
        self.migration.set_speed(config.adaptation_speed);
        self.config = config;
        self.presets = presets;
        if let Some(level) = self.active.level() {
            let target = self.presets.for_level(level).clone();
            if &target != self.migration.target() {
                self.active = ActiveStrategy::Migrating { target: level };
                self.migration.restart(target);
            }
        }
    }

    /// Forgets the transition history and the evaluation timers.
    pub fn reset(&mut self) {
        self.history.clear();
        self.last_evaluation_ms = None;
        self.last_switch_ms = None;
        self.reference_complexity = None;
    }

    // ── Accessors ────────────────────────────────────────────────────────

    /// Selected mode.
    pub fn mode(&self) -> PerformanceMode {
        self.mode
    }

    /// The level the policy has chosen (possibly still being migrated to).
    pub fn level(&self) -> QualityLevel {
        self.level
    }

    /// Current state of the strategy.
    pub fn active(&self) -> ActiveStrategy {
        self.active
    }

    /// The live, possibly interpolated, strategy.
    pub fn current_strategy(&self) -> &OptimizationStrategy {
        self.migration.current()
    }

    /// The strategy being migrated toward.
    pub fn target_strategy(&self) -> &OptimizationStrategy {
        self.migration.target()
    }

    /// How the policy was seeded.
    pub fn seed_state(&self) -> SeedState {
        self.seed
    }

    fn holds_safe_default(&self) -> bool {
        matches!(self.seed, SeedState::BenchmarkPending | SeedState::Unsupported)
    }

    /// Executed transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &ModeTransition> {
        self.history.iter()
    }

    /// Clock time of the last switch.
    pub fn last_switch_ms(&self) -> Option<u64> {
        self.last_switch_ms
    }

    /// Current configuration.
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Current presets.
    pub fn presets(&self) -> &StrategyPresets {
        &self.presets
    }
}

impl Default for StrategyPolicy {
    fn default() -> Self {
        Self::new(PolicyConfig::default(), StrategyPresets::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::control::ShadowQuality;
    use lumen_core::platform::{DeviceTier, HardwareSnapshot, ProbeStatus};

    fn inputs(avg_fps: f32, complexity: ComplexityLevel) -> PolicyInputs {
        PolicyInputs {
            avg_fps,
            sample_count: 5,
            complexity,
            stability: 0.0,
        }
    }

    fn profile(tier: DeviceTier, status: ProbeStatus) -> DeviceProfile {
        DeviceProfile {
            tier,
            status,
            hardware: HardwareSnapshot::default(),
            gpu: None,
            benchmark: None,
            hardware_score: 0.0,
            score: 0.0,
        }
    }

    #[test]
    fn test_lookup_table() {
        use ComplexityLevel as C;
        use FpsBand as B;
        use QualityLevel::{High, Low, Medium};
        let rows = [
            (C::Low, [Low, Medium, High, High]),
            (C::Medium, [Low, Low, Medium, High]),
            (C::High, [Low, Low, Medium, Medium]),
            (C::VeryHigh, [Low, Low, Low, Medium]),
        ];
        for (complexity, expected) in rows {
            for (band, level) in [B::Critical, B::Below, B::OnTarget, B::Above].into_iter().zip(expected) {
                assert_eq!(lookup(complexity, band), level, "{complexity} / {band:?}");
            }
        }
    }

    #[test]
    fn test_fps_bands() {
        let h = HysteresisConfig::default();
        assert_eq!(FpsBand::classify(20.0, 45.0, &h), FpsBand::Critical);
        assert_eq!(FpsBand::classify(30.0, 45.0, &h), FpsBand::Below);
        assert_eq!(FpsBand::classify(45.0, 45.0, &h), FpsBand::OnTarget);
        assert_eq!(FpsBand::classify(55.0, 45.0, &h), FpsBand::Above);
    }

    #[test]
    fn test_low_fps_downgrades() {
        let mut policy = StrategyPolicy::default();
        let t = policy
            .evaluate(0, &inputs(18.0, ComplexityLevel::High))
            .expect("should downgrade");
        assert_eq!((t.from, t.to), (QualityLevel::Medium, QualityLevel::Low));
        assert!(t.is_downgrade());
        assert_eq!(policy.active(), ActiveStrategy::Migrating { target: QualityLevel::Low });
    }

    #[test]
    fn test_no_evaluation_without_samples() {
        let mut policy = StrategyPolicy::default();
        let mut i = inputs(10.0, ComplexityLevel::VeryHigh);
        i.sample_count = 0;
        assert!(policy.evaluate(0, &i).is_none());
        // The empty evaluation did not consume the rate limit.
        assert!(policy.evaluate(1, &inputs(10.0, ComplexityLevel::VeryHigh)).is_some());
    }

    #[test]
    fn test_rate_limit_and_cooldown() {
        let mut policy = StrategyPolicy::default();
        assert!(policy.evaluate(0, &inputs(45.0, ComplexityLevel::Low)).is_none());
        // Complexity jump inside the adjustment interval is not seen yet.
        assert!(policy.evaluate(1000, &inputs(45.0, ComplexityLevel::VeryHigh)).is_none());
        let t = policy
            .evaluate(2000, &inputs(45.0, ComplexityLevel::VeryHigh))
            .expect("complexity increase downgrades");
        assert_eq!(t.to, QualityLevel::Low);
        // Cooldown blocks everything for 5s after the switch.
        assert!(policy.evaluate(4000, &inputs(60.0, ComplexityLevel::Low)).is_none());
        assert!(policy.evaluate(6999, &inputs(60.0, ComplexityLevel::Low)).is_none());
        let t = policy
            .evaluate(7000, &inputs(60.0, ComplexityLevel::Low))
            .expect("complexity decrease with high fps upgrades");
        assert_eq!(t.to, QualityLevel::High);
    }

    #[test]
    fn test_unstable_fps_holds_upgrade() {
        let mut policy = StrategyPolicy::default();
        policy.evaluate(0, &inputs(60.0, ComplexityLevel::High));
        let mut i = inputs(60.0, ComplexityLevel::Medium);
        i.stability = 0.5;
        assert!(policy.evaluate(2000, &i).is_none());
    }

    #[test]
    fn test_seeding() {
        let mut policy = StrategyPolicy::default();
        assert_eq!(policy.level(), QualityLevel::Medium);

        policy.begin_benchmark();
        assert_eq!(policy.level(), QualityLevel::Low);
        assert!(policy.evaluate(0, &inputs(10.0, ComplexityLevel::High)).is_none());

        policy.seed_from_profile(&profile(DeviceTier::Unknown, ProbeStatus::Interrupted));
        assert_eq!(policy.level(), QualityLevel::Low);

        policy.seed_from_profile(&profile(DeviceTier::High, ProbeStatus::Completed));
        assert_eq!(policy.level(), QualityLevel::High);
        assert_eq!(policy.current_strategy(), &OptimizationStrategy::preset(QualityLevel::High));

        policy.seed_from_profile(&profile(DeviceTier::Unknown, ProbeStatus::Unsupported));
        assert_eq!(policy.seed_state(), SeedState::Unsupported);
        assert!(policy.set_mode(0, PerformanceMode::High).is_none());
        assert_eq!(policy.level(), QualityLevel::Low);
    }

    #[test]
    fn test_manual_mode_records_transition_and_resets_cooldown() {
        let mut policy = StrategyPolicy::default();
        let t = policy
            .set_mode(100, PerformanceMode::High)
            .expect("manual switch");
        assert_eq!(t.triggers, vec![MANUAL_TRIGGER.to_string()]);
        assert!(policy.evaluate(200, &inputs(10.0, ComplexityLevel::High)).is_none());

        policy.set_mode(300, PerformanceMode::Auto);
        assert!(policy.evaluate(5299, &inputs(10.0, ComplexityLevel::High)).is_none());
        assert!(policy.evaluate(5300, &inputs(10.0, ComplexityLevel::High)).is_some());
        assert_eq!(policy.transitions().count(), 2);
    }

    #[test]
    fn test_step_settles_after_migration() {
        let mut policy = StrategyPolicy::default();
        policy.set_mode(0, PerformanceMode::Low);
        for _ in 0..500 {
            policy.step();
        }
        assert_eq!(policy.active(), ActiveStrategy::Settled(QualityLevel::Low));
        assert_eq!(policy.current_strategy(), &OptimizationStrategy::preset(QualityLevel::Low));
    }

    #[test]
    fn test_custom_strategy_is_clamped_and_skips_evaluation() {
        let mut policy = StrategyPolicy::default();
        policy.set_custom_strategy(OptimizationStrategy {
            particle_budget: 50_000,
            ..OptimizationStrategy::default()
        });
        assert_eq!(policy.active(), ActiveStrategy::Custom);
        assert_eq!(policy.target_strategy().particle_budget, 20_000);
        assert!(policy.evaluate(0, &inputs(5.0, ComplexityLevel::VeryHigh)).is_none());

        policy.set_mode(10, PerformanceMode::Auto);
        assert_eq!(policy.active(), ActiveStrategy::Migrating { target: QualityLevel::Medium });
    }

    #[test]
    fn test_setters_hold_low_while_benchmarking() {
        let mut policy = StrategyPolicy::default();
        policy.begin_benchmark();

        assert!(policy.set_mode(0, PerformanceMode::High).is_none());
        assert!(!policy.set_custom_strategy(OptimizationStrategy::preset(QualityLevel::High)));
        for _ in 0..500 {
            policy.step();
        }
        assert_eq!(policy.active(), ActiveStrategy::Settled(QualityLevel::Low));
        assert_eq!(policy.current_strategy(), &OptimizationStrategy::preset(QualityLevel::Low));

        // The deferred mode wins over the tier once the profile arrives.
        policy.seed_from_profile(&profile(DeviceTier::Low, ProbeStatus::Completed));
        assert_eq!(policy.level(), QualityLevel::High);
    }

    #[test]
    fn test_unsupported_device_ignores_custom_strategy() {
        let mut policy = StrategyPolicy::default();
        policy.seed_from_profile(&profile(DeviceTier::Unknown, ProbeStatus::Unsupported));

        assert!(!policy.set_custom_strategy(OptimizationStrategy::preset(QualityLevel::High)));
        for _ in 0..500 {
            policy.step();
        }
        assert_eq!(policy.active(), ActiveStrategy::Settled(QualityLevel::Low));
        assert_eq!(policy.current_strategy().shadow_quality, ShadowQuality::Off);
    }

    #[test]
    fn test_transition_history_is_bounded() {
        let mut policy = StrategyPolicy::new(
            PolicyConfig {
                transition_history: 3,
                ..PolicyConfig::default()
            },
            StrategyPresets::default(),
        );
        let modes = [PerformanceMode::Low, PerformanceMode::High];
        for i in 0..10u64 {
            policy.set_mode(i, modes[(i % 2) as usize]);
        }
        assert_eq!(policy.transitions().count(), 3);
        assert_eq!(policy.transitions().last().map(|t| t.at_ms), Some(9));
    }

    #[test]
    fn test_update_config_retargets_migration() {
        let mut policy = StrategyPolicy::default();
        let mut presets = StrategyPresets::default();
        presets.medium.particle_budget = 4000;
        policy.update_config(PolicyConfig::default(), presets);
        assert_eq!(policy.active(), ActiveStrategy::Migrating { target: QualityLevel::Medium });
        assert_eq!(policy.target_strategy().particle_budget, 4000);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(PolicyConfig::default().validate().is_ok());
        let bad = PolicyConfig {
            hysteresis: HysteresisConfig {
                upgrade_ratio: 0.9,
                ..HysteresisConfig::default()
            },
            ..PolicyConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
