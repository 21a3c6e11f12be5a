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

//! The per-view performance controller and its render-loop tick.

use crate::config::ControllerConfig;
use crate::report::PerformanceReport;
use lumen_agents::{ApplyReport, DisposalReport, FrameSkipper, ResourceApplier, SceneBudgets};
use lumen_control::{
    ActiveStrategy, ComplexityAnalysis, ComplexityLevel, ComplexityScorer, PolicyInputs,
    SeedState, StrategyPolicy,
};
use lumen_core::control::{ModeTransition, OptimizationStrategy, PerformanceMode, QualityLevel};
use lumen_core::event::EventBus;
use lumen_core::platform::{DeviceProfile, DeviceTier};
use lumen_core::renderer::{GpuResourceBackend, RenderTarget};
use lumen_core::scene::{SceneNode, SceneStats};
use lumen_core::telemetry::{PerformanceEvent, PerformanceSample};
use lumen_core::{Clock, ConfigError};
use lumen_infra::DeviceCapabilityProbe;
use lumen_telemetry::{MetricsCollector, PerformanceSummary, SampleInputs};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// The host's render-loop registration, cancelled on dispose.
pub trait FrameLoop {
    /// Unregisters the loop. No further ticks will be delivered.
    fn cancel(&mut self);
}

/// Lifecycle state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerStatus {
    /// Constructed, waiting for `init`.
    Idle,
    /// Ticking normally.
    Running,
    /// A device benchmark is in flight; the low preset is held.
    Benchmarking,
    /// No 3D context is available; the low preset is pinned.
    Unsupported,
    /// Disposed. Ticks are ignored.
    Disposed,
}

/// What the host should do with the current frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// Whether the host should render this frame.
    pub render: bool,
    /// A metric sample was taken.
    pub sampled: bool,
    /// The scene complexity was analyzed.
    pub analyzed: bool,
    /// The mode transition executed on this tick.
    pub transition: Option<ModeTransition>,
}

/// Snapshot returned by [`PerformanceController::performance_stats`].
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStats {
    /// Summary over the policy window.
    pub summary: PerformanceSummary,
    /// Most recent sample.
    pub latest: Option<PerformanceSample>,
    /// Instantaneous FPS from the fast buffer.
    pub instant_fps: f32,
    /// Coefficient of variation of the instantaneous FPS.
    pub stability: f32,
    /// Selected mode.
    pub mode: PerformanceMode,
    /// Level the policy has chosen.
    pub level: QualityLevel,
    /// State of the live strategy.
    pub active: ActiveStrategy,
    /// Lifecycle state.
    pub status: ControllerStatus,
}

/// Snapshot returned by [`PerformanceController::analysis_status`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisStatus {
    /// Latest complexity analysis.
    pub analysis: Option<ComplexityAnalysis>,
    /// Trend of the complexity score.
    pub complexity_trend: f32,
    /// Executed transitions, oldest first.
    pub transitions: Vec<ModeTransition>,
    /// How the policy was seeded.
    pub seed: SeedState,
    /// Tier of the device, once benchmarked.
    pub tier: Option<DeviceTier>,
}

type PerformanceCallback = Box<dyn FnMut(&PerformanceSample, &PerformanceSummary)>;
type OptimizationCallback = Box<dyn FnMut(&OptimizationStrategy, &ApplyReport)>;

/// Owns the whole control loop of one visualization view.
///
/// Each tick runs, in order: frame recording, sampling, complexity analysis,
/// policy evaluation, migration step, application and the frame-skip decision.
/// Setters may be called between ticks; a new strategy set mid-migration
/// restarts the migration from the live values.
pub struct PerformanceController {
    config: ControllerConfig,
    clock: Arc<dyn Clock>,
    collector: MetricsCollector,
    scorer: ComplexityScorer,
    policy: StrategyPolicy,
    applier: ResourceApplier,
    skipper: FrameSkipper,
    events: EventBus<PerformanceEvent>,
    frame_loop: Option<Box<dyn FrameLoop>>,
    status: ControllerStatus,
    profile: Option<DeviceProfile>,
    tick_index: u64,
    last_sample_at: Option<Duration>,
    performance_callbacks: Vec<PerformanceCallback>,
    optimization_callbacks: Vec<OptimizationCallback>,
}

impl PerformanceController {
    /// Creates a controller. Invalid configuration is rejected.
    pub fn new(
        config: ControllerConfig,
        clock: Arc<dyn Clock>,
        backend: Box<dyn GpuResourceBackend>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let skipper = FrameSkipper::new(config.frame_skip.clone(), config.policy.target_fps);
        Ok(Self {
            collector: MetricsCollector::new(config.collector.clone()),
            scorer: ComplexityScorer::new(config.complexity.clone()),
            policy: StrategyPolicy::new(config.policy.clone(), config.presets.clone()),
            applier: ResourceApplier::new(backend),
            skipper,
            events: EventBus::new(),
            frame_loop: None,
            status: ControllerStatus::Idle,
            profile: None,
            tick_index: 0,
            last_sample_at: None,
            performance_callbacks: Vec::new(),
            optimization_callbacks: Vec::new(),
            clock,
            config,
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Registers the host's frame loop and starts ticking.
    pub fn init(&mut self, frame_loop: Box<dyn FrameLoop>) {
        if self.status == ControllerStatus::Disposed {
            log::warn!("PerformanceController: init after dispose ignored.");
            return;
        }
        if let Some(mut previous) = self.frame_loop.replace(frame_loop) {
            previous.cancel();
        }
        if self.status == ControllerStatus::Idle {
            self.status = ControllerStatus::Running;
        }
        log::info!("PerformanceController: initialized ({:?}).", self.status);
    }

    /// Cancels the frame loop, flushes every buffer and releases all owned GPU objects.
    ///
    /// Calling it twice is harmless.
    pub fn dispose(&mut self) {
        if self.status == ControllerStatus::Disposed {
            return;
        }
        if let Some(mut frame_loop) = self.frame_loop.take() {
            frame_loop.cancel();
        }
        self.last_sample_at = None;
        self.tick_index = 0;
        self.collector.clear();
        self.collector.drain_warnings();
        self.scorer.clear();
        self.policy.reset();
        let report = self.applier.release_all();
        self.events.drain();
        self.performance_callbacks.clear();
        self.optimization_callbacks.clear();
        self.status = ControllerStatus::Disposed;
        log::info!(
            "PerformanceController: disposed, released {} GPU object(s) ({} failure(s)).",
            report.released,
            report.failures
        );
    }

    /// Lifecycle state.
    pub fn status(&self) -> ControllerStatus {
        self.status
    }

    /// Whether the host may build 3D content.
    pub fn three_d_available(&self) -> bool {
        self.status != ControllerStatus::Unsupported
    }

    // ── Tick ─────────────────────────────────────────────────────────────

    /// Runs one render-loop tick against the borrowed renderer and active scene.
    pub fn tick(&mut self, target: &mut dyn RenderTarget, scene: &SceneNode) -> TickOutcome {
        match self.status {
            ControllerStatus::Disposed => return TickOutcome::default(),
            ControllerStatus::Idle => {
                return TickOutcome {
                    render: true,
                    ..TickOutcome::default()
                }
            }
            _ => {}
        }

        let now = self.clock.now();
        let now_ms = now.as_millis() as u64;
        self.tick_index += 1;
        let mut outcome = TickOutcome::default();

        // ── Metrics ──────────────────────────────────────────────────────
        let info = target.info();
        self.collector.record_frame(now, &info);
        let due = match self.last_sample_at {
            None => {
                self.last_sample_at = Some(now);
                false
            }
            Some(last) => {
                now.saturating_sub(last) >= Duration::from_millis(self.config.sample_rate_ms)
            }
        };
        if due {
            self.last_sample_at = Some(now);
            let inputs = SampleInputs {
                info,
                heap_mb: target.heap_mb(),
                scene_complexity: self.scorer.latest().map(|a| a.score).unwrap_or(0.0),
                mode: self.policy.level(),
            };
            self.take_sample(now, &inputs);
            outcome.sampled = true;
        }

        // ── Complexity ───────────────────────────────────────────────────
        if (self.tick_index - 1) % self.config.analysis_every_ticks == 0 {
            self.scorer.observe(&SceneStats::from_scene(scene));
            outcome.analyzed = true;
        }

        // ── Policy ───────────────────────────────────────────────────────
        if self.status == ControllerStatus::Running {
            let complexity = self
                .scorer
                .latest()
                .map(|a| a.level)
                .unwrap_or(ComplexityLevel::Low);
            let summary = self.collector.summary(self.config.summary_window);
            let inputs =
                PolicyInputs::from_summary(&summary, complexity, self.collector.stability());
            if let Some(transition) = self.policy.evaluate(now_ms, &inputs) {
                self.events
                    .publish(PerformanceEvent::ModeChanged(transition.clone()));
                outcome.transition = Some(transition);
            }
        }

        // ── Apply ────────────────────────────────────────────────────────
        let strategy = self.policy.step().clone();
        let report = self.applier.apply(&strategy, target);
        if report.changed {
            self.events.publish(PerformanceEvent::OptimizationApplied {
                level: self.policy.active().level(),
                strategy: strategy.clone(),
                at_ms: now_ms,
            });
            for callback in &mut self.optimization_callbacks {
                callback(&strategy, &report);
            }
        }

        // ── Frame skip ───────────────────────────────────────────────────
        self.skipper.set_threshold(strategy.frame_skip_threshold);
        outcome.render = !self
            .skipper
            .should_skip_frame(self.tick_index, self.collector.instant_fps());

        log::trace!(
            "PerformanceController: tick {} done (render {}, sampled {}, analyzed {}).",
            self.tick_index,
            outcome.render,
            outcome.sampled,
            outcome.analyzed
        );
        outcome
    }

    fn take_sample(&mut self, now: Duration, inputs: &SampleInputs) {
        let sample = self.collector.sample(now, inputs);
        for warning in self.collector.drain_warnings() {
            self.events.publish(PerformanceEvent::Warning(warning));
        }
        if !self.performance_callbacks.is_empty() {
            let summary = self.collector.summary(self.config.summary_window);
            for callback in &mut self.performance_callbacks {
                callback(&sample, &summary);
            }
        }
    }

    // ── Benchmark ────────────────────────────────────────────────────────

    /// Holds the low preset while the host benchmarks the device elsewhere.
    pub fn begin_benchmark(&mut self) {
        if self.status == ControllerStatus::Disposed {
            return;
        }
        self.policy.begin_benchmark();
        self.status = ControllerStatus::Benchmarking;
    }

    /// Seeds the policy from a finished benchmark.
    ///
    /// An unsupported profile pins the low preset and disables 3D content. An
    /// interrupted profile has tier `Unknown` and starts from low; the host may
    /// retry.
    pub fn complete_benchmark(&mut self, profile: DeviceProfile) {
        if self.status == ControllerStatus::Disposed {
            return;
        }
        self.policy.seed_from_profile(&profile);
        self.status = if !profile.is_supported() {
            ControllerStatus::Unsupported
        } else if self.frame_loop.is_some() {
            ControllerStatus::Running
        } else {
            ControllerStatus::Idle
        };
        self.profile = Some(profile);
    }

    /// Runs `probe` as an explicit, blocking user action and seeds the policy from it.
    pub fn run_benchmark(&mut self, probe: &mut DeviceCapabilityProbe) -> Option<&DeviceProfile> {
        if self.status == ControllerStatus::Disposed {
            return None;
        }
        self.begin_benchmark();
        let profile = probe.run();
        self.complete_benchmark(profile);
        self.profile.as_ref()
    }

    /// The last device profile.
    pub fn profile(&self) -> Option<&DeviceProfile> {
        self.profile.as_ref()
    }

    // ── UI surface ───────────────────────────────────────────────────────

    /// Current metrics and policy state.
    pub fn performance_stats(&self) -> PerformanceStats {
        PerformanceStats {
            summary: self.collector.summary(self.config.summary_window),
            latest: self.collector.latest().cloned(),
            instant_fps: self.collector.instant_fps(),
            stability: self.collector.stability(),
            mode: self.policy.mode(),
            level: self.policy.level(),
            active: self.policy.active(),
            status: self.status,
        }
    }

    /// The live, possibly interpolated, strategy.
    pub fn current_strategy(&self) -> &OptimizationStrategy {
        self.policy.current_strategy()
    }

    /// Latest complexity analysis and transition history.
    pub fn analysis_status(&self) -> AnalysisStatus {
        AnalysisStatus {
            analysis: self.scorer.latest().cloned(),
            complexity_trend: self.scorer.trend(),
            transitions: self.policy.transitions().cloned().collect(),
            seed: self.policy.seed_state(),
            tier: self.profile.as_ref().map(|p| p.tier),
        }
    }

    /// Registers a callback invoked after every metric sample.
    pub fn on_performance_change(
        &mut self,
        callback: impl FnMut(&PerformanceSample, &PerformanceSummary) + 'static,
    ) {
        self.performance_callbacks.push(Box::new(callback));
    }

    /// Registers a callback invoked whenever a strategy change reaches the renderer.
    pub fn on_optimization_applied(
        &mut self,
        callback: impl FnMut(&OptimizationStrategy, &ApplyReport) + 'static,
    ) {
        self.optimization_callbacks.push(Box::new(callback));
    }

    /// Discrete events published since the last drain.
    pub fn drain_events(&self) -> Vec<PerformanceEvent> {
        self.events.drain()
    }

    /// The event bus, for hosts that prefer to hold the receiver.
    pub fn events(&self) -> &EventBus<PerformanceEvent> {
        &self.events
    }

    /// Builds the downloadable report.
    pub fn report(&self) -> PerformanceReport {
        PerformanceReport {
            generated_at: self.clock.now_ms(),
            summary: self.collector.summary(0),
            samples: self.collector.export_records(),
        }
    }

    /// Serializes the rolling history and its summary to JSON.
    pub fn export_report(&self) -> Result<String, serde_json::Error> {
        self.report().to_json()
    }

    /// Selects a mode by hand.
    pub fn set_mode(&mut self, mode: PerformanceMode) -> Option<ModeTransition> {
        let transition = self.policy.set_mode(self.clock.now_ms(), mode)?;
        self.events
            .publish(PerformanceEvent::ModeChanged(transition.clone()));
        Some(transition)
    }

    /// Migrates toward a host-provided strategy.
    ///
    /// Returns `false` when the strategy is ignored because a benchmark is in
    /// flight or the device cannot render 3D content.
    pub fn set_custom_strategy(&mut self, strategy: OptimizationStrategy) -> bool {
        self.policy.set_custom_strategy(strategy)
    }

    /// Validates and applies a new configuration without restarting.
    ///
    /// Buffers, timers and an in-flight migration are kept.
    pub fn update_config(&mut self, config: ControllerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.collector.update_config(config.collector.clone());
        self.scorer.update_config(config.complexity.clone());
        self.policy
            .update_config(config.policy.clone(), config.presets.clone());
        self.skipper.set_config(config.frame_skip.clone());
        if (config.policy.target_fps - self.config.policy.target_fps).abs() > f32::EPSILON {
            self.skipper.set_target_fps(config.policy.target_fps);
        }
        self.config = config;
        log::info!("PerformanceController: configuration updated.");
        Ok(())
    }

    /// Current configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    // ── Scene resources ──────────────────────────────────────────────────

    /// Budgets scene-construction code should build with.
    pub fn scene_budgets(&self) -> SceneBudgets {
        self.applier.scene_budgets()
    }

    /// Hands the GPU objects of a freshly built subtree to the controller.
    pub fn adopt(&mut self, root: &SceneNode) -> usize {
        self.applier.adopt(root)
    }

    /// Releases the GPU objects of a subtree removed from the scene.
    pub fn dispose_removed(&mut self, root: &SceneNode) -> DisposalReport {
        self.applier.dispose_removed(root)
    }
}

impl Drop for PerformanceController {
    fn drop(&mut self) {
        self.dispose();
    }
}
