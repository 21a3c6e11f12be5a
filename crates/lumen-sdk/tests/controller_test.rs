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

//! End-to-end tests of the controller driven by a simulated renderer and a
//! manual clock.

use lumen_agents::InMemoryResourceBackend;
use lumen_control::ActiveStrategy;
use lumen_core::control::{
    ModeTransition, OptimizationStrategy, PerformanceMode, QualityLevel, ShadowQuality,
};
use lumen_core::platform::{DeviceProfile, HardwareSnapshot};
use lumen_core::renderer::{GpuResourceKind, RenderTarget, RendererInfo};
use lumen_core::scene::{GeometryResource, MaterialResource, NodeKind, SceneNode};
use lumen_core::telemetry::PerformanceEvent;
use lumen_core::{Clock, ManualClock};
use lumen_sdk::{ControllerConfig, ControllerStatus, FrameLoop, PerformanceController};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────
// Harness
// ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SimTarget {
    pixel_ratio: f32,
    buffer: (u32, u32),
    shadows: (bool, u32),
    heap_mb: Option<f32>,
}

impl RenderTarget for SimTarget {
    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }
    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }
    fn device_pixel_ratio(&self) -> f32 {
        2.0
    }
    fn canvas_size(&self) -> (u32, u32) {
        (1280, 720)
    }
    fn set_drawing_buffer_size(&mut self, width: u32, height: u32) {
        self.buffer = (width, height);
    }
    fn set_shadow_map(&mut self, enabled: bool, resolution: u32) {
        self.shadows = (enabled, resolution);
    }
    fn info(&self) -> RendererInfo {
        RendererInfo {
            draw_calls: 12,
            triangles: 40_000,
            points: 10_000,
            geometries: 3,
            textures: 2,
            programs: 2,
        }
    }
    fn heap_mb(&self) -> Option<f32> {
        self.heap_mb
    }
}

struct FlagLoop(Arc<AtomicBool>);

impl FrameLoop for FlagLoop {
    fn cancel(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

struct Harness {
    clock: ManualClock,
    backend: InMemoryResourceBackend,
    target: SimTarget,
    controller: PerformanceController,
    cancelled: Arc<AtomicBool>,
}

impl Harness {
    fn new(config: ControllerConfig) -> Self {
        let clock = ManualClock::new();
        let backend = InMemoryResourceBackend::new();
        let mut controller =
            PerformanceController::new(config, Arc::new(clock.clone()), Box::new(backend.clone()))
                .expect("valid config");
        let cancelled = Arc::new(AtomicBool::new(false));
        controller.init(Box::new(FlagLoop(Arc::clone(&cancelled))));
        Self {
            clock,
            backend,
            target: SimTarget::default(),
            controller,
            cancelled,
        }
    }

    /// Ticks at a fixed frame rate until `duration_ms` of clock time has passed.
    fn run(&mut self, scene: &SceneNode, fps: f64, duration_ms: u64) -> Vec<ModeTransition> {
        let frame = Duration::from_secs_f64(1.0 / fps);
        let end = self.clock.now() + Duration::from_millis(duration_ms);
        let mut transitions = Vec::new();
        while self.clock.now() < end {
            let outcome = self.controller.tick(&mut self.target, scene);
            transitions.extend(outcome.transition);
            self.clock.advance(frame);
        }
        transitions
    }
}

/// Scores about 65 (high) with a mesh, about 43 (medium) without.
fn scene(backend: &InMemoryResourceBackend, field_resolution: u32, with_mesh: bool) -> SceneNode {
    let material = MaterialResource::new(backend.register(GpuResourceKind::Material));
    let mut root = SceneNode::group(1, "root")
        .with_child(
            SceneNode::new(2, "particles", NodeKind::Points)
                .with_geometry(GeometryResource {
                    id: backend.register(GpuResourceKind::Geometry),
                    vertex_count: 10_000,
                    index_count: None,
                })
                .with_material(material.clone()),
        )
        .with_child(
            SceneNode::new(
                3,
                "field",
                NodeKind::Field {
                    resolution: field_resolution,
                },
            )
            .with_material(material.clone()),
        );
    if with_mesh {
        root = root.with_child(
            SceneNode::new(4, "surface", NodeKind::Mesh)
                .with_geometry(GeometryResource {
                    id: backend.register(GpuResourceKind::Geometry),
                    vertex_count: 200_000,
                    index_count: Some(750_000),
                })
                .with_material(material),
        );
    }
    root
}

fn high_scene(backend: &InMemoryResourceBackend) -> SceneNode {
    scene(backend, 128, true)
}

fn medium_scene(backend: &InMemoryResourceBackend) -> SceneNode {
    scene(backend, 64, false)
}

// ─────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_low_fps_with_high_complexity_selects_low() {
    let mut h = Harness::new(ControllerConfig::default());
    let scene = high_scene(&h.backend);

    let transitions = h.run(&scene, 18.0, 1300);

    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].from, QualityLevel::Medium);
    assert_eq!(transitions[0].to, QualityLevel::Low);
    assert!(transitions[0].at_ms <= 1100);
    assert!(h
        .controller
        .drain_events()
        .iter()
        .any(|e| matches!(e, PerformanceEvent::ModeChanged(t) if t.to == QualityLevel::Low)));
}

#[test]
fn test_complexity_drop_upgrades_exactly_once() {
    let mut h = Harness::new(ControllerConfig::default());
    let high = high_scene(&h.backend);
    let medium = medium_scene(&h.backend);

    let before = h.run(&high, 58.0, 2500);
    let after = h.run(&medium, 58.0, 5400);

    assert!(before.is_empty());
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].from, QualityLevel::Medium);
    assert_eq!(after[0].to, QualityLevel::High);
}

#[test]
fn test_migration_settles_on_the_new_preset() {
    let mut h = Harness::new(ControllerConfig::default());
    let scene = high_scene(&h.backend);

    h.run(&scene, 18.0, 6000);

    assert_eq!(
        h.controller.performance_stats().active,
        ActiveStrategy::Settled(QualityLevel::Low)
    );
    assert_eq!(
        h.controller.current_strategy(),
        &OptimizationStrategy::preset(QualityLevel::Low)
    );
    assert_eq!(h.controller.scene_budgets().particle_budget, 1000);
    assert_eq!(h.target.shadows, (false, 0));
    assert_eq!(h.backend.live_of_kind(GpuResourceKind::RenderTarget), 0);
}

// ─────────────────────────────────────────────────────────────────────
// Seeding
// ─────────────────────────────────────────────────────────────────────

fn hardware() -> HardwareSnapshot {
    HardwareSnapshot {
        logical_cores: 4,
        total_memory_mb: Some(4096),
        is_mobile: false,
        has_touch: false,
    }
}

#[test]
fn test_unsupported_profile_pins_low_and_disables_3d() {
    let mut h = Harness::new(ControllerConfig::default());
    h.controller
        .complete_benchmark(DeviceProfile::unsupported(hardware()));
    let scene = high_scene(&h.backend);

    assert!(!h
        .controller
        .set_custom_strategy(OptimizationStrategy::preset(QualityLevel::High)));
    assert!(h.controller.set_mode(PerformanceMode::High).is_none());
    let transitions = h.run(&scene, 60.0, 8000);

    assert_eq!(h.controller.status(), ControllerStatus::Unsupported);
    assert!(!h.controller.three_d_available());
    assert!(transitions.is_empty());
    assert_eq!(
        h.controller.current_strategy(),
        &OptimizationStrategy::preset(QualityLevel::Low)
    );
    assert_eq!(h.target.shadows, (false, 0));
    assert_eq!(h.backend.live_of_kind(GpuResourceKind::RenderTarget), 0);
}

#[test]
fn test_benchmark_in_flight_holds_safe_default() {
    let mut h = Harness::new(ControllerConfig::default());
    h.controller.begin_benchmark();
    let scene = medium_scene(&h.backend);

    let transitions = h.run(&scene, 120.0, 8000);

    assert!(transitions.is_empty());
    assert_eq!(h.controller.status(), ControllerStatus::Benchmarking);
    assert_eq!(h.controller.performance_stats().level, QualityLevel::Low);

    h.controller
        .complete_benchmark(DeviceProfile::interrupted(hardware(), None));
    assert_eq!(h.controller.status(), ControllerStatus::Running);
    assert_eq!(h.controller.performance_stats().level, QualityLevel::Low);
}

#[test]
fn test_setters_are_held_while_benchmarking() {
    let mut h = Harness::new(ControllerConfig::default());
    h.controller.begin_benchmark();
    let scene = medium_scene(&h.backend);

    assert!(h.controller.set_mode(PerformanceMode::High).is_none());
    assert!(!h
        .controller
        .set_custom_strategy(OptimizationStrategy::preset(QualityLevel::High)));
    h.run(&scene, 60.0, 3000);

    assert_eq!(
        h.controller.current_strategy(),
        &OptimizationStrategy::preset(QualityLevel::Low)
    );
    assert_eq!(h.target.shadows, (false, 0));

    // The pinned mode takes over once the profile arrives.
    h.controller
        .complete_benchmark(DeviceProfile::interrupted(hardware(), None));
    assert_eq!(h.controller.performance_stats().level, QualityLevel::High);
}

// ─────────────────────────────────────────────────────────────────────
// Host setters
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_custom_strategy_mid_migration_restarts_cleanly() {
    let mut h = Harness::new(ControllerConfig::default());
    let scene = medium_scene(&h.backend);
    let manual = h.controller.set_mode(PerformanceMode::High);
    assert!(manual.is_some_and(|t| t.triggers == vec!["manual".to_string()]));
    h.run(&scene, 60.0, 100);

    let custom = OptimizationStrategy {
        particle_budget: 2000,
        field_resolution: 48,
        render_scale: 0.7,
        shadow_quality: ShadowQuality::Medium,
        pixel_ratio: 1.0,
        frame_skip_threshold: 0.0,
        enable_lod: true,
        enable_culling: true,
    };
    h.controller.set_custom_strategy(custom.clone());
    h.run(&scene, 60.0, 5000);

    assert_eq!(h.controller.performance_stats().active, ActiveStrategy::Custom);
    assert_eq!(h.controller.current_strategy(), &custom);
    assert_eq!(h.target.shadows, (true, 1024));
}

#[test]
fn test_update_config_resizes_history_without_restart() {
    let mut h = Harness::new(ControllerConfig::default());
    let scene = medium_scene(&h.backend);
    h.run(&scene, 60.0, 5500);
    assert_eq!(h.controller.report().samples.len(), 5);

    let mut config = h.controller.config().clone();
    config.collector.history_capacity = 2;
    config.summary_window = 2;
    h.controller.update_config(config).expect("valid config");

    assert_eq!(h.controller.report().samples.len(), 2);
    assert_eq!(h.controller.status(), ControllerStatus::Running);

    let mut invalid = h.controller.config().clone();
    invalid.policy.adaptation_speed = 3.0;
    assert!(h.controller.update_config(invalid).is_err());
}

#[test]
fn test_callbacks_fire_on_samples_and_applications() {
    let mut h = Harness::new(ControllerConfig::default());
    let samples = Rc::new(Cell::new(0));
    let applied = Rc::new(Cell::new(0));
    let s = Rc::clone(&samples);
    h.controller
        .on_performance_change(move |_, _| s.set(s.get() + 1));
    let a = Rc::clone(&applied);
    h.controller
        .on_optimization_applied(move |_, _| a.set(a.get() + 1));
    let scene = medium_scene(&h.backend);

    h.run(&scene, 60.0, 2500);

    assert_eq!(samples.get(), 2);
    assert_eq!(applied.get(), 1);
}

// ─────────────────────────────────────────────────────────────────────
// Lifecycle and export
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_dispose_cancels_loop_and_releases_everything() {
    let mut h = Harness::new(ControllerConfig::default());
    let scene = high_scene(&h.backend);
    assert_eq!(h.controller.adopt(&scene), 4);
    h.run(&scene, 60.0, 3000);
    assert!(h.backend.live_count() > 0);

    h.controller.dispose();

    assert!(h.cancelled.load(Ordering::SeqCst));
    assert_eq!(h.controller.status(), ControllerStatus::Disposed);
    assert_eq!(h.backend.live_count(), 0);
    assert_eq!(h.backend.invalid_releases(), 0);
    assert_eq!(h.controller.performance_stats().summary.sample_count, 0);
    assert!(h.controller.analysis_status().transitions.is_empty());
    assert!(!h.controller.tick(&mut h.target, &scene).render);

    h.controller.dispose();
    assert_eq!(h.backend.invalid_releases(), 0);
}

#[test]
fn test_dispose_removed_subtree() {
    let mut h = Harness::new(ControllerConfig::default());
    let scene = medium_scene(&h.backend);
    h.controller.adopt(&scene);

    let first = h.controller.dispose_removed(&scene);
    let second = h.controller.dispose_removed(&scene);

    assert_eq!(first.nodes_disposed, 3);
    assert_eq!(second.released, 0);
    assert_eq!(h.backend.live_count(), 0);
}

#[test]
fn test_exact_heap_reading_reaches_the_report() {
    let mut h = Harness::new(ControllerConfig::default());
    h.target.heap_mb = Some(256.0);
    let scene = medium_scene(&h.backend);
    h.run(&scene, 60.0, 2500);

    let json = h.controller.export_report().expect("serializable");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    let samples = value["samples"].as_array().expect("samples array");

    assert_eq!(samples.len(), 2);
    for sample in samples {
        assert_eq!(sample["memoryEstimated"], false);
        assert_eq!(sample["memoryUsage"].as_f64(), Some(256.0));
    }
    assert!(!h.controller.performance_stats().summary.memory_estimated);
}

#[test]
fn test_export_report_uses_documented_field_names() {
    let mut h = Harness::new(ControllerConfig::default());
    let scene = medium_scene(&h.backend);
    h.run(&scene, 60.0, 3500);

    let json = h.controller.export_report().expect("serializable");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    assert!(value["generatedAt"].as_u64().is_some());
    assert!(value["summary"]["avgFPS"].as_f64().is_some_and(|f| f > 50.0));
    let samples = value["samples"].as_array().expect("samples array");
    assert_eq!(samples.len(), 3);
    for key in [
        "timestamp",
        "frameTime",
        "fps",
        "memoryUsage",
        "drawCalls",
        "sceneComplexity",
        "performanceMode",
    ] {
        assert!(samples[0].get(key).is_some(), "missing {key}");
    }
}
