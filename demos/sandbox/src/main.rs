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

// Lumen Sandbox
// Drives the controller for a minute of simulated time against a renderer
// whose frame cost follows the applied strategy and the scene load.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use lumen_core::renderer::GpuResourceKind;
use lumen_core::scene::{GeometryResource, LightKind, MaterialResource};
use lumen_core::telemetry::PerformanceEvent;
use lumen_sdk::prelude::*;

const SIMULATED_SECONDS: u64 = 60;

/// Scene load per phase of the run: light, heavy, light again.
fn phase_load(at: Duration) -> Load {
    match at.as_secs() {
        0..=19 => Load::Light,
        20..=39 => Load::Heavy,
        _ => Load::Light,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Load {
    Light,
    Heavy,
}

impl Load {
    fn triangles(self) -> u32 {
        match self {
            Load::Light => 100_000,
            Load::Heavy => 600_000,
        }
    }

    fn point_lights(self) -> u32 {
        match self {
            Load::Light => 0,
            Load::Heavy => 4,
        }
    }

    // GPU contention from the heavy content, on top of its raw cost.
    fn contention(self) -> f32 {
        match self {
            Load::Light => 1.0,
            Load::Heavy => 1.6,
        }
    }
}

// ── Simulated renderer ──────────────────────────────────────────────────

struct SimulatedRenderer {
    pixel_ratio: f32,
    buffer: (u32, u32),
    shadow_resolution: u32,
    info: RendererInfo,
}

impl SimulatedRenderer {
    fn new() -> Self {
        Self {
            pixel_ratio: 1.0,
            buffer: (1280, 720),
            shadow_resolution: 0,
            info: RendererInfo::default(),
        }
    }

    /// Renders one frame and returns its cost.
    fn render(&mut self, budgets: &SceneBudgets, load: Load) -> Duration {
        let megapixels = (self.buffer.0 * self.buffer.1) as f32 / 1_000_000.0;
        let field = budgets.field_resolution as f32;
        let cost_ms = load.contention()
            * (2.0
                + budgets.particle_budget as f32 / 1000.0 * 1.2
                + field * field / 4096.0 * 1.5
                + megapixels * 4.0
                + self.shadow_resolution as f32 / 1024.0 * 2.0
                + load.triangles() as f32 / 100_000.0 * 1.5
                + load.point_lights() as f32);
        self.info.draw_calls = 4 + load.point_lights();
        self.info.triangles = load.triangles();
        self.info.points = budgets.particle_budget;
        Duration::from_secs_f32(cost_ms / 1000.0)
    }
}

impl RenderTarget for SimulatedRenderer {
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
        log::debug!("SimulatedRenderer: drawing buffer {width}x{height}");
        self.buffer = (width, height);
    }

    fn set_shadow_map(&mut self, enabled: bool, resolution: u32) {
        self.shadow_resolution = if enabled { resolution } else { 0 };
    }

    fn info(&self) -> RendererInfo {
        self.info
    }
}

// ── Scene construction ──────────────────────────────────────────────────

struct SceneBuilder {
    backend: InMemoryResourceBackend,
    next_id: u64,
}

impl SceneBuilder {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Builds the visualization the way scene code would, from the current budgets.
    fn build(&mut self, budgets: &SceneBudgets, load: Load) -> SceneNode {
        let material = MaterialResource::new(self.backend.register(GpuResourceKind::Material));
        let root_id = self.id();
        let points_id = self.id();
        let field_id = self.id();
        let surface_id = self.id();
        let mut root = SceneNode::group(root_id, "visualization")
            .with_child(
                SceneNode::new(points_id, "particles", NodeKind::Points)
                    .with_geometry(GeometryResource {
                        id: self.backend.register(GpuResourceKind::Geometry),
                        vertex_count: budgets.particle_budget,
                        index_count: None,
                    })
                    .with_material(material.clone()),
            )
            .with_child(
                SceneNode::new(
                    field_id,
                    "field",
                    NodeKind::Field {
                        resolution: budgets.field_resolution,
                    },
                )
                .with_material(material.clone()),
            )
            .with_child(
                SceneNode::new(surface_id, "surface", NodeKind::Mesh)
                    .with_geometry(GeometryResource {
                        id: self.backend.register(GpuResourceKind::Geometry),
                        vertex_count: load.triangles(),
                        index_count: Some(load.triangles() * 3),
                    })
                    .with_material(material)
                    .casting_shadow(true),
            );
        for _ in 0..load.point_lights() {
            let id = self.id();
            root = root.with_child(
                SceneNode::new(id, "light", NodeKind::Light(LightKind::Point)).casting_shadow(true),
            );
        }
        root
    }
}

struct SimulatedLoop {
    running: Rc<Cell<bool>>,
}

impl FrameLoop for SimulatedLoop {
    fn cancel(&mut self) {
        self.running.set(false);
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading configuration from {path}"))?;
            ControllerConfig::from_json_str(&text)?
        }
        None => ControllerConfig::default(),
    };

    let clock = ManualClock::new();
    let backend = InMemoryResourceBackend::new();
    let mut controller =
        PerformanceController::new(config, Arc::new(clock.clone()), Box::new(backend.clone()))?;

    // ── Benchmark ────────────────────────────────────────────────────────
    let mut probe = DeviceCapabilityProbe::new(
        ProbeConfig {
            duration_ms: 600,
            ..ProbeConfig::default()
        },
        Arc::new(SystemClock::new()),
        Box::new(SysinfoHardwareProvider::new()),
        Box::new(SoftwareContextFactory::new()),
    );
    if let Some(profile) = controller.run_benchmark(&mut probe) {
        log::info!(
            "Sandbox: device tier {:?} (score {:.1}, status {:?})",
            profile.tier,
            profile.score,
            profile.status
        );
    }
    if !controller.three_d_available() {
        log::warn!("Sandbox: no 3D context, nothing to simulate.");
        return Ok(());
    }

    let running = Rc::new(Cell::new(true));
    controller.init(Box::new(SimulatedLoop {
        running: Rc::clone(&running),
    }));

    // ── Render loop ──────────────────────────────────────────────────────
    let mut renderer = SimulatedRenderer::new();
    let mut builder = SceneBuilder {
        backend: backend.clone(),
        next_id: 0,
    };
    let mut load = phase_load(Duration::ZERO);
    let mut budgets = controller.scene_budgets();
    let mut scene = builder.build(&budgets, load);
    controller.adopt(&scene);

    let (mut frames, mut skipped, mut warnings) = (0u64, 0u64, 0u64);
    let end = Duration::from_secs(SIMULATED_SECONDS);
    while running.get() && clock.now() < end {
        let outcome = controller.tick(&mut renderer, &scene);

        let cost = if outcome.render {
            frames += 1;
            renderer.render(&budgets, load)
        } else {
            skipped += 1;
            Duration::from_millis(1)
        };
        clock.advance(cost);

        for event in controller.drain_events() {
            match event {
                PerformanceEvent::Warning(w) => {
                    warnings += 1;
                    log::debug!("Sandbox: {w}");
                }
                PerformanceEvent::ModeChanged(t) => log::info!(
                    "Sandbox: t={:.1}s {} -> {} ({})",
                    t.at_ms as f32 / 1000.0,
                    t.from,
                    t.to,
                    t.triggers.join("; ")
                ),
                PerformanceEvent::OptimizationApplied { .. } => {}
            }
        }

        // Rebuild when the budgets or the scene load change.
        let next_load = phase_load(clock.now());
        let next_budgets = controller.scene_budgets();
        if next_load != load || next_budgets.generation != budgets.generation {
            let report = controller.dispose_removed(&scene);
            load = next_load;
            budgets = next_budgets;
            scene = builder.build(&budgets, load);
            controller.adopt(&scene);
            log::debug!(
                "Sandbox: rebuilt scene ({} particles, field {}), released {} object(s)",
                budgets.particle_budget,
                budgets.field_resolution,
                report.released
            );
        }
    }

    let stats = controller.performance_stats();
    log::info!(
        "Sandbox: {frames} frames rendered, {skipped} skipped, {warnings} warning(s), final level {} at {:.1} fps",
        stats.level,
        stats.summary.avg_fps
    );
    println!("{}", controller.export_report()?);

    controller.dispose();
    log::info!(
        "Sandbox: disposed, {} GPU object(s) still live, loop running: {}",
        backend.live_count(),
        running.get()
    );
    Ok(())
}
