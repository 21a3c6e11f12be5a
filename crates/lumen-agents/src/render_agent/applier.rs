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

//! Applies optimization strategies to the live renderer.

use crate::resource_agent::{DisposalReport, ResourceTracker};
use lumen_core::control::{OptimizationStrategy, ShadowQuality};
use lumen_core::renderer::{GpuResourceBackend, GpuResourceKind, RenderTarget, ResourceId};
use lumen_core::scene::SceneNode;
use serde::Serialize;

/// Budgets that scene-construction code reads on its next rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SceneBudgets {
    /// Maximum number of particles to build.
    pub particle_budget: u32,
    /// Resolution of field and grid meshes.
    pub field_resolution: u32,
    /// Whether level-of-detail meshes should be used.
    pub enable_lod: bool,
    /// Whether frustum culling should be enabled.
    pub enable_culling: bool,
    /// Incremented every time one of the budgets changes.
    pub generation: u64,
}

impl SceneBudgets {
    fn from_strategy(strategy: &OptimizationStrategy, generation: u64) -> Self {
        Self {
            particle_budget: strategy.particle_budget,
            field_resolution: strategy.field_resolution,
            enable_lod: strategy.enable_lod,
            enable_culling: strategy.enable_culling,
            generation,
        }
    }

    fn same_budgets(&self, other: &SceneBudgets) -> bool {
        self.particle_budget == other.particle_budget
            && self.field_resolution == other.field_resolution
            && self.enable_lod == other.enable_lod
            && self.enable_culling == other.enable_culling
    }
}

/// What a call to [`ResourceApplier::apply`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    /// False when the strategy matched the last applied one.
    pub changed: bool,
    /// The pixel ratio was updated.
    pub pixel_ratio_changed: bool,
    /// The drawing buffer was resized.
    pub resized: bool,
    /// A shadow map was allocated or released.
    pub shadows_changed: bool,
    /// Scene budgets changed; geometry should be rebuilt.
    pub budgets_changed: bool,
}

/// Applies strategies to the borrowed renderer and owns the controller's GPU objects.
///
/// `apply` is idempotent: the same strategy applied twice allocates and frees
/// nothing the second time.
pub struct ResourceApplier {
    backend: Box<dyn GpuResourceBackend>,
    tracker: ResourceTracker,
    // Last strategy pushed to the renderer.
    last_applied: Option<OptimizationStrategy>,
    // Shadow map currently owned, with its quality.
    shadow_map: Option<(ShadowQuality, ResourceId)>,
    // Last drawing-buffer size and pixel ratio set on the renderer.
    buffer_size: Option<(u32, u32)>,
    pixel_ratio: Option<f32>,
    budgets: SceneBudgets,
}

impl ResourceApplier {
    /// Creates an applier that allocates through `backend`.
    pub fn new(backend: Box<dyn GpuResourceBackend>) -> Self {
        Self {
            backend,
            tracker: ResourceTracker::new(),
            last_applied: None,
            shadow_map: None,
            buffer_size: None,
            pixel_ratio: None,
            budgets: SceneBudgets::from_strategy(&OptimizationStrategy::default(), 0),
        }
    }

    /// Pushes `strategy` to the renderer, touching only what differs.
    pub fn apply(
        &mut self,
        strategy: &OptimizationStrategy,
        target: &mut dyn RenderTarget,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();

        // ── Viewport ────────────────────────────────────────────────
        // The canvas may have been resized by the host, so the buffer size is
        // recomputed even when the strategy is unchanged.
        let ratio = strategy.pixel_ratio.min(target.device_pixel_ratio()).max(0.0);
        if self.pixel_ratio != Some(ratio) {
            target.set_pixel_ratio(ratio);
            self.pixel_ratio = Some(ratio);
            report.pixel_ratio_changed = true;
        }
        let (width, height) = target.canvas_size();
        let scale = strategy.render_scale * ratio;
        let size = (
            ((width as f32 * scale).round() as u32).max(1),
            ((height as f32 * scale).round() as u32).max(1),
        );
        if self.buffer_size != Some(size) {
            target.set_drawing_buffer_size(size.0, size.1);
            self.buffer_size = Some(size);
            report.resized = true;
        }

        if self.last_applied.as_ref() == Some(strategy) {
            report.changed = report.pixel_ratio_changed || report.resized;
            return report;
        }

        // ── Shadows ─────────────────────────────────────────────────
        report.shadows_changed = self.apply_shadows(strategy.shadow_quality, target);

        // ── Budgets ─────────────────────────────────────────────────
        let budgets = SceneBudgets::from_strategy(strategy, self.budgets.generation);
        if !budgets.same_budgets(&self.budgets) {
            self.budgets = SceneBudgets {
                generation: self.budgets.generation + 1,
                ..budgets
            };
            report.budgets_changed = true;
            log::debug!(
                "ResourceApplier: scene budgets now {} particles, field {} (generation {}).",
                self.budgets.particle_budget,
                self.budgets.field_resolution,
                self.budgets.generation
            );
        }

        self.last_applied = Some(strategy.clone());
        report.changed = true;
        report
    }

    fn apply_shadows(&mut self, quality: ShadowQuality, target: &mut dyn RenderTarget) -> bool {
        let current = self.shadow_map.map(|(q, _)| q).unwrap_or(ShadowQuality::Off);
        if current == quality {
            return false;
        }

        if let Some((old, id)) = self.shadow_map.take() {
            if let Err(e) = self.backend.release(GpuResourceKind::RenderTarget, id) {
                log::warn!("ResourceApplier: failed to release {old:?} shadow map: {e}");
            }
        }

        if !quality.is_enabled() {
            target.set_shadow_map(false, 0);
            return true;
        }

        let resolution = quality.map_resolution();
        match self
            .backend
            .allocate(GpuResourceKind::RenderTarget, "shadow-map")
        {
            Ok(id) => {
                self.shadow_map = Some((quality, id));
                target.set_shadow_map(true, resolution);
            }
            Err(e) => {
                log::warn!("ResourceApplier: {e}; shadows disabled.");
                target.set_shadow_map(false, 0);
            }
        }
        true
    }

    /// Forgets the last applied strategy so the next `apply` pushes everything.
    pub fn invalidate(&mut self) {
        self.last_applied = None;
        self.pixel_ratio = None;
        self.buffer_size = None;
    }

    /// The budgets scene code should build with.
    pub fn scene_budgets(&self) -> SceneBudgets {
        self.budgets
    }

    /// The last strategy pushed to the renderer.
    pub fn last_applied(&self) -> Option<&OptimizationStrategy> {
        self.last_applied.as_ref()
    }

    /// Whether a shadow map is currently allocated.
    pub fn has_shadow_map(&self) -> bool {
        self.shadow_map.is_some()
    }

    /// Transfers ownership of the GPU objects under `root` to the applier.
    pub fn adopt(&mut self, root: &SceneNode) -> usize {
        self.tracker.adopt(root)
    }

    /// Releases the GPU objects under a node removed from the scene.
    pub fn dispose_removed(&mut self, root: &SceneNode) -> DisposalReport {
        self.tracker.dispose_removed(root, self.backend.as_mut())
    }

    /// The tracker of adopted scene objects.
    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    /// Releases every adopted object and the shadow map.
    pub fn release_all(&mut self) -> DisposalReport {
        let mut report = self.tracker.release_all(self.backend.as_mut());
        if let Some((_, id)) = self.shadow_map.take() {
            match self.backend.release(GpuResourceKind::RenderTarget, id) {
                Ok(()) => report.released += 1,
                Err(e) => {
                    log::warn!("ResourceApplier: {e}");
                    report.failures += 1;
                }
            }
        }
        self.last_applied = None;
        report
    }
}
