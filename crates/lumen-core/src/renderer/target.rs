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

use serde::{Deserialize, Serialize};

/// Per-frame counters exposed by the renderer.
///
/// `draw_calls`, `triangles` and `points` are reset by the renderer at the start
/// of every frame; the memory counters are live object counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RendererInfo {
    /// Draw calls issued during the last frame.
    pub draw_calls: u32,
    /// Triangles rasterized during the last frame.
    pub triangles: u32,
    /// Points rasterized during the last frame.
    pub points: u32,
    /// Live geometry buffers.
    pub geometries: u32,
    /// Live textures.
    pub textures: u32,
    /// Compiled shader programs.
    pub programs: u32,
}

/// The live renderer, borrowed for the duration of a tick.
pub trait RenderTarget {
    /// Current pixel ratio.
    fn pixel_ratio(&self) -> f32;

    /// Sets the pixel ratio.
    fn set_pixel_ratio(&mut self, ratio: f32);

    /// Native pixel ratio of the display. Applied ratios never exceed it.
    fn device_pixel_ratio(&self) -> f32;

    /// Logical canvas size in CSS pixels.
    fn canvas_size(&self) -> (u32, u32);

    /// Sets the size of the drawing buffer in pixels.
    fn set_drawing_buffer_size(&mut self, width: u32, height: u32);

    /// Enables or disables shadow mapping with the given map resolution.
    fn set_shadow_map(&mut self, enabled: bool, resolution: u32);

    /// Reads the renderer's counters.
    fn info(&self) -> RendererInfo;

    /// Used heap in megabytes, when the platform exposes it.
    ///
    /// Without it, samples carry an estimate built from [`RendererInfo`].
    fn heap_mb(&self) -> Option<f32> {
        None
    }
}
