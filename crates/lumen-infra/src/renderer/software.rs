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

//! A CPU rasterizer standing in for a detached GPU context.
//!
//! It projects the benchmark mesh and point cloud into a private depth buffer.
//! Nothing it renders is ever presented, so the live scene is never touched.

use lumen_core::platform::GpuCapabilities;
use lumen_core::renderer::{BenchmarkScene, OffscreenContext, OffscreenContextFactory};

const CAMERA_DISTANCE: f32 = 5.0;
const FOCAL_LENGTH: f32 = 1.5;

/// Creates [`SoftwareContext`]s.
#[derive(Debug, Clone, Default)]
pub struct SoftwareContextFactory {
    max_dimension: Option<u32>,
}

impl SoftwareContextFactory {
    /// A factory accepting any context size.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory refusing contexts larger than `max_dimension` on either edge.
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: Some(max_dimension),
        }
    }
}

impl OffscreenContextFactory for SoftwareContextFactory {
    fn create(&self, width: u32, height: u32) -> Option<Box<dyn OffscreenContext>> {
        if width == 0 || height == 0 {
            return None;
        }
        if let Some(max) = self.max_dimension {
            if width > max || height > max {
                log::warn!("SoftwareContext: {width}x{height} exceeds the {max}px limit.");
                return None;
            }
        }
        Some(Box::new(SoftwareContext::new(width, height)))
    }
}

/// A depth-only software render target.
#[derive(Debug, Clone)]
pub struct SoftwareContext {
    width: u32,
    height: u32,
    depth: Vec<f32>,
    frames: u64,
    covered: usize,
}

impl SoftwareContext {
    /// Allocates a `width` x `height` depth buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: vec![f32::INFINITY; width as usize * height as usize],
            frames: 0,
            covered: 0,
        }
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Pixels written during the last frame.
    pub fn covered_pixels(&self) -> usize {
        self.covered
    }

    fn project(&self, [x, y, z]: [f32; 3], rotation: f32) -> Option<(f32, f32, f32)> {
        let (sin, cos) = rotation.sin_cos();
        let rx = x * cos + z * sin;
        let rz = -x * sin + z * cos + CAMERA_DISTANCE;
        if rz <= 0.1 {
            return None;
        }
        let half_w = self.width as f32 * 0.5;
        let half_h = self.height as f32 * 0.5;
        let sx = half_w + rx / rz * FOCAL_LENGTH * half_w;
        let sy = half_h - y / rz * FOCAL_LENGTH * half_h;
        Some((sx, sy, rz))
    }

    fn write(&mut self, px: i64, py: i64, depth: f32) {
        if px < 0 || py < 0 || px >= self.width as i64 || py >= self.height as i64 {
            return;
        }
        let idx = py as usize * self.width as usize + px as usize;
        if depth < self.depth[idx] {
            if self.depth[idx].is_infinite() {
                self.covered += 1;
            }
            self.depth[idx] = depth;
        }
    }

    fn raster_triangle(&mut self, a: (f32, f32, f32), b: (f32, f32, f32), c: (f32, f32, f32)) {
        let edge = |p: (f32, f32), q: (f32, f32), r: (f32, f32)| {
            (q.0 - p.0) * (r.1 - p.1) - (q.1 - p.1) * (r.0 - p.0)
        };
        let area = edge((a.0, a.1), (b.0, b.1), (c.0, c.1));
        if area.abs() < f32::EPSILON {
            return;
        }
        let min_x = a.0.min(b.0).min(c.0).floor().max(0.0) as i64;
        let max_x = a.0.max(b.0).max(c.0).ceil().min(self.width as f32 - 1.0) as i64;
        let min_y = a.1.min(b.1).min(c.1).floor().max(0.0) as i64;
        let max_y = a.1.max(b.1).max(c.1).ceil().min(self.height as f32 - 1.0) as i64;

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let p = (px as f32 + 0.5, py as f32 + 0.5);
                let w0 = edge((b.0, b.1), (c.0, c.1), p) / area;
                let w1 = edge((c.0, c.1), (a.0, a.1), p) / area;
                let w2 = edge((a.0, a.1), (b.0, b.1), p) / area;
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.write(px, py, w0 * a.2 + w1 * b.2 + w2 * c.2);
                }
            }
        }
    }
}

impl OffscreenContext for SoftwareContext {
    fn capabilities(&self) -> GpuCapabilities {
        GpuCapabilities {
            adapter_name: "lumen-software".to_string(),
            modern_api: false,
            extension_count: 0,
            max_texture_size: self.width.max(self.height),
        }
    }

    fn render(&mut self, scene: &BenchmarkScene) {
        self.depth.fill(f32::INFINITY);
        self.covered = 0;

        for tri in scene.mesh_indices.chunks_exact(3) {
            let vertex = |i: u32| scene.mesh_positions.get(i as usize).copied();
            let (Some(a), Some(b), Some(c)) = (vertex(tri[0]), vertex(tri[1]), vertex(tri[2])) else {
                continue;
            };
            if let (Some(a), Some(b), Some(c)) = (
                self.project(a, scene.rotation),
                self.project(b, scene.rotation),
                self.project(c, scene.rotation),
            ) {
                self.raster_triangle(a, b, c);
            }
        }

        for point in &scene.points {
            if let Some((x, y, z)) = self.project(*point, scene.rotation) {
                self.write(x as i64, y as i64, z);
            }
        }
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_rejects_degenerate_sizes() {
        assert!(SoftwareContextFactory::new().create(0, 10).is_none());
        assert!(SoftwareContextFactory::with_max_dimension(64)
            .create(128, 32)
            .is_none());
        assert!(SoftwareContextFactory::new().create(32, 32).is_some());
    }

    #[test]
    fn test_render_covers_pixels() {
        let mut ctx = SoftwareContext::new(64, 64);
        let mut scene = BenchmarkScene::new(500);
        ctx.render(&scene);
        let first = ctx.covered_pixels();
        assert!(first > 0);

        scene.rotate(0.7);
        ctx.render(&scene);
        assert_eq!(ctx.frames(), 2);
        assert!(ctx.covered_pixels() > 0);
    }
}
