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

use crate::platform::GpuCapabilities;

/// Fixed content rendered during a capability benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkScene {
    /// Vertex positions of the rotating mesh.
    pub mesh_positions: Vec<[f32; 3]>,
    /// Triangle indices into `mesh_positions`.
    pub mesh_indices: Vec<u32>,
    /// Positions of the point cloud.
    pub points: Vec<[f32; 3]>,
    /// Current rotation of the mesh around the Y axis, in radians.
    pub rotation: f32,
}

impl BenchmarkScene {
    /// Builds the benchmark scene: a unit cube and a deterministic point cloud
    /// of `point_count` points spread over a sphere shell.
    pub fn new(point_count: usize) -> Self {
        let mesh_positions = vec![
            [-0.5, -0.5, -0.5],
            [0.5, -0.5, -0.5],
            [0.5, 0.5, -0.5],
            [-0.5, 0.5, -0.5],
            [-0.5, -0.5, 0.5],
            [0.5, -0.5, 0.5],
            [0.5, 0.5, 0.5],
            [-0.5, 0.5, 0.5],
        ];
        #[rustfmt::skip]
        let mesh_indices = vec![
            0, 1, 2, 0, 2, 3, // back
            4, 6, 5, 4, 7, 6, // front
            0, 4, 5, 0, 5, 1, // bottom
            3, 2, 6, 3, 6, 7, // top
            0, 3, 7, 0, 7, 4, // left
            1, 5, 6, 1, 6, 2, // right
        ];

        // Golden-angle spiral gives an even spread without randomness.
        let golden = std::f32::consts::PI * (3.0 - 5f32.sqrt());
        let n = point_count.max(1) as f32;
        let points = (0..point_count)
            .map(|i| {
                let y = 1.0 - 2.0 * (i as f32 + 0.5) / n;
                let r = (1.0 - y * y).max(0.0).sqrt();
                let theta = golden * i as f32;
                let radius = 2.0 + (i % 7) as f32 * 0.1;
                [r * theta.cos() * radius, y * radius, r * theta.sin() * radius]
            })
            .collect();

        Self {
            mesh_positions,
            mesh_indices,
            points,
            rotation: 0.0,
        }
    }

    /// Advances the mesh rotation by `radians`.
    pub fn rotate(&mut self, radians: f32) {
        self.rotation = (self.rotation + radians) % std::f32::consts::TAU;
    }
}

/// A rendering context detached from the live page.
pub trait OffscreenContext {
    /// Capabilities of the underlying graphics device.
    fn capabilities(&self) -> GpuCapabilities;

    /// Renders one frame of `scene`.
    fn render(&mut self, scene: &BenchmarkScene);
}

/// Creates off-screen contexts for the benchmark.
pub trait OffscreenContextFactory {
    /// Creates a `width` x `height` context, or `None` when 3D rendering is unavailable.
    fn create(&self, width: u32, height: u32) -> Option<Box<dyn OffscreenContext>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_scene_is_deterministic() {
        let a = BenchmarkScene::new(10_000);
        let b = BenchmarkScene::new(10_000);
        assert_eq!(a, b);
        assert_eq!(a.points.len(), 10_000);
        assert_eq!(a.mesh_indices.len(), 36);
        assert!(a.mesh_indices.iter().all(|&i| (i as usize) < a.mesh_positions.len()));
    }

    #[test]
    fn test_rotation_wraps() {
        let mut scene = BenchmarkScene::new(0);
        scene.rotate(std::f32::consts::TAU + 0.5);
        assert!((scene.rotation - 0.5).abs() < 1e-4);
    }
}
