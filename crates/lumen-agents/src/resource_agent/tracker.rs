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

use lumen_core::renderer::{GpuResourceBackend, GpuResourceKind, ResourceId};
use lumen_core::scene::{NodeId, SceneNode};
use serde::Serialize;
use std::collections::HashMap;

type ResourceKey = (GpuResourceKind, ResourceId);

/// Outcome of a [`ResourceTracker::dispose_removed`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DisposalReport {
    /// Adopted nodes whose resources were handed back.
    pub nodes_disposed: usize,
    /// GPU objects actually released through the backend.
    pub released: usize,
    /// Objects still referenced by another adopted node.
    pub shared_kept: usize,
    /// Releases the backend refused.
    pub failures: usize,
    /// Nodes that were never adopted or were already disposed.
    pub skipped_nodes: usize,
}

impl DisposalReport {
    fn merge(&mut self, other: DisposalReport) {
        self.nodes_disposed += other.nodes_disposed;
        self.released += other.released;
        self.shared_kept += other.shared_kept;
        self.failures += other.failures;
        self.skipped_nodes += other.skipped_nodes;
    }
}

/// Reference-counted ownership of the GPU objects held by scene nodes.
///
/// A resource may be shared by many nodes (one material on a hundred meshes);
/// it is released once the last adopted node referencing it is disposed.
/// Node entries are removed before anything is released, so disposing the same
/// subtree twice can never free an object twice.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    refcounts: HashMap<ResourceKey, u32>,
    nodes: HashMap<NodeId, Vec<ResourceKey>>,
}

impl ResourceTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of the GPU objects of `root` and all its descendants.
    ///
    /// Nodes already adopted are left as they are. Returns the number of newly
    /// adopted nodes.
    pub fn adopt(&mut self, root: &SceneNode) -> usize {
        let mut adopted = 0;
        root.walk(&mut |node| {
            if self.nodes.contains_key(&node.id) {
                return;
            }
            let keys = node_resources(node);
            for key in &keys {
                *self.refcounts.entry(*key).or_insert(0) += 1;
            }
            self.nodes.insert(node.id, keys);
            adopted += 1;
        });
        log::trace!("ResourceTracker: adopted {adopted} node(s) under '{}'.", root.name);
        adopted
    }

    /// Releases the GPU objects of `root` and all its descendants.
    ///
    /// Never fails: unknown nodes are skipped and backend errors are logged and
    /// counted, and the pass continues with the next object.
    pub fn dispose_removed(
        &mut self,
        root: &SceneNode,
        backend: &mut dyn GpuResourceBackend,
    ) -> DisposalReport {
        let mut report = DisposalReport::default();
        let mut ids = Vec::new();
        root.walk(&mut |node| ids.push(node.id));
        for id in ids {
            report.merge(self.dispose_node(id, backend));
        }
        if report.failures > 0 {
            log::warn!(
                "ResourceTracker: disposal of '{}' finished with {} failure(s).",
                root.name,
                report.failures
            );
        }
        report
    }

    /// Releases every adopted object.
    pub fn release_all(&mut self, backend: &mut dyn GpuResourceBackend) -> DisposalReport {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        let mut report = DisposalReport::default();
        for id in ids {
            report.merge(self.dispose_node(id, backend));
        }
        report
    }

    fn dispose_node(&mut self, id: NodeId, backend: &mut dyn GpuResourceBackend) -> DisposalReport {
        let mut report = DisposalReport::default();
        let Some(keys) = self.nodes.remove(&id) else {
            report.skipped_nodes = 1;
            return report;
        };
        report.nodes_disposed = 1;

        for key in keys {
            let remaining = match self.refcounts.get_mut(&key) {
                Some(count) => {
                    *count -= 1;
                    *count
                }
                None => continue,
            };
            if remaining > 0 {
                report.shared_kept += 1;
                continue;
            }
            self.refcounts.remove(&key);
            let (kind, resource) = key;
            match backend.release(kind, resource) {
                Ok(()) => report.released += 1,
                Err(e) => {
                    log::warn!("ResourceTracker: {e}");
                    report.failures += 1;
                }
            }
        }
        report
    }

    /// Whether `id` is currently adopted.
    pub fn is_tracked(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of adopted nodes.
    pub fn tracked_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct live objects.
    pub fn tracked_resources(&self) -> usize {
        self.refcounts.len()
    }

    /// Current reference count of an object.
    pub fn refcount(&self, kind: GpuResourceKind, id: ResourceId) -> u32 {
        self.refcounts.get(&(kind, id)).copied().unwrap_or(0)
    }
}

/// Geometry, materials with their texture maps, and skeleton of one node, deduplicated.
fn node_resources(node: &SceneNode) -> Vec<ResourceKey> {
    let mut keys = Vec::new();
    let mut push = |key: ResourceKey| {
        if !keys.contains(&key) {
            keys.push(key);
        }
    };
    if let Some(geometry) = &node.geometry {
        push((GpuResourceKind::Geometry, geometry.id));
    }
    for material in &node.materials {
        push((GpuResourceKind::Material, material.id));
        for (_, texture) in &material.textures {
            push((GpuResourceKind::Texture, *texture));
        }
    }
    if let Some(skeleton) = node.skeleton {
        push((GpuResourceKind::Skeleton, skeleton));
    }
    keys
}
