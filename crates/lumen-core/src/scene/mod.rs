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

//! A minimal scene-graph description.
//!
//! Scene construction belongs to the host. The controller only needs to count
//! what a scene costs to draw and to know which GPU objects a subtree owns, so
//! nodes carry resource handles and sizes rather than actual buffers.

use crate::renderer::ResourceId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identifier of a scene node, unique within a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Light types, weighted differently by the complexity scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    /// Uniform ambient term.
    Ambient,
    /// Sky/ground gradient.
    Hemisphere,
    /// Parallel light.
    Directional,
    /// Omnidirectional light.
    Point,
    /// Cone light.
    Spot,
}

/// What a node draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Pure transform node.
    Group,
    /// Triangle mesh.
    Mesh,
    /// Point cloud; every vertex is a particle.
    Points,
    /// Line strip or segments.
    Line,
    /// A light source.
    Light(LightKind),
    /// A sampled field or grid visualization of the given edge resolution.
    Field {
        /// Samples per edge.
        resolution: u32,
    },
}

/// Geometry buffers attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryResource {
    /// GPU handle of the buffers.
    pub id: ResourceId,
    /// Size of the position attribute, in vertices.
    pub vertex_count: u32,
    /// Size of the index buffer, when indexed.
    pub index_count: Option<u32>,
}

impl GeometryResource {
    /// Triangle count estimated from the attribute sizes.
    pub fn estimated_triangles(&self) -> u32 {
        self.index_count.unwrap_or(self.vertex_count) / 3
    }
}

/// Texture slots a material can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureSlot {
    /// Base color.
    Color,
    /// Tangent-space normals.
    Normal,
    /// Roughness.
    Roughness,
    /// Metalness.
    Metalness,
    /// Emission.
    Emissive,
    /// Ambient occlusion.
    AmbientOcclusion,
    /// Alpha mask.
    Alpha,
    /// Environment reflection.
    Environment,
}

/// A material and every texture map bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialResource {
    /// GPU handle of the material.
    pub id: ResourceId,
    /// Bound texture maps.
    pub textures: Vec<(TextureSlot, ResourceId)>,
}

impl MaterialResource {
    /// A material without texture maps.
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            textures: Vec::new(),
        }
    }

    /// Binds a texture map.
    pub fn with_texture(mut self, slot: TextureSlot, texture: ResourceId) -> Self {
        self.textures.push((slot, texture));
        self
    }
}

/// A node of the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    /// Unique identifier.
    pub id: NodeId,
    /// Debug name.
    pub name: String,
    /// What the node draws.
    pub kind: NodeKind,
    /// Invisible nodes and their subtrees are not drawn.
    pub visible: bool,
    /// Whether the node renders into shadow maps.
    pub casts_shadow: bool,
    /// Geometry buffers.
    pub geometry: Option<GeometryResource>,
    /// Materials, one per draw group.
    pub materials: Vec<MaterialResource>,
    /// Skinning skeleton.
    pub skeleton: Option<ResourceId>,
    /// Child nodes.
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Creates a visible node without resources or children.
    pub fn new(id: u64, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId(id),
            name: name.into(),
            kind,
            visible: true,
            casts_shadow: false,
            geometry: None,
            materials: Vec::new(),
            skeleton: None,
            children: Vec::new(),
        }
    }

    /// Creates an empty group node.
    pub fn group(id: u64, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeKind::Group)
    }

    /// Attaches geometry buffers.
    pub fn with_geometry(mut self, geometry: GeometryResource) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Attaches a material.
    pub fn with_material(mut self, material: MaterialResource) -> Self {
        self.materials.push(material);
        self
    }

    /// Attaches a skeleton.
    pub fn with_skeleton(mut self, skeleton: ResourceId) -> Self {
        self.skeleton = Some(skeleton);
        self
    }

    /// Sets the shadow-casting flag.
    pub fn casting_shadow(mut self, casts: bool) -> Self {
        self.casts_shadow = casts;
        self
    }

    /// Sets the visibility flag.
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Appends a child.
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Visits this node and every descendant in depth-first pre-order.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a SceneNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Returns the descendant (or self) with the given id.
    pub fn find(&self, id: NodeId) -> Option<&SceneNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// Number of lights in a scene, per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightCounts {
    /// Ambient lights.
    pub ambient: u32,
    /// Hemisphere lights.
    pub hemisphere: u32,
    /// Directional lights.
    pub directional: u32,
    /// Point lights.
    pub point: u32,
    /// Spot lights.
    pub spot: u32,
}

impl LightCounts {
    /// Counts one more light of `kind`.
    pub fn add(&mut self, kind: LightKind) {
        match kind {
            LightKind::Ambient => self.ambient += 1,
            LightKind::Hemisphere => self.hemisphere += 1,
            LightKind::Directional => self.directional += 1,
            LightKind::Point => self.point += 1,
            LightKind::Spot => self.spot += 1,
        }
    }

    /// Total number of lights.
    pub fn total(&self) -> u32 {
        self.ambient + self.hemisphere + self.directional + self.point + self.spot
    }
}

/// Counts gathered from the visible part of a scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SceneStats {
    /// Vertices of every visible point cloud.
    pub particle_count: u32,
    /// Highest field resolution in the scene.
    pub field_resolution: u32,
    /// Estimated triangles of every visible mesh and field.
    pub triangle_count: u32,
    /// Objects that issue at least one draw call.
    pub draw_call_objects: u32,
    /// Distinct materials in use.
    pub material_count: u32,
    /// Lights per kind.
    pub lights: LightCounts,
    /// Meshes and lights with shadow casting enabled.
    pub shadow_casters: u32,
}

impl SceneStats {
    /// Traverses the visible part of `root`.
    pub fn from_scene(root: &SceneNode) -> Self {
        let mut stats = SceneStats::default();
        let mut materials = HashSet::new();
        stats.accumulate(root, &mut materials);
        stats.material_count = materials.len() as u32;
        stats
    }

    fn accumulate(&mut self, node: &SceneNode, materials: &mut HashSet<ResourceId>) {
        if !node.visible {
            return;
        }

        let vertices = node.geometry.map(|g| g.vertex_count).unwrap_or(0);
        let triangles = node.geometry.map(|g| g.estimated_triangles()).unwrap_or(0);
        let draws = match node.kind {
            NodeKind::Group => false,
            NodeKind::Light(kind) => {
                self.lights.add(kind);
                false
            }
            NodeKind::Points => {
                self.particle_count = self.particle_count.saturating_add(vertices);
                true
            }
            NodeKind::Mesh => {
                self.triangle_count = self.triangle_count.saturating_add(triangles);
                true
            }
            NodeKind::Field { resolution } => {
                self.field_resolution = self.field_resolution.max(resolution);
                self.triangle_count = self.triangle_count.saturating_add(triangles);
                true
            }
            NodeKind::Line => true,
        };

        if draws {
            self.draw_call_objects += 1;
            materials.extend(node.materials.iter().map(|m| m.id));
        }
        if node.casts_shadow && matches!(node.kind, NodeKind::Mesh | NodeKind::Light(_)) {
            self.shadow_casters += 1;
        }

        for child in &node.children {
            self.accumulate(child, materials);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(id: u64, vertices: u32, indices: Option<u32>) -> GeometryResource {
        GeometryResource {
            id: ResourceId(id),
            vertex_count: vertices,
            index_count: indices,
        }
    }

    fn sample_scene() -> SceneNode {
        let shared = MaterialResource::new(ResourceId(100));
        SceneNode::group(0, "root")
            .with_child(
                SceneNode::new(1, "cloud", NodeKind::Points)
                    .with_geometry(geometry(10, 5000, None))
                    .with_material(MaterialResource::new(ResourceId(101))),
            )
            .with_child(
                SceneNode::new(2, "surface", NodeKind::Mesh)
                    .with_geometry(geometry(11, 400, Some(1200)))
                    .with_material(shared.clone())
                    .casting_shadow(true),
            )
            .with_child(
                SceneNode::new(3, "surface-copy", NodeKind::Mesh)
                    .with_geometry(geometry(12, 300, None))
                    .with_material(shared),
            )
            .with_child(SceneNode::new(4, "field", NodeKind::Field { resolution: 64 }))
            .with_child(
                SceneNode::new(5, "sun", NodeKind::Light(LightKind::Directional))
                    .casting_shadow(true),
            )
            .with_child(SceneNode::new(6, "fill", NodeKind::Light(LightKind::Ambient)))
            .with_child(
                SceneNode::group(7, "hidden")
                    .with_visibility(false)
                    .with_child(
                        SceneNode::new(8, "hidden-cloud", NodeKind::Points)
                            .with_geometry(geometry(13, 9999, None)),
                    ),
            )
    }

    #[test]
    fn test_triangle_estimate_prefers_indices() {
        assert_eq!(geometry(1, 300, Some(900)).estimated_triangles(), 300);
        assert_eq!(geometry(1, 300, None).estimated_triangles(), 100);
    }

    #[test]
    fn test_stats_from_scene() {
        let stats = SceneStats::from_scene(&sample_scene());
        assert_eq!(stats.particle_count, 5000);
        assert_eq!(stats.triangle_count, 400 + 100);
        assert_eq!(stats.field_resolution, 64);
        assert_eq!(stats.draw_call_objects, 4);
        assert_eq!(stats.material_count, 2);
        assert_eq!(stats.lights.directional, 1);
        assert_eq!(stats.lights.total(), 2);
        assert_eq!(stats.shadow_casters, 2);
    }

    #[test]
    fn test_walk_and_find() {
        let scene = sample_scene();
        let mut ids = Vec::new();
        scene.walk(&mut |n| ids.push(n.id.0));
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(scene.find(NodeId(8)).map(|n| n.name.as_str()), Some("hidden-cloud"));
        assert!(scene.find(NodeId(42)).is_none());
    }
}
