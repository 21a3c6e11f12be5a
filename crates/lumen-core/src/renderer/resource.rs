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
use std::fmt;

/// Opaque handle to a GPU-side object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of a GPU-side object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuResourceKind {
    /// Vertex/index buffers.
    Geometry,
    /// Material and its compiled program.
    Material,
    /// Texture map.
    Texture,
    /// Skinning skeleton and its bone texture.
    Skeleton,
    /// Off-screen render target such as a shadow map.
    RenderTarget,
}

/// Errors reported by a [`GpuResourceBackend`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// The resource was never allocated or was already released.
    #[error("{kind:?} {id} is not a live resource")]
    NotFound {
        /// Kind of the requested resource.
        kind: GpuResourceKind,
        /// Handle of the requested resource.
        id: ResourceId,
    },
    /// The backend refused the allocation.
    #[error("allocation of {kind:?} '{label}' failed: {reason}")]
    AllocationFailed {
        /// Kind of the requested resource.
        kind: GpuResourceKind,
        /// Debug label of the requested resource.
        label: String,
        /// Backend-provided reason.
        reason: String,
    },
    /// The backend failed to release the resource.
    #[error("release of {kind:?} {id} failed: {reason}")]
    ReleaseFailed {
        /// Kind of the resource.
        kind: GpuResourceKind,
        /// Handle of the resource.
        id: ResourceId,
        /// Backend-provided reason.
        reason: String,
    },
}

/// Allocates and frees GPU-side objects.
pub trait GpuResourceBackend: Send {
    /// Allocates a new object of `kind`.
    fn allocate(&mut self, kind: GpuResourceKind, label: &str) -> Result<ResourceId, ResourceError>;

    /// Frees an object previously returned by [`GpuResourceBackend::allocate`]
    /// or created by scene code.
    fn release(&mut self, kind: GpuResourceKind, id: ResourceId) -> Result<(), ResourceError>;
}
