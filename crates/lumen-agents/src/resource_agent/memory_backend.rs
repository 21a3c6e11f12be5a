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

use lumen_core::renderer::{GpuResourceBackend, GpuResourceKind, ResourceError, ResourceId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct BackendState {
    next_id: u64,
    live: HashMap<ResourceId, GpuResourceKind>,
    released: Vec<(GpuResourceKind, ResourceId)>,
    failing: HashSet<ResourceId>,
    invalid_releases: usize,
}

/// A bookkeeping-only GPU backend.
///
/// Clones share the same state, so a host or test can keep a handle for
/// inspection while the controller owns another. Used by the headless
/// sandbox and by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResourceBackend {
    state: Arc<RwLock<BackendState>>,
}

impl InMemoryResourceBackend {
    /// Creates an empty backend. Ids start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an object created outside the backend (by scene code), returning its id.
    pub fn register(&self, kind: GpuResourceKind) -> ResourceId {
        match self.state.write() {
            Ok(mut state) => {
                state.next_id += 1;
                let id = ResourceId(state.next_id);
                state.live.insert(id, kind);
                id
            }
            Err(_) => {
                log::error!("InMemoryResourceBackend: state lock poisoned.");
                ResourceId(0)
            }
        }
    }

    /// Makes every future release of `id` fail.
    pub fn fail_release_of(&self, id: ResourceId) {
        if let Ok(mut state) = self.state.write() {
            state.failing.insert(id);
        }
    }

    /// Whether `id` is live.
    pub fn is_live(&self, id: ResourceId) -> bool {
        self.state
            .read()
            .map(|s| s.live.contains_key(&id))
            .unwrap_or(false)
    }

    /// Number of live objects.
    pub fn live_count(&self) -> usize {
        self.state.read().map(|s| s.live.len()).unwrap_or(0)
    }

    /// Number of live objects of `kind`.
    pub fn live_of_kind(&self, kind: GpuResourceKind) -> usize {
        self.state
            .read()
            .map(|s| s.live.values().filter(|k| **k == kind).count())
            .unwrap_or(0)
    }

    /// Every successful release, in order.
    pub fn released(&self) -> Vec<(GpuResourceKind, ResourceId)> {
        self.state
            .read()
            .map(|s| s.released.clone())
            .unwrap_or_default()
    }

    /// Releases of objects that were not live: double frees or unknown ids.
    pub fn invalid_releases(&self) -> usize {
        self.state.read().map(|s| s.invalid_releases).unwrap_or(0)
    }
}

impl GpuResourceBackend for InMemoryResourceBackend {
    fn allocate(
        &mut self,
        kind: GpuResourceKind,
        label: &str,
    ) -> Result<ResourceId, ResourceError> {
        let mut state = self.state.write().map_err(|_| ResourceError::AllocationFailed {
            kind,
            label: label.to_string(),
            reason: "state lock poisoned".to_string(),
        })?;
        state.next_id += 1;
        let id = ResourceId(state.next_id);
        state.live.insert(id, kind);
        log::trace!("InMemoryResourceBackend: allocated {kind:?} '{label}' as {id}.");
        Ok(id)
    }

    fn release(&mut self, kind: GpuResourceKind, id: ResourceId) -> Result<(), ResourceError> {
        let mut state = self.state.write().map_err(|_| ResourceError::ReleaseFailed {
            kind,
            id,
            reason: "state lock poisoned".to_string(),
        })?;
        if state.failing.contains(&id) {
            return Err(ResourceError::ReleaseFailed {
                kind,
                id,
                reason: "injected failure".to_string(),
            });
        }
        match state.live.remove(&id) {
            Some(_) => {
                state.released.push((kind, id));
                Ok(())
            }
            None => {
                state.invalid_releases += 1;
                Err(ResourceError::NotFound { kind, id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_release_and_double_free() {
        let mut backend = InMemoryResourceBackend::new();
        let handle = backend.clone();
        let id = backend
            .allocate(GpuResourceKind::Texture, "albedo")
            .expect("allocation succeeds");
        assert!(handle.is_live(id));
        assert_eq!(handle.live_of_kind(GpuResourceKind::Texture), 1);

        assert!(backend.release(GpuResourceKind::Texture, id).is_ok());
        assert_eq!(
            backend.release(GpuResourceKind::Texture, id),
            Err(ResourceError::NotFound {
                kind: GpuResourceKind::Texture,
                id
            })
        );
        assert_eq!(handle.invalid_releases(), 1);
        assert_eq!(handle.released(), vec![(GpuResourceKind::Texture, id)]);
    }

    #[test]
    fn test_injected_failure_keeps_object_live() {
        let mut backend = InMemoryResourceBackend::new();
        let id = backend.register(GpuResourceKind::Geometry);
        backend.fail_release_of(id);
        assert!(matches!(
            backend.release(GpuResourceKind::Geometry, id),
            Err(ResourceError::ReleaseFailed { .. })
        ));
        assert!(backend.is_live(id));
    }
}
