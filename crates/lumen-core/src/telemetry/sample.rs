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

use crate::control::QualityLevel;
use serde::{Deserialize, Serialize};

/// Where a memory reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    /// Read from the host's heap-size API.
    Exact,
    /// Derived from live geometry, texture and program counts.
    #[default]
    Estimated,
}

/// A memory measurement together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MemoryReading {
    /// Memory in megabytes.
    pub megabytes: f32,
    /// Provenance of the value.
    pub source: MemorySource,
}

impl MemoryReading {
    /// A reading taken from the heap-size API.
    pub fn exact(megabytes: f32) -> Self {
        Self {
            megabytes,
            source: MemorySource::Exact,
        }
    }

    /// A reading derived from object counts.
    pub fn estimated(megabytes: f32) -> Self {
        Self {
            megabytes,
            source: MemorySource::Estimated,
        }
    }

    /// Whether the value is an estimate.
    pub fn is_estimated(&self) -> bool {
        self.source == MemorySource::Estimated
    }
}

/// One measurement tick.
///
/// FPS is never stored; it is always derived from `frame_time_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    /// Clock time of the sample, in milliseconds.
    pub timestamp_ms: u64,
    /// Average frame time since the previous sample. Never negative.
    pub frame_time_ms: f32,
    /// Memory reading.
    pub memory: MemoryReading,
    /// Draw calls of the last rendered frame.
    pub draw_calls: u32,
    /// Triangles of the last rendered frame.
    pub triangles: u32,
    /// Latest complexity score in `[0, 100]`.
    pub scene_complexity: f32,
    /// Quality level active when the sample was taken.
    pub performance_mode: QualityLevel,
}

impl PerformanceSample {
    /// Frames per second derived from the frame time. 0 when the frame time is 0.
    pub fn fps(&self) -> f32 {
        if self.frame_time_ms > 0.0 {
            1000.0 / self.frame_time_ms
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(frame_time_ms: f32) -> PerformanceSample {
        PerformanceSample {
            timestamp_ms: 0,
            frame_time_ms,
            memory: MemoryReading::exact(64.0),
            draw_calls: 0,
            triangles: 0,
            scene_complexity: 0.0,
            performance_mode: QualityLevel::Medium,
        }
    }

    #[test]
    fn test_fps_is_derived_from_frame_time() {
        assert_relative_eq!(sample(20.0).fps(), 50.0);
        assert_eq!(sample(0.0).fps(), 0.0);
    }

    #[test]
    fn test_memory_provenance() {
        assert!(!MemoryReading::exact(1.0).is_estimated());
        assert!(MemoryReading::estimated(1.0).is_estimated());
    }
}
