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

//! Serializable history records.

use lumen_core::control::QualityLevel;
use lumen_core::telemetry::PerformanceSample;
use serde::{Deserialize, Serialize};

/// One exported history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    /// Clock time in milliseconds.
    pub timestamp: u64,
    /// Frame time in milliseconds.
    pub frame_time: f32,
    /// Derived FPS.
    pub fps: f32,
    /// Memory in megabytes.
    pub memory_usage: f32,
    /// Whether `memory_usage` is an estimate.
    pub memory_estimated: bool,
    /// Draw calls of the sampled frame.
    pub draw_calls: u32,
    /// Complexity score at sample time.
    pub scene_complexity: f32,
    /// Active quality level.
    pub performance_mode: QualityLevel,
}

impl From<&PerformanceSample> for PerformanceRecord {
    fn from(sample: &PerformanceSample) -> Self {
        Self {
            timestamp: sample.timestamp_ms,
            frame_time: sample.frame_time_ms,
            fps: sample.fps(),
            memory_usage: sample.memory.megabytes,
            memory_estimated: sample.memory.is_estimated(),
            draw_calls: sample.draw_calls,
            scene_complexity: sample.scene_complexity,
            performance_mode: sample.performance_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::telemetry::MemoryReading;

    #[test]
    fn test_record_field_names() {
        let sample = PerformanceSample {
            timestamp_ms: 42,
            frame_time_ms: 20.0,
            memory: MemoryReading::estimated(80.0),
            draw_calls: 12,
            triangles: 300,
            scene_complexity: 55.0,
            performance_mode: QualityLevel::High,
        };
        let value = serde_json::to_value(PerformanceRecord::from(&sample)).expect("serializable");
        let object = value.as_object().expect("object");
        for key in [
            "timestamp",
            "frameTime",
            "fps",
            "memoryUsage",
            "drawCalls",
            "sceneComplexity",
            "performanceMode",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(value["performanceMode"], "high");
        assert_eq!(value["fps"], 50.0);
        assert_eq!(value["memoryEstimated"], true);
    }
}
