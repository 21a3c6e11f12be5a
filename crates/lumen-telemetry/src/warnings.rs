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

//! Threshold evaluation.

use crate::config::WarningThresholds;
use lumen_core::telemetry::{PerformanceSample, PerformanceWarning, Severity, WarningKind};

/// A value at least this many times past its threshold is critical.
pub const CRITICAL_FACTOR: f32 = 2.0;

fn severity_above(value: f32, threshold: f32) -> Severity {
    if value >= threshold * CRITICAL_FACTOR {
        Severity::Critical
    } else {
        Severity::Warning
    }
}

fn severity_below(value: f32, threshold: f32) -> Severity {
    if value <= threshold / CRITICAL_FACTOR {
        Severity::Critical
    } else {
        Severity::Warning
    }
}

/// Returns every threshold `sample` crosses.
///
/// FPS and frame-time checks are skipped for samples without a frame-time
/// measurement.
pub fn evaluate(
    sample: &PerformanceSample,
    thresholds: &WarningThresholds,
) -> Vec<PerformanceWarning> {
    let mut warnings = Vec::new();
    let mut push = |kind, severity, value, threshold| {
        warnings.push(PerformanceWarning {
            kind,
            severity,
            value,
            threshold,
            timestamp_ms: sample.timestamp_ms,
        })
    };

    if sample.frame_time_ms > 0.0 {
        let fps = sample.fps();
        if fps < thresholds.min_fps {
            push(
                WarningKind::LowFps,
                severity_below(fps, thresholds.min_fps),
                fps,
                thresholds.min_fps,
            );
        }
        if sample.frame_time_ms > thresholds.max_frame_time_ms {
            push(
                WarningKind::HighFrameTime,
                severity_above(sample.frame_time_ms, thresholds.max_frame_time_ms),
                sample.frame_time_ms,
                thresholds.max_frame_time_ms,
            );
        }
    }

    let memory = sample.memory.megabytes;
    if memory > thresholds.max_memory_mb {
        push(
            WarningKind::HighMemory,
            severity_above(memory, thresholds.max_memory_mb),
            memory,
            thresholds.max_memory_mb,
        );
    }

    let draw_calls = sample.draw_calls as f32;
    let max_draw_calls = thresholds.max_draw_calls as f32;
    if draw_calls > max_draw_calls {
        push(
            WarningKind::HighDrawCalls,
            severity_above(draw_calls, max_draw_calls),
            draw_calls,
            max_draw_calls,
        );
    }

    warnings
}
