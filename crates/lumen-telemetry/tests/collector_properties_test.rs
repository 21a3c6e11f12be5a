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

//! Properties of the sampled history under arbitrary frame pacing.

use lumen_core::control::QualityLevel;
use lumen_core::renderer::RendererInfo;
use lumen_core::telemetry::{Severity, WarningKind};
use lumen_telemetry::{CollectorConfig, MetricsCollector, SampleInputs};
use proptest::prelude::*;
use std::time::Duration;

fn collector(capacity: usize) -> MetricsCollector {
    MetricsCollector::new(CollectorConfig {
        history_capacity: capacity,
        ..CollectorConfig::default()
    })
}

/// Feeds `frames_per_sample[i]` frames of `frame_ms` each, then samples.
fn drive(c: &mut MetricsCollector, frames_per_sample: &[(u32, u64)]) -> Vec<u64> {
    let mut now = Duration::ZERO;
    let mut stamps = Vec::new();
    let info = RendererInfo::default();
    for (frames, frame_ms) in frames_per_sample {
        for _ in 0..*frames {
            c.record_frame(now, &info);
            now += Duration::from_millis(*frame_ms);
        }
        let sample = c.sample(now, &SampleInputs::default());
        stamps.push(sample.timestamp_ms);
    }
    stamps
}

proptest! {
    #[test]
    fn prop_history_keeps_most_recent_in_order(
        capacity in 1usize..40,
        pacing in proptest::collection::vec((1u32..30, 1u64..100), 1..120),
    ) {
        let mut c = collector(capacity);
        let stamps = drive(&mut c, &pacing);

        prop_assert!(c.len() <= capacity);
        let expected: Vec<u64> = stamps.iter().rev().take(capacity).rev().copied().collect();
        let kept: Vec<u64> = c.history().map(|s| s.timestamp_ms).collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn prop_summary_count_never_exceeds_history(
        capacity in 1usize..20,
        window in 0usize..40,
        pacing in proptest::collection::vec((1u32..10, 5u64..50), 0..60),
    ) {
        let mut c = collector(capacity);
        drive(&mut c, &pacing);
        let summary = c.summary(window);
        prop_assert!(summary.sample_count <= c.len());
        prop_assert!(summary.avg_fps >= 0.0);
    }
}

#[test]
fn test_frame_time_twice_the_threshold_is_critical() {
    let mut c = collector(10);
    // 30 frames of 80ms: 12.5 fps, frame time ~80ms against 30 fps / 33.3ms.
    drive(&mut c, &[(30, 80)]);
    let warnings = c.drain_warnings();

    let frame_time = warnings
        .iter()
        .find(|w| w.kind == WarningKind::HighFrameTime)
        .expect("frame-time warning");
    assert_eq!(frame_time.severity, Severity::Critical);
    let fps = warnings
        .iter()
        .find(|w| w.kind == WarningKind::LowFps)
        .expect("fps warning");
    assert_eq!(fps.severity, Severity::Critical);
}

#[test]
fn test_mild_overrun_is_a_warning() {
    let mut c = collector(10);
    drive(&mut c, &[(30, 40)]);
    let warnings = c.drain_warnings();
    assert!(!warnings.is_empty());
    assert!(warnings.iter().all(|w| w.severity == Severity::Warning));
}

#[test]
fn test_export_records_follow_history() {
    let mut c = collector(3);
    drive(&mut c, &[(10, 16), (10, 16), (10, 16), (10, 20)]);
    let records = c.export_records();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.performance_mode == QualityLevel::Low));
    assert!(records.iter().all(|r| r.memory_estimated));
}
