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

//! The metrics collector.

use crate::config::CollectorConfig;
use crate::export::PerformanceRecord;
use crate::warnings;
use lumen_core::control::QualityLevel;
use lumen_core::event::EventBus;
use lumen_core::renderer::RendererInfo;
use lumen_core::telemetry::{MemoryReading, PerformanceSample, PerformanceWarning};
use lumen_core::RingBuffer;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Inputs the host provides when a sample is taken.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleInputs {
    /// Renderer counters, read for live object counts.
    pub info: RendererInfo,
    /// Heap size in megabytes, when the host exposes a heap-size API.
    pub heap_mb: Option<f32>,
    /// Latest complexity score.
    pub scene_complexity: f32,
    /// Active quality level.
    pub mode: QualityLevel,
}

/// Smoothed view over the most recent samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    /// Mean FPS.
    #[serde(rename = "avgFPS")]
    pub avg_fps: f32,
    /// Mean frame time in milliseconds.
    pub avg_frame_time: f32,
    /// Mean memory in megabytes.
    pub avg_memory: f32,
    /// Mean draw calls.
    pub avg_draw_calls: f32,
    /// Number of samples the summary covers.
    pub sample_count: usize,
    /// Whether any covered sample carried an estimated memory reading.
    pub memory_estimated: bool,
    /// Variance of the frame time. High values indicate stutter.
    pub frame_time_variance: f32,
    /// FPS trend, positive when improving.
    pub fps_trend: f32,
}

/// Samples live frame metrics into a bounded history.
///
/// `record_frame` must be called on every tick, before the renderer resets its
/// per-frame counters. `sample` is called at the configured sample rate.
#[derive(Debug)]
pub struct MetricsCollector {
    config: CollectorConfig,
    history: RingBuffer<PerformanceSample>,
    fps_buffer: RingBuffer<f32>,
    frames_since_sample: u32,
    window_start: Option<Duration>,
    last_frame_at: Option<Duration>,
    last_frame_info: RendererInfo,
    warnings: EventBus<PerformanceWarning>,
}

impl MetricsCollector {
    /// Creates a collector. The configuration is expected to be validated.
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            history: RingBuffer::new(config.history_capacity),
            fps_buffer: RingBuffer::new(config.fps_window),
            frames_since_sample: 0,
            window_start: None,
            last_frame_at: None,
            last_frame_info: RendererInfo::default(),
            warnings: EventBus::new(),
            config,
        }
    }

    /// Records one rendered frame.
    ///
    /// Reads the renderer's per-frame counters and feeds the instantaneous FPS
    /// buffer from the time elapsed since the previous frame.
    ///
    /// The very first frame only opens the sampling window: a window holds one
    /// frame per elapsed interval.
    pub fn record_frame(&mut self, now: Duration, info: &RendererInfo) {
        if let Some(last) = self.last_frame_at {
            let dt = now.saturating_sub(last).as_secs_f32();
            if dt > 0.0 {
                self.fps_buffer.push(1.0 / dt);
            }
        }
        self.last_frame_at = Some(now);
        self.last_frame_info = *info;
        if self.window_start.is_none() {
            self.window_start = Some(now);
            return;
        }
        self.frames_since_sample = self.frames_since_sample.saturating_add(1);
    }

    /// Takes a sample covering every frame since the previous sample.
    ///
    /// The sample is appended to the history, evicting the oldest one when full,
    /// and threshold crossings are published on [`MetricsCollector::warnings`].
    pub fn sample(&mut self, now: Duration, inputs: &SampleInputs) -> PerformanceSample {
        let elapsed_ms = self
            .window_start
            .map(|start| now.saturating_sub(start).as_secs_f32() * 1000.0)
            .unwrap_or(0.0);
        let frames = self.frames_since_sample.max(1);
        let frame_time_ms = (elapsed_ms / frames as f32).max(0.0);

        let memory = match inputs.heap_mb {
            Some(mb) => MemoryReading::exact(mb),
            None => MemoryReading::estimated(self.config.memory_estimate.estimate(&inputs.info)),
        };

        let sample = PerformanceSample {
            timestamp_ms: now.as_millis() as u64,
            frame_time_ms,
            memory,
            draw_calls: self.last_frame_info.draw_calls,
            triangles: self.last_frame_info.triangles,
            scene_complexity: inputs.scene_complexity,
            performance_mode: inputs.mode,
        };

        log::trace!(
            "MetricsCollector: sample at {}ms, {:.1} fps over {} frames, {:.1}MB{}",
            sample.timestamp_ms,
            sample.fps(),
            frames,
            memory.megabytes,
            if memory.is_estimated() { " (estimated)" } else { "" }
        );

        for warning in warnings::evaluate(&sample, &self.config.warning_thresholds) {
            log::warn!("MetricsCollector: {warning}");
            self.warnings.publish(warning);
        }

        self.history.push(sample.clone());
        self.frames_since_sample = 0;
        self.window_start = Some(now);
        sample
    }

    /// Summarizes the `window` most recent samples (every sample when `window` is 0).
    pub fn summary(&self, window: usize) -> PerformanceSummary {
        let window = if window == 0 {
            self.history.len()
        } else {
            window.min(self.history.len())
        };
        if window == 0 {
            return PerformanceSummary::default();
        }

        let mut fps = RingBuffer::new(window);
        let mut frame_time = RingBuffer::new(window);
        let mut memory = RingBuffer::new(window);
        let mut draw_calls = RingBuffer::new(window);
        let mut memory_estimated = false;
        for sample in self.history.recent(window) {
            fps.push(sample.fps());
            frame_time.push(sample.frame_time_ms);
            memory.push(sample.memory.megabytes);
            draw_calls.push(sample.draw_calls as f32);
            memory_estimated |= sample.memory.is_estimated();
        }

        PerformanceSummary {
            avg_fps: fps.average(),
            avg_frame_time: frame_time.average(),
            avg_memory: memory.average(),
            avg_draw_calls: draw_calls.average(),
            sample_count: window,
            memory_estimated,
            frame_time_variance: frame_time.variance(),
            fps_trend: fps.trend(),
        }
    }

    /// Mean of the instantaneous FPS buffer.
    pub fn instant_fps(&self) -> f32 {
        self.fps_buffer.average()
    }

    /// Coefficient of variation of the instantaneous FPS buffer.
    ///
    /// 0 means perfectly steady; values above ~0.2 indicate visible stutter.
    pub fn stability(&self) -> f32 {
        let mean = self.fps_buffer.average();
        if mean <= 0.0 {
            return 0.0;
        }
        self.fps_buffer.variance().sqrt() / mean
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<&PerformanceSample> {
        self.history.latest()
    }

    /// The full history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &PerformanceSample> {
        self.history.iter()
    }

    /// Number of samples in the history.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether no sample has been taken since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// The warning channel.
    pub fn warnings(&self) -> &EventBus<PerformanceWarning> {
        &self.warnings
    }

    /// Takes every pending warning.
    pub fn drain_warnings(&mut self) -> Vec<PerformanceWarning> {
        self.warnings.drain()
    }

    /// Flushes every buffer, pending counter and pending warning.
    pub fn clear(&mut self) {
        self.history.clear();
        self.fps_buffer.clear();
        self.frames_since_sample = 0;
        self.window_start = None;
        self.last_frame_at = None;
        self.last_frame_info = RendererInfo::default();
        let dropped = self.warnings.drain().len();
        log::debug!("MetricsCollector: cleared ({dropped} pending warnings dropped).");
    }

    /// Resizes the history and the instantaneous buffer, evicting oldest first.
    pub fn set_capacity(&mut self, history_capacity: usize, fps_window: usize) {
        self.history.set_capacity(history_capacity);
        self.fps_buffer.set_capacity(fps_window);
        self.config.history_capacity = self.history.capacity();
        self.config.fps_window = self.fps_buffer.capacity();
    }

    /// Applies a new configuration, keeping the buffered samples.
    pub fn update_config(&mut self, config: CollectorConfig) {
        self.set_capacity(config.history_capacity, config.fps_window);
        self.config = config;
    }

    /// Current configuration.
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Serializable copy of the history.
    pub fn export_records(&self) -> Vec<PerformanceRecord> {
        self.history.iter().map(PerformanceRecord::from).collect()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(CollectorConfig::default())
    }
}
