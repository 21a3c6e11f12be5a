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

//! The one-shot device capability benchmark.
//!
//! The probe renders a fixed scene (a rotating mesh and a large point cloud)
//! into a detached context for a bounded duration, samples instantaneous FPS
//! at a fixed interval, trims outliers from both ends and averages the rest.
//! The windowed FPS is blended with a hardware score into a tier.
//!
//! Running the probe blocks the calling thread for the whole duration. It must
//! only be started from an explicit user action.

use lumen_core::platform::{
    BenchmarkResult, DeviceProfile, DeviceTier, GpuCapabilities, HardwareProvider,
    HardwareSnapshot, ProbeStatus,
};
use lumen_core::renderer::{BenchmarkScene, OffscreenContextFactory};
use lumen_core::{Clock, Stopwatch};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Reasons a benchmark run produced no measurement.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeError {
    /// No off-screen context could be created.
    #[error("no off-screen rendering context is available")]
    ContextUnavailable,
    /// The run was cancelled through the cancel handle.
    #[error("benchmark interrupted after {after_ms}ms")]
    Interrupted {
        /// Time spent before the cancellation was observed.
        after_ms: u64,
    },
    /// The run ended without a single FPS sample.
    #[error("benchmark produced no FPS samples ({frames} frames rendered)")]
    NoSamples {
        /// Frames rendered during the run.
        frames: u64,
    },
}

/// Values against which raw measurements are normalized to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceValues {
    /// FPS scoring 100.
    pub fps: f32,
    /// Logical cores scoring 100.
    pub logical_cores: u32,
    /// Memory scoring 100.
    pub memory_mb: u64,
    /// GPU extensions scoring the full extension share.
    pub extensions: u32,
}

impl Default for ReferenceValues {
    fn default() -> Self {
        Self {
            fps: 60.0,
            logical_cores: 8,
            memory_mb: 8192,
            extensions: 32,
        }
    }
}

/// Lower score bounds of the high and medium tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Scores at or above are high.
    pub high: f32,
    /// Scores at or above are medium.
    pub medium: f32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high: 70.0,
            medium: 40.0,
        }
    }
}

/// Configuration of [`DeviceCapabilityProbe`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Wall-clock duration of a run.
    pub duration_ms: u64,
    /// Interval between two FPS samples.
    pub sample_interval_ms: u64,
    /// Fraction of samples dropped from each end before averaging.
    pub trim_fraction: f32,
    /// Points in the benchmark point cloud.
    pub point_count: usize,
    /// Off-screen context size.
    pub width: u32,
    /// Off-screen context size.
    pub height: u32,
    /// Mesh rotation per frame, in radians.
    pub rotation_per_frame: f32,
    /// Hard cap on rendered frames, in case the clock stalls.
    pub max_frames: u64,
    /// Share of the windowed FPS in the combined score. The hardware score gets the rest.
    pub fps_weight: f32,
    /// Normalization references.
    pub reference: ReferenceValues,
    /// Tier thresholds.
    pub tiers: TierThresholds,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            duration_ms: 3000,
            sample_interval_ms: 100,
            trim_fraction: 0.1,
            point_count: 10_000,
            width: 256,
            height: 256,
            rotation_per_frame: 0.01,
            max_frames: 200_000,
            fps_weight: 0.6,
            reference: ReferenceValues::default(),
            tiers: TierThresholds::default(),
        }
    }
}

/// Mean of `samples` after dropping `trim` of them from each end.
///
/// Returns `None` for an empty slice. When trimming would leave nothing, the
/// untrimmed mean is used.
pub fn trimmed_mean(samples: &[f32], trim: f32) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted: Vec<f32> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f32::total_cmp);
    let k = (sorted.len() as f32 * trim.clamp(0.0, 0.5)).floor() as usize;
    let kept = if sorted.len() > 2 * k {
        &sorted[k..sorted.len() - k]
    } else {
        &sorted[..]
    };
    Some(kept.iter().sum::<f32>() / kept.len() as f32)
}

/// Hardware score in `[0, 100]`: mean of the core, memory and GPU sub-scores.
///
/// Unknown memory counts as 50. The GPU sub-score gives 60 for the modern API
/// level and up to 40 for the extension count.
pub fn hardware_score(
    hardware: &HardwareSnapshot,
    gpu: Option<&GpuCapabilities>,
    reference: &ReferenceValues,
) -> f32 {
    let ratio = |value: f32, reference: f32| {
        if reference <= 0.0 {
            0.0
        } else {
            (value / reference).clamp(0.0, 1.0)
        }
    };
    let cores = ratio(hardware.logical_cores as f32, reference.logical_cores as f32) * 100.0;
    let memory = hardware
        .total_memory_mb
        .map(|mb| ratio(mb as f32, reference.memory_mb as f32) * 100.0)
        .unwrap_or(50.0);
    let gpu = gpu
        .map(|g| {
            let api = if g.modern_api { 60.0 } else { 0.0 };
            api + ratio(g.extension_count as f32, reference.extensions as f32) * 40.0
        })
        .unwrap_or(0.0);
    (cores + memory + gpu) / 3.0
}

/// Blends the windowed FPS and the hardware score.
pub fn combined_score(windowed_fps: f32, hardware_score: f32, config: &ProbeConfig) -> f32 {
    let fps_score = if config.reference.fps > 0.0 {
        (windowed_fps / config.reference.fps).clamp(0.0, 1.0) * 100.0
    } else {
        0.0
    };
    let w = config.fps_weight.clamp(0.0, 1.0);
    fps_score * w + hardware_score.clamp(0.0, 100.0) * (1.0 - w)
}

/// Maps a score to a tier. Mobile and touch devices are capped one tier below.
pub fn classify(
    score: f32,
    hardware: &HardwareSnapshot,
    thresholds: &TierThresholds,
) -> DeviceTier {
    let tier = if score >= thresholds.high {
        DeviceTier::High
    } else if score >= thresholds.medium {
        DeviceTier::Medium
    } else {
        DeviceTier::Low
    };
    if hardware.is_mobile || hardware.has_touch {
        tier.capped_one_below()
    } else {
        tier
    }
}

/// Benchmarks the host in an isolated off-screen context.
pub struct DeviceCapabilityProbe {
    config: ProbeConfig,
    clock: Arc<dyn Clock>,
    hardware: Box<dyn HardwareProvider>,
    contexts: Box<dyn OffscreenContextFactory>,
    cancel: Arc<AtomicBool>,
}

impl DeviceCapabilityProbe {
    /// Creates a probe.
    pub fn new(
        config: ProbeConfig,
        clock: Arc<dyn Clock>,
        hardware: Box<dyn HardwareProvider>,
        contexts: Box<dyn OffscreenContextFactory>,
    ) -> Self {
        Self {
            config,
            clock,
            hardware,
            contexts,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A shareable flag that aborts a run in progress when raised.
    ///
    /// Hosts raise it when the page is hidden or navigated away from.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Current configuration.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Runs the benchmark for the configured duration.
    pub fn run(&mut self) -> DeviceProfile {
        self.run_benchmark(Duration::from_millis(self.config.duration_ms))
    }

    /// Runs the benchmark for `duration`.
    ///
    /// Never fails: an unavailable context yields an unsupported profile, and
    /// a cancelled or empty run yields an interrupted profile with tier
    /// `Unknown`. The cancel flag is lowered afterwards so the run can be retried.
    pub fn run_benchmark(&mut self, duration: Duration) -> DeviceProfile {
        let hardware = self.hardware.snapshot();
        let mut gpu = None;
        let result = self.measure(duration, &mut gpu);
        self.cancel.store(false, Ordering::SeqCst);

        match result {
            Ok(benchmark) => {
                let hardware_score = hardware_score(&hardware, gpu.as_ref(), &self.config.reference);
                let score = combined_score(benchmark.windowed_fps, hardware_score, &self.config);
                let tier = classify(score, &hardware, &self.config.tiers);
                log::info!(
                    "DeviceCapabilityProbe: {:.1} fps windowed ({} of {} samples), hardware {:.1}, score {:.1} -> {:?}",
                    benchmark.windowed_fps,
                    benchmark.kept_samples,
                    benchmark.raw_samples,
                    hardware_score,
                    score,
                    tier
                );
                DeviceProfile {
                    tier,
                    status: ProbeStatus::Completed,
                    hardware,
                    gpu,
                    benchmark: Some(benchmark),
                    hardware_score,
                    score,
                }
            }
            Err(ProbeError::ContextUnavailable) => {
                log::warn!("DeviceCapabilityProbe: no off-screen context, 3D rendering unsupported.");
                DeviceProfile::unsupported(hardware)
            }
            Err(e) => {
                log::warn!("DeviceCapabilityProbe: {e}. Result discarded.");
                DeviceProfile::interrupted(hardware, gpu)
            }
        }
    }

    fn measure(
        &self,
        duration: Duration,
        gpu: &mut Option<GpuCapabilities>,
    ) -> Result<BenchmarkResult, ProbeError> {
        let mut context = self
            .contexts
            .create(self.config.width, self.config.height)
            .ok_or(ProbeError::ContextUnavailable)?;
        *gpu = Some(context.capabilities());

        let mut scene = BenchmarkScene::new(self.config.point_count);
        let interval = Duration::from_millis(self.config.sample_interval_ms.max(1));
        let clock = self.clock.as_ref();
        let run = Stopwatch::start(clock);
        let mut window = Stopwatch::start(clock);
        let mut window_frames = 0u64;
        let mut frames = 0u64;
        let mut samples = Vec::new();

        log::info!(
            "DeviceCapabilityProbe: running for {}ms with {} points.",
            duration.as_millis(),
            self.config.point_count
        );

        while run.elapsed(clock) < duration && frames < self.config.max_frames {
            if self.cancel.load(Ordering::SeqCst) {
                return Err(ProbeError::Interrupted {
                    after_ms: run.elapsed(clock).as_millis() as u64,
                });
            }
            scene.rotate(self.config.rotation_per_frame);
            context.render(&scene);
            frames += 1;
            window_frames += 1;

            let elapsed = window.elapsed(clock);
            if elapsed >= interval {
                samples.push(window_frames as f32 / elapsed.as_secs_f32());
                window = Stopwatch::start(clock);
                window_frames = 0;
            }
        }

        let windowed_fps =
            trimmed_mean(&samples, self.config.trim_fraction).ok_or(ProbeError::NoSamples { frames })?;
        let k = (samples.len() as f32 * self.config.trim_fraction.clamp(0.0, 0.5)).floor() as usize;
        let kept_samples = if samples.len() > 2 * k {
            samples.len() - 2 * k
        } else {
            samples.len()
        };

        Ok(BenchmarkResult {
            windowed_fps,
            raw_samples: samples.len(),
            kept_samples,
            duration_ms: run.elapsed(clock).as_millis() as u64,
            frames_rendered: frames,
        })
    }
}
