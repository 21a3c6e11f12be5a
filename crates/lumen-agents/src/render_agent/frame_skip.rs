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

//! Adaptive frame skipping for devices that fall behind the target rate.

use serde::{Deserialize, Serialize};

/// Tuning of the frame-skip decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSkipConfig {
    /// EMA factor of the adaptive target FPS.
    pub smoothing: f32,
    /// Lower clamp of the adaptive target, as a fraction of the static target.
    pub min_target_ratio: f32,
    /// How far below the adaptive target (fraction) the loop must fall before skipping.
    pub behind_margin: f32,
    /// Smallest allowed skip interval. Never below 2.
    pub min_interval: u64,
    /// Largest skip interval.
    pub max_interval: u64,
}

impl Default for FrameSkipConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.1,
            min_target_ratio: 0.5,
            behind_margin: 0.1,
            min_interval: 2,
            max_interval: 6,
        }
    }
}

impl FrameSkipConfig {
    /// Validates ranges.
    pub fn validate(&self) -> Result<(), lumen_core::ConfigError> {
        use lumen_core::ConfigError;
        ConfigError::check_range("frame_skip.smoothing", self.smoothing as f64, 0.001, 1.0)?;
        ConfigError::check_range(
            "frame_skip.min_target_ratio",
            self.min_target_ratio as f64,
            0.0,
            1.0,
        )?;
        ConfigError::check_range("frame_skip.behind_margin", self.behind_margin as f64, 0.0, 1.0)?;
        ConfigError::check_range("frame_skip.min_interval", self.min_interval as f64, 2.0, 60.0)?;
        ConfigError::check_range(
            "frame_skip.max_interval",
            self.max_interval as f64,
            self.min_interval as f64,
            60.0,
        )
    }
}

/// Decides which frames to drop when the render loop falls behind.
///
/// The comparison is made against a smoothed adaptive target rather than the
/// configured one, so a device that settles at a lower rate stops skipping.
/// Two consecutive frames are never skipped.
#[derive(Debug, Clone)]
pub struct FrameSkipper {
    config: FrameSkipConfig,
    target_fps: f32,
    threshold: f32,
    adaptive_target: f32,
    last_skipped: Option<u64>,
}

impl FrameSkipper {
    /// Creates a skipper for `target_fps`, with skipping disabled until a threshold is set.
    pub fn new(config: FrameSkipConfig, target_fps: f32) -> Self {
        Self {
            config,
            target_fps,
            threshold: 0.0,
            adaptive_target: target_fps,
            last_skipped: None,
        }
    }

    /// Sets the FPS under which skipping may start. 0 disables skipping.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    /// Sets the static target and re-centers the adaptive target on it.
    pub fn set_target_fps(&mut self, target_fps: f32) {
        self.target_fps = target_fps;
        self.adaptive_target = target_fps;
    }

    /// Replaces the tuning.
    pub fn set_config(&mut self, config: FrameSkipConfig) {
        self.config = config;
    }

    /// The smoothed target the current FPS is compared against.
    pub fn adaptive_target(&self) -> f32 {
        self.adaptive_target
    }

    /// Whether the render call of `frame_index` should be skipped.
    pub fn should_skip_frame(&mut self, frame_index: u64, current_fps: f32) -> bool {
        if !current_fps.is_finite() || current_fps <= 0.0 {
            return false;
        }

        let floor = self.target_fps * self.config.min_target_ratio;
        self.adaptive_target += self.config.smoothing * (current_fps - self.adaptive_target);
        self.adaptive_target = self.adaptive_target.clamp(floor, self.target_fps.max(floor));

        if self.threshold <= 0.0 || current_fps >= self.threshold {
            return false;
        }
        let behind = self.adaptive_target * (1.0 - self.config.behind_margin);
        if current_fps >= behind || self.adaptive_target <= 0.0 {
            return false;
        }
        if self.last_skipped.is_some_and(|last| last + 1 == frame_index) {
            return false;
        }

        let deficit = 1.0 - current_fps / self.adaptive_target;
        let min_interval = self.config.min_interval.max(2);
        let max_interval = self.config.max_interval.max(min_interval);
        let interval = ((1.0 / deficit).ceil() as u64).clamp(min_interval, max_interval);
        let skip = frame_index % interval == 0;
        if skip {
            self.last_skipped = Some(frame_index);
            log::trace!(
                "FrameSkipper: skipping frame {frame_index} ({current_fps:.1} FPS vs {:.1}).",
                self.adaptive_target
            );
        }
        skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_disabled_without_threshold() {
        let mut skipper = FrameSkipper::new(FrameSkipConfig::default(), 60.0);
        assert!((0..100).all(|i| !skipper.should_skip_frame(i, 10.0)));
    }

    #[test]
    fn test_skips_when_far_behind() {
        let mut skipper = FrameSkipper::new(FrameSkipConfig::default(), 60.0);
        skipper.set_threshold(30.0);
        let skipped = (0..60).filter(|i| skipper.should_skip_frame(*i, 12.0)).count();
        assert!(skipped > 0);
        assert!(skipped <= 30);
    }

    #[test]
    fn test_no_skip_above_threshold() {
        let mut skipper = FrameSkipper::new(FrameSkipConfig::default(), 60.0);
        skipper.set_threshold(20.0);
        assert!((0..100).all(|i| !skipper.should_skip_frame(i, 25.0)));
    }

    #[test]
    fn test_adaptive_target_clamped() {
        let mut skipper = FrameSkipper::new(FrameSkipConfig::default(), 60.0);
        for i in 0..500 {
            skipper.should_skip_frame(i, 5.0);
        }
        assert!((skipper.adaptive_target() - 30.0).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_never_two_consecutive_skips(
            fps in proptest::collection::vec(1.0f32..120.0, 1..300),
            threshold in 0.0f32..60.0,
        ) {
            let mut skipper = FrameSkipper::new(FrameSkipConfig::default(), 60.0);
            skipper.set_threshold(threshold);
            let mut previous = false;
            for (i, f) in fps.into_iter().enumerate() {
                let skip = skipper.should_skip_frame(i as u64, f);
                prop_assert!(!(skip && previous));
                previous = skip;
            }
        }
    }
}
