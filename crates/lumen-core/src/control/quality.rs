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

/// A concrete rendering-quality preset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    /// Cheapest preset. Also the conservative fallback for every failure.
    #[default]
    Low,
    /// Balanced preset.
    Medium,
    /// Full quality.
    High,
}

impl QualityLevel {
    /// All levels from cheapest to most expensive.
    pub const ALL: [QualityLevel; 3] =
        [QualityLevel::Low, QualityLevel::Medium, QualityLevel::High];

    /// The next cheaper level, saturating at [`QualityLevel::Low`].
    pub fn step_down(self) -> Self {
        match self {
            QualityLevel::High => QualityLevel::Medium,
            _ => QualityLevel::Low,
        }
    }

    /// The next more expensive level, saturating at [`QualityLevel::High`].
    pub fn step_up(self) -> Self {
        match self {
            QualityLevel::Low => QualityLevel::Medium,
            _ => QualityLevel::High,
        }
    }

    /// Lower-case name used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            QualityLevel::Low => "low",
            QualityLevel::Medium => "medium",
            QualityLevel::High => "high",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The mode selected by the user.
///
/// `Auto` lets the policy settle on a [`QualityLevel`] by itself; the other
/// modes pin a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    /// Pin the low preset.
    Low,
    /// Pin the medium preset.
    Medium,
    /// Pin the high preset.
    High,
    /// Continuously re-evaluate.
    #[default]
    Auto,
}

impl PerformanceMode {
    /// Returns the pinned level, or `None` for [`PerformanceMode::Auto`].
    pub fn fixed_level(self) -> Option<QualityLevel> {
        match self {
            PerformanceMode::Low => Some(QualityLevel::Low),
            PerformanceMode::Medium => Some(QualityLevel::Medium),
            PerformanceMode::High => Some(QualityLevel::High),
            PerformanceMode::Auto => None,
        }
    }
}

impl From<QualityLevel> for PerformanceMode {
    fn from(level: QualityLevel) -> Self {
        match level {
            QualityLevel::Low => PerformanceMode::Low,
            QualityLevel::Medium => PerformanceMode::Medium,
            QualityLevel::High => PerformanceMode::High,
        }
    }
}

/// Shadow-map quality.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ShadowQuality {
    /// Shadows disabled.
    #[default]
    Off,
    /// 512px shadow maps.
    Low,
    /// 1024px shadow maps.
    Medium,
    /// 2048px shadow maps.
    High,
}

impl ShadowQuality {
    /// Whether shadow mapping is enabled at all.
    pub fn is_enabled(self) -> bool {
        self != ShadowQuality::Off
    }

    /// Edge length of the shadow map in pixels, 0 when disabled.
    pub fn map_resolution(self) -> u32 {
        match self {
            ShadowQuality::Off => 0,
            ShadowQuality::Low => 512,
            ShadowQuality::Medium => 1024,
            ShadowQuality::High => 2048,
        }
    }
}
