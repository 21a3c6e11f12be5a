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

/// The metric that crossed its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// FPS fell below the minimum.
    LowFps,
    /// Frame time rose above the maximum.
    HighFrameTime,
    /// Memory rose above the maximum.
    HighMemory,
    /// Draw calls rose above the maximum.
    HighDrawCalls,
}

/// How far past its threshold a value is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Past the threshold.
    Warning,
    /// At least twice as far as the threshold allows.
    Critical,
}

/// A threshold crossing, emitted as a discrete event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceWarning {
    /// Metric that crossed.
    pub kind: WarningKind,
    /// Severity of the crossing.
    pub severity: Severity,
    /// Observed value.
    pub value: f32,
    /// Configured threshold.
    pub threshold: f32,
    /// Clock time of the sample that crossed, in milliseconds.
    pub timestamp_ms: u64,
}

impl fmt::Display for PerformanceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {:?}: {:.1} (threshold {:.1})",
            self.severity, self.kind, self.value, self.threshold
        )
    }
}
