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

use lumen_telemetry::{PerformanceRecord, PerformanceSummary};
use serde::Serialize;

/// Downloadable report of the rolling history and its summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    /// Clock time the report was generated at, in milliseconds.
    pub generated_at: u64,
    /// Summary over the whole history.
    pub summary: PerformanceSummary,
    /// Every retained sample, oldest first.
    pub samples: Vec<PerformanceRecord>,
}

impl PerformanceReport {
    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
