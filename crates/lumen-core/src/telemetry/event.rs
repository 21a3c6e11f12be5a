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

use super::PerformanceWarning;
use crate::control::{ModeTransition, OptimizationStrategy, QualityLevel};
use serde::{Deserialize, Serialize};

/// Discrete events published by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PerformanceEvent {
    /// A sample crossed a warning threshold.
    Warning(PerformanceWarning),
    /// The policy switched quality level.
    ModeChanged(ModeTransition),
    /// A strategy was applied to the renderer.
    OptimizationApplied {
        /// Level the strategy belongs to, `None` for custom strategies.
        level: Option<QualityLevel>,
        /// The applied strategy.
        strategy: OptimizationStrategy,
        /// Clock time of the application, in milliseconds.
        at_ms: u64,
    },
}
