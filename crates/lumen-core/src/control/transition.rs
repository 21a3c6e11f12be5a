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

use super::QualityLevel;
use serde::{Deserialize, Serialize};

/// The trigger recorded when the user picks a mode by hand.
pub const MANUAL_TRIGGER: &str = "manual";

/// A record of one executed policy decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeTransition {
    /// Clock time of the decision, in milliseconds.
    pub at_ms: u64,
    /// Level before the switch.
    pub from: QualityLevel,
    /// Level after the switch.
    pub to: QualityLevel,
    /// Human-readable factors that caused the switch.
    pub triggers: Vec<String>,
}

impl ModeTransition {
    /// Whether the switch moved to a more expensive level.
    pub fn is_upgrade(&self) -> bool {
        self.to > self.from
    }

    /// Whether the switch moved to a cheaper level.
    pub fn is_downgrade(&self) -> bool {
        self.to < self.from
    }
}
