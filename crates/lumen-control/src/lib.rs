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

//! # Lumen Control
//!
//! The decision layer of the controller.
//!
//! - [`ComplexityScorer`] turns scene statistics into a weighted complexity score.
//! - [`StrategyPolicy`] is the hysteresis state machine choosing the quality level.
//! - [`StrategyMigration`] interpolates the live strategy toward the chosen preset.

#![warn(missing_docs)]

pub mod complexity;
pub mod policy;

pub use complexity::{
    ComplexityAnalysis, ComplexityBreakdown, ComplexityConfig, ComplexityFactor, ComplexityLevel,
    ComplexityScorer, Recommendation,
};
pub use policy::migration::{SnapEpsilon, StrategyMigration};
pub use policy::{
    ActiveStrategy, FpsBand, HysteresisConfig, PolicyConfig, PolicyInputs, SeedState,
    StrategyPolicy,
};
