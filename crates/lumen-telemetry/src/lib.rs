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

//! # Lumen Telemetry
//!
//! Samples live frame metrics into a bounded rolling history, derives smoothed
//! summaries for the policy, and raises threshold warnings as discrete events.

#![warn(missing_docs)]

pub mod collector;
pub mod config;
pub mod export;
pub mod warnings;

pub use collector::{MetricsCollector, PerformanceSummary, SampleInputs};
pub use config::{CollectorConfig, MemoryEstimateModel, WarningThresholds};
pub use export::PerformanceRecord;
