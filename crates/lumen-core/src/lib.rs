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

//! # Lumen Core
//!
//! Foundational crate containing the shared data model, traits, and interface
//! contracts of the adaptive rendering performance controller.
//!
//! This crate defines the abstract "what": samples, strategies, device profiles,
//! the scene description consumed by the complexity scorer, and the traits that
//! the host renderer and GPU backend implement. `lumen-telemetry`,
//! `lumen-control`, `lumen-infra` and `lumen-agents` provide the concrete "how".

#![warn(missing_docs)]

pub mod config;
pub mod control;
pub mod event;
pub mod platform;
pub mod renderer;
pub mod scene;
pub mod telemetry;
pub mod utils;

pub use config::ConfigError;
pub use utils::ring_buffer::RingBuffer;
pub use utils::timer::{Clock, ManualClock, Stopwatch, SystemClock};
