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

//! # Lumen Agents
//!
//! Agents acting on the live renderer.
//!
//! - [`ResourceApplier`] applies strategies and is the single source of truth
//!   for the budgets scene code should build with.
//! - [`FrameSkipper`] decides which frames to drop under load.
//! - [`ResourceTracker`] owns adopted GPU objects and disposes them exactly once.

#![warn(missing_docs)]

pub mod render_agent;
pub mod resource_agent;

pub use render_agent::{ApplyReport, FrameSkipConfig, FrameSkipper, ResourceApplier, SceneBudgets};
pub use resource_agent::{DisposalReport, InMemoryResourceBackend, ResourceTracker};
