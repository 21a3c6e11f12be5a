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

//! The public-facing SDK of the Lumen performance controller.
//!
//! A host constructs one [`PerformanceController`] per visualization view,
//! calls [`PerformanceController::tick`] from its render loop, and reads the
//! budgets and status it exposes. Everything the controller needs from the
//! host is borrowed through the traits of `lumen-core`.

#![warn(missing_docs)]

mod config;
mod controller;
mod report;

pub use config::ControllerConfig;
pub use controller::{
    AnalysisStatus, ControllerStatus, FrameLoop, PerformanceController, PerformanceStats,
    TickOutcome,
};
pub use report::PerformanceReport;

/// Types most hosts need.
pub mod prelude {
    pub use crate::{
        ControllerConfig, ControllerStatus, FrameLoop, PerformanceController, TickOutcome,
    };
    pub use lumen_agents::{InMemoryResourceBackend, SceneBudgets};
    pub use lumen_core::control::{OptimizationStrategy, PerformanceMode, QualityLevel};
    pub use lumen_core::renderer::{GpuResourceBackend, RenderTarget, RendererInfo};
    pub use lumen_core::scene::{NodeKind, SceneNode};
    pub use lumen_core::{Clock, ManualClock, SystemClock};
    pub use lumen_infra::{
        DeviceCapabilityProbe, ProbeConfig, SoftwareContextFactory, SysinfoHardwareProvider,
    };
}
