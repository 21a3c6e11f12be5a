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

//! # Lumen Infra
//!
//! Concrete implementations of the platform-facing contracts defined in
//! `lumen-core`: the one-shot [`DeviceCapabilityProbe`], a `sysinfo`-backed
//! [`HardwareProvider`](lumen_core::platform::HardwareProvider), and a CPU
//! rasterizing off-screen context used when no GPU context is injected.

#![warn(missing_docs)]

pub mod platform;
pub mod probe;
pub mod renderer;

pub use platform::SysinfoHardwareProvider;
pub use probe::{DeviceCapabilityProbe, ProbeConfig, ProbeError, ReferenceValues, TierThresholds};
pub use renderer::SoftwareContextFactory;
