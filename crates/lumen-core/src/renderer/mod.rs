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

//! Contracts between the controller and the host renderer.
//!
//! The live renderer is always borrowed through [`RenderTarget`]. GPU objects the
//! controller owns are created through [`GpuResourceBackend`], and benchmarks run
//! in a detached [`OffscreenContext`] so they never touch the live scene.

mod offscreen;
mod resource;
mod target;

pub use offscreen::*;
pub use resource::*;
pub use target::*;
