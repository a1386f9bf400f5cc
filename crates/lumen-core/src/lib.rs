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
//! Foundational crate containing traits, core types, and interface contracts
//! that define the static lighting build architecture.
//!
//! Nothing in here performs a build. Higher crates gather scene data
//! (`lumen-lanes`), talk to the remote worker pool (`lumen-io`) and drive the
//! stage machine (`lumen-agents`) on top of these contracts.

#![warn(missing_docs)]

pub mod agent;
pub mod cancel;
pub mod context;
pub mod event;
pub mod lane;
pub mod lighting;
pub mod math;
pub mod options;
pub mod scene;
pub mod stage;
pub mod swarm;
pub mod utils;

pub use cancel::CancelFlag;
pub use context::{BuildContext, EditorConditions};
pub use lighting::{LightingGuid, LightingQuality};
pub use options::{BuildOptions, LevelFilter};
pub use stage::BuildStage;
pub use utils::timer::Stopwatch;
