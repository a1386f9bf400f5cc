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
//! The control side of a static lighting build.
//!
//! [`lighting_agent::StaticLightingSystem`] is the per-build stage machine: it
//! owns the gathered scene, the job client and the lanes, and advances one
//! stage step per host tick. [`lighting_agent::StaticLightingManager`] owns at
//! most one such system, enforces single-flight and is the only place a build
//! is torn down.

#![warn(missing_docs)]

pub mod lighting_agent;

pub use lighting_agent::{
    BuildError, StaticLightingManager, StaticLightingSystem, SwarmChannelFactory,
};
