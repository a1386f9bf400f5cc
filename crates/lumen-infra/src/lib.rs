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
//! Concrete implementations of the collaborators a lighting build talks to:
//! an in-process worker pool speaking the remote job protocol, and a scene
//! store implementing the scene query and editor traits.

#![warn(missing_docs)]

pub mod scene;
pub mod swarm;

pub use scene::{single_mesh, EditorCall, InMemoryScene};
pub use swarm::{LocalSwarm, LocalSwarmConfig};
