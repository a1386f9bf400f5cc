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

//! # Lumen IO
//!
//! Everything that crosses a process or disk boundary: the RON configuration,
//! the framed bincode records exchanged with the worker pool, the diagnostic
//! dump directory and the client that drives one remote job.

#![warn(missing_docs)]

pub mod config;
pub mod dump;
pub mod swarm;
pub mod wire;

pub use config::{ConfigError, ImportMode, LightmassConfig};
pub use dump::{BinaryDumpDirectory, DumpError};
pub use swarm::{ClientError, DistributedJobClient, MappingState};
pub use wire::{JobRecord, WireError};
