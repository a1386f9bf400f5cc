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

//! Acts as the **[A]gent** for static lighting builds.
//!
//! The agent is split in two:
//! - [`StaticLightingSystem`] runs one build through its stages
//!   (`Startup`, `AmortizedExport`, `SwarmKickoff`, `AsynchronousBuilding`,
//!   `AutoApplyingImport`, `WaitingForImport`, `Import`), delegating the work
//!   of each stage to a lane.
//! - [`StaticLightingManager`] is the host-facing entry point. It creates
//!   systems, forwards ticks, and routes cancel, fail, apply and discard
//!   through one teardown path.

mod error;
mod manager;
mod system;

pub use error::*;
pub use manager::*;
pub use system::*;
