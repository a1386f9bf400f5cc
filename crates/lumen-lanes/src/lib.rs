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

//! # Lumen Lanes
//!
//! The work units a lighting build delegates to, one per pipeline concern:
//!
//! - [`gather_lane`]: walks the scene and produces the build's meshes, mappings and lights.
//! - [`index_lane`]: assigns deterministic guids to processed mappings.
//! - [`export_lane`]: streams the gathered scene to the job client a few items per tick.
//! - [`import_lane`]: the deferred and immediate import strategies.
//! - [`apply_lane`]: writes results back and invalidates stale cached lighting.

#![warn(missing_docs)]

pub mod apply_lane;
pub mod export_lane;
pub mod gather_lane;
pub mod import_lane;
pub mod index_lane;

mod messages;

pub use apply_lane::{ApplyRequest, ResultApplyLane};
pub use export_lane::{AmortizedExportLane, ExportError, ExportSink, ExportStatus};
pub use gather_lane::{BuildScope, GatherError, GatherOutput, SceneGatherLane};
pub use import_lane::{
    import_strategy_for, DeferredImportStrategy, ImmediateImportStrategy, ImportError,
    ImportSession, ImportStrategy,
};
pub use index_lane::{DeterministicIndexLane, IndexReport};
