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

//! The stages of a lighting build.

use std::fmt;

/// Current stage of the build state machine.
///
/// At most one build is past `NotRunning` at any time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStage {
    /// No build in progress.
    #[default]
    NotRunning,
    /// Gathering the scene and connecting to the worker pool.
    Startup,
    /// Exporting meshes and mappings, a chunk per tick.
    AmortizedExport,
    /// Opening the remote job and starting the run.
    SwarmKickoff,
    /// The remote job is running and polled every tick.
    AsynchronousBuilding,
    /// The run finished; deciding whether results can be applied without asking.
    AutoApplyingImport,
    /// Waiting for the user to apply or discard the results.
    WaitingForImport,
    /// Importing and applying results.
    Import,
}

impl BuildStage {
    /// Whether a build is in progress in this stage.
    pub fn is_running(&self) -> bool {
        !matches!(self, BuildStage::NotRunning)
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::NotRunning => "NotRunning",
            BuildStage::Startup => "Startup",
            BuildStage::AmortizedExport => "AmortizedExport",
            BuildStage::SwarmKickoff => "SwarmKickoff",
            BuildStage::AsynchronousBuilding => "AsynchronousBuilding",
            BuildStage::AutoApplyingImport => "AutoApplyingImport",
            BuildStage::WaitingForImport => "WaitingForImport",
            BuildStage::Import => "Import",
        };
        write!(f, "{name}")
    }
}
