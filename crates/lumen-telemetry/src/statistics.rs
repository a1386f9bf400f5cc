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

//! The accumulator of named durations filled in throughout a build.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PHASE_COUNT: usize = 18;

/// A named duration tracked by [`LightmassStatistics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatPhase {
    /// Everything before export starts.
    Startup,
    /// Walking levels and actors.
    Collect,
    /// Selecting eligible lights.
    PrepareLights,
    /// Asking primitives for their meshes and mappings.
    GatherLightingInfo,
    /// From export start to the remote run finishing.
    Processing,
    /// Importing results after the run.
    Import,
    /// Applying results to the scene.
    Apply,
    /// Encoding textures.
    Encoding,
    /// Invalidating stale lighting.
    Invalidation,
    /// Finishing, from the user's accept to teardown.
    Finishing,
    /// Whole build, excluding time spent waiting for the user.
    Total,
    /// Time spent waiting for the user to accept results.
    WaitingForUser,
    /// Connecting to the worker pool.
    SwarmStartup,
    /// Opening the remote job.
    SwarmJobOpen,
    /// Exporting input records.
    Export,
    /// Closing the remote job.
    SwarmJobClose,
    /// Importing results while the run is still going.
    ImportInProcessing,
    /// Applying results while the run is still going.
    ApplyInProcessing,
}

impl StatPhase {
    /// Every phase, in report order.
    pub const ALL: [StatPhase; PHASE_COUNT] = [
        StatPhase::Startup,
        StatPhase::Collect,
        StatPhase::PrepareLights,
        StatPhase::GatherLightingInfo,
        StatPhase::Processing,
        StatPhase::Import,
        StatPhase::Apply,
        StatPhase::Encoding,
        StatPhase::Invalidation,
        StatPhase::Finishing,
        StatPhase::Total,
        StatPhase::WaitingForUser,
        StatPhase::SwarmStartup,
        StatPhase::SwarmJobOpen,
        StatPhase::Export,
        StatPhase::SwarmJobClose,
        StatPhase::ImportInProcessing,
        StatPhase::ApplyInProcessing,
    ];

    /// Label used in the report.
    pub fn label(&self) -> &'static str {
        match self {
            StatPhase::Startup => "Startup",
            StatPhase::Collect => "Collect",
            StatPhase::PrepareLights => "Prepare lights",
            StatPhase::GatherLightingInfo => "Gather lighting info",
            StatPhase::Processing => "Processing",
            StatPhase::Import => "Import",
            StatPhase::Apply => "Apply",
            StatPhase::Encoding => "Encoding",
            StatPhase::Invalidation => "Invalidation",
            StatPhase::Finishing => "Finishing",
            StatPhase::Total => "Total",
            StatPhase::WaitingForUser => "Waiting for user",
            StatPhase::SwarmStartup => "Swarm startup",
            StatPhase::SwarmJobOpen => "Swarm job open",
            StatPhase::Export => "Export",
            StatPhase::SwarmJobClose => "Swarm job close",
            StatPhase::ImportInProcessing => "Import during processing",
            StatPhase::ApplyInProcessing => "Apply during processing",
        }
    }

    fn slot(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(0)
    }
}

/// Serializable copy of the accumulated durations, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    /// `(label, seconds)` in report order.
    pub phases: Vec<(String, f64)>,
}

impl StatisticsSnapshot {
    /// Seconds recorded for the phase with `label`.
    pub fn seconds(&self, label: &str) -> Option<f64> {
        self.phases
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, s)| *s)
    }

    /// JSON form of the snapshot.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Shared handle to a build's timing accumulator.
///
/// Cheap to clone; every clone adds into the same table.
#[derive(Debug, Clone, Default)]
pub struct LightmassStatistics {
    table: Arc<Mutex<[Duration; PHASE_COUNT]>>,
}

impl LightmassStatistics {
    /// Creates an all-zero accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `elapsed` to `phase`.
    pub fn add(&self, phase: StatPhase, elapsed: Duration) {
        match self.table.lock() {
            Ok(mut table) => table[phase.slot()] += elapsed,
            Err(_) => log::warn!("[LightmassStatistics] Table poisoned; dropped {phase:?}"),
        }
    }

    /// Replaces the value of `phase`.
    pub fn set(&self, phase: StatPhase, value: Duration) {
        match self.table.lock() {
            Ok(mut table) => table[phase.slot()] = value,
            Err(_) => log::warn!("[LightmassStatistics] Table poisoned; dropped {phase:?}"),
        }
    }

    /// Current value of `phase`.
    pub fn get(&self, phase: StatPhase) -> Duration {
        self.table
            .lock()
            .map(|table| table[phase.slot()])
            .unwrap_or_default()
    }

    /// Adds every phase of `other` into this accumulator.
    pub fn merge_from(&self, other: &LightmassStatistics) {
        if Arc::ptr_eq(&self.table, &other.table) {
            return;
        }
        for phase in StatPhase::ALL {
            self.add(phase, other.get(phase));
        }
    }

    /// Copies the table into a serializable snapshot.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            phases: StatPhase::ALL
                .iter()
                .map(|p| (p.label().to_string(), self.get(*p).as_secs_f64()))
                .collect(),
        }
    }

    /// Starts a timer that adds to `phase` when dropped.
    pub fn scoped(&self, phase: StatPhase) -> crate::ScopedGather {
        crate::ScopedGather::new(self.clone(), phase)
    }
}
