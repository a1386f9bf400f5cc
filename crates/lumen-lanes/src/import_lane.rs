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

//! The two ways results come back from the remote pool.
//!
//! [`DeferredImportStrategy`] leaves completed mappings on the pool until the
//! run is over and imports them all in one pass. [`ImmediateImportStrategy`]
//! fetches and applies each mapping from the polling tick as soon as it is
//! reported complete. One strategy is chosen per build and used throughout.

use crate::apply_lane::ResultApplyLane;
use lumen_core::lane::{Lane, LaneError, LaneKind};
use lumen_core::lighting::LightingGuid;
use lumen_core::scene::StaticLightingWorld;
use lumen_data::StaticLightingSet;
use lumen_io::{ClientError, DistributedJobClient, ImportMode, MappingState};
use lumen_telemetry::{LightmassStatistics, StatPhase};
use std::any::Any;
use thiserror::Error;

/// Errors raised while importing results.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The client refused or failed the fetch.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The pool reported a guid no processed mapping has.
    #[error("no processed mapping has guid {0}")]
    UnknownMapping(LightingGuid),
    /// The result could not be written back.
    #[error(transparent)]
    Apply(#[from] LaneError),
}

/// Everything an import strategy works with during one call.
pub struct ImportSession<'a> {
    /// The build's job client.
    pub client: &'a mut DistributedJobClient,
    /// The build's meshes and mappings.
    pub set: &'a StaticLightingSet,
    /// The scene receiving results.
    pub world: &'a mut dyn StaticLightingWorld,
    /// Writes results into the scene.
    pub apply: &'a ResultApplyLane,
    /// Build statistics.
    pub statistics: &'a LightmassStatistics,
}

impl ImportSession<'_> {
    fn mapping_index(&self, guid: LightingGuid) -> Result<usize, ImportError> {
        self.set
            .find_processed_mapping(guid)
            .ok_or(ImportError::UnknownMapping(guid))
    }
}

/// A way of bringing results back, selected once per build.
pub trait ImportStrategy: Lane {
    /// The configuration value this strategy implements.
    fn mode(&self) -> ImportMode;

    /// Called from the polling tick with the mappings reported complete since
    /// the previous tick. Failures are logged and the mapping is skipped.
    /// Returns how many mappings were applied.
    fn on_mappings_completed(
        &mut self,
        completed: &[LightingGuid],
        session: &mut ImportSession<'_>,
    ) -> usize;

    /// Called once after the run completed successfully. Brings back every
    /// mapping not yet applied. Returns how many mappings were applied.
    fn complete(&mut self, session: &mut ImportSession<'_>) -> Result<usize, ImportError>;
}

/// Creates the strategy for `mode`.
pub fn import_strategy_for(mode: ImportMode) -> Box<dyn ImportStrategy> {
    match mode {
        ImportMode::Deferred => Box::new(DeferredImportStrategy::default()),
        ImportMode::Immediate => Box::new(ImmediateImportStrategy::default()),
    }
}

/// Imports every completed mapping in one pass after the run.
#[derive(Debug, Default)]
pub struct DeferredImportStrategy {
    reported: usize,
}

impl ImportStrategy for DeferredImportStrategy {
    fn mode(&self) -> ImportMode {
        ImportMode::Deferred
    }

    fn on_mappings_completed(
        &mut self,
        completed: &[LightingGuid],
        _session: &mut ImportSession<'_>,
    ) -> usize {
        self.reported += completed.len();
        log::trace!(
            "DeferredImportStrategy: {} mappings waiting for import.",
            self.reported
        );
        0
    }

    fn complete(&mut self, session: &mut ImportSession<'_>) -> Result<usize, ImportError> {
        let pending = session.client.mappings_in_state(MappingState::Completed);
        for &guid in &pending {
            let index = session.mapping_index(guid)?;
            let result = session.client.import_mapping(guid, true)?;
            let _apply = session.statistics.scoped(StatPhase::Apply);
            session
                .apply
                .apply_mapping(session.world, session.set, index, result)?;
        }
        log::info!("DeferredImportStrategy: Imported {} mappings.", pending.len());
        Ok(pending.len())
    }
}

impl Lane for DeferredImportStrategy {
    fn strategy_name(&self) -> &'static str {
        "DeferredImport"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Import
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Fetches and applies each mapping as soon as it completes.
#[derive(Debug, Default)]
pub struct ImmediateImportStrategy {
    applied: usize,
}

impl ImmediateImportStrategy {
    fn process(
        &mut self,
        guid: LightingGuid,
        session: &mut ImportSession<'_>,
    ) -> Result<(), ImportError> {
        let index = session.mapping_index(guid)?;
        let result = session.client.process_mapping(guid)?;
        let _apply = session.statistics.scoped(StatPhase::ApplyInProcessing);
        session
            .apply
            .apply_mapping(session.world, session.set, index, result)?;
        self.applied += 1;
        Ok(())
    }
}

impl ImportStrategy for ImmediateImportStrategy {
    fn mode(&self) -> ImportMode {
        ImportMode::Immediate
    }

    fn on_mappings_completed(
        &mut self,
        completed: &[LightingGuid],
        session: &mut ImportSession<'_>,
    ) -> usize {
        let mut applied = 0;
        for &guid in completed {
            match self.process(guid, session) {
                Ok(()) => applied += 1,
                Err(e) => log::error!("ImmediateImportStrategy: Skipping {guid}: {e}"),
            }
        }
        applied
    }

    fn complete(&mut self, session: &mut ImportSession<'_>) -> Result<usize, ImportError> {
        // Completions that arrived in the final poll.
        let late = session.client.mappings_in_state(MappingState::Completed);
        for guid in late {
            self.process(guid, session)?;
        }
        log::info!("ImmediateImportStrategy: Applied {} mappings.", self.applied);
        Ok(self.applied)
    }
}

impl Lane for ImmediateImportStrategy {
    fn strategy_name(&self) -> &'static str {
        "ImmediateImport"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Import
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
