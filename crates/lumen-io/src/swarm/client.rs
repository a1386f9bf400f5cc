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

use crate::dump::BinaryDumpDirectory;
use crate::wire::{self, WireError};
use lumen_core::cancel::CancelFlag;
use lumen_core::lighting::{LightingGuid, MappingResult};
use lumen_core::swarm::{JobDescriptor, SwarmChannel, SwarmError, SwarmMessage};
use lumen_telemetry::{LightmassStatistics, StatPhase};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;

/// Progress of one mapping on the client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingState {
    /// Exported, not reported back yet.
    Pending,
    /// The pool reported its results are ready.
    Completed,
    /// Results were fetched for a later bulk apply.
    Imported,
    /// Results were fetched to be applied immediately.
    Processed,
}

/// Errors raised by the job client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The channel failed.
    #[error(transparent)]
    Swarm(#[from] SwarmError),
    /// A result could not be decoded.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// The mapping is not in a state that allows this call.
    #[error("mapping {guid} is {state:?}, expected Completed")]
    UnexpectedState {
        /// Mapping guid.
        guid: LightingGuid,
        /// Current state, `None` if never registered.
        state: Option<MappingState>,
    },
    /// The pool answered with results for a different mapping.
    #[error("requested results for {requested}, received {received}")]
    GuidMismatch {
        /// Guid asked for.
        requested: LightingGuid,
        /// Guid in the payload.
        received: LightingGuid,
    },
}

/// Drives one job on the remote worker pool.
///
/// The client only executes whatever the build asks of it and keeps the
/// protocol state: connection, open job, staged input and per-mapping
/// completion. Staged input is discarded if the client is dropped before
/// the job is opened. Dropping the client with a job still open cancels it
/// while it runs and closes it once it has finished.
pub struct DistributedJobClient {
    channel: Box<dyn SwarmChannel>,
    connected: bool,
    job: Option<JobDescriptor>,
    staged_input: Vec<Vec<u8>>,
    mappings: BTreeMap<LightingGuid, MappingState>,
    newly_completed: VecDeque<LightingGuid>,
    percent_done: f32,
    finished: bool,
    success: bool,
    cancel: CancelFlag,
    cancel_sent: bool,
    dump: Option<BinaryDumpDirectory>,
    statistics: LightmassStatistics,
}

impl DistributedJobClient {
    /// Creates a client over `channel`, not yet connected.
    pub fn new(
        channel: Box<dyn SwarmChannel>,
        cancel: CancelFlag,
        statistics: LightmassStatistics,
    ) -> Self {
        Self {
            channel,
            connected: false,
            job: None,
            staged_input: Vec::new(),
            mappings: BTreeMap::new(),
            newly_completed: VecDeque::new(),
            percent_done: 0.0,
            finished: false,
            success: false,
            cancel,
            cancel_sent: false,
            dump: None,
            statistics,
        }
    }

    /// Writes every imported payload to `dump`.
    pub fn with_dump_directory(mut self, dump: BinaryDumpDirectory) -> Self {
        self.dump = Some(dump);
        self
    }

    /// Connects to the pool. Blocks briefly.
    pub fn connect(&mut self) -> Result<(), SwarmError> {
        let _scope = self.statistics.scoped(StatPhase::SwarmStartup);
        self.channel.connect()?;
        self.connected = true;
        log::info!("DistributedJobClient: Connected to the worker pool.");
        Ok(())
    }

    /// Whether `connect` succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether a job is open.
    pub fn has_open_job(&self) -> bool {
        self.job.is_some()
    }

    /// Buffers one encoded input record until the job is opened.
    pub fn stage_input(&mut self, record: Vec<u8>) {
        self.staged_input.push(record);
    }

    /// Number of records waiting for the job to open.
    pub fn staged_input_len(&self) -> usize {
        self.staged_input.len()
    }

    /// Registers a processed mapping whose results are expected back.
    pub fn expect_mapping(&mut self, guid: LightingGuid) {
        self.mappings.insert(guid, MappingState::Pending);
    }

    /// Opens the job and sends every staged record. Blocks briefly.
    pub fn open_job(&mut self, mut job: JobDescriptor) -> Result<(), SwarmError> {
        if !self.connected {
            return Err(SwarmError::NotConnected);
        }
        job.input_records = self.staged_input.len();
        {
            let _scope = self.statistics.scoped(StatPhase::SwarmJobOpen);
            self.channel.open_job(&job)?;
        }
        log::info!(
            "DistributedJobClient: Opened job {} with {} input records.",
            job.job_id,
            job.input_records
        );
        self.job = Some(job);

        let _scope = self.statistics.scoped(StatPhase::Export);
        for record in std::mem::take(&mut self.staged_input) {
            self.channel.send_input(&record)?;
        }
        Ok(())
    }

    /// Starts the run.
    pub fn begin_run(&mut self) -> Result<(), SwarmError> {
        if self.job.is_none() {
            return Err(SwarmError::NoOpenJob);
        }
        self.channel.begin_run()
    }

    /// Drains pool messages without blocking. Returns whether the run is over.
    ///
    /// A pending cancel request stops the remote job once and finishes the
    /// run unsuccessfully.
    pub fn update(&mut self) -> bool {
        if self.finished {
            return true;
        }
        if self.job.is_none() {
            return false;
        }
        if self.cancel.is_requested() {
            if !self.cancel_sent {
                log::info!("DistributedJobClient: Cancel requested, stopping the remote job.");
                self.channel.cancel_job();
                self.cancel_sent = true;
            }
            self.finished = true;
            self.success = false;
            return true;
        }

        for message in self.channel.poll() {
            match message {
                SwarmMessage::Progress(fraction) => {
                    self.percent_done = (fraction.clamp(0.0, 1.0) * 100.0).max(self.percent_done);
                }
                SwarmMessage::MappingCompleted(guid) => match self.mappings.get_mut(&guid) {
                    Some(state @ MappingState::Pending) => {
                        *state = MappingState::Completed;
                        self.newly_completed.push_back(guid);
                    }
                    Some(state) => {
                        log::debug!("DistributedJobClient: Duplicate completion for {guid} ({state:?}).")
                    }
                    None => log::warn!("DistributedJobClient: Completion for unknown mapping {guid}."),
                },
                SwarmMessage::JobFinished { success } => {
                    self.finished = true;
                    self.success = success;
                    if success {
                        self.percent_done = 100.0;
                    }
                    log::info!("DistributedJobClient: Job finished (success: {success}).");
                }
                SwarmMessage::Log(text) => log::debug!("Swarm: {text}"),
            }
        }
        self.finished
    }

    /// Progress of the run, `0..=100`.
    pub fn async_percent_done(&self) -> f32 {
        self.percent_done
    }

    /// Whether the run finished and every mapping was processed.
    pub fn is_processing_completed_successfully(&self) -> bool {
        self.finished && self.success
    }

    /// Mappings reported complete since the last call, in report order.
    pub fn take_completed(&mut self) -> Vec<LightingGuid> {
        self.newly_completed.drain(..).collect()
    }

    /// State of a registered mapping.
    pub fn mapping_state(&self, guid: LightingGuid) -> Option<MappingState> {
        self.mappings.get(&guid).copied()
    }

    /// Registered mappings in a given state, in guid order.
    pub fn mappings_in_state(&self, state: MappingState) -> Vec<LightingGuid> {
        self.mappings
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(g, _)| *g)
            .collect()
    }

    /// Confirms the run is over and successful. Blocks briefly.
    pub fn complete_run(&mut self) -> Result<(), SwarmError> {
        if !self.finished {
            return Err(SwarmError::Remote("run still in progress".into()));
        }
        if !self.success {
            return Err(SwarmError::Remote(
                "processing did not complete successfully".into(),
            ));
        }
        Ok(())
    }

    /// Fetches a completed mapping's results for a later bulk apply.
    ///
    /// `deferred` is true when called from the bulk pass after the run, false
    /// when the run is still going; it only selects which statistic is charged.
    pub fn import_mapping(
        &mut self,
        guid: LightingGuid,
        deferred: bool,
    ) -> Result<MappingResult, ClientError> {
        let phase = if deferred {
            StatPhase::Import
        } else {
            StatPhase::ImportInProcessing
        };
        let _scope = self.statistics.scoped(phase);
        self.fetch(guid, MappingState::Imported)
    }

    /// Fetches a completed mapping's results to apply them right away.
    pub fn process_mapping(&mut self, guid: LightingGuid) -> Result<MappingResult, ClientError> {
        let _scope = self.statistics.scoped(StatPhase::ImportInProcessing);
        self.fetch(guid, MappingState::Processed)
    }

    /// Closes the job. Blocks briefly.
    pub fn close_job(&mut self) -> Result<(), SwarmError> {
        let Some(job) = self.job.take() else {
            return Err(SwarmError::NoOpenJob);
        };
        let _scope = self.statistics.scoped(StatPhase::SwarmJobClose);
        self.channel.close_job()?;
        log::info!("DistributedJobClient: Closed job {}.", job.job_id);
        Ok(())
    }

    fn fetch(
        &mut self,
        guid: LightingGuid,
        next: MappingState,
    ) -> Result<MappingResult, ClientError> {
        let state = self.mapping_state(guid);
        if state != Some(MappingState::Completed) {
            return Err(ClientError::UnexpectedState { guid, state });
        }
        let bytes = self.channel.fetch_mapping(guid)?;
        let result = wire::decode_result(&bytes)?;
        if result.guid != guid {
            return Err(ClientError::GuidMismatch {
                requested: guid,
                received: result.guid,
            });
        }
        if let Some(dump) = &self.dump {
            if let Err(e) = dump.write(&format!("{guid}.bin"), &bytes) {
                log::warn!("DistributedJobClient: {e}");
            }
        }
        self.mappings.insert(guid, next);
        Ok(result)
    }
}

impl Drop for DistributedJobClient {
    fn drop(&mut self) {
        if self.job.is_some() {
            if self.finished {
                log::info!("DistributedJobClient: Dropped with a finished job, closing it.");
                if let Err(e) = self.channel.close_job() {
                    log::error!("DistributedJobClient: Failed to close the job: {e}");
                }
            } else {
                log::info!("DistributedJobClient: Dropped with a running job, canceling it.");
                self.channel.cancel_job();
            }
        }
        if !self.staged_input.is_empty() {
            log::debug!(
                "DistributedJobClient: Discarding {} staged input records.",
                self.staged_input.len()
            );
        }
    }
}

impl std::fmt::Debug for DistributedJobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedJobClient")
            .field("connected", &self.connected)
            .field("job", &self.job)
            .field("staged_input", &self.staged_input.len())
            .field("mappings", &self.mappings.len())
            .field("finished", &self.finished)
            .field("success", &self.success)
            .finish()
    }
}
