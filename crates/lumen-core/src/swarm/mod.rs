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

//! Contract for the channel to the remote lighting worker pool.
//!
//! A channel carries one job at a time. Every call except the ones listed as
//! blocking in [`SwarmChannel`] must return immediately.

use crate::lighting::{LightingGuid, LightingQuality};
use std::fmt;
use uuid::Uuid;

/// Description of the job opened on the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Unique id of this job.
    pub job_id: Uuid,
    /// Requested quality.
    pub quality: LightingQuality,
    /// Only precomputed visibility is requested.
    pub only_build_visibility: bool,
    /// Local cores the pool should leave idle.
    pub num_unused_local_cores: u32,
    /// Number of input records that will follow.
    pub input_records: usize,
}

/// A message from the pool, drained by polling.
#[derive(Debug, Clone, PartialEq)]
pub enum SwarmMessage {
    /// Overall progress in `[0, 1]`.
    Progress(f32),
    /// A mapping's results are ready to be fetched.
    MappingCompleted(LightingGuid),
    /// The run is over.
    JobFinished {
        /// Whether every mapping was processed.
        success: bool,
    },
    /// Diagnostic text from a worker.
    Log(String),
}

/// Errors raised by a swarm channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SwarmError {
    /// A call needed a connection that does not exist.
    NotConnected,
    /// The pool could not be reached.
    ConnectionFailed(String),
    /// A call needed an open job.
    NoOpenJob,
    /// The pool refused the job.
    JobOpenFailed(String),
    /// The pool side of the channel is gone.
    ChannelClosed,
    /// No results exist for this guid.
    UnknownMapping(LightingGuid),
    /// A failure reported by the pool.
    Remote(String),
}

impl fmt::Display for SwarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwarmError::NotConnected => write!(f, "Not connected to the worker pool"),
            SwarmError::ConnectionFailed(reason) => write!(f, "Connection failed: {reason}"),
            SwarmError::NoOpenJob => write!(f, "No job is open"),
            SwarmError::JobOpenFailed(reason) => write!(f, "Job could not be opened: {reason}"),
            SwarmError::ChannelClosed => write!(f, "Worker pool channel closed"),
            SwarmError::UnknownMapping(guid) => write!(f, "No results for mapping {guid}"),
            SwarmError::Remote(reason) => write!(f, "Worker pool error: {reason}"),
        }
    }
}

impl std::error::Error for SwarmError {}

/// A transport to the remote worker pool.
///
/// `connect`, `open_job`, `close_job` and `fetch_mapping` may block briefly.
/// `poll` never blocks.
pub trait SwarmChannel: Send {
    /// Connects to the pool.
    fn connect(&mut self) -> Result<(), SwarmError>;

    /// Opens a job.
    fn open_job(&mut self, job: &JobDescriptor) -> Result<(), SwarmError>;

    /// Sends one encoded input record to the open job.
    fn send_input(&mut self, record: &[u8]) -> Result<(), SwarmError>;

    /// Starts processing the job's input.
    fn begin_run(&mut self) -> Result<(), SwarmError>;

    /// Drains every message received since the last call.
    fn poll(&mut self) -> Vec<SwarmMessage>;

    /// Fetches the encoded result of a completed mapping.
    fn fetch_mapping(&mut self, guid: LightingGuid) -> Result<Vec<u8>, SwarmError>;

    /// Asks the pool to stop the job.
    fn cancel_job(&mut self);

    /// Closes the job.
    fn close_job(&mut self) -> Result<(), SwarmError>;
}
