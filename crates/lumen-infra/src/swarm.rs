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

//! An in-process worker pool speaking the remote job protocol.
//!
//! [`LocalSwarm`] spawns a coordinator thread on `connect`. Input records are
//! decoded as they arrive; `begin_run` computes a flat result for every
//! processed mapping and reports completion, progress and the end of the run
//! back over a channel. It does not trace any light: each mapping gets an
//! ambient term scaled by the number of lights relevant to its mesh.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use lumen_core::lighting::{LightingGuid, MappingResult, QuantizedLightmapData, ShadowMapData};
use lumen_core::swarm::{JobDescriptor, SwarmChannel, SwarmError, SwarmMessage};
use lumen_io::wire::{self, JobRecord, MappingRecord, MeshRecord};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Behaviour of a [`LocalSwarm`].
#[derive(Debug, Clone, Default)]
pub struct LocalSwarmConfig {
    /// Wall time spent on each mapping.
    pub mapping_delay: Duration,
    /// Refuse every connection attempt.
    pub refuse_connection: bool,
    /// Refuse to open jobs.
    pub refuse_job: bool,
    /// End every run unsuccessfully without computing anything.
    pub fail_run: bool,
}

enum Command {
    OpenJob(JobDescriptor),
    Input(Vec<u8>),
    BeginRun,
    Cancel,
    Close,
}

type ResultStore = Arc<Mutex<BTreeMap<LightingGuid, Vec<u8>>>>;

#[derive(Default)]
struct JobInput {
    meshes: BTreeMap<LightingGuid, MeshRecord>,
    mappings: Vec<MappingRecord>,
    records: usize,
}

impl JobInput {
    fn accept(&mut self, record: JobRecord) {
        self.records += 1;
        match record {
            JobRecord::Mesh(mesh) => {
                self.meshes.insert(mesh.guid, mesh);
            }
            JobRecord::Mapping(mapping) => self.mappings.push(mapping),
            _ => {}
        }
    }
}

/// A [`SwarmChannel`] backed by a coordinator thread in this process.
pub struct LocalSwarm {
    config: LocalSwarmConfig,
    commands: Option<Sender<Command>>,
    replies: Option<Receiver<SwarmMessage>>,
    results: ResultStore,
    handle: Option<JoinHandle<()>>,
    job_open: bool,
}

impl LocalSwarm {
    /// Creates an unconnected pool.
    pub fn new(config: LocalSwarmConfig) -> Self {
        Self {
            config,
            commands: None,
            replies: None,
            results: Arc::new(Mutex::new(BTreeMap::new())),
            handle: None,
            job_open: false,
        }
    }

    fn send(&self, command: Command) -> Result<(), SwarmError> {
        self.commands
            .as_ref()
            .ok_or(SwarmError::NotConnected)?
            .send(command)
            .map_err(|_| SwarmError::ChannelClosed)
    }
}

impl Default for LocalSwarm {
    fn default() -> Self {
        Self::new(LocalSwarmConfig::default())
    }
}

impl SwarmChannel for LocalSwarm {
    fn connect(&mut self) -> Result<(), SwarmError> {
        if self.config.refuse_connection {
            return Err(SwarmError::ConnectionFailed(
                "the local pool refuses connections".into(),
            ));
        }
        if self.handle.is_some() {
            return Ok(());
        }

        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (reply_tx, reply_rx) = crossbeam_channel::unbounded();
        let results = Arc::clone(&self.results);
        let config = self.config.clone();
        let handle = thread::Builder::new()
            .name("lumen-local-swarm".into())
            .spawn(move || coordinate(command_rx, reply_tx, results, config))
            .map_err(|e| SwarmError::ConnectionFailed(e.to_string()))?;

        self.commands = Some(command_tx);
        self.replies = Some(reply_rx);
        self.handle = Some(handle);
        log::info!("LocalSwarm: Coordinator started.");
        Ok(())
    }

    fn open_job(&mut self, job: &JobDescriptor) -> Result<(), SwarmError> {
        if self.config.refuse_job {
            return Err(SwarmError::JobOpenFailed("the local pool refuses jobs".into()));
        }
        self.send(Command::OpenJob(job.clone()))?;
        self.job_open = true;
        Ok(())
    }

    fn send_input(&mut self, record: &[u8]) -> Result<(), SwarmError> {
        if !self.job_open {
            return Err(SwarmError::NoOpenJob);
        }
        self.send(Command::Input(record.to_vec()))
    }

    fn begin_run(&mut self) -> Result<(), SwarmError> {
        if !self.job_open {
            return Err(SwarmError::NoOpenJob);
        }
        self.send(Command::BeginRun)
    }

    fn poll(&mut self) -> Vec<SwarmMessage> {
        self.replies
            .as_ref()
            .map(|replies| replies.try_iter().collect())
            .unwrap_or_default()
    }

    fn fetch_mapping(&mut self, guid: LightingGuid) -> Result<Vec<u8>, SwarmError> {
        let results = self
            .results
            .lock()
            .map_err(|_| SwarmError::Remote("result store poisoned".into()))?;
        results
            .get(&guid)
            .cloned()
            .ok_or(SwarmError::UnknownMapping(guid))
    }

    fn cancel_job(&mut self) {
        if self.send(Command::Cancel).is_err() {
            log::debug!("LocalSwarm: Cancel sent to a stopped coordinator.");
        }
        self.job_open = false;
    }

    fn close_job(&mut self) -> Result<(), SwarmError> {
        self.send(Command::Close)?;
        self.job_open = false;
        if let Ok(mut results) = self.results.lock() {
            results.clear();
        }
        Ok(())
    }
}

impl Drop for LocalSwarm {
    fn drop(&mut self) {
        // Closing the command channel ends the coordinator loop.
        self.commands.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("LocalSwarm: Coordinator thread panicked.");
            }
        }
    }
}

fn coordinate(
    commands: Receiver<Command>,
    replies: Sender<SwarmMessage>,
    results: ResultStore,
    config: LocalSwarmConfig,
) {
    let mut job: Option<(JobDescriptor, JobInput)> = None;
    while let Ok(command) = commands.recv() {
        match command {
            Command::OpenJob(descriptor) => {
                log::debug!("LocalSwarm: Job {} opened.", descriptor.job_id);
                job = Some((descriptor, JobInput::default()));
            }
            Command::Input(bytes) => match (&mut job, wire::decode_record(&bytes)) {
                (Some((_, input)), Ok(record)) => input.accept(record),
                (None, _) => log::warn!("LocalSwarm: Input received without an open job."),
                (_, Err(e)) => {
                    let _ = replies.send(SwarmMessage::Log(format!("Rejected input record: {e}")));
                }
            },
            Command::BeginRun => {
                let Some((descriptor, input)) = &job else {
                    continue;
                };
                if descriptor.input_records != input.records {
                    log::warn!(
                        "LocalSwarm: Job announced {} records, received {}.",
                        descriptor.input_records,
                        input.records
                    );
                }
                if !run(input, &commands, &replies, &results, &config) {
                    job = None;
                }
            }
            Command::Cancel | Command::Close => job = None,
        }
    }
    log::debug!("LocalSwarm: Coordinator stopped.");
}

/// Returns false if the run was interrupted by a cancel or close.
fn run(
    input: &JobInput,
    commands: &Receiver<Command>,
    replies: &Sender<SwarmMessage>,
    results: &ResultStore,
    config: &LocalSwarmConfig,
) -> bool {
    if config.fail_run {
        let _ = replies.send(SwarmMessage::Log("A worker failed.".into()));
        let _ = replies.send(SwarmMessage::JobFinished { success: false });
        return true;
    }

    let processed: Vec<&MappingRecord> = input
        .mappings
        .iter()
        .filter(|m| m.process_mapping)
        .collect();
    let total = processed.len();
    for (done, mapping) in processed.into_iter().enumerate() {
        match commands.try_recv() {
            Ok(Command::Cancel) | Ok(Command::Close) | Err(TryRecvError::Disconnected) => {
                log::info!("LocalSwarm: Run interrupted after {done} of {total} mappings.");
                return false;
            }
            Ok(_) | Err(TryRecvError::Empty) => {}
        }
        if !config.mapping_delay.is_zero() {
            thread::sleep(config.mapping_delay);
        }

        let started = Instant::now();
        let mut result = flat_result(mapping, input.meshes.get(&mapping.guid));
        result.execution_time_secs = started.elapsed().as_secs_f32();
        match wire::encode_result(&result) {
            Ok(bytes) => {
                if let Ok(mut store) = results.lock() {
                    store.insert(mapping.guid, bytes);
                }
            }
            Err(e) => {
                let text = format!("Failed to encode {}: {e}", mapping.guid);
                let _ = replies.send(SwarmMessage::Log(text));
                continue;
            }
        }
        if replies.send(SwarmMessage::MappingCompleted(mapping.guid)).is_err() {
            return false;
        }
        let _ = replies.send(SwarmMessage::Progress((done + 1) as f32 / total as f32));
    }

    if total == 0 {
        let _ = replies.send(SwarmMessage::Progress(1.0));
    }
    let _ = replies.send(SwarmMessage::JobFinished { success: true });
    true
}

/// Ambient texel level for a mesh lit by `lights` relevant lights.
pub fn ambient_level(lights: usize) -> u8 {
    (64 + 32 * lights).min(255) as u8
}

fn flat_result(mapping: &MappingRecord, mesh: Option<&MeshRecord>) -> MappingResult {
    let lights = mesh.map_or(&[][..], |m| m.relevant_lights.as_slice());
    let level = ambient_level(lights.len());
    let texels = (mapping.size_x as usize) * (mapping.size_y as usize);
    MappingResult {
        guid: mapping.guid,
        lightmap: Some(QuantizedLightmapData {
            size_x: mapping.size_x,
            size_y: mapping.size_y,
            scale: [1.0; 4],
            texels: vec![[level, level, level, 255]; texels],
        }),
        shadow_maps: lights
            .iter()
            .map(|&light| ShadowMapData {
                light,
                size_x: mapping.size_x,
                size_y: mapping.size_y,
                texels: vec![255; texels],
            })
            .collect(),
        execution_time_secs: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::lighting::LightingQuality;
    use uuid::Uuid;

    fn descriptor(input_records: usize) -> JobDescriptor {
        JobDescriptor {
            job_id: Uuid::new_v4(),
            quality: LightingQuality::Preview,
            only_build_visibility: false,
            num_unused_local_cores: 0,
            input_records,
        }
    }

    fn mapping(index: u32, process_mapping: bool) -> Vec<u8> {
        wire::encode_record(&JobRecord::Mapping(MappingRecord {
            guid: LightingGuid::deterministic(index),
            size_x: 4,
            size_y: 2,
            process_mapping,
            description: format!("mapping {index}"),
        }))
        .expect("encodes")
    }

    fn drain_until_finished(swarm: &mut LocalSwarm) -> Vec<SwarmMessage> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut messages = Vec::new();
        while Instant::now() < deadline {
            messages.extend(swarm.poll());
            if messages
                .iter()
                .any(|m| matches!(m, SwarmMessage::JobFinished { .. }))
            {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        messages
    }

    #[test]
    fn test_refused_connection() {
        let mut swarm = LocalSwarm::new(LocalSwarmConfig {
            refuse_connection: true,
            ..LocalSwarmConfig::default()
        });
        assert!(matches!(swarm.connect(), Err(SwarmError::ConnectionFailed(_))));
        assert_eq!(swarm.open_job(&descriptor(0)), Err(SwarmError::NotConnected));
    }

    #[test]
    fn test_run_completes_processed_mappings_only() {
        // --- 1. ARRANGE ---
        let mut swarm = LocalSwarm::default();
        swarm.connect().expect("connects");
        swarm.open_job(&descriptor(2)).expect("opens");
        swarm.send_input(&mapping(0, true)).expect("sends");
        swarm.send_input(&mapping(1, false)).expect("sends");

        // --- 2. ACT ---
        swarm.begin_run().expect("runs");
        let messages = drain_until_finished(&mut swarm);

        // --- 3. ASSERT ---
        let completed: Vec<_> = messages
            .iter()
            .filter_map(|m| match m {
                SwarmMessage::MappingCompleted(guid) => Some(*guid),
                _ => None,
            })
            .collect();
        assert_eq!(completed, vec![LightingGuid::deterministic(0)]);
        assert!(messages.contains(&SwarmMessage::JobFinished { success: true }));

        let bytes = swarm
            .fetch_mapping(LightingGuid::deterministic(0))
            .expect("result stored");
        let result = wire::decode_result(&bytes).expect("decodes");
        let lightmap = result.lightmap.expect("lightmap");
        assert_eq!(lightmap.texels.len(), 8);
        let level = ambient_level(0);
        assert_eq!(lightmap.texels[0], [level, level, level, 255]);
        assert!(swarm.fetch_mapping(LightingGuid::deterministic(1)).is_err());
    }

    #[test]
    fn test_failing_run_reports_unsuccessful_finish() {
        let mut swarm = LocalSwarm::new(LocalSwarmConfig {
            fail_run: true,
            ..LocalSwarmConfig::default()
        });
        swarm.connect().expect("connects");
        swarm.open_job(&descriptor(0)).expect("opens");
        swarm.begin_run().expect("runs");

        let messages = drain_until_finished(&mut swarm);

        assert!(messages.contains(&SwarmMessage::JobFinished { success: false }));
    }

    #[test]
    fn test_begin_run_requires_open_job() {
        let mut swarm = LocalSwarm::default();
        swarm.connect().expect("connects");
        assert_eq!(swarm.begin_run(), Err(SwarmError::NoOpenJob));
    }
}
