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

//! Time-sliced export of a gathered build to the remote job input.
//!
//! The lane is a resumable cursor over the records still to send. Each call to
//! [`AmortizedExportLane::export_next`] emits at most `items_per_tick` meshes
//! and mappings, so a large scene is spread across many host ticks.

use crate::messages::publish_message;
use lumen_core::cancel::CancelFlag;
use lumen_core::event::{BuildEvent, EventBus, Severity};
use lumen_core::lane::{Lane, LaneKind};
use lumen_core::math::{Aabb, Vec3};
use lumen_core::scene::{LightKind, Mobility};
use lumen_data::StaticLightingSet;
use lumen_io::config::SceneConfig;
use lumen_io::wire::{self, JobRecord, LightRecord, MappingRecord, MeshRecord, SceneSettingsRecord};
use lumen_io::{DistributedJobClient, WireError};
use std::any::Any;
use thiserror::Error;

/// Receives encoded job input records.
pub trait ExportSink {
    /// Takes one encoded record.
    fn stage_record(&mut self, record: Vec<u8>);
}

impl ExportSink for DistributedJobClient {
    fn stage_record(&mut self, record: Vec<u8>) {
        self.stage_input(record);
    }
}

impl ExportSink for Vec<Vec<u8>> {
    fn stage_record(&mut self, record: Vec<u8>) {
        self.push(record);
    }
}

/// Errors that stop an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A record could not be encoded.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// A mapping points at a mesh that does not exist.
    #[error("mapping {0} has no mesh")]
    MissingMesh(usize),
}

/// Where an export stands after a call to `export_next`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportStatus {
    /// More work remains.
    InProgress {
        /// Meshes and mappings exported out of the total, `0..=100`.
        percent: f32,
    },
    /// Everything was exported.
    Complete,
    /// The cancel flag was seen; the export stopped early.
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Settings,
    Volumes,
    Meshes(usize),
    Mappings(usize),
    Lights,
    Done,
}

/// Streams a [`StaticLightingSet`] into an [`ExportSink`] across ticks.
#[derive(Debug)]
pub struct AmortizedExportLane {
    settings: SceneSettingsRecord,
    importance_volumes: Vec<Aabb>,
    character_volumes: Vec<Aabb>,
    scene: SceneConfig,
    items_per_tick: usize,
    cursor: Cursor,
    exported_items: usize,
}

impl AmortizedExportLane {
    /// Creates an export positioned before the scene settings record.
    pub fn new(
        settings: SceneSettingsRecord,
        importance_volumes: Vec<Aabb>,
        character_volumes: Vec<Aabb>,
        scene: SceneConfig,
        items_per_tick: usize,
    ) -> Self {
        Self {
            settings,
            importance_volumes,
            character_volumes,
            scene,
            items_per_tick: items_per_tick.max(1),
            cursor: Cursor::Settings,
            exported_items: 0,
        }
    }

    /// Whether the last record was emitted.
    pub fn is_complete(&self) -> bool {
        self.cursor == Cursor::Done
    }

    /// Meshes and mappings exported so far.
    pub fn exported_items(&self) -> usize {
        self.exported_items
    }

    /// Meshes plus mappings exported out of the total, `0..=100`.
    pub fn percent_done(&self, set: &StaticLightingSet) -> f32 {
        let total = set.meshes().len() + set.mappings().len();
        if total == 0 {
            return if self.is_complete() { 100.0 } else { 0.0 };
        }
        self.exported_items as f32 * 100.0 / total as f32
    }

    /// Emits the next slice of records.
    ///
    /// The cancel flag is checked before every mesh and mapping.
    pub fn export_next(
        &mut self,
        set: &StaticLightingSet,
        sink: &mut dyn ExportSink,
        cancel: &CancelFlag,
        events: &EventBus<BuildEvent>,
    ) -> Result<ExportStatus, ExportError> {
        let mut budget = self.items_per_tick;
        loop {
            match self.cursor {
                Cursor::Settings => {
                    let record = JobRecord::SceneSettings(self.settings.clone());
                    sink.stage_record(wire::encode_record(&record)?);
                    self.cursor = Cursor::Volumes;
                }
                Cursor::Volumes => {
                    self.export_volumes(set, sink, events)?;
                    self.cursor = Cursor::Meshes(0);
                }
                Cursor::Meshes(index) => {
                    let Some(mesh) = set.meshes().get(index) else {
                        self.cursor = Cursor::Mappings(0);
                        continue;
                    };
                    if budget == 0 {
                        return Ok(self.in_progress(set));
                    }
                    if cancel.is_requested() {
                        log::info!("AmortizedExportLane: Canceled at mesh {index}.");
                        return Ok(ExportStatus::Canceled);
                    }
                    let record = JobRecord::Mesh(MeshRecord::from_mesh(mesh, &set.lights));
                    sink.stage_record(wire::encode_record(&record)?);
                    self.exported_items += 1;
                    budget -= 1;
                    self.cursor = Cursor::Meshes(index + 1);
                }
                Cursor::Mappings(index) => {
                    let Some(mapping) = set.mappings().get(index) else {
                        self.cursor = Cursor::Lights;
                        continue;
                    };
                    if budget == 0 {
                        return Ok(self.in_progress(set));
                    }
                    if cancel.is_requested() {
                        log::info!("AmortizedExportLane: Canceled at mapping {index}.");
                        return Ok(ExportStatus::Canceled);
                    }
                    let guid = set
                        .mapping_guid(index)
                        .ok_or(ExportError::MissingMesh(index))?;
                    let record = JobRecord::Mapping(MappingRecord::from_mapping(mapping, guid));
                    sink.stage_record(wire::encode_record(&record)?);
                    self.exported_items += 1;
                    budget -= 1;
                    self.cursor = Cursor::Mappings(index + 1);
                }
                Cursor::Lights => {
                    self.export_lights(set, sink)?;
                    self.cursor = Cursor::Done;
                }
                Cursor::Done => return Ok(ExportStatus::Complete),
            }
        }
    }

    fn in_progress(&self, set: &StaticLightingSet) -> ExportStatus {
        ExportStatus::InProgress {
            percent: self.percent_done(set),
        }
    }

    fn export_volumes(
        &self,
        set: &StaticLightingSet,
        sink: &mut dyn ExportSink,
        events: &EventBus<BuildEvent>,
    ) -> Result<(), ExportError> {
        let volumes = if self.importance_volumes.is_empty() {
            synthesize_importance_volume(&set.automatic_importance_volume_bounds, &self.scene, events)
                .into_iter()
                .collect()
        } else {
            self.importance_volumes.clone()
        };
        for volume in volumes {
            sink.stage_record(wire::encode_record(&JobRecord::ImportanceVolume(volume))?);
        }
        for volume in &self.character_volumes {
            let record = JobRecord::CharacterIndirectDetailVolume(*volume);
            sink.stage_record(wire::encode_record(&record)?);
        }
        Ok(())
    }

    fn export_lights(
        &self,
        set: &StaticLightingSet,
        sink: &mut dyn ExportSink,
    ) -> Result<(), ExportError> {
        let (sky, others): (Vec<_>, Vec<_>) =
            set.lights.iter().partition(|l| l.kind == LightKind::Sky);
        let sky = sky
            .into_iter()
            .filter(|l| matches!(l.mobility, Mobility::Static | Mobility::Stationary));
        for light in others.into_iter().chain(sky) {
            let record = JobRecord::Light(LightRecord::from(light));
            sink.stage_record(wire::encode_record(&record)?);
        }
        Ok(())
    }
}

/// The importance volume used when the scene has none.
///
/// Built from the bounds of shadow-casting meshes. An implausibly large one is
/// clamped around its center and reported as a performance warning; otherwise
/// it is padded by the configured margin. Empty bounds give no volume.
pub fn synthesize_importance_volume(
    bounds: &Aabb,
    scene: &SceneConfig,
    events: &EventBus<BuildEvent>,
) -> Option<Aabb> {
    if !bounds.is_valid() {
        return None;
    }
    let min_extent = scene.min_importance_volume_extent_without_warning;
    let extent = bounds.half_extents();
    if extent.length_squared() > min_extent * min_extent {
        publish_message(
            events,
            Severity::PerformanceWarning,
            format!(
                "No importance volume found and the scene is so large ({:.0} units) that the \
                 automatically synthesized volume would hurt build time and quality. Place an \
                 importance volume around the playable area.",
                extent.length_squared().sqrt() * 2.0
            ),
        );
        Some(Aabb::from_center_half_extents(
            bounds.center(),
            Vec3::splat(min_extent),
        ))
    } else {
        publish_message(
            events,
            Severity::Warning,
            "No importance volume found, so the scene bounding box was used. You can optimize \
             your scene's quality and lighting build times by adding importance volumes."
                .to_string(),
        );
        Some(bounds.expand_by(scene.automatic_importance_volume_expand_by))
    }
}

impl Lane for AmortizedExportLane {
    fn strategy_name(&self) -> &'static str {
        "AmortizedExport"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Export
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::lighting::LightingQuality;
    use lumen_core::scene::LightmassWorldSettings;

    fn settings() -> SceneSettingsRecord {
        SceneSettingsRecord {
            quality: LightingQuality::Preview,
            num_unused_local_cores: 1,
            only_build_visibility: false,
            lightmass: LightmassWorldSettings::default(),
            levels: vec!["Persistent".into()],
        }
    }

    #[test]
    fn test_small_scene_volume_is_padded() {
        // --- 1. ARRANGE ---
        let events = EventBus::new();
        let bounds = Aabb::from_min_max(Vec3::ZERO, Vec3::splat(100.0));

        // --- 2. ACT ---
        let volume = synthesize_importance_volume(&bounds, &SceneConfig::default(), &events);

        // --- 3. ASSERT ---
        let volume = volume.expect("a volume");
        assert_eq!(volume.min, Vec3::splat(-500.0));
        assert_eq!(volume.max, Vec3::splat(600.0));
        assert!(matches!(
            events.drain().as_slice(),
            [BuildEvent::MessageLog { severity: Severity::Warning, .. }]
        ));
    }

    #[test]
    fn test_huge_scene_volume_is_clamped_with_performance_warning() {
        let events = EventBus::new();
        let bounds = Aabb::from_min_max(Vec3::splat(-50_000.0), Vec3::splat(50_000.0));

        let volume = synthesize_importance_volume(&bounds, &SceneConfig::default(), &events)
            .expect("a volume");

        assert_eq!(volume.min, Vec3::splat(-10_000.0));
        assert_eq!(volume.max, Vec3::splat(10_000.0));
        assert!(matches!(
            events.drain().as_slice(),
            [BuildEvent::MessageLog { severity: Severity::PerformanceWarning, .. }]
        ));
    }

    #[test]
    fn test_empty_bounds_give_no_volume() {
        let events = EventBus::new();
        assert!(synthesize_importance_volume(&Aabb::INVALID, &SceneConfig::default(), &events)
            .is_none());
        assert!(events.drain().is_empty());
    }

    #[test]
    fn test_empty_set_exports_settings_and_completes() {
        let mut lane = AmortizedExportLane::new(
            settings(),
            vec![Aabb::from_min_max(Vec3::ZERO, Vec3::ONE)],
            vec![],
            SceneConfig::default(),
            8,
        );
        let mut sink: Vec<Vec<u8>> = Vec::new();
        let set = StaticLightingSet::new();

        let status = lane
            .export_next(&set, &mut sink, &CancelFlag::new(), &EventBus::new())
            .expect("exports");

        assert_eq!(status, ExportStatus::Complete);
        assert!(lane.is_complete());
        assert_eq!(lane.percent_done(&set), 100.0);
        let kinds: Vec<_> = sink
            .iter()
            .map(|b| wire::decode_record(b).expect("decodes").kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                wire::RecordKind::SceneSettings,
                wire::RecordKind::ImportanceVolume
            ]
        );
    }
}
