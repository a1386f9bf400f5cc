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

use super::RecordKind;
use lumen_core::lighting::{LightingGuid, LightingQuality};
use lumen_core::math::Aabb;
use lumen_core::scene::{LightInfo, LightKind, LightmassWorldSettings, Mobility};
use lumen_data::{MeshSource, StaticLightingMapping, StaticLightingMesh};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scene-wide settings, always the first record of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSettingsRecord {
    /// Requested quality.
    pub quality: LightingQuality,
    /// Local cores the pool should leave idle.
    pub num_unused_local_cores: u32,
    /// Only precomputed visibility is requested.
    pub only_build_visibility: bool,
    /// Solver settings.
    pub lightmass: LightmassWorldSettings,
    /// Names of the levels being built.
    pub levels: Vec<String>,
}

/// Where an exported mesh came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshRecordSource {
    /// A primitive element.
    Primitive {
        /// Component handle.
        component: u64,
        /// Element index.
        element: u32,
    },
    /// A BSP node group.
    NodeGroup {
        /// Level handle.
        level: u32,
        /// Node indices.
        nodes: Vec<u64>,
    },
}

/// An exported mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshRecord {
    /// Mesh guid.
    pub guid: LightingGuid,
    /// Origin.
    pub source: MeshRecordSource,
    /// World-space bounds.
    pub bounds: Aabb,
    /// Casts shadows.
    pub cast_shadow: bool,
    /// Triangle count.
    pub num_triangles: u32,
    /// Vertex count.
    pub num_vertices: u32,
    /// Visibility ids.
    pub visibility_ids: Vec<u32>,
    /// Persistent guids of the relevant lights.
    pub relevant_lights: Vec<Uuid>,
}

impl MeshRecord {
    /// Builds the record of `mesh`, translating light handles through `lights`.
    ///
    /// Relevant lights missing from `lights` are dropped.
    pub fn from_mesh(mesh: &StaticLightingMesh, lights: &[LightInfo]) -> Self {
        let source = match &mesh.source {
            MeshSource::Primitive { component, element } => MeshRecordSource::Primitive {
                component: component.0,
                element: *element,
            },
            MeshSource::NodeGroup(group) => MeshRecordSource::NodeGroup {
                level: group.level.0,
                nodes: group.nodes.iter().map(|n| *n as u64).collect(),
            },
        };
        Self {
            guid: mesh.guid,
            source,
            bounds: mesh.bounds,
            cast_shadow: mesh.cast_shadow,
            num_triangles: mesh.num_triangles,
            num_vertices: mesh.num_vertices,
            visibility_ids: mesh.visibility_ids.iter().map(|v| v.0).collect(),
            relevant_lights: mesh
                .relevant_lights
                .iter()
                .filter_map(|id| lights.iter().find(|l| l.id == *id).map(|l| l.guid))
                .collect(),
        }
    }
}

/// An exported mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    /// Guid of the mapping's mesh.
    pub guid: LightingGuid,
    /// Lightmap width.
    pub size_x: u32,
    /// Lightmap height.
    pub size_y: u32,
    /// Results are expected back for this mapping.
    pub process_mapping: bool,
    /// Description.
    pub description: String,
}

impl MappingRecord {
    /// Builds the record of `mapping`, whose mesh has `guid`.
    pub fn from_mapping(mapping: &StaticLightingMapping, guid: LightingGuid) -> Self {
        Self {
            guid,
            size_x: mapping.size_x,
            size_y: mapping.size_y,
            process_mapping: mapping.process_mapping,
            description: mapping.description.clone(),
        }
    }
}

/// An exported light.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightRecord {
    /// Persistent guid.
    pub guid: Uuid,
    /// Kind.
    pub kind: LightKind,
    /// Mobility.
    pub mobility: Mobility,
    /// Shadowing is baked.
    pub has_static_shadowing: bool,
    /// Direct lighting is baked.
    pub has_static_lighting: bool,
}

impl From<&LightInfo> for LightRecord {
    fn from(light: &LightInfo) -> Self {
        Self {
            guid: light.guid,
            kind: light.kind,
            mobility: light.mobility,
            has_static_shadowing: light.has_static_shadowing,
            has_static_lighting: light.has_static_lighting,
        }
    }
}

/// One record of a job's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobRecord {
    /// Scene settings.
    SceneSettings(SceneSettingsRecord),
    /// Importance volume.
    ImportanceVolume(Aabb),
    /// Character indirect detail volume.
    CharacterIndirectDetailVolume(Aabb),
    /// Mesh.
    Mesh(MeshRecord),
    /// Mapping.
    Mapping(MappingRecord),
    /// Light.
    Light(LightRecord),
}

impl JobRecord {
    /// Header kind of this record.
    pub fn kind(&self) -> RecordKind {
        match self {
            JobRecord::SceneSettings(_) => RecordKind::SceneSettings,
            JobRecord::ImportanceVolume(_) => RecordKind::ImportanceVolume,
            JobRecord::CharacterIndirectDetailVolume(_) => RecordKind::CharacterIndirectDetailVolume,
            JobRecord::Mesh(_) => RecordKind::Mesh,
            JobRecord::Mapping(_) => RecordKind::Mapping,
            JobRecord::Light(_) => RecordKind::Light,
        }
    }
}
