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

//! The meshes, mappings and lights of one build.

use crate::mapping::StaticLightingMapping;
use crate::mesh::{MeshIndex, MeshSource, StaticLightingMesh};
use crate::node_group::NodeGroup;
use lumen_core::lighting::LightingGuid;
use lumen_core::math::Aabb;
use lumen_core::scene::{ComponentId, LightId, LightInfo, PrimitiveLightingInfo, VisibilityId};
use std::fmt;
use uuid::Uuid;

/// A primitive's contribution was rejected and nothing of it was merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// The primitive returned a different number of meshes and mappings.
    CountMismatch {
        /// Offending component.
        component: ComponentId,
        /// Meshes returned.
        meshes: usize,
        /// Mappings returned.
        mappings: usize,
    },
    /// A mapping refers to a mesh the primitive did not return, or two mappings share one.
    BadMeshReference {
        /// Offending component.
        component: ComponentId,
        /// Local mesh index of the mapping.
        mesh: usize,
    },
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeError::CountMismatch {
                component,
                meshes,
                mappings,
            } => write!(
                f,
                "{component} returned {meshes} meshes but {mappings} mappings"
            ),
            MergeError::BadMeshReference { component, mesh } => {
                write!(f, "{component} has a mapping with invalid mesh index {mesh}")
            }
        }
    }
}

impl std::error::Error for MergeError {}

/// Everything a build gathered. Owned by the build for its whole lifetime.
///
/// `meshes().len() == mappings().len()` holds after every merge.
#[derive(Debug, Clone)]
pub struct StaticLightingSet {
    /// Lights taking part in the build, sky lights included.
    pub lights: Vec<LightInfo>,
    meshes: Vec<StaticLightingMesh>,
    mappings: Vec<StaticLightingMapping>,
    /// Bounds of every mesh.
    pub lighting_mesh_bounds: Aabb,
    /// Bounds of every shadow-casting mesh.
    pub automatic_importance_volume_bounds: Aabb,
}

impl StaticLightingSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            lights: Vec::new(),
            meshes: Vec::new(),
            mappings: Vec::new(),
            lighting_mesh_bounds: Aabb::INVALID,
            automatic_importance_volume_bounds: Aabb::INVALID,
        }
    }

    /// Meshes, in merge order.
    pub fn meshes(&self) -> &[StaticLightingMesh] {
        &self.meshes
    }

    /// Mappings, in merge order or sorted order once sorted.
    pub fn mappings(&self) -> &[StaticLightingMapping] {
        &self.mappings
    }

    /// The mesh at `index`.
    pub fn mesh(&self, index: MeshIndex) -> Option<&StaticLightingMesh> {
        self.meshes.get(index.0)
    }

    /// The mesh a mapping is for.
    pub fn mesh_of(&self, mapping: &StaticLightingMapping) -> Option<&StaticLightingMesh> {
        self.mesh(mapping.mesh)
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether nothing was gathered.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Mappings whose results are written back, with their index.
    pub fn processed_mappings(&self) -> impl Iterator<Item = (usize, &StaticLightingMapping)> {
        self.mappings
            .iter()
            .enumerate()
            .filter(|(_, m)| m.process_mapping)
    }

    /// Merges one primitive's meshes and mappings.
    ///
    /// The contribution is validated first; on error nothing is merged.
    pub fn add_primitive(
        &mut self,
        component: ComponentId,
        info: PrimitiveLightingInfo,
        relevant_lights: &[LightId],
        visibility_id: Option<VisibilityId>,
        process_mapping: bool,
    ) -> Result<usize, MergeError> {
        if info.meshes.len() != info.mappings.len() {
            return Err(MergeError::CountMismatch {
                component,
                meshes: info.meshes.len(),
                mappings: info.mappings.len(),
            });
        }
        let mut referenced = vec![false; info.meshes.len()];
        for mapping in &info.mappings {
            match referenced.get_mut(mapping.mesh) {
                Some(seen) if !*seen => *seen = true,
                _ => {
                    return Err(MergeError::BadMeshReference {
                        component,
                        mesh: mapping.mesh,
                    })
                }
            }
        }

        let base = self.meshes.len();
        for desc in info.meshes {
            let mesh = StaticLightingMesh {
                guid: LightingGuid::from_uuid(desc.guid),
                source: MeshSource::Primitive {
                    component,
                    element: desc.element,
                },
                bounds: desc.bounds,
                cast_shadow: desc.cast_shadow,
                num_triangles: desc.num_triangles,
                num_vertices: desc.num_vertices,
                visibility_ids: visibility_id.into_iter().collect(),
                relevant_lights: relevant_lights.to_vec(),
            };
            self.accumulate_bounds(&mesh);
            self.meshes.push(mesh);
        }
        let added = info.mappings.len();
        self.mappings
            .extend(info.mappings.into_iter().map(|m| StaticLightingMapping {
                mesh: MeshIndex(base + m.mesh),
                size_x: m.size_x,
                size_y: m.size_y,
                process_mapping,
                description: m.description,
            }));

        debug_assert_eq!(self.meshes.len(), self.mappings.len());
        log::trace!("StaticLightingSet: Merged {added} mappings from {component}");
        Ok(added)
    }

    /// Merges a BSP node group as one mesh and one mapping.
    pub fn add_node_group(&mut self, group: NodeGroup, process_mapping: bool) {
        let seed = format!(
            "{}:{}",
            group.level.0,
            group.nodes.first().copied().unwrap_or_default()
        );
        let mesh = StaticLightingMesh {
            guid: LightingGuid::from_uuid(Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())),
            bounds: group.bounds,
            cast_shadow: group.cast_shadow,
            num_triangles: group.num_triangles,
            num_vertices: group.num_vertices,
            visibility_ids: group.visibility_ids.clone(),
            relevant_lights: group.relevant_lights.clone(),
            source: MeshSource::NodeGroup(group),
        };
        let (size_x, size_y) = match &mesh.source {
            MeshSource::NodeGroup(g) => (g.size_x, g.size_y),
            MeshSource::Primitive { .. } => (0, 0),
        };
        let description = format!("BSP {}", mesh.source.label());
        self.accumulate_bounds(&mesh);
        self.meshes.push(mesh);
        self.mappings.push(StaticLightingMapping {
            mesh: MeshIndex(self.meshes.len() - 1),
            size_x,
            size_y,
            process_mapping,
            description,
        });
    }

    /// Stable sort of the mappings by descending texel count.
    ///
    /// Mappings with the same texel count keep their relative order. Meshes
    /// are not moved, so mesh indices stay valid.
    pub fn sort_mappings_by_texel_count(&mut self) {
        self.mappings
            .sort_by(|a, b| b.texel_count().cmp(&a.texel_count()));
    }

    /// Overwrites the guid of the mesh of the mapping at `mapping_index`.
    pub fn set_mapping_guid(&mut self, mapping_index: usize, guid: LightingGuid) -> bool {
        let Some(mesh) = self.mappings.get(mapping_index).map(|m| m.mesh) else {
            return false;
        };
        match self.meshes.get_mut(mesh.0) {
            Some(mesh) => {
                mesh.guid = guid;
                true
            }
            None => false,
        }
    }

    /// Guid of the mesh of the mapping at `mapping_index`.
    pub fn mapping_guid(&self, mapping_index: usize) -> Option<LightingGuid> {
        let mapping = self.mappings.get(mapping_index)?;
        self.mesh_of(mapping).map(|m| m.guid)
    }

    /// Finds a processed mapping by the guid of its mesh.
    pub fn find_processed_mapping(&self, guid: LightingGuid) -> Option<usize> {
        if let Some(index) = guid.deterministic_index(self.mappings.len()) {
            if self.mapping_guid(index) == Some(guid) && self.mappings[index].process_mapping {
                return Some(index);
            }
        }
        self.processed_mappings()
            .find(|(i, _)| self.mapping_guid(*i) == Some(guid))
            .map(|(i, _)| i)
    }

    /// Sum of the texel counts of every processed mapping.
    pub fn processed_texel_count(&self) -> u64 {
        self.processed_mappings().map(|(_, m)| m.texel_count()).sum()
    }

    fn accumulate_bounds(&mut self, mesh: &StaticLightingMesh) {
        self.lighting_mesh_bounds.merge_in_place(&mesh.bounds);
        if mesh.cast_shadow {
            self.automatic_importance_volume_bounds
                .merge_in_place(&mesh.bounds);
        }
    }
}

impl Default for StaticLightingSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::math::Vec3;
    use lumen_core::scene::{LevelId, MappingDesc, MeshDesc};

    fn mesh_desc(element: u32, cast_shadow: bool, offset: f32) -> MeshDesc {
        MeshDesc {
            guid: Uuid::new_v4(),
            element,
            bounds: Aabb::from_min_max(Vec3::splat(offset), Vec3::splat(offset + 1.0)),
            cast_shadow,
            num_triangles: 12,
            num_vertices: 8,
        }
    }

    fn mapping_desc(mesh: usize, size: u32) -> MappingDesc {
        MappingDesc {
            mesh,
            size_x: size,
            size_y: size,
            description: format!("mapping {mesh}"),
        }
    }

    #[test]
    fn test_add_primitive_keeps_counts_equal() {
        let mut set = StaticLightingSet::new();
        let info = PrimitiveLightingInfo {
            meshes: vec![mesh_desc(0, true, 0.0), mesh_desc(1, false, 10.0)],
            mappings: vec![mapping_desc(1, 16), mapping_desc(0, 32)],
        };

        let added = set
            .add_primitive(ComponentId(4), info, &[LightId(1)], Some(VisibilityId(3)), true)
            .expect("valid contribution");

        assert_eq!(added, 2);
        assert_eq!(set.meshes().len(), set.mappings().len());
        assert_eq!(set.mappings()[0].mesh, MeshIndex(1));
        assert_eq!(set.meshes()[0].visibility_ids, vec![VisibilityId(3)]);
        assert_eq!(set.meshes()[1].relevant_lights, vec![LightId(1)]);
    }

    #[test]
    fn test_mismatched_contribution_is_rejected_whole() {
        let mut set = StaticLightingSet::new();
        let info = PrimitiveLightingInfo {
            meshes: vec![mesh_desc(0, true, 0.0), mesh_desc(1, true, 0.0)],
            mappings: vec![mapping_desc(0, 16)],
        };

        let err = set
            .add_primitive(ComponentId(9), info, &[], None, true)
            .unwrap_err();

        assert_eq!(
            err,
            MergeError::CountMismatch {
                component: ComponentId(9),
                meshes: 2,
                mappings: 1
            }
        );
        assert!(set.meshes().is_empty());
        assert!(set.mappings().is_empty());
    }

    #[test]
    fn test_shared_mesh_reference_is_rejected() {
        let mut set = StaticLightingSet::new();
        let info = PrimitiveLightingInfo {
            meshes: vec![mesh_desc(0, true, 0.0), mesh_desc(1, true, 0.0)],
            mappings: vec![mapping_desc(0, 16), mapping_desc(0, 8)],
        };

        assert!(matches!(
            set.add_primitive(ComponentId(1), info, &[], None, true),
            Err(MergeError::BadMeshReference { mesh: 0, .. })
        ));
        assert!(set.is_empty());
    }

    #[test]
    fn test_only_shadow_casters_grow_importance_bounds() {
        let mut set = StaticLightingSet::new();
        let info = PrimitiveLightingInfo {
            meshes: vec![mesh_desc(0, true, 0.0), mesh_desc(1, false, 100.0)],
            mappings: vec![mapping_desc(0, 4), mapping_desc(1, 4)],
        };
        set.add_primitive(ComponentId(1), info, &[], None, true)
            .expect("valid contribution");

        assert_eq!(set.automatic_importance_volume_bounds.max, Vec3::splat(1.0));
        assert_eq!(set.lighting_mesh_bounds.max, Vec3::splat(101.0));
    }

    #[test]
    fn test_sort_is_stable_and_descending() {
        let mut set = StaticLightingSet::new();
        let info = PrimitiveLightingInfo {
            meshes: (0..4).map(|i| mesh_desc(i, true, 0.0)).collect(),
            mappings: vec![
                mapping_desc(0, 8),
                mapping_desc(1, 32),
                mapping_desc(2, 8),
                mapping_desc(3, 16),
            ],
        };
        set.add_primitive(ComponentId(1), info, &[], None, true)
            .expect("valid contribution");

        set.sort_mappings_by_texel_count();

        let order: Vec<usize> = set.mappings().iter().map(|m| m.mesh.0).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_node_group_becomes_one_pair() {
        let mut set = StaticLightingSet::new();
        let group = NodeGroup {
            level: LevelId(0),
            nodes: vec![2, 5],
            components: vec![ComponentId(7)],
            size_x: 64,
            size_y: 32,
            bounds: Aabb::from_min_max(Vec3::ZERO, Vec3::ONE),
            cast_shadow: true,
            relevant_lights: vec![],
            visibility_ids: vec![VisibilityId(0)],
            num_triangles: 4,
            num_vertices: 8,
        };

        set.add_node_group(group.clone(), true);
        set.add_node_group(group, true);

        assert_eq!(set.len(), 2);
        assert_eq!(set.mappings()[1].texel_count(), 64 * 32);
        // Same level and first node give the same persistent guid.
        assert_eq!(set.meshes()[0].guid, set.meshes()[1].guid);
    }

    #[test]
    fn test_find_processed_mapping_by_guid() {
        let mut set = StaticLightingSet::new();
        let info = PrimitiveLightingInfo {
            meshes: vec![mesh_desc(0, true, 0.0), mesh_desc(1, true, 0.0)],
            mappings: vec![mapping_desc(0, 4), mapping_desc(1, 4)],
        };
        set.add_primitive(ComponentId(1), info, &[], None, true)
            .expect("valid contribution");
        set.set_mapping_guid(0, LightingGuid::deterministic(0));
        set.set_mapping_guid(1, LightingGuid::deterministic(1));

        assert_eq!(set.find_processed_mapping(LightingGuid::deterministic(1)), Some(1));
        assert_eq!(set.find_processed_mapping(LightingGuid::deterministic(5)), None);
    }
}
