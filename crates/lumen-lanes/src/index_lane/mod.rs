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

//! Deterministic guid assignment for processed mappings.

use lumen_core::lane::{Lane, LaneKind};
use lumen_core::lighting::LightingGuid;
use lumen_data::StaticLightingSet;
use std::any::Any;

/// Outcome of an indexing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Number of guids assigned, which is also the next counter value.
    pub assigned: u32,
    /// Processed mappings whose guid failed verification.
    pub mismatches: Vec<usize>,
}

/// Gives every processed mapping the guid `(0, 0, 0, n)`, `n` counting up from 0.
///
/// With sorting enabled, mappings are first stable-sorted by descending texel
/// count so the order does not depend on gather order.
#[derive(Debug, Clone, Copy)]
pub struct DeterministicIndexLane {
    sort_mappings: bool,
}

impl DeterministicIndexLane {
    /// Creates the lane.
    pub fn new(sort_mappings: bool) -> Self {
        Self { sort_mappings }
    }

    /// Sorts if enabled, assigns the guids, then verifies them.
    pub fn run(&self, set: &mut StaticLightingSet) -> IndexReport {
        if self.sort_mappings {
            set.sort_mappings_by_texel_count();
        }

        let processed: Vec<usize> = set.processed_mappings().map(|(i, _)| i).collect();
        let mut counter = 0u32;
        for index in processed {
            if set.set_mapping_guid(index, LightingGuid::deterministic(counter)) {
                counter += 1;
            }
        }

        let mismatches = Self::verify(set);
        for &index in &mismatches {
            log::warn!(
                "DeterministicIndexLane: Mapping {} has guid {:?}, which is not a deterministic index.",
                index,
                set.mapping_guid(index)
            );
        }
        log::debug!("DeterministicIndexLane: Assigned {counter} deterministic guids.");
        IndexReport {
            assigned: counter,
            mismatches,
        }
    }

    /// Indices of processed mappings whose guid is not `(0, 0, 0, d)` with
    /// `d` below the mapping count. Reported only, never corrected.
    pub fn verify(set: &StaticLightingSet) -> Vec<usize> {
        let total = set.len();
        set.processed_mappings()
            .filter(|(i, _)| {
                set.mapping_guid(*i)
                    .and_then(|guid| guid.deterministic_index(total))
                    .is_none()
            })
            .map(|(i, _)| i)
            .collect()
    }
}

impl Lane for DeterministicIndexLane {
    fn strategy_name(&self) -> &'static str {
        if self.sort_mappings {
            "SortedDeterministicIndex"
        } else {
            "GatherOrderDeterministicIndex"
        }
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Index
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
    use lumen_core::math::{Aabb, Vec3};
    use lumen_core::scene::{ComponentId, MappingDesc, MeshDesc, PrimitiveLightingInfo};
    use uuid::Uuid;

    fn primitive(sizes: &[(u32, u32)]) -> PrimitiveLightingInfo {
        PrimitiveLightingInfo {
            meshes: sizes
                .iter()
                .enumerate()
                .map(|(i, _)| MeshDesc {
                    guid: Uuid::new_v4(),
                    element: i as u32,
                    bounds: Aabb::from_min_max(Vec3::ZERO, Vec3::ONE),
                    cast_shadow: true,
                    num_triangles: 2,
                    num_vertices: 4,
                })
                .collect(),
            mappings: sizes
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| MappingDesc {
                    mesh: i,
                    size_x: x,
                    size_y: y,
                    description: format!("element {i}"),
                })
                .collect(),
        }
    }

    fn set_with(sizes: &[(u32, u32)], processed: bool) -> StaticLightingSet {
        let mut set = StaticLightingSet::new();
        set.add_primitive(ComponentId(1), primitive(sizes), &[], None, processed)
            .expect("valid primitive");
        set
    }

    fn guids(set: &StaticLightingSet) -> Vec<(String, LightingGuid)> {
        (0..set.len())
            .map(|i| {
                (
                    set.mappings()[i].description.clone(),
                    set.mapping_guid(i).expect("guid"),
                )
            })
            .collect()
    }

    #[test]
    fn test_gather_order_without_sorting() {
        // --- 1. ARRANGE ---
        let mut set = set_with(&[(4, 4), (16, 16), (8, 8)], true);

        // --- 2. ACT ---
        let report = DeterministicIndexLane::new(false).run(&mut set);

        // --- 3. ASSERT ---
        assert_eq!(report.assigned, 3);
        assert!(report.mismatches.is_empty());
        assert_eq!(
            guids(&set),
            vec![
                ("element 0".to_string(), LightingGuid::deterministic(0)),
                ("element 1".to_string(), LightingGuid::deterministic(1)),
                ("element 2".to_string(), LightingGuid::deterministic(2)),
            ]
        );
    }

    #[test]
    fn test_sorted_by_descending_texels_with_stable_ties() {
        let mut set = set_with(&[(4, 4), (16, 16), (2, 8), (8, 8)], true);

        DeterministicIndexLane::new(true).run(&mut set);

        let order: Vec<String> = guids(&set).into_iter().map(|(d, _)| d).collect();
        assert_eq!(order, vec!["element 1", "element 3", "element 0", "element 2"]);
        for (i, (_, guid)) in guids(&set).into_iter().enumerate() {
            assert_eq!(guid, LightingGuid::deterministic(i as u32));
        }
    }

    #[test]
    fn test_unprocessed_mappings_keep_their_guid() {
        let mut set = set_with(&[(4, 4)], false);
        let before = set.mapping_guid(0);

        let report = DeterministicIndexLane::new(true).run(&mut set);

        assert_eq!(report.assigned, 0);
        assert_eq!(set.mapping_guid(0), before);
    }

    #[test]
    fn test_counter_restarts_every_run() {
        let mut first = set_with(&[(4, 4), (4, 4)], true);
        let mut second = set_with(&[(4, 4)], true);
        let lane = DeterministicIndexLane::new(false);

        lane.run(&mut first);
        lane.run(&mut second);

        assert_eq!(second.mapping_guid(0), Some(LightingGuid::deterministic(0)));
    }

    #[test]
    fn test_verify_flags_foreign_guids() {
        let mut set = set_with(&[(4, 4), (4, 4)], true);
        DeterministicIndexLane::new(false).run(&mut set);
        set.set_mapping_guid(1, LightingGuid::new(0, 0, 1, 0));

        assert_eq!(DeterministicIndexLane::verify(&set), vec![1]);
    }
}
