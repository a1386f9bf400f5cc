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

//! A cluster of BSP nodes lit as one mesh.

use lumen_core::math::Aabb;
use lumen_core::scene::{ComponentId, LevelId, LightId, VisibilityId};

/// Coplanar, adjacent BSP nodes sharing a lightmap resolution.
///
/// Every node of a level belongs to exactly one group per build.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGroup {
    /// Level owning the model.
    pub level: LevelId,
    /// Node indices, ascending.
    pub nodes: Vec<usize>,
    /// Model components the nodes belong to, ascending and unique.
    pub components: Vec<ComponentId>,
    /// Lightmap width in texels.
    pub size_x: u32,
    /// Lightmap height in texels.
    pub size_y: u32,
    /// Bounds of all node vertices.
    pub bounds: Aabb,
    /// Whether any component of the group casts shadows.
    pub cast_shadow: bool,
    /// Lights affecting any component of the group.
    pub relevant_lights: Vec<LightId>,
    /// Visibility ids of the group's components.
    pub visibility_ids: Vec<VisibilityId>,
    /// Triangles of the fan-triangulated nodes.
    pub num_triangles: u32,
    /// Vertices of the nodes.
    pub num_vertices: u32,
}

impl NodeGroup {
    /// Whether the group contains `node`.
    pub fn contains_node(&self, node: usize) -> bool {
        self.nodes.binary_search(&node).is_ok()
    }
}
