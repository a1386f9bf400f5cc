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

//! Static lighting meshes and where they come from.

use crate::node_group::NodeGroup;
use lumen_core::lighting::LightingGuid;
use lumen_core::math::Aabb;
use lumen_core::scene::{ComponentId, LightId, MappingTarget, VisibilityId};

/// Index of a mesh inside its [`StaticLightingSet`](crate::StaticLightingSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshIndex(pub usize);

/// The scene object a mesh was built from.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshSource {
    /// One element of a primitive component.
    Primitive {
        /// Component handle.
        component: ComponentId,
        /// Element index.
        element: u32,
    },
    /// A group of coplanar BSP nodes.
    NodeGroup(NodeGroup),
}

impl MeshSource {
    /// Where results computed for this source are written.
    pub fn target(&self) -> MappingTarget {
        match self {
            MeshSource::Primitive { component, element } => MappingTarget::Primitive {
                component: *component,
                element: *element,
            },
            MeshSource::NodeGroup(group) => MappingTarget::NodeGroup {
                level: group.level,
                nodes: group.nodes.clone(),
            },
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match self {
            MeshSource::Primitive { component, element } => format!("{component}[{element}]"),
            MeshSource::NodeGroup(group) => {
                format!("{} nodes of {}", group.nodes.len(), group.level)
            }
        }
    }
}

/// A unit of geometry that takes part in the lighting solve.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticLightingMesh {
    /// Persistent guid until the indexer assigns a deterministic one.
    pub guid: LightingGuid,
    /// Origin of the geometry.
    pub source: MeshSource,
    /// World-space bounds.
    pub bounds: Aabb,
    /// Whether the mesh casts shadows.
    pub cast_shadow: bool,
    /// Triangle count.
    pub num_triangles: u32,
    /// Vertex count.
    pub num_vertices: u32,
    /// Visibility ids of the components the mesh belongs to.
    pub visibility_ids: Vec<VisibilityId>,
    /// Lights that affect this mesh. Sky lights are never listed.
    pub relevant_lights: Vec<LightId>,
}
