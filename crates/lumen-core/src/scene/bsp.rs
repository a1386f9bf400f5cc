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

//! A read-only snapshot of a level's BSP model, as handed to the gatherer.

use super::{ActorId, ComponentId};
use crate::math::Vec3;

/// A BSP surface. Several nodes may share one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct BspSurface {
    /// Brush actor the surface was built from.
    pub owner: Option<ActorId>,
    /// Whether the surface itself is selected in the editor.
    pub selected: bool,
    /// Unit normal of the surface plane.
    pub plane_normal: Vec3,
    /// Signed distance of the plane from the origin along its normal.
    pub plane_distance: f32,
    /// World units per lightmap texel.
    pub lightmap_resolution: f32,
}

/// A convex polygon of the BSP tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BspNode {
    /// Index into [`BspModel::surfaces`].
    pub surface: usize,
    /// Index into [`BspModel::components`].
    pub component: usize,
    /// Indices into [`BspModel::points`].
    pub vertices: Vec<u32>,
}

/// A model component, the renderable owner of a set of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BspComponent {
    /// Component handle.
    pub id: ComponentId,
    /// Indices into [`BspModel::nodes`].
    pub nodes: Vec<usize>,
    /// Whether the component casts shadows.
    pub cast_shadow: bool,
}

/// The whole model of one level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BspModel {
    /// Surfaces.
    pub surfaces: Vec<BspSurface>,
    /// Nodes.
    pub nodes: Vec<BspNode>,
    /// Shared vertex positions.
    pub points: Vec<Vec3>,
    /// Model components.
    pub components: Vec<BspComponent>,
}

impl BspModel {
    /// Positions of a node's vertices. Out-of-range indices are skipped.
    pub fn node_points(&self, node: usize) -> impl Iterator<Item = Vec3> + '_ {
        self.nodes
            .get(node)
            .into_iter()
            .flat_map(|n| n.vertices.iter())
            .filter_map(|&v| self.points.get(v as usize).copied())
    }
}
