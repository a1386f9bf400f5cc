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

//! Grouping of BSP nodes into lightable node groups, and selection propagation
//! for selected-only builds.

use lumen_core::math::Aabb;
use lumen_core::scene::{ActorId, BspModel, ComponentId, LevelId};
use lumen_data::NodeGroup;

/// Smallest lightmap side of a node group, in texels.
pub const MIN_NODE_GROUP_SIZE: u32 = 4;
/// Largest lightmap side of a node group, in texels.
pub const MAX_NODE_GROUP_SIZE: u32 = 1024;

const PLANE_TOLERANCE: f32 = 1.0e-3;
const POINT_TOLERANCE: f32 = 1.0e-2;

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Lowest index stays the root so group order follows node order.
            let (keep, merge) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[merge] = keep;
        }
    }
}

fn same_plane(model: &BspModel, a: usize, b: usize) -> bool {
    let (Some(na), Some(nb)) = (model.nodes.get(a), model.nodes.get(b)) else {
        return false;
    };
    let (Some(sa), Some(sb)) = (model.surfaces.get(na.surface), model.surfaces.get(nb.surface))
    else {
        return false;
    };
    sa.plane_normal.approx_eq(sb.plane_normal, PLANE_TOLERANCE)
        && (sa.plane_distance - sb.plane_distance).abs() <= PLANE_TOLERANCE
        && sa.lightmap_resolution == sb.lightmap_resolution
}

fn share_a_point(model: &BspModel, a: usize, b: usize) -> bool {
    model
        .node_points(a)
        .any(|pa| model.node_points(b).any(|pb| pa.approx_eq(pb, POINT_TOLERANCE)))
}

/// Partitions every node of `model` into clusters of coplanar, adjacent nodes
/// with the same lightmap resolution.
///
/// Clusters are ordered by their lowest node index and each cluster lists its
/// nodes in ascending order. Every node appears in exactly one cluster.
pub fn cluster_nodes(model: &BspModel, across_components: bool) -> Vec<Vec<usize>> {
    let count = model.nodes.len();
    let mut sets = DisjointSet::new(count);
    for a in 0..count {
        for b in (a + 1)..count {
            if !across_components && model.nodes[a].component != model.nodes[b].component {
                continue;
            }
            if same_plane(model, a, b) && share_a_point(model, a, b) {
                sets.union(a, b);
            }
        }
    }

    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut slot_of_root = vec![usize::MAX; count];
    for node in 0..count {
        let root = sets.find(node);
        if slot_of_root[root] == usize::MAX {
            slot_of_root[root] = clusters.len();
            clusters.push(Vec::new());
        }
        clusters[slot_of_root[root]].push(node);
    }
    clusters
}

/// Builds a node group from a cluster. Lights and visibility ids are left for
/// the caller.
pub fn build_node_group(level: LevelId, model: &BspModel, nodes: Vec<usize>) -> NodeGroup {
    let mut bounds = Aabb::INVALID;
    let mut components: Vec<ComponentId> = Vec::new();
    let mut cast_shadow = false;
    let mut num_triangles = 0u32;
    let mut num_vertices = 0u32;
    let mut resolution = 0.0f32;

    for &node in &nodes {
        for point in model.node_points(node) {
            bounds = bounds.merged_with_point(point);
        }
        let Some(bsp_node) = model.nodes.get(node) else {
            continue;
        };
        let vertices = bsp_node.vertices.len() as u32;
        num_vertices += vertices;
        num_triangles += vertices.saturating_sub(2);
        if let Some(surface) = model.surfaces.get(bsp_node.surface) {
            resolution = surface.lightmap_resolution;
        }
        if let Some(component) = model.components.get(bsp_node.component) {
            cast_shadow |= component.cast_shadow;
            if !components.contains(&component.id) {
                components.push(component.id);
            }
        }
    }
    components.sort();

    let (size_x, size_y) = lightmap_size(&bounds, resolution);
    NodeGroup {
        level,
        nodes,
        components,
        size_x,
        size_y,
        bounds,
        cast_shadow,
        relevant_lights: Vec::new(),
        visibility_ids: Vec::new(),
        num_triangles,
        num_vertices,
    }
}

/// Lightmap size of a group: its two largest bounds axes over the resolution.
pub fn lightmap_size(bounds: &Aabb, resolution: f32) -> (u32, u32) {
    if !bounds.is_valid() {
        return (MIN_NODE_GROUP_SIZE, MIN_NODE_GROUP_SIZE);
    }
    let resolution = if resolution > 0.0 { resolution } else { 1.0 };
    let size = bounds.size();
    let mut axes = [size.x, size.y, size.z];
    axes.sort_by(|a, b| b.total_cmp(a));
    let texels = |extent: f32| {
        ((extent / resolution).ceil() as u32).clamp(MIN_NODE_GROUP_SIZE, MAX_NODE_GROUP_SIZE)
    };
    (texels(axes[0]), texels(axes[1]))
}

/// Surfaces to build in a selected-only build, as a per-node mask.
///
/// Pass 1 marks every selected surface, or surface whose brush actor is
/// selected, together with every surface reachable through the model
/// components of its nodes. Pass 2 expands once more from the surfaces pass 1
/// marked. The propagation stops there, so coplanar neighbours further away
/// are not picked up.
pub fn selected_node_mask(model: &BspModel, is_actor_selected: impl Fn(ActorId) -> bool) -> Vec<bool> {
    let mut nodes_of_surface: Vec<Vec<usize>> = vec![Vec::new(); model.surfaces.len()];
    for (index, node) in model.nodes.iter().enumerate() {
        if let Some(nodes) = nodes_of_surface.get_mut(node.surface) {
            nodes.push(index);
        }
    }

    let expand = |surface: usize, marked: &mut Vec<bool>| {
        for &node in &nodes_of_surface[surface] {
            let Some(component) = model.components.get(model.nodes[node].component) else {
                continue;
            };
            for &other in &component.nodes {
                if let Some(slot) = model
                    .nodes
                    .get(other)
                    .and_then(|n| marked.get_mut(n.surface))
                {
                    *slot = true;
                }
            }
        }
    };

    // 1. Direct selection.
    let mut marked = vec![false; model.surfaces.len()];
    for (index, surface) in model.surfaces.iter().enumerate() {
        let selected = surface.selected || surface.owner.is_some_and(&is_actor_selected);
        if selected {
            marked[index] = true;
            expand(index, &mut marked);
        }
    }

    // 2. One extra hop.
    let first_pass: Vec<usize> = (0..marked.len()).filter(|&s| marked[s]).collect();
    for surface in first_pass {
        expand(surface, &mut marked);
    }

    model
        .nodes
        .iter()
        .map(|node| marked.get(node.surface).copied().unwrap_or(false))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::math::Vec3;
    use lumen_core::scene::{BspComponent, BspNode, BspSurface};

    fn surface(normal: Vec3, distance: f32, selected: bool) -> BspSurface {
        BspSurface {
            owner: None,
            selected,
            plane_normal: normal,
            plane_distance: distance,
            lightmap_resolution: 32.0,
        }
    }

    /// Two floor quads sharing an edge, one wall quad touching them, and a
    /// detached floor quad far away.
    fn floor_model() -> BspModel {
        let up = Vec3::new(0.0, 0.0, 1.0);
        let side = Vec3::new(1.0, 0.0, 0.0);
        BspModel {
            surfaces: vec![
                surface(up, 0.0, false),
                surface(up, 0.0, false),
                surface(side, 0.0, false),
                surface(up, 0.0, false),
            ],
            points: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(256.0, 0.0, 0.0),
                Vec3::new(256.0, 256.0, 0.0),
                Vec3::new(0.0, 256.0, 0.0),
                Vec3::new(512.0, 0.0, 0.0),
                Vec3::new(512.0, 256.0, 0.0),
                Vec3::new(0.0, 0.0, 256.0),
                Vec3::new(0.0, 256.0, 256.0),
                Vec3::new(4096.0, 0.0, 0.0),
                Vec3::new(4352.0, 0.0, 0.0),
                Vec3::new(4352.0, 256.0, 0.0),
            ],
            nodes: vec![
                BspNode { surface: 0, component: 0, vertices: vec![0, 1, 2, 3] },
                BspNode { surface: 1, component: 0, vertices: vec![1, 4, 5, 2] },
                BspNode { surface: 2, component: 1, vertices: vec![0, 3, 7, 6] },
                BspNode { surface: 3, component: 1, vertices: vec![8, 9, 10] },
            ],
            components: vec![
                BspComponent { id: ComponentId(100), nodes: vec![0, 1], cast_shadow: true },
                BspComponent { id: ComponentId(101), nodes: vec![2, 3], cast_shadow: false },
            ],
        }
    }

    #[test]
    fn test_coplanar_adjacent_nodes_are_clustered() {
        // --- 1. ARRANGE ---
        let model = floor_model();

        // --- 2. ACT ---
        let clusters = cluster_nodes(&model, true);

        // --- 3. ASSERT ---
        assert_eq!(clusters, vec![vec![0, 1], vec![2], vec![3]]);
    }

    #[test]
    fn test_every_node_belongs_to_one_cluster() {
        let model = floor_model();
        let mut seen: Vec<usize> = cluster_nodes(&model, false).into_iter().flatten().collect();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_clusters_do_not_cross_components_when_disabled() {
        let mut model = floor_model();
        model.nodes[1].component = 1;
        model.components[0].nodes = vec![0];
        model.components[1].nodes = vec![1, 2, 3];

        assert_eq!(cluster_nodes(&model, false), vec![vec![0], vec![1], vec![2], vec![3]]);
        assert_eq!(cluster_nodes(&model, true), vec![vec![0, 1], vec![2], vec![3]]);
    }

    #[test]
    fn test_node_group_size_and_shadowing() {
        let model = floor_model();

        let group = build_node_group(LevelId(0), &model, vec![0, 1]);

        assert_eq!((group.size_x, group.size_y), (16, 8));
        assert!(group.cast_shadow);
        assert_eq!(group.components, vec![ComponentId(100)]);
        assert_eq!(group.num_vertices, 8);
        assert_eq!(group.num_triangles, 4);
    }

    #[test]
    fn test_lightmap_size_is_clamped() {
        let tiny = Aabb::from_min_max(Vec3::ZERO, Vec3::splat(1.0));
        let huge = Aabb::from_min_max(Vec3::ZERO, Vec3::new(1.0e6, 1.0e6, 0.0));

        assert_eq!(lightmap_size(&tiny, 32.0), (4, 4));
        assert_eq!(lightmap_size(&huge, 32.0), (1024, 1024));
        assert_eq!(lightmap_size(&Aabb::INVALID, 32.0), (4, 4));
    }

    #[test]
    fn test_selection_expands_one_component_hop() {
        // --- 1. ARRANGE ---
        let mut model = floor_model();
        model.surfaces[2].selected = true;

        // --- 2. ACT ---
        let mask = selected_node_mask(&model, |_| false);

        // --- 3. ASSERT ---
        // The wall shares component 101 with the detached quad.
        assert_eq!(mask, vec![false, false, true, true]);
    }

    #[test]
    fn test_selection_through_brush_actor() {
        let mut model = floor_model();
        model.surfaces[0].owner = Some(ActorId(7));

        let mask = selected_node_mask(&model, |actor| actor == ActorId(7));

        assert_eq!(mask, vec![true, true, false, false]);
    }

    #[test]
    fn test_nothing_selected_marks_nothing() {
        let model = floor_model();
        assert!(selected_node_mask(&model, |_| false).iter().all(|m| !m));
    }
}
