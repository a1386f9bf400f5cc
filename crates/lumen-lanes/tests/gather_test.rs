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

//! Integration tests for scene gathering against an in-memory scene.

use lumen_core::event::{BuildEvent, EventBus, Severity};
use lumen_core::lane::{Lane, LaneKind};
use lumen_core::math::{Aabb, Vec3};
use lumen_core::options::BuildOptions;
use lumen_core::scene::{
    BspComponent, BspModel, BspNode, BspSurface, LevelId, LightKind, MappingDesc, MeshDesc,
    Mobility, PrimitiveLightingInfo, VisibilityId, WorldSettings,
};
use lumen_infra::{EditorCall, InMemoryScene};
use lumen_lanes::{GatherError, GatherOutput, SceneGatherLane};
use lumen_telemetry::LightmassStatistics;
use uuid::Uuid;

fn unit_box() -> Aabb {
    Aabb::from_min_max(Vec3::ZERO, Vec3::splat(100.0))
}

fn gather(scene: &mut InMemoryScene, options: &BuildOptions) -> (GatherOutput, Vec<BuildEvent>) {
    let events = EventBus::new();
    let statistics = LightmassStatistics::new();
    let output = SceneGatherLane::default().run(scene, options, &events, &statistics);
    (output, events.drain())
}

fn error_messages(events: &[BuildEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            BuildEvent::MessageLog {
                severity: Severity::Error,
                text,
            } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn floor_model() -> BspModel {
    let up = Vec3::new(0.0, 0.0, 1.0);
    let surface = |selected| BspSurface {
        owner: None,
        selected,
        plane_normal: up,
        plane_distance: 0.0,
        lightmap_resolution: 32.0,
    };
    BspModel {
        surfaces: vec![surface(false), surface(false)],
        points: vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(256.0, 0.0, 0.0),
            Vec3::new(256.0, 256.0, 0.0),
            Vec3::new(0.0, 256.0, 0.0),
            Vec3::new(512.0, 0.0, 0.0),
            Vec3::new(512.0, 256.0, 0.0),
        ],
        nodes: vec![
            BspNode {
                surface: 0,
                component: 0,
                vertices: vec![0, 1, 2, 3],
            },
            BspNode {
                surface: 1,
                component: 0,
                vertices: vec![1, 4, 5, 2],
            },
        ],
        components: vec![BspComponent {
            id: lumen_core::scene::ComponentId(9000),
            nodes: vec![0, 1],
            cast_shadow: true,
        }],
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Primitives
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_meshes_and_mappings_stay_paired() {
    // --- 1. ARRANGE ---
    let mut scene = InMemoryScene::new();
    let actor = scene.add_actor(LevelId(0));
    scene.add_static_mesh(actor, (32, 32), unit_box());
    scene.add_static_mesh(actor, (16, 16), unit_box());
    let broken = PrimitiveLightingInfo {
        meshes: vec![],
        mappings: vec![MappingDesc {
            mesh: 0,
            size_x: 8,
            size_y: 8,
            description: "orphan mapping".into(),
        }],
    };
    let broken_id = scene.add_primitive(actor, Mobility::Static, broken);

    // --- 2. ACT ---
    let (output, events) = gather(&mut scene, &BuildOptions::default());

    // --- 3. ASSERT ---
    assert_eq!(output.set.meshes().len(), output.set.mappings().len());
    assert_eq!(output.set.len(), 2, "The mismatched primitive must be skipped whole");
    assert_eq!(output.errors.len(), 1);
    assert!(error_messages(&events)[0].contains(&broken_id.to_string()));
}

#[test]
fn test_sky_lights_are_gathered_but_never_relevant() {
    let mut scene = InMemoryScene::new();
    let actor = scene.add_actor(LevelId(0));
    scene.add_static_mesh(actor, (8, 8), unit_box());
    let sky = scene.add_light(LightKind::Sky, Mobility::Stationary);
    let sun = scene.add_light(LightKind::Directional, Mobility::Static);

    let (output, _) = gather(&mut scene, &BuildOptions::default());

    let ids: Vec<_> = output.set.lights.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![sky, sun]);
    assert_eq!(output.set.meshes()[0].relevant_lights, vec![sun]);
}

#[test]
fn test_visibility_only_gathers_unprocessed_mappings() {
    let mut scene = InMemoryScene::new();
    let actor = scene.add_actor(LevelId(0));
    scene.add_static_mesh(actor, (8, 8), unit_box());
    let options = BuildOptions {
        only_build_visibility: true,
        ..BuildOptions::default()
    };

    let (output, _) = gather(&mut scene, &options);

    assert_eq!(output.set.len(), 1);
    assert_eq!(output.set.processed_mappings().count(), 0);
}

#[test]
fn test_unregistered_primitives_are_ignored() {
    let mut scene = InMemoryScene::new();
    let actor = scene.add_actor(LevelId(0));
    let hidden = scene.add_static_mesh(actor, (8, 8), unit_box());
    scene.unregister_primitive(hidden);

    let (output, _) = gather(&mut scene, &BuildOptions::default());

    assert!(output.set.is_empty());
    assert!(!output.scope.enqueued.contains(&hidden));
}

// ─────────────────────────────────────────────────────────────────────────────
// Visibility ids
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_visibility_ids_are_sequential_for_static_meshes() {
    // --- 1. ARRANGE ---
    let mut scene = InMemoryScene::new();
    scene.set_world_settings(WorldSettings {
        precompute_visibility: true,
        ..WorldSettings::default()
    });
    let actor = scene.add_actor(LevelId(0));
    let first = scene.add_static_mesh(actor, (8, 8), unit_box());
    let movable = scene.add_primitive(
        actor,
        Mobility::Movable,
        lumen_infra::single_mesh((8, 8), unit_box()),
    );
    let second = scene.add_static_mesh(actor, (8, 8), unit_box());

    // --- 2. ACT ---
    let (output, _) = gather(&mut scene, &BuildOptions::default());

    // --- 3. ASSERT ---
    use lumen_core::scene::SceneQuery;
    assert_eq!(scene.visibility_id(first), Some(VisibilityId(0)));
    assert_eq!(scene.visibility_id(second), Some(VisibilityId(1)));
    assert_eq!(scene.visibility_id(movable), None);
    assert!(scene.is_level_dirty(LevelId(0)));
    assert_eq!(output.set.meshes()[0].visibility_ids, vec![VisibilityId(0)]);
    assert_eq!(scene.calls()[0], EditorCall::ResetVisibilityIds);
}

#[test]
fn test_no_visibility_ids_without_precomputed_visibility() {
    let mut scene = InMemoryScene::new();
    let actor = scene.add_actor(LevelId(0));
    scene.add_static_mesh(actor, (8, 8), unit_box());

    gather(&mut scene, &BuildOptions::default());

    assert!(!scene.is_level_dirty(LevelId(0)));
    assert!(!scene
        .calls()
        .iter()
        .any(|c| matches!(c, EditorCall::SetVisibilityId(..))));
}

// ─────────────────────────────────────────────────────────────────────────────
// Levels and selection
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_filtered_levels_are_skipped_and_reported() {
    let mut scene = InMemoryScene::new();
    let streaming = scene.add_level("Caves");
    let actor = scene.add_actor(streaming);
    scene.add_static_mesh(actor, (8, 8), unit_box());
    let options = BuildOptions::default().with_levels(vec![LevelId(0)]);

    let (output, events) = gather(&mut scene, &options);

    assert!(output.set.is_empty());
    assert_eq!(output.skipped_levels, vec!["Caves".to_string()]);
    assert!(events.iter().any(|e| matches!(
        e,
        BuildEvent::MessageLog { severity: Severity::Warning, text } if text.contains("Caves")
    )));
}

#[test]
fn test_dirty_geometry_is_rebuilt_before_gathering() {
    let mut scene = InMemoryScene::new();
    if let Some(level) = scene.level_mut(LevelId(0)) {
        level.geometry_dirty_for_lighting = true;
    }

    gather(&mut scene, &BuildOptions::default());

    assert!(scene.calls().contains(&EditorCall::RebuildDirtyGeometry));
}

#[test]
fn test_selected_only_with_nothing_selected_reports_and_completes() {
    // --- 1. ARRANGE ---
    let mut scene = InMemoryScene::new();
    let actor = scene.add_actor(LevelId(0));
    scene.add_static_mesh(actor, (8, 8), unit_box());
    scene.set_bsp_model(LevelId(0), floor_model());
    let options = BuildOptions {
        only_build_selected: true,
        ..BuildOptions::default()
    };

    // --- 2. ACT ---
    let (output, events) = gather(&mut scene, &options);

    // --- 3. ASSERT ---
    assert!(output.set.is_empty());
    assert_eq!(output.errors, vec![GatherError::NothingSelected]);
    assert_eq!(
        error_messages(&events),
        vec!["Building selected actors and BSP only, but no actors or BSP selected!".to_string()]
    );
}

#[test]
fn test_selected_only_gathers_selected_actors() {
    let mut scene = InMemoryScene::new();
    let picked = scene.add_actor(LevelId(0));
    let other = scene.add_actor(LevelId(0));
    let picked_mesh = scene.add_static_mesh(picked, (8, 8), unit_box());
    scene.add_static_mesh(other, (8, 8), unit_box());
    scene.select_actor(picked, true);
    let options = BuildOptions {
        only_build_selected: true,
        ..BuildOptions::default()
    };

    let (output, _) = gather(&mut scene, &options);

    assert_eq!(output.set.len(), 1);
    assert_eq!(output.scope.actors, vec![picked]);
    assert_eq!(scene.enqueued_components(), vec![picked_mesh]);
    assert!(output.errors.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// BSP
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_bsp_nodes_become_one_node_group() {
    let mut scene = InMemoryScene::new();
    scene.set_bsp_model(LevelId(0), floor_model());

    let (output, _) = gather(&mut scene, &BuildOptions::default());

    assert_eq!(output.set.len(), 1);
    let mapping = &output.set.mappings()[0];
    assert_eq!((mapping.size_x, mapping.size_y), (16, 8));
    assert!(mapping.process_mapping);
    assert!(output.set.automatic_importance_volume_bounds.is_valid());
}

#[test]
fn test_selected_bsp_surface_builds_its_group() {
    let mut scene = InMemoryScene::new();
    let mut model = floor_model();
    model.surfaces[1].selected = true;
    scene.set_bsp_model(LevelId(0), model);
    let options = BuildOptions {
        only_build_selected: true,
        ..BuildOptions::default()
    };

    let (output, _) = gather(&mut scene, &options);

    assert_eq!(output.set.len(), 1);
    assert!(output.errors.is_empty());
}

#[test]
fn test_explicit_mesh_guids_survive_gathering() {
    let mut scene = InMemoryScene::new();
    let actor = scene.add_actor(LevelId(0));
    let guid = Uuid::new_v4();
    scene.add_primitive(
        actor,
        Mobility::Static,
        PrimitiveLightingInfo {
            meshes: vec![MeshDesc {
                guid,
                element: 0,
                bounds: unit_box(),
                cast_shadow: false,
                num_triangles: 2,
                num_vertices: 4,
            }],
            mappings: vec![MappingDesc {
                mesh: 0,
                size_x: 4,
                size_y: 4,
                description: "decal".into(),
            }],
        },
    );

    let (output, _) = gather(&mut scene, &BuildOptions::default());

    assert_eq!(
        output.set.meshes()[0].guid,
        lumen_core::LightingGuid::from_uuid(guid)
    );
    assert!(
        !output.set.automatic_importance_volume_bounds.is_valid(),
        "Only shadow casters feed the automatic importance volume"
    );
}

#[test]
fn test_gather_lane_reports_its_kind() {
    let lane = SceneGatherLane::default();
    let per_component = SceneGatherLane::default().with_bsp_across_components(false);

    assert_eq!(lane.lane_kind(), LaneKind::Gather);
    assert_eq!(lane.strategy_name(), "SceneGather");
    assert_eq!(per_component.strategy_name(), "SceneGatherPerComponent");
    assert!(lane.as_any().downcast_ref::<SceneGatherLane>().is_some());
}
