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

//! Integration tests for invalidation and result application.

use lumen_core::event::{BuildEvent, EventBus};
use lumen_core::lighting::LightingQuality;
use lumen_core::math::{Aabb, Vec3};
use lumen_core::options::BuildOptions;
use lumen_core::scene::{LevelId, LevelInvalidation, LightKind, Mobility};
use lumen_infra::{EditorCall, InMemoryScene};
use lumen_lanes::apply_lane::BUILD_FAILED_DIALOG;
use lumen_lanes::{ApplyRequest, GatherOutput, ResultApplyLane, SceneGatherLane};
use lumen_telemetry::LightmassStatistics;

fn unit_box() -> Aabb {
    Aabb::from_min_max(Vec3::ZERO, Vec3::splat(100.0))
}

fn gathered_scene() -> (InMemoryScene, GatherOutput) {
    let mut scene = InMemoryScene::new();
    let actor = scene.add_actor(LevelId(0));
    scene.add_static_mesh(actor, (8, 8), unit_box());
    scene.add_light(LightKind::Point, Mobility::Stationary);
    scene.add_light(LightKind::Spot, Mobility::Movable);
    let output = SceneGatherLane::default().run(
        &mut scene,
        &BuildOptions::default(),
        &EventBus::new(),
        &LightmassStatistics::new(),
    );
    scene.clear_calls();
    (scene, output)
}

fn request<'a>(output: &'a GatherOutput, success: bool, canceled: bool) -> ApplyRequest<'a> {
    ApplyRequest {
        success,
        canceled,
        only_build_selected: false,
        quality: LightingQuality::High,
        lights: &output.set.lights,
        scope: &output.scope,
    }
}

#[test]
fn test_successful_apply_runs_in_order() {
    // --- 1. ARRANGE ---
    let (mut scene, output) = gathered_scene();
    let events = EventBus::new();

    // --- 2. ACT ---
    ResultApplyLane::default().apply_new_lighting_data(
        &mut scene,
        request(&output, true, false),
        &events,
    );

    // --- 3. ASSERT ---
    let stationary = output.set.lights[0].id;
    assert_eq!(
        scene.calls(),
        &[
            EditorCall::ApplyTempModelElements(true),
            EditorCall::MarkLightValid(stationary),
            EditorCall::SetLevelQuality(LevelId(0), LightingQuality::High),
            EditorCall::UpdatePrecomputedVisibility,
            EditorCall::ClearWorldComponents,
            EditorCall::UpdateWorldComponents,
            EditorCall::CollectGarbage,
            EditorCall::CommitModelSurfaces,
        ]
    );
    assert!(events.drain().is_empty(), "A successful apply shows no dialog");
}

#[test]
fn test_failed_apply_shows_dialog_unless_canceled() {
    let (mut scene, output) = gathered_scene();
    let lane = ResultApplyLane::default();

    let failed = EventBus::new();
    lane.apply_new_lighting_data(&mut scene, request(&output, false, false), &failed);
    let canceled = EventBus::new();
    lane.apply_new_lighting_data(&mut scene, request(&output, false, true), &canceled);

    assert_eq!(
        failed.drain(),
        vec![BuildEvent::Dialog(BUILD_FAILED_DIALOG.to_string())]
    );
    assert!(canceled.drain().is_empty());
    assert!(!scene
        .calls()
        .iter()
        .any(|c| matches!(c, EditorCall::MarkLightValid(_) | EditorCall::SetLevelQuality(..))));
}

#[test]
fn test_selected_only_apply_leaves_lights_untouched() {
    let (mut scene, output) = gathered_scene();
    let mut request = request(&output, true, false);
    request.only_build_selected = true;

    ResultApplyLane::default().apply_new_lighting_data(&mut scene, request, &EventBus::new());

    assert!(!scene
        .calls()
        .iter()
        .any(|c| matches!(c, EditorCall::MarkLightValid(_))));
}

#[test]
fn test_invalidation_covers_levels_lights_and_primitives() {
    let (mut scene, output) = gathered_scene();
    let light = output.set.lights[0].id;
    let mesh = output.scope.enqueued[0];

    ResultApplyLane::default().invalidate_static_lighting(&mut scene, &output.scope, false);

    assert_eq!(
        scene.calls()[0],
        EditorCall::InvalidateLevel(
            LevelId(0),
            LevelInvalidation {
                light_volume: true,
                visibility: true,
                model: true,
            }
        )
    );
    assert!(scene.calls().contains(&EditorCall::InvalidateLight(light)));
    assert!(scene.calls().contains(&EditorCall::InvalidateComponent(mesh)));
}

#[test]
fn test_visibility_only_invalidation_keeps_primitive_lighting() {
    let (mut scene, output) = gathered_scene();

    ResultApplyLane::default().invalidate_static_lighting(&mut scene, &output.scope, true);

    assert!(matches!(
        scene.calls()[0],
        EditorCall::InvalidateLevel(
            _,
            LevelInvalidation {
                light_volume: false,
                ..
            }
        )
    ));
    assert!(!scene
        .calls()
        .iter()
        .any(|c| matches!(c, EditorCall::InvalidateComponent(_))));
}

#[test]
fn test_post_invalidation_sweeps_primitives_added_during_the_build() {
    // --- 1. ARRANGE ---
    let (mut scene, output) = gathered_scene();
    let actor = scene.add_actor(LevelId(0));
    let late = scene.add_static_mesh(actor, (8, 8), unit_box());

    // --- 2. ACT ---
    ResultApplyLane::default().post_invalidate_static_lighting(&mut scene, &output.scope);

    // --- 3. ASSERT ---
    let swept: Vec<_> = scene
        .calls()
        .iter()
        .filter_map(|c| match c {
            EditorCall::InvalidateComponent(id) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(swept, vec![late]);
    assert!(
        scene.enqueued_components().is_empty(),
        "Every enqueued flag is cleared after the build"
    );
}
