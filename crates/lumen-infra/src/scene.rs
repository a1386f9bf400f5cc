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

//! A scene store held entirely in memory.
//!
//! [`InMemoryScene`] is assembled with builder calls and implements the scene
//! query, editor and result sink traits. Every mutation is recorded as an
//! [`EditorCall`] so callers can check what a build did and in which order.

use lumen_core::lighting::{LightingGuid, LightingQuality, MappingResult};
use lumen_core::math::Aabb;
use lumen_core::options::BuildOptions;
use lumen_core::scene::{
    ActorId, BspModel, ComponentId, LevelId, LevelInfo, LevelInvalidation, LightId, LightInfo,
    LightKind, LightingResultSink, MappingDesc, MappingTarget, MeshDesc, Mobility, PrimitiveInfo,
    PrimitiveLightingInfo, SceneEditor, SceneQuery, VisibilityId, WorldSettings,
};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCall {
    /// `reset_visibility_ids`
    ResetVisibilityIds,
    /// `set_visibility_id`
    SetVisibilityId(ComponentId, VisibilityId),
    /// `mark_level_dirty`
    MarkLevelDirty(LevelId),
    /// `rebuild_dirty_geometry`
    RebuildDirtyGeometry,
    /// `set_static_lighting_build_enqueued`
    SetEnqueued(ComponentId, bool),
    /// `invalidate_level_lighting`
    InvalidateLevel(LevelId, LevelInvalidation),
    /// `invalidate_component_lighting`
    InvalidateComponent(ComponentId),
    /// `invalidate_light_lighting`
    InvalidateLight(LightId),
    /// `apply_temp_model_elements`
    ApplyTempModelElements(bool),
    /// `mark_light_precomputed_valid`
    MarkLightValid(LightId),
    /// `set_level_lighting_quality`
    SetLevelQuality(LevelId, LightingQuality),
    /// `update_precomputed_visibility`
    UpdatePrecomputedVisibility,
    /// `clear_world_components`
    ClearWorldComponents,
    /// `update_world_components`
    UpdateWorldComponents,
    /// `collect_garbage`
    CollectGarbage,
    /// `commit_model_surfaces`
    CommitModelSurfaces,
    /// `write_mapping_result`
    WriteResult(MappingTarget, LightingGuid),
    /// `encode_textures`
    EncodeTextures {
        /// Encoder quality level.
        encode_quality: u32,
        /// Whether the build succeeded.
        success: bool,
    },
}

#[derive(Debug, Clone)]
struct ScenePrimitive {
    info: PrimitiveInfo,
    lighting: PrimitiveLightingInfo,
}

#[derive(Debug, Clone)]
struct SceneActor {
    id: ActorId,
    level: LevelId,
    selected: bool,
    primitives: Vec<ScenePrimitive>,
}

/// A scene store for tests, tools and demos.
#[derive(Debug, Clone)]
pub struct InMemoryScene {
    next_id: u64,
    levels: Vec<LevelInfo>,
    settings: WorldSettings,
    actors: Vec<SceneActor>,
    lights: Vec<LightInfo>,
    light_links: Option<BTreeSet<(LightId, ComponentId)>>,
    bsp_models: BTreeMap<LevelId, BspModel>,
    importance_volumes: Vec<Aabb>,
    character_volumes: Vec<Aabb>,
    enqueued: BTreeSet<ComponentId>,
    visibility_ids: BTreeMap<ComponentId, VisibilityId>,
    dirty_levels: BTreeSet<LevelId>,
    level_quality: BTreeMap<LevelId, LightingQuality>,
    valid_lights: BTreeSet<LightId>,
    written: Vec<(MappingTarget, MappingResult)>,
    calls: Vec<EditorCall>,
}

impl Default for InMemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryScene {
    /// Creates a scene with only a visible persistent level, `LevelId(0)`.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            levels: vec![LevelInfo {
                id: LevelId(0),
                name: "PersistentLevel".into(),
                is_persistent: true,
                visible_in_editor: true,
                geometry_dirty_for_lighting: false,
            }],
            settings: WorldSettings::default(),
            actors: Vec::new(),
            lights: Vec::new(),
            light_links: None,
            bsp_models: BTreeMap::new(),
            importance_volumes: Vec::new(),
            character_volumes: Vec::new(),
            enqueued: BTreeSet::new(),
            visibility_ids: BTreeMap::new(),
            dirty_levels: BTreeSet::new(),
            level_quality: BTreeMap::new(),
            valid_lights: BTreeSet::new(),
            written: Vec::new(),
            calls: Vec::new(),
        }
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The persistent level.
    pub fn persistent_level(&self) -> LevelId {
        LevelId(0)
    }

    /// Adds a streaming level.
    pub fn add_level(&mut self, name: &str) -> LevelId {
        let id = LevelId(self.levels.len() as u32);
        self.levels.push(LevelInfo {
            id,
            name: name.to_string(),
            is_persistent: false,
            visible_in_editor: true,
            geometry_dirty_for_lighting: false,
        });
        id
    }

    /// Mutable access to a level's flags.
    pub fn level_mut(&mut self, level: LevelId) -> Option<&mut LevelInfo> {
        self.levels.iter_mut().find(|l| l.id == level)
    }

    /// Replaces the world settings.
    pub fn set_world_settings(&mut self, settings: WorldSettings) {
        self.settings = settings;
    }

    /// Adds an empty actor to `level`.
    pub fn add_actor(&mut self, level: LevelId) -> ActorId {
        let id = ActorId(self.allocate());
        self.actors.push(SceneActor {
            id,
            level,
            selected: false,
            primitives: Vec::new(),
        });
        id
    }

    /// Selects or deselects an actor.
    pub fn select_actor(&mut self, actor: ActorId, selected: bool) {
        if let Some(a) = self.actors.iter_mut().find(|a| a.id == actor) {
            a.selected = selected;
        }
    }

    /// Adds a primitive with explicit lighting info to `actor`.
    pub fn add_primitive(
        &mut self,
        actor: ActorId,
        mobility: Mobility,
        lighting: PrimitiveLightingInfo,
    ) -> ComponentId {
        let id = ComponentId(self.allocate());
        if let Some(a) = self.actors.iter_mut().find(|a| a.id == actor) {
            a.primitives.push(ScenePrimitive {
                info: PrimitiveInfo {
                    id,
                    registered: true,
                    mobility,
                },
                lighting,
            });
        }
        id
    }

    /// Adds a static, shadow-casting primitive with one mesh and one mapping.
    pub fn add_static_mesh(&mut self, actor: ActorId, size: (u32, u32), bounds: Aabb) -> ComponentId {
        self.add_primitive(actor, Mobility::Static, single_mesh(size, bounds))
    }

    /// Marks a primitive as unregistered.
    pub fn unregister_primitive(&mut self, component: ComponentId) {
        if let Some(p) = self.primitive_mut(component) {
            p.info.registered = false;
        }
    }

    fn primitive_mut(&mut self, component: ComponentId) -> Option<&mut ScenePrimitive> {
        self.actors
            .iter_mut()
            .flat_map(|a| a.primitives.iter_mut())
            .find(|p| p.info.id == component)
    }

    /// Adds a light owned by a new actor in the persistent level.
    pub fn add_light(&mut self, kind: LightKind, mobility: Mobility) -> LightId {
        let owner = self.add_actor(LevelId(0));
        let id = LightId(self.allocate());
        self.lights.push(LightInfo {
            id,
            guid: Uuid::new_v4(),
            owner: Some(owner),
            owner_in_world: true,
            owner_pending_kill: false,
            affects_world: true,
            has_static_shadowing: mobility != Mobility::Movable,
            has_static_lighting: mobility == Mobility::Static,
            kind,
            mobility,
        });
        id
    }

    /// Mutable access to a light's flags.
    pub fn light_mut(&mut self, light: LightId) -> Option<&mut LightInfo> {
        self.lights.iter_mut().find(|l| l.id == light)
    }

    /// The actor owning `light`.
    pub fn light_owner(&self, light: LightId) -> Option<ActorId> {
        self.lights.iter().find(|l| l.id == light).and_then(|l| l.owner)
    }

    /// Restricts `light` to the primitives explicitly linked to it. Until the
    /// first link, every light affects every primitive.
    pub fn link_light(&mut self, light: LightId, component: ComponentId) {
        self.light_links
            .get_or_insert_with(BTreeSet::new)
            .insert((light, component));
    }

    /// Sets the BSP model of a level.
    pub fn set_bsp_model(&mut self, level: LevelId, model: BspModel) {
        self.bsp_models.insert(level, model);
    }

    /// Adds an explicit importance volume.
    pub fn add_importance_volume(&mut self, volume: Aabb) {
        self.importance_volumes.push(volume);
    }

    /// Adds a character indirect detail volume.
    pub fn add_character_indirect_detail_volume(&mut self, volume: Aabb) {
        self.character_volumes.push(volume);
    }

    /// Every recorded mutation, oldest first.
    pub fn calls(&self) -> &[EditorCall] {
        &self.calls
    }

    /// Forgets recorded mutations.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Results written by the last builds, in write order.
    pub fn written_results(&self) -> &[(MappingTarget, MappingResult)] {
        &self.written
    }

    /// Quality recorded for a level by the last successful build.
    pub fn level_quality(&self, level: LevelId) -> Option<LightingQuality> {
        self.level_quality.get(&level).copied()
    }

    /// Whether a level was marked dirty.
    pub fn is_level_dirty(&self, level: LevelId) -> bool {
        self.dirty_levels.contains(&level)
    }

    /// Whether a light was marked as having valid precomputed lighting.
    pub fn is_light_valid(&self, light: LightId) -> bool {
        self.valid_lights.contains(&light)
    }

    /// Components currently flagged as enqueued.
    pub fn enqueued_components(&self) -> Vec<ComponentId> {
        self.enqueued.iter().copied().collect()
    }

    /// Position of the first recorded call matching `predicate`.
    pub fn position_of(&self, predicate: impl Fn(&EditorCall) -> bool) -> Option<usize> {
        self.calls.iter().position(predicate)
    }
}

/// Lighting info for a primitive with one mesh and one mapping.
pub fn single_mesh(size: (u32, u32), bounds: Aabb) -> PrimitiveLightingInfo {
    PrimitiveLightingInfo {
        meshes: vec![MeshDesc {
            guid: Uuid::new_v4(),
            element: 0,
            bounds,
            cast_shadow: true,
            num_triangles: 12,
            num_vertices: 24,
        }],
        mappings: vec![MappingDesc {
            mesh: 0,
            size_x: size.0,
            size_y: size.1,
            description: format!("{}x{} lightmap", size.0, size.1),
        }],
    }
}

impl SceneQuery for InMemoryScene {
    fn levels(&self) -> Vec<LevelInfo> {
        self.levels.clone()
    }

    fn world_settings(&self) -> WorldSettings {
        self.settings.clone()
    }

    fn actors(&self, level: LevelId) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|a| a.level == level)
            .map(|a| a.id)
            .collect()
    }

    fn is_actor_selected(&self, actor: ActorId) -> bool {
        self.actors.iter().any(|a| a.id == actor && a.selected)
    }

    fn primitives(&self, actor: ActorId) -> Vec<PrimitiveInfo> {
        self.actors
            .iter()
            .filter(|a| a.id == actor)
            .flat_map(|a| a.primitives.iter().map(|p| p.info))
            .collect()
    }

    fn lights(&self) -> Vec<LightInfo> {
        self.lights.clone()
    }

    fn light_affects_primitive(&self, light: LightId, primitive: ComponentId) -> bool {
        match &self.light_links {
            Some(links) => links.contains(&(light, primitive)),
            None => true,
        }
    }

    fn static_lighting_info(
        &self,
        primitive: ComponentId,
        _relevant_lights: &[LightId],
        _options: &BuildOptions,
    ) -> PrimitiveLightingInfo {
        self.actors
            .iter()
            .flat_map(|a| a.primitives.iter())
            .find(|p| p.info.id == primitive)
            .map(|p| p.lighting.clone())
            .unwrap_or_default()
    }

    fn bsp_model(&self, level: LevelId) -> Option<BspModel> {
        self.bsp_models.get(&level).cloned()
    }

    fn importance_volumes(&self) -> Vec<Aabb> {
        self.importance_volumes.clone()
    }

    fn character_indirect_detail_volumes(&self) -> Vec<Aabb> {
        self.character_volumes.clone()
    }

    fn is_static_lighting_build_enqueued(&self, component: ComponentId) -> bool {
        self.enqueued.contains(&component)
    }

    fn visibility_id(&self, component: ComponentId) -> Option<VisibilityId> {
        self.visibility_ids.get(&component).copied()
    }
}

impl SceneEditor for InMemoryScene {
    fn reset_visibility_ids(&mut self) {
        self.visibility_ids.clear();
        self.calls.push(EditorCall::ResetVisibilityIds);
    }

    fn set_visibility_id(&mut self, component: ComponentId, id: VisibilityId) {
        self.visibility_ids.insert(component, id);
        self.calls.push(EditorCall::SetVisibilityId(component, id));
    }

    fn mark_level_dirty(&mut self, level: LevelId) {
        self.dirty_levels.insert(level);
        self.calls.push(EditorCall::MarkLevelDirty(level));
    }

    fn rebuild_dirty_geometry(&mut self) {
        for level in &mut self.levels {
            level.geometry_dirty_for_lighting = false;
        }
        self.calls.push(EditorCall::RebuildDirtyGeometry);
    }

    fn set_static_lighting_build_enqueued(&mut self, component: ComponentId, enqueued: bool) {
        if enqueued {
            self.enqueued.insert(component);
        } else {
            self.enqueued.remove(&component);
        }
        self.calls.push(EditorCall::SetEnqueued(component, enqueued));
    }

    fn invalidate_level_lighting(&mut self, level: LevelId, what: LevelInvalidation) {
        if what.model {
            self.level_quality.remove(&level);
        }
        self.calls.push(EditorCall::InvalidateLevel(level, what));
    }

    fn invalidate_component_lighting(&mut self, component: ComponentId) {
        self.calls.push(EditorCall::InvalidateComponent(component));
    }

    fn invalidate_light_lighting(&mut self, light: LightId) {
        self.valid_lights.remove(&light);
        self.calls.push(EditorCall::InvalidateLight(light));
    }

    fn apply_temp_model_elements(&mut self, success: bool) {
        self.calls.push(EditorCall::ApplyTempModelElements(success));
    }

    fn mark_light_precomputed_valid(&mut self, light: LightId) {
        self.valid_lights.insert(light);
        self.calls.push(EditorCall::MarkLightValid(light));
    }

    fn set_level_lighting_quality(&mut self, level: LevelId, quality: LightingQuality) {
        self.level_quality.insert(level, quality);
        self.calls.push(EditorCall::SetLevelQuality(level, quality));
    }

    fn update_precomputed_visibility(&mut self) {
        self.calls.push(EditorCall::UpdatePrecomputedVisibility);
    }

    fn clear_world_components(&mut self) {
        self.calls.push(EditorCall::ClearWorldComponents);
    }

    fn update_world_components(&mut self) {
        self.calls.push(EditorCall::UpdateWorldComponents);
    }

    fn collect_garbage(&mut self) {
        self.calls.push(EditorCall::CollectGarbage);
    }

    fn commit_model_surfaces(&mut self) {
        self.calls.push(EditorCall::CommitModelSurfaces);
    }
}

impl LightingResultSink for InMemoryScene {
    fn write_mapping_result(&mut self, target: &MappingTarget, result: MappingResult) {
        self.calls
            .push(EditorCall::WriteResult(target.clone(), result.guid));
        self.written.push((target.clone(), result));
    }

    fn encode_textures(&mut self, encode_quality: u32, success: bool) {
        self.calls.push(EditorCall::EncodeTextures {
            encode_quality,
            success,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::math::Vec3;

    #[test]
    fn test_actors_are_listed_per_level() {
        // --- 1. ARRANGE ---
        let mut scene = InMemoryScene::new();
        let streaming = scene.add_level("Streaming");
        let a = scene.add_actor(scene.persistent_level());
        let b = scene.add_actor(streaming);

        // --- 2. ACT ---
        let persistent = scene.actors(LevelId(0));

        // --- 3. ASSERT ---
        assert_eq!(persistent, vec![a]);
        assert_eq!(scene.actors(streaming), vec![b]);
    }

    #[test]
    fn test_light_links_restrict_relevance() {
        let mut scene = InMemoryScene::new();
        let actor = scene.add_actor(LevelId(0));
        let mesh = scene.add_static_mesh(actor, (8, 8), Aabb::from_min_max(Vec3::ZERO, Vec3::ONE));
        let lamp = scene.add_light(LightKind::Point, Mobility::Stationary);
        let sun = scene.add_light(LightKind::Directional, Mobility::Static);

        assert!(scene.light_affects_primitive(lamp, mesh));
        scene.link_light(sun, mesh);
        assert!(!scene.light_affects_primitive(lamp, mesh));
        assert!(scene.light_affects_primitive(sun, mesh));
    }

    #[test]
    fn test_editor_calls_are_recorded_in_order() {
        let mut scene = InMemoryScene::new();
        scene.clear_world_components();
        scene.update_world_components();
        scene.collect_garbage();

        assert_eq!(
            scene.calls(),
            &[
                EditorCall::ClearWorldComponents,
                EditorCall::UpdateWorldComponents,
                EditorCall::CollectGarbage,
            ]
        );
    }
}
