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

use super::{
    ActorId, BspModel, ComponentId, LevelId, LevelInfo, LightId, LightInfo, PrimitiveInfo,
    PrimitiveLightingInfo, VisibilityId, WorldSettings,
};
use crate::lighting::{LightingQuality, MappingResult};
use crate::math::Aabb;
use crate::options::BuildOptions;

/// Read access to the scene.
pub trait SceneQuery {
    /// All levels of the world, persistent level first.
    fn levels(&self) -> Vec<LevelInfo>;

    /// World-wide settings.
    fn world_settings(&self) -> WorldSettings;

    /// Actors of a level.
    fn actors(&self, level: LevelId) -> Vec<ActorId>;

    /// Whether the actor is selected in the editor.
    fn is_actor_selected(&self, actor: ActorId) -> bool;

    /// Primitive components of an actor.
    fn primitives(&self, actor: ActorId) -> Vec<PrimitiveInfo>;

    /// Every light component in the world, eligible or not.
    fn lights(&self) -> Vec<LightInfo>;

    /// Whether `light` affects `primitive`.
    fn light_affects_primitive(&self, light: LightId, primitive: ComponentId) -> bool;

    /// Meshes and mappings a primitive contributes, given its relevant lights.
    fn static_lighting_info(
        &self,
        primitive: ComponentId,
        relevant_lights: &[LightId],
        options: &BuildOptions,
    ) -> PrimitiveLightingInfo;

    /// The BSP model of a level, if it has one.
    fn bsp_model(&self, level: LevelId) -> Option<BspModel>;

    /// Explicit importance volumes placed in the world.
    fn importance_volumes(&self) -> Vec<Aabb>;

    /// Volumes where character indirect lighting samples are densified.
    fn character_indirect_detail_volumes(&self) -> Vec<Aabb>;

    /// Whether the component was flagged for rebuild by the current build.
    fn is_static_lighting_build_enqueued(&self, component: ComponentId) -> bool;

    /// Current visibility id of a component.
    fn visibility_id(&self, component: ComponentId) -> Option<VisibilityId>;
}

/// Which per-level caches to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInvalidation {
    /// Precomputed light volume samples.
    pub light_volume: bool,
    /// Precomputed visibility cells.
    pub visibility: bool,
    /// Lightmaps of the level's BSP model.
    pub model: bool,
}

/// Mutating access to the scene, used only by the gather and apply lanes.
pub trait SceneEditor {
    /// Clears every component's visibility id.
    fn reset_visibility_ids(&mut self);
    /// Assigns a visibility id to a component.
    fn set_visibility_id(&mut self, component: ComponentId, id: VisibilityId);
    /// Marks a level as modified.
    fn mark_level_dirty(&mut self, level: LevelId);
    /// Rebuilds BSP geometry flagged as dirty for lighting.
    fn rebuild_dirty_geometry(&mut self);
    /// Flags or unflags a component as being rebuilt by the current build.
    fn set_static_lighting_build_enqueued(&mut self, component: ComponentId, enqueued: bool);
    /// Drops cached lighting of a level.
    fn invalidate_level_lighting(&mut self, level: LevelId, what: LevelInvalidation);
    /// Drops cached lighting of a primitive component.
    fn invalidate_component_lighting(&mut self, component: ComponentId);
    /// Drops cached lighting that depends on a light. The light keeps its guid.
    fn invalidate_light_lighting(&mut self, light: LightId);
    /// Commits or drops temporary BSP elements created for the build.
    fn apply_temp_model_elements(&mut self, success: bool);
    /// Marks a light as having valid precomputed lighting.
    fn mark_light_precomputed_valid(&mut self, light: LightId);
    /// Records the quality achieved for a level.
    fn set_level_lighting_quality(&mut self, level: LevelId, quality: LightingQuality);
    /// Refreshes precomputed visibility data from the build.
    fn update_precomputed_visibility(&mut self);
    /// Unregisters every component from the renderer, releasing old lighting references.
    fn clear_world_components(&mut self);
    /// Registers every component again.
    fn update_world_components(&mut self);
    /// Reclaims replaced lightmap and shadowmap data.
    fn collect_garbage(&mut self);
    /// Commits BSP surface changes.
    fn commit_model_surfaces(&mut self);
}

/// Where a mapping's results land in the scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MappingTarget {
    /// An element of a primitive component.
    Primitive {
        /// Component handle.
        component: ComponentId,
        /// Element index.
        element: u32,
    },
    /// A group of BSP nodes of one level.
    NodeGroup {
        /// Level owning the model.
        level: LevelId,
        /// Node indices.
        nodes: Vec<usize>,
    },
}

/// The encoder collaborator. Storage format is up to the implementation.
pub trait LightingResultSink {
    /// Writes one mapping's imported results into its storage slots.
    fn write_mapping_result(&mut self, target: &MappingTarget, result: MappingResult);
    /// Encodes all written results into textures.
    fn encode_textures(&mut self, encode_quality: u32, success: bool);
}

/// The full scene surface a build needs.
pub trait StaticLightingWorld: SceneQuery + SceneEditor + LightingResultSink {}

impl<T: SceneQuery + SceneEditor + LightingResultSink> StaticLightingWorld for T {}
