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

use super::{ActorId, ComponentId, LevelId, LightId};
use crate::math::Aabb;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a component may move at runtime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mobility {
    /// Never moves; fully baked.
    #[default]
    Static,
    /// Does not move but may change color or intensity; shadows are baked.
    Stationary,
    /// Fully dynamic.
    Movable,
}

/// Kind of light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightKind {
    /// Infinitely distant light.
    Directional,
    /// Omnidirectional local light.
    Point,
    /// Cone-shaped local light.
    Spot,
    /// Captured environment lighting. Never part of a primitive's relevant lights.
    Sky,
}

/// A level of the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelInfo {
    /// Handle.
    pub id: LevelId,
    /// Display name.
    pub name: String,
    /// Whether this is the persistent level.
    pub is_persistent: bool,
    /// Whether the level is currently visible in the editor.
    pub visible_in_editor: bool,
    /// BSP geometry changed since its lighting data was last rebuilt.
    pub geometry_dirty_for_lighting: bool,
}

/// A light component with its static-lighting-relevant attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightInfo {
    /// Handle.
    pub id: LightId,
    /// Persistent guid, stable across builds.
    pub guid: Uuid,
    /// Owning actor, if any.
    pub owner: Option<ActorId>,
    /// The owner is contained in the world being built.
    pub owner_in_world: bool,
    /// The owner is pending deletion.
    pub owner_pending_kill: bool,
    /// The light affects the world at all.
    pub affects_world: bool,
    /// Shadowing is baked.
    pub has_static_shadowing: bool,
    /// Direct lighting is baked.
    pub has_static_lighting: bool,
    /// Light kind.
    pub kind: LightKind,
    /// Mobility.
    pub mobility: Mobility,
}

impl LightInfo {
    /// Whether the light takes part in a lighting build: owned by an in-world
    /// actor that is not pending deletion, affecting the world, and with
    /// static shadowing or static lighting.
    pub fn is_eligible_for_static_lighting(&self) -> bool {
        self.owner.is_some()
            && self.owner_in_world
            && !self.owner_pending_kill
            && self.affects_world
            && (self.has_static_shadowing || self.has_static_lighting)
    }
}

/// A primitive component as listed by its actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveInfo {
    /// Handle.
    pub id: ComponentId,
    /// Registered with the renderer.
    pub registered: bool,
    /// Mobility.
    pub mobility: Mobility,
}

/// One mesh a primitive contributes to the lighting solve.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDesc {
    /// Persistent guid of the mesh element.
    pub guid: Uuid,
    /// Element index within the primitive (LOD or section).
    pub element: u32,
    /// World-space bounds.
    pub bounds: Aabb,
    /// Whether the mesh casts shadows.
    pub cast_shadow: bool,
    /// Triangle count.
    pub num_triangles: u32,
    /// Vertex count.
    pub num_vertices: u32,
}

/// One mapping a primitive contributes, referring to a mesh by local index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDesc {
    /// Index into the meshes returned alongside this mapping.
    pub mesh: usize,
    /// Lightmap width in texels.
    pub size_x: u32,
    /// Lightmap height in texels.
    pub size_y: u32,
    /// Human readable description, used in logs.
    pub description: String,
}

/// What a primitive returns when asked for its static lighting data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveLightingInfo {
    /// Meshes.
    pub meshes: Vec<MeshDesc>,
    /// Mappings, one per mesh.
    pub mappings: Vec<MappingDesc>,
}

/// Solver settings authored on the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightmassWorldSettings {
    /// Global lightmap texel density scale.
    pub static_lighting_level_scale: f32,
    /// Number of indirect bounces.
    pub num_indirect_lighting_bounces: u32,
    /// Linear color of the environment.
    pub environment_color: [f32; 3],
    /// Intensity of the environment color.
    pub environment_intensity: f32,
    /// Scale applied to diffuse reflectance.
    pub diffuse_boost: f32,
    /// Whether ambient occlusion is computed.
    pub use_ambient_occlusion: bool,
}

impl Default for LightmassWorldSettings {
    fn default() -> Self {
        Self {
            static_lighting_level_scale: 1.0,
            num_indirect_lighting_bounces: 3,
            environment_color: [0.0, 0.0, 0.0],
            environment_intensity: 1.0,
            diffuse_boost: 1.0,
            use_ambient_occlusion: false,
        }
    }
}

/// World-wide settings that affect the build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldSettings {
    /// The world wants precomputed visibility.
    pub precompute_visibility: bool,
    /// The world forbids precomputed lighting entirely.
    pub force_no_precomputed_lighting: bool,
    /// Solver settings.
    pub lightmass: LightmassWorldSettings,
}
