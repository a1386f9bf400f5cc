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

//! Writing results back into the scene, and invalidating stale cached lighting
//! around a build.

use crate::gather_lane::BuildScope;
use lumen_core::event::{BuildEvent, EventBus};
use lumen_core::lane::{Lane, LaneError, LaneKind};
use lumen_core::lighting::{LightingQuality, MappingResult};
use lumen_core::scene::{LevelInvalidation, LightInfo, Mobility, StaticLightingWorld};
use lumen_data::StaticLightingSet;
use std::any::Any;

/// Dialog text shown when a build fails for any reason other than a cancel.
pub const BUILD_FAILED_DIALOG: &str = "The lighting build failed. See the message log for details.";

/// How a finished build is committed.
#[derive(Debug, Clone, Copy)]
pub struct ApplyRequest<'a> {
    /// The remote run completed and every mapping was imported.
    pub success: bool,
    /// The user canceled the build.
    pub canceled: bool,
    /// Only selected actors were rebuilt.
    pub only_build_selected: bool,
    /// Quality recorded for the built levels.
    pub quality: LightingQuality,
    /// Lights that took part in the build.
    pub lights: &'a [LightInfo],
    /// What the build touched.
    pub scope: &'a BuildScope,
}

/// Applies results and keeps cached lighting consistent with them.
#[derive(Debug, Clone, Copy)]
pub struct ResultApplyLane {
    collect_garbage: bool,
}

impl Default for ResultApplyLane {
    fn default() -> Self {
        Self {
            collect_garbage: true,
        }
    }
}

impl ResultApplyLane {
    /// Creates the lane. `collect_garbage` controls the reclaim pass after apply.
    pub fn new(collect_garbage: bool) -> Self {
        Self { collect_garbage }
    }

    /// Writes one imported mapping into the storage slots of its target.
    pub fn apply_mapping(
        &self,
        world: &mut dyn StaticLightingWorld,
        set: &StaticLightingSet,
        mapping_index: usize,
        result: MappingResult,
    ) -> Result<(), LaneError> {
        let mesh = set
            .mappings()
            .get(mapping_index)
            .and_then(|mapping| set.mesh_of(mapping))
            .ok_or_else(|| {
                LaneError::InvalidState(format!("mapping {mapping_index} has no mesh"))
            })?;
        log::trace!(
            "ResultApplyLane: Writing {} ({} texels) to {}.",
            result.guid,
            result.texel_count(),
            mesh.source.label()
        );
        world.write_mapping_result(&mesh.source.target(), result);
        Ok(())
    }

    /// Drops cached lighting for everything the build rebuilds.
    ///
    /// Light volume samples and primitive lighting are kept in visibility-only
    /// builds.
    pub fn invalidate_static_lighting(
        &self,
        world: &mut dyn StaticLightingWorld,
        scope: &BuildScope,
        only_build_visibility: bool,
    ) {
        for level in &scope.levels {
            world.invalidate_level_lighting(
                level.id,
                LevelInvalidation {
                    light_volume: !only_build_visibility,
                    visibility: true,
                    model: true,
                },
            );
        }

        let lights = world.lights();
        for &actor in &scope.actors {
            for light in lights.iter().filter(|l| l.owner == Some(actor)) {
                world.invalidate_light_lighting(light.id);
            }
            if only_build_visibility {
                continue;
            }
            for primitive in world.primitives(actor) {
                if primitive.registered {
                    world.invalidate_component_lighting(primitive.id);
                }
            }
        }
        log::debug!(
            "ResultApplyLane: Invalidated {} levels and {} actors.",
            scope.levels.len(),
            scope.actors.len()
        );
    }

    /// Invalidates registered primitives of built levels that this build did
    /// not rebuild, then clears every enqueued flag.
    pub fn post_invalidate_static_lighting(
        &self,
        world: &mut dyn StaticLightingWorld,
        scope: &BuildScope,
    ) {
        let mut swept = 0usize;
        for level in &scope.levels {
            for actor in world.actors(level.id) {
                for primitive in world.primitives(actor) {
                    if primitive.registered && !world.is_static_lighting_build_enqueued(primitive.id)
                    {
                        world.invalidate_component_lighting(primitive.id);
                        swept += 1;
                    }
                }
            }
        }
        for &component in &scope.enqueued {
            world.set_static_lighting_build_enqueued(component, false);
        }
        if swept > 0 {
            log::info!("ResultApplyLane: Invalidated {swept} primitives changed during the build.");
        }
    }

    /// Commits a finished build.
    ///
    /// Every component is unregistered before any is registered again, so no
    /// render state keeps a reference to replaced lighting.
    pub fn apply_new_lighting_data(
        &self,
        world: &mut dyn StaticLightingWorld,
        request: ApplyRequest<'_>,
        events: &EventBus<BuildEvent>,
    ) {
        world.apply_temp_model_elements(request.success);

        if request.success && !request.only_build_selected {
            for light in request
                .lights
                .iter()
                .filter(|l| matches!(l.mobility, Mobility::Static | Mobility::Stationary))
            {
                world.mark_light_precomputed_valid(light.id);
            }
        }
        if request.success {
            for level in &request.scope.levels {
                world.set_level_lighting_quality(level.id, request.quality);
            }
        }

        world.update_precomputed_visibility();
        world.clear_world_components();
        world.update_world_components();
        if self.collect_garbage {
            world.collect_garbage();
        }
        world.commit_model_surfaces();

        if !request.success && !request.canceled {
            log::error!("ResultApplyLane: {BUILD_FAILED_DIALOG}");
            events.publish(BuildEvent::Dialog(BUILD_FAILED_DIALOG.to_string()));
        }
    }
}

impl Lane for ResultApplyLane {
    fn strategy_name(&self) -> &'static str {
        "ResultApply"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Apply
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
