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

//! Scene gathering: which levels, lights, primitives and BSP surfaces take part
//! in a build, turned into the build's meshes and mappings.

pub mod bsp;
pub mod lights;

use crate::messages::publish_message;
use lumen_core::event::{BuildEvent, EventBus, Severity};
use lumen_core::lane::{Lane, LaneKind};
use lumen_core::options::BuildOptions;
use lumen_core::scene::{
    ActorId, BspModel, ComponentId, LevelId, LevelInfo, LightId, Mobility, PrimitiveInfo,
    StaticLightingWorld, VisibilityId,
};
use lumen_data::{MergeError, StaticLightingSet};
use lumen_io::LightmassConfig;
use lumen_telemetry::{LightmassStatistics, StatPhase};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Non-fatal problems found while gathering. The gather always completes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatherError {
    /// A primitive's contribution was rejected and skipped.
    #[error("Skipped a primitive: {0}")]
    Merge(#[from] MergeError),
    /// A selected-only build found nothing selected.
    #[error("Building selected actors and BSP only, but no actors or BSP selected!")]
    NothingSelected,
}

/// What a build touches in the scene, used by invalidation and apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildScope {
    /// Levels whose lighting is rebuilt.
    pub levels: Vec<LevelInfo>,
    /// Actors whose lighting is rebuilt.
    pub actors: Vec<ActorId>,
    /// Components flagged as enqueued for this build.
    pub enqueued: Vec<ComponentId>,
}

impl BuildScope {
    /// Names of the built levels.
    pub fn level_names(&self) -> Vec<String> {
        self.levels.iter().map(|l| l.name.clone()).collect()
    }
}

/// Result of a gather pass.
#[derive(Debug, Clone)]
pub struct GatherOutput {
    /// Lights, meshes and mappings of the build.
    pub set: StaticLightingSet,
    /// What the build touches.
    pub scope: BuildScope,
    /// Names of levels left out by the level filter or editor visibility.
    pub skipped_levels: Vec<String>,
    /// Problems reported to the message log.
    pub errors: Vec<GatherError>,
}

impl Default for GatherOutput {
    fn default() -> Self {
        Self {
            set: StaticLightingSet::new(),
            scope: BuildScope::default(),
            skipped_levels: Vec::new(),
            errors: Vec::new(),
        }
    }
}

struct VisibilityIds {
    enabled: bool,
    next: u32,
    dirty_levels: BTreeSet<LevelId>,
    bsp_components: BTreeMap<ComponentId, VisibilityId>,
}

impl VisibilityIds {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            next: 0,
            dirty_levels: BTreeSet::new(),
            bsp_components: BTreeMap::new(),
        }
    }

    fn assign(
        &mut self,
        world: &mut dyn StaticLightingWorld,
        level: LevelId,
        component: ComponentId,
    ) -> Option<VisibilityId> {
        if !self.enabled {
            return None;
        }
        let id = VisibilityId(self.next);
        self.next += 1;
        world.set_visibility_id(component, id);
        self.dirty_levels.insert(level);
        Some(id)
    }

    fn assign_bsp(
        &mut self,
        world: &mut dyn StaticLightingWorld,
        level: LevelId,
        component: ComponentId,
    ) -> Option<VisibilityId> {
        if let Some(id) = self.bsp_components.get(&component) {
            return Some(*id);
        }
        let id = self.assign(world, level, component)?;
        self.bsp_components.insert(component, id);
        Some(id)
    }
}

/// Walks the scene and gathers everything a build needs.
#[derive(Debug, Clone, Copy)]
pub struct SceneGatherLane {
    gather_bsp_across_components: bool,
    rebuild_dirty_geometry: bool,
}

impl Default for SceneGatherLane {
    fn default() -> Self {
        Self {
            gather_bsp_across_components: true,
            rebuild_dirty_geometry: true,
        }
    }
}

impl SceneGatherLane {
    /// Creates a gather lane from the build configuration.
    pub fn from_config(config: &LightmassConfig) -> Self {
        Self {
            gather_bsp_across_components: config.debug.gather_bsp_surfaces_across_components,
            rebuild_dirty_geometry: config.static_lighting.rebuild_dirty_geometry_for_lighting,
        }
    }

    /// Whether BSP nodes of different model components may share a group.
    pub fn with_bsp_across_components(mut self, enabled: bool) -> Self {
        self.gather_bsp_across_components = enabled;
        self
    }

    /// Gathers lights, primitives and BSP node groups of every built level.
    pub fn run(
        &self,
        world: &mut dyn StaticLightingWorld,
        options: &BuildOptions,
        events: &EventBus<BuildEvent>,
        statistics: &LightmassStatistics,
    ) -> GatherOutput {
        let _collect = statistics.scoped(StatPhase::Collect);
        let mut output = GatherOutput::default();
        let precompute_visibility = world.world_settings().precompute_visibility;
        let process_mapping = !options.only_build_visibility;

        world.reset_visibility_ids();

        // 1. Levels
        let mut dirty_geometry = false;
        for level in world.levels() {
            if !options.should_build_lighting_for_level(&level) {
                output.skipped_levels.push(level.name);
                continue;
            }
            if level.geometry_dirty_for_lighting {
                dirty_geometry = true;
                publish_message(
                    events,
                    Severity::Warning,
                    format!("Geometry of level {} changed since its last BSP rebuild.", level.name),
                );
            }
            output.scope.levels.push(level);
        }
        if !output.skipped_levels.is_empty() {
            publish_message(
                events,
                Severity::Warning,
                format!(
                    "Skipping lighting for levels: {}",
                    output.skipped_levels.join(", ")
                ),
            );
        }
        if dirty_geometry && self.rebuild_dirty_geometry {
            log::info!("SceneGatherLane: Rebuilding dirty geometry before gathering.");
            world.rebuild_dirty_geometry();
        }

        // 2. Lights
        {
            let _prepare = statistics.scoped(StatPhase::PrepareLights);
            output.set.lights = lights::gather_lights(world.lights());
        }
        let candidates = lights::relevance_candidates(&output.set.lights);

        // 3. Primitives and BSP surfaces
        let _gather = statistics.scoped(StatPhase::GatherLightingInfo);
        let mut visibility = VisibilityIds::new(precompute_visibility);
        let mut anything_selected = false;
        let levels: Vec<LevelId> = output.scope.levels.iter().map(|l| l.id).collect();
        for level in levels {
            for actor in world.actors(level) {
                let selected = world.is_actor_selected(actor);
                if options.only_build_selected && !selected {
                    continue;
                }
                anything_selected |= selected;
                output.scope.actors.push(actor);

                for primitive in world.primitives(actor) {
                    if !primitive.registered {
                        continue;
                    }
                    world.set_static_lighting_build_enqueued(primitive.id, true);
                    output.scope.enqueued.push(primitive.id);

                    if let Err(e) = self.gather_primitive(
                        world,
                        options,
                        level,
                        primitive,
                        &candidates,
                        &mut visibility,
                        &mut output.set,
                        process_mapping,
                    ) {
                        publish_message(events, Severity::Error, e.to_string());
                        output.errors.push(e);
                    }
                }
            }

            if let Some(model) = world.bsp_model(level) {
                anything_selected |= self.gather_bsp(
                    world,
                    options,
                    level,
                    &model,
                    &candidates,
                    &mut visibility,
                    &mut output,
                    process_mapping,
                );
            }
        }

        if options.only_build_selected && !anything_selected {
            let error = GatherError::NothingSelected;
            publish_message(events, Severity::Error, error.to_string());
            output.errors.push(error);
        }

        for level in &visibility.dirty_levels {
            world.mark_level_dirty(*level);
        }

        log::info!(
            "SceneGatherLane: Gathered {} meshes, {} mappings and {} lights from {} levels.",
            output.set.meshes().len(),
            output.set.mappings().len(),
            output.set.lights.len(),
            output.scope.levels.len()
        );
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn gather_primitive(
        &self,
        world: &mut dyn StaticLightingWorld,
        options: &BuildOptions,
        level: LevelId,
        primitive: PrimitiveInfo,
        candidates: &[LightId],
        visibility: &mut VisibilityIds,
        set: &mut StaticLightingSet,
        process_mapping: bool,
    ) -> Result<(), GatherError> {
        let relevant: Vec<LightId> = candidates
            .iter()
            .copied()
            .filter(|&light| world.light_affects_primitive(light, primitive.id))
            .collect();
        let info = world.static_lighting_info(primitive.id, &relevant, options);
        if info.meshes.is_empty() && info.mappings.is_empty() {
            return Ok(());
        }

        let visibility_id = if primitive.mobility == Mobility::Static && !info.meshes.is_empty() {
            visibility.assign(world, level, primitive.id)
        } else {
            None
        };
        set.add_primitive(primitive.id, info, &relevant, visibility_id, process_mapping)?;
        Ok(())
    }

    /// Returns whether anything of the model was selected.
    #[allow(clippy::too_many_arguments)]
    fn gather_bsp(
        &self,
        world: &mut dyn StaticLightingWorld,
        options: &BuildOptions,
        level: LevelId,
        model: &BspModel,
        candidates: &[LightId],
        visibility: &mut VisibilityIds,
        output: &mut GatherOutput,
        process_mapping: bool,
    ) -> bool {
        let mask = if options.only_build_selected {
            Some(bsp::selected_node_mask(model, |actor| {
                world.is_actor_selected(actor)
            }))
        } else {
            None
        };
        let anything_selected = mask.as_ref().is_some_and(|m| m.iter().any(|&n| n));

        let mut groups = 0usize;
        for cluster in bsp::cluster_nodes(model, self.gather_bsp_across_components) {
            if let Some(mask) = &mask {
                if !cluster.iter().any(|&node| mask[node]) {
                    continue;
                }
            }
            let mut group = bsp::build_node_group(level, model, cluster);
            group.relevant_lights = candidates
                .iter()
                .copied()
                .filter(|&light| {
                    group
                        .components
                        .iter()
                        .any(|&c| world.light_affects_primitive(light, c))
                })
                .collect();
            group.visibility_ids = group
                .components
                .iter()
                .filter_map(|&c| visibility.assign_bsp(world, level, c))
                .collect();
            for &component in &group.components {
                if !output.scope.enqueued.contains(&component) {
                    world.set_static_lighting_build_enqueued(component, true);
                    output.scope.enqueued.push(component);
                }
            }
            output.set.add_node_group(group, process_mapping);
            groups += 1;
        }
        log::debug!("SceneGatherLane: {groups} BSP node groups in {level}.");
        anything_selected
    }
}

impl Lane for SceneGatherLane {
    fn strategy_name(&self) -> &'static str {
        if self.gather_bsp_across_components {
            "SceneGather"
        } else {
            "SceneGatherPerComponent"
        }
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Gather
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
