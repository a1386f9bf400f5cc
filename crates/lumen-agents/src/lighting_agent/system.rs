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

//! Defines the StaticLightingSystem, the stage machine of one lighting build.

use super::error::{BuildError, KICKOFF_FAILED_MESSAGE};
use lumen_core::cancel::CancelFlag;
use lumen_core::context::BuildContext;
use lumen_core::event::{BuildEvent, EventBus, Severity};
use lumen_core::lighting::LightingQuality;
use lumen_core::options::BuildOptions;
use lumen_core::scene::{ComponentId, StaticLightingWorld};
use lumen_core::stage::BuildStage;
use lumen_core::swarm::{JobDescriptor, SwarmChannel};
use lumen_core::Stopwatch;
use lumen_data::StaticLightingSet;
use lumen_io::wire::SceneSettingsRecord;
use lumen_io::{BinaryDumpDirectory, DistributedJobClient, ImportMode, LightmassConfig};
use lumen_lanes::{
    import_strategy_for, AmortizedExportLane, ApplyRequest, BuildScope, DeterministicIndexLane,
    ExportStatus, ImportSession, ImportStrategy, ResultApplyLane, SceneGatherLane,
};
use lumen_telemetry::{report_statistics, LightmassStatistics, StatPhase};
use std::time::Duration;
use uuid::Uuid;

/// Warning published for selected-only builds above preview quality.
pub const SELECTED_ONLY_WARNING: &str =
    "Building selected actors only, lightmap memory and quality will be sub-optimal until the next full rebuild.";

/// What the manager has to do once a tick returns.
#[derive(Debug)]
pub enum TickOutcome {
    /// Nothing; the build stays in its current stage.
    Continue,
    /// Route the build to the fail path. `Some` replaces the generic message.
    Fail(Option<String>),
    /// A setup error. The build is destroyed after a dialog.
    Abort(BuildError),
    /// Results are ready and may be committed without asking the user.
    AutoApply,
    /// The build ended without a remote job.
    Completed,
}

/// The stage machine of a single lighting build.
///
/// Owns everything the build produces: the gathered set, the scope of the
/// build, the export cursor and the job client. All of it is released when
/// the system is dropped; dropping a system with a running job cancels it.
pub struct StaticLightingSystem {
    options: BuildOptions,
    config: LightmassConfig,
    stage: BuildStage,
    cancel: CancelFlag,
    /// Orchestrator-side timings.
    statistics: LightmassStatistics,
    /// Timings charged by the job client, merged at finish.
    swarm_statistics: LightmassStatistics,
    channel: Option<Box<dyn SwarmChannel>>,
    set: StaticLightingSet,
    scope: BuildScope,
    export: Option<AmortizedExportLane>,
    client: Option<DistributedJobClient>,
    import: Box<dyn ImportStrategy>,
    apply: ResultApplyLane,
    build_timer: Stopwatch,
    processing_timer: Stopwatch,
    waiting_timer: Option<Stopwatch>,
    last_progress: Option<u32>,
    review_notified: bool,
    build_canceled: bool,
    /// Scoped lighting was invalidated for this build.
    invalidated: bool,
    enqueued_released: bool,
}

impl StaticLightingSystem {
    /// Creates a system in `Startup`. Nothing is gathered until the first tick.
    pub fn new(
        options: BuildOptions,
        config: LightmassConfig,
        channel: Box<dyn SwarmChannel>,
        cancel: CancelFlag,
    ) -> Self {
        let import = import_strategy_for(config.debug.import_mode);
        let apply = ResultApplyLane::new(config.editor.purge_old_lightmaps);
        Self {
            options,
            config,
            stage: BuildStage::Startup,
            cancel,
            statistics: LightmassStatistics::new(),
            swarm_statistics: LightmassStatistics::new(),
            channel: Some(channel),
            set: StaticLightingSet::new(),
            scope: BuildScope::default(),
            export: None,
            client: None,
            import,
            apply,
            build_timer: Stopwatch::new(),
            processing_timer: Stopwatch::new(),
            waiting_timer: None,
            last_progress: None,
            review_notified: false,
            build_canceled: false,
            invalidated: false,
            enqueued_released: false,
        }
    }

    /// The current stage.
    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    /// The options this build was created with.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Timings recorded so far.
    pub fn statistics(&self) -> &LightmassStatistics {
        &self.statistics
    }

    /// The gathered meshes, mappings and lights.
    pub fn set(&self) -> &StaticLightingSet {
        &self.set
    }

    /// Levels, actors and components this build covers.
    pub fn scope(&self) -> &BuildScope {
        &self.scope
    }

    /// Whether the remote pool is processing the job.
    pub fn is_async_building(&self) -> bool {
        self.stage == BuildStage::AsynchronousBuilding
    }

    /// Whether the finish sequence saw a cancel request.
    pub fn build_canceled(&self) -> bool {
        self.build_canceled
    }

    /// Progress of the current stage, `0..=100`.
    pub fn percent_done(&self) -> f32 {
        match self.stage {
            BuildStage::AmortizedExport => self
                .export
                .as_ref()
                .map_or(0.0, |export| export.percent_done(&self.set)),
            BuildStage::AsynchronousBuilding => self
                .client
                .as_ref()
                .map_or(0.0, |client| client.async_percent_done()),
            BuildStage::AutoApplyingImport | BuildStage::WaitingForImport | BuildStage::Import => {
                100.0
            }
            _ => 0.0,
        }
    }

    /// Components still flagged as enqueued for this build.
    ///
    /// Empty once the post-build sweep cleared them. The manager releases the
    /// rest when a build is torn down early.
    pub fn take_unreleased_components(&mut self) -> Vec<ComponentId> {
        if self.enqueued_released {
            return Vec::new();
        }
        self.enqueued_released = true;
        std::mem::take(&mut self.scope.enqueued)
    }

    /// Runs the work of the current stage once.
    pub fn update(
        &mut self,
        context: &mut BuildContext<'_>,
        events: &EventBus<BuildEvent>,
    ) -> TickOutcome {
        if self.cancel.is_requested() && !self.is_async_building() {
            return TickOutcome::Fail(None);
        }

        match self.stage {
            BuildStage::Startup => self.begin_lightmass_process(context.world, events),
            BuildStage::AmortizedExport => self.update_export(events),
            BuildStage::SwarmKickoff => self.kickoff_swarm(events),
            BuildStage::AsynchronousBuilding => self.update_async_building(context.world, events),
            BuildStage::AutoApplyingImport => self.update_auto_applying_import(context, events),
            BuildStage::WaitingForImport | BuildStage::Import | BuildStage::NotRunning => {
                TickOutcome::Continue
            }
        }
    }

    fn set_stage(&mut self, stage: BuildStage, events: &EventBus<BuildEvent>) {
        log::debug!("StaticLightingSystem: {} -> {}", self.stage, stage);
        self.stage = stage;
        events.publish(BuildEvent::StageChanged {
            stage,
            percent: self.percent_done(),
        });
    }

    fn publish_progress(&mut self, text: String, events: &EventBus<BuildEvent>) {
        let percent = self.percent_done();
        let rounded = percent.floor() as u32;
        if self.last_progress == Some(rounded) {
            return;
        }
        self.last_progress = Some(rounded);
        events.publish(BuildEvent::Progress {
            stage: self.stage,
            percent,
            text,
        });
    }

    // --- Startup ---

    fn begin_lightmass_process(
        &mut self,
        world: &mut dyn StaticLightingWorld,
        events: &EventBus<BuildEvent>,
    ) -> TickOutcome {
        let _startup = self.statistics.scoped(StatPhase::Startup);
        let settings = world.world_settings();

        if self.options.only_build_visibility && !settings.precompute_visibility {
            return TickOutcome::Abort(BuildError::VisibilityDisabled);
        }
        if self.options.only_build_selected && self.options.quality != LightingQuality::Preview {
            log::warn!("StaticLightingSystem: {SELECTED_ONLY_WARNING}");
            events.publish(BuildEvent::MessageLog {
                severity: Severity::Warning,
                text: SELECTED_ONLY_WARNING.to_string(),
            });
        }

        let gather = SceneGatherLane::from_config(&self.config).run(
            world,
            &self.options,
            events,
            &self.statistics,
        );
        self.set = gather.set;
        self.scope = gather.scope;

        if settings.force_no_precomputed_lighting {
            log::info!("StaticLightingSystem: World forces no precomputed lighting, clearing it.");
            self.invalidate(world);
            self.apply.apply_new_lighting_data(world, self.apply_request(true, false), events);
            self.post_invalidate(world);
            return TickOutcome::Completed;
        }

        let report =
            DeterministicIndexLane::new(self.config.debug.sort_mappings).run(&mut self.set);
        for index in report.mismatches {
            events.publish(BuildEvent::MessageLog {
                severity: Severity::Warning,
                text: format!("Mapping {index} does not carry a deterministic guid."),
            });
        }

        let Some(channel) = self.channel.take() else {
            log::error!("StaticLightingSystem: Startup ran twice.");
            return TickOutcome::Fail(None);
        };
        let mut client =
            DistributedJobClient::new(channel, self.cancel.clone(), self.swarm_statistics.clone());
        if let Some(dump) = self.prepare_dump_directory() {
            client = client.with_dump_directory(dump);
        }
        for (index, _) in self.set.processed_mappings() {
            if let Some(guid) = self.set.mapping_guid(index) {
                client.expect_mapping(guid);
            }
        }

        let importance_volumes = world.importance_volumes();
        let character_volumes = world.character_indirect_detail_volumes();
        let record = SceneSettingsRecord {
            quality: self.options.quality,
            num_unused_local_cores: self.options.num_unused_local_cores,
            only_build_visibility: self.options.only_build_visibility,
            lightmass: settings.lightmass,
            levels: self.scope.level_names(),
        };
        self.export = Some(AmortizedExportLane::new(
            record,
            importance_volumes,
            character_volumes,
            self.config.scene.clone(),
            self.config.export.items_per_tick,
        ));

        if let Err(e) = client.connect() {
            return TickOutcome::Abort(BuildError::ConnectionFailed(e));
        }
        self.client = Some(client);
        self.processing_timer = Stopwatch::new();

        log::info!(
            "StaticLightingSystem: Startup complete, exporting {} meshes and {} mappings.",
            self.set.meshes().len(),
            self.set.mappings().len()
        );
        self.set_stage(BuildStage::AmortizedExport, events);
        TickOutcome::Continue
    }

    fn prepare_dump_directory(&self) -> Option<BinaryDumpDirectory> {
        if !self.options.dump_binary_results {
            return None;
        }
        let dump = BinaryDumpDirectory::new(&self.config.dump.directory);
        match dump.prepare_fresh() {
            Ok(removed) => {
                log::info!(
                    "StaticLightingSystem: Cleared {} previous dumps in {}.",
                    removed,
                    dump.path().display()
                );
                Some(dump)
            }
            Err(e) => {
                log::warn!("StaticLightingSystem: {e}. Results will not be dumped.");
                None
            }
        }
    }

    // --- AmortizedExport ---

    fn update_export(&mut self, events: &EventBus<BuildEvent>) -> TickOutcome {
        let (Some(export), Some(client)) = (self.export.as_mut(), self.client.as_mut()) else {
            log::error!("StaticLightingSystem: Export stage entered without a client.");
            return TickOutcome::Fail(None);
        };
        let status = export.export_next(&self.set, client, &self.cancel, events);

        match status {
            Ok(ExportStatus::InProgress { percent }) => {
                let text = format!("Exporting lighting data: {percent:.0}% Done");
                self.publish_progress(text, events);
                TickOutcome::Continue
            }
            Ok(ExportStatus::Complete) => {
                self.set_stage(BuildStage::SwarmKickoff, events);
                self.last_progress = None;
                self.publish_progress("Kicking off Swarm".to_string(), events);
                TickOutcome::Continue
            }
            Ok(ExportStatus::Canceled) => TickOutcome::Fail(None),
            Err(e) => {
                log::error!("StaticLightingSystem: {}", BuildError::from(e));
                TickOutcome::Fail(None)
            }
        }
    }

    // --- SwarmKickoff ---

    fn kickoff_swarm(&mut self, events: &EventBus<BuildEvent>) -> TickOutcome {
        let Some(client) = self.client.as_mut() else {
            return TickOutcome::Fail(Some(KICKOFF_FAILED_MESSAGE.to_string()));
        };

        let job = JobDescriptor {
            job_id: Uuid::new_v4(),
            quality: self.options.quality,
            only_build_visibility: self.options.only_build_visibility,
            num_unused_local_cores: self.options.num_unused_local_cores,
            input_records: 0,
        };
        if let Err(e) = client.open_job(job) {
            return TickOutcome::Abort(BuildError::JobOpenFailed(e));
        }
        if let Err(e) = client.begin_run() {
            log::error!("StaticLightingSystem: Begin run failed: {e}");
            return TickOutcome::Fail(Some(KICKOFF_FAILED_MESSAGE.to_string()));
        }

        self.export = None;
        self.last_progress = None;
        self.set_stage(BuildStage::AsynchronousBuilding, events);
        TickOutcome::Continue
    }

    // --- AsynchronousBuilding ---

    fn update_async_building(
        &mut self,
        world: &mut dyn StaticLightingWorld,
        events: &EventBus<BuildEvent>,
    ) -> TickOutcome {
        let Some(client) = self.client.as_mut() else {
            return TickOutcome::Fail(None);
        };
        let finished = client.update();

        let completed = client.take_completed();
        if !completed.is_empty() {
            // Immediate results land in the world now, so stale lighting goes first.
            if self.import.mode() == ImportMode::Immediate && !self.invalidated {
                self.invalidate(world);
            }
            let Some(client) = self.client.as_mut() else {
                return TickOutcome::Fail(None);
            };
            let mut session = ImportSession {
                client,
                set: &self.set,
                world,
                apply: &self.apply,
                statistics: &self.statistics,
            };
            self.import.on_mappings_completed(&completed, &mut session);
        }

        let percent = self.percent_done();
        self.publish_progress(format!("Building lighting: {percent:.0}%"), events);

        if !finished {
            return TickOutcome::Continue;
        }

        self.statistics
            .add(StatPhase::Processing, self.processing_timer.elapsed());
        self.waiting_timer = Some(Stopwatch::new());

        let succeeded = self
            .client
            .as_ref()
            .is_some_and(|client| client.is_processing_completed_successfully());
        if succeeded {
            self.set_stage(BuildStage::AutoApplyingImport, events);
            TickOutcome::Continue
        } else {
            log::warn!("StaticLightingSystem: Remote processing did not complete successfully.");
            TickOutcome::Fail(None)
        }
    }

    // --- AutoApplyingImport ---

    fn update_auto_applying_import(
        &mut self,
        context: &BuildContext<'_>,
        events: &EventBus<BuildEvent>,
    ) -> TickOutcome {
        if self.config.editor.auto_apply_lighting && context.editor.allows_auto_apply() {
            events.publish(BuildEvent::BuildDone {
                review_required: false,
            });
            return TickOutcome::AutoApply;
        }

        self.set_stage(BuildStage::WaitingForImport, events);
        if !self.review_notified {
            self.review_notified = true;
            log::info!("StaticLightingSystem: Lighting build completed, waiting for the user.");
            events.publish(BuildEvent::BuildDone {
                review_required: true,
            });
        }
        TickOutcome::Continue
    }

    // --- Import ---

    /// Imports every result, applies it and commits the new lighting.
    ///
    /// Returns whether the build succeeded. Called by the manager once the user
    /// accepted the results, or right away when they are auto-applied.
    pub fn finish_lightmass_process(
        &mut self,
        world: &mut dyn StaticLightingWorld,
        events: &EventBus<BuildEvent>,
    ) -> bool {
        let waiting = self
            .waiting_timer
            .take()
            .map_or(Duration::ZERO, |timer| timer.elapsed());
        self.statistics.set(StatPhase::WaitingForUser, waiting);
        self.set_stage(BuildStage::Import, events);

        if !self.invalidated {
            self.invalidate(world);
        }

        let mut success = false;
        if let Some(client) = self.client.as_mut() {
            match client.complete_run() {
                Ok(()) => {
                    let mut session = ImportSession {
                        client,
                        set: &self.set,
                        world: &mut *world,
                        apply: &self.apply,
                        statistics: &self.statistics,
                    };
                    match self.import.complete(&mut session) {
                        Ok(imported) => {
                            log::info!("StaticLightingSystem: Imported {imported} mappings.");
                            success = true;
                        }
                        Err(e) => log::error!("StaticLightingSystem: Import failed: {e}"),
                    }
                }
                Err(e) => log::error!("StaticLightingSystem: Complete run failed: {e}"),
            }
        }

        {
            let _encoding = self.statistics.scoped(StatPhase::Encoding);
            world.encode_textures(self.options.quality.encode_quality(), success);
        }

        {
            let _finishing = self.statistics.scoped(StatPhase::Finishing);
            if let Some(client) = self.client.as_mut() {
                if let Err(e) = client.close_job() {
                    log::error!("StaticLightingSystem: Close job failed: {e}");
                    success = false;
                }
            }
        }
        self.statistics.merge_from(&self.swarm_statistics);
        self.build_canceled |= self.cancel.is_requested();
        success &= !self.build_canceled;

        {
            let _apply = self.statistics.scoped(StatPhase::Apply);
            let request = self.apply_request(success, self.build_canceled);
            self.apply.apply_new_lighting_data(world, request, events);
        }
        self.post_invalidate(world);

        let total = self.build_timer.elapsed().saturating_sub(waiting);
        self.statistics.set(StatPhase::Total, total);
        if self.config.debug.stats_enabled {
            report_statistics(&self.statistics);
        }
        success
    }

    fn apply_request(&self, success: bool, canceled: bool) -> ApplyRequest<'_> {
        ApplyRequest {
            success,
            canceled,
            only_build_selected: self.options.only_build_selected,
            quality: self.options.quality,
            lights: &self.set.lights,
            scope: &self.scope,
        }
    }

    fn invalidate(&mut self, world: &mut dyn StaticLightingWorld) {
        let _invalidation = self.statistics.scoped(StatPhase::Invalidation);
        self.apply
            .invalidate_static_lighting(world, &self.scope, self.options.only_build_visibility);
        self.invalidated = true;
    }

    fn post_invalidate(&mut self, world: &mut dyn StaticLightingWorld) {
        let _invalidation = self.statistics.scoped(StatPhase::Invalidation);
        self.apply.post_invalidate_static_lighting(world, &self.scope);
        self.enqueued_released = true;
    }
}

impl std::fmt::Debug for StaticLightingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticLightingSystem")
            .field("stage", &self.stage)
            .field("options", &self.options)
            .field("meshes", &self.set.meshes().len())
            .field("mappings", &self.set.mappings().len())
            .field("import", &self.import.strategy_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::math::{Aabb, Vec3};
    use lumen_core::scene::LevelId;
    use lumen_infra::{InMemoryScene, LocalSwarm};

    fn system(config: LightmassConfig) -> StaticLightingSystem {
        StaticLightingSystem::new(
            BuildOptions::default(),
            config,
            Box::new(LocalSwarm::default()),
            CancelFlag::new(),
        )
    }

    fn scene() -> InMemoryScene {
        let mut scene = InMemoryScene::new();
        let actor = scene.add_actor(LevelId(0));
        scene.add_static_mesh(actor, (32, 32), Aabb::from_min_max(Vec3::ZERO, Vec3::ONE));
        scene.add_static_mesh(actor, (64, 64), Aabb::from_min_max(Vec3::ONE, Vec3::splat(2.0)));
        scene
    }

    #[test]
    fn test_new_system_waits_for_its_first_tick() {
        let system = system(LightmassConfig::default());

        assert_eq!(system.stage(), BuildStage::Startup);
        assert_eq!(system.percent_done(), 0.0);
        assert!(system.set().is_empty());
    }

    #[test]
    fn test_startup_gathers_indexes_and_connects() {
        // --- 1. ARRANGE ---
        let mut system = system(LightmassConfig::default());
        let mut scene = scene();
        let events = EventBus::new();

        // --- 2. ACT ---
        let outcome = {
            let mut context = BuildContext::new(&mut scene);
            system.update(&mut context, &events)
        };

        // --- 3. ASSERT ---
        assert!(matches!(outcome, TickOutcome::Continue));
        assert_eq!(system.stage(), BuildStage::AmortizedExport);
        assert_eq!(system.set().mappings().len(), 2);
        assert_eq!(
            system.set().mapping_guid(0),
            Some(lumen_core::lighting::LightingGuid::deterministic(0)),
            "the larger mapping is sorted first"
        );
        assert_eq!(system.set().mappings()[0].texel_count(), 64 * 64);
        assert!(events.drain().contains(&BuildEvent::StageChanged {
            stage: BuildStage::AmortizedExport,
            percent: 0.0,
        }));
    }

    #[test]
    fn test_pending_cancel_fails_outside_the_remote_run() {
        let cancel = CancelFlag::new();
        let mut system = StaticLightingSystem::new(
            BuildOptions::default(),
            LightmassConfig::default(),
            Box::new(LocalSwarm::default()),
            cancel.clone(),
        );
        let mut scene = scene();
        cancel.request();

        let mut context = BuildContext::new(&mut scene);
        let outcome = system.update(&mut context, &EventBus::new());

        assert!(matches!(outcome, TickOutcome::Fail(None)));
        assert_eq!(system.stage(), BuildStage::Startup);
    }

    #[test]
    fn test_unreleased_components_are_handed_out_once() {
        let mut system = system(LightmassConfig::default());
        let mut scene = scene();
        let mut context = BuildContext::new(&mut scene);
        system.update(&mut context, &EventBus::new());

        assert_eq!(system.take_unreleased_components().len(), 2);
        assert!(system.take_unreleased_components().is_empty());
    }
}
