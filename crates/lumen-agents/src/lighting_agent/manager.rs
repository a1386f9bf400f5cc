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

//! Defines the StaticLightingManager, the host-facing owner of lighting builds.

use super::error::{BuildError, BUILD_CANCELED_MESSAGE, BUILD_FAILED_MESSAGE};
use super::system::{StaticLightingSystem, TickOutcome};
use lumen_core::agent::{Agent, AgentId, AgentStatus};
use lumen_core::cancel::CancelFlag;
use lumen_core::context::BuildContext;
use lumen_core::event::{BuildEvent, BuildOutcome, EventBus};
use lumen_core::options::BuildOptions;
use lumen_core::scene::{ComponentId, StaticLightingWorld};
use lumen_core::stage::BuildStage;
use lumen_core::swarm::SwarmChannel;
use lumen_io::LightmassConfig;
use std::any::Any;

/// Text of the notification once new lighting is committed.
pub const BUILD_COMPLETED_MESSAGE: &str = "Lighting build completed";

/// Opens a fresh channel to the worker pool for each build.
pub type SwarmChannelFactory = Box<dyn Fn() -> Box<dyn SwarmChannel> + Send>;

/// Owns at most one [`StaticLightingSystem`] and drives it from the host tick.
///
/// A second build request while one is active is rejected with a warning.
/// Cancel, fail, apply and discard all end in
/// [`destroy_static_lighting_system`](Self::destroy_static_lighting_system),
/// which is the only place a build is dropped and the only place
/// [`BuildEvent::Finished`] is published.
pub struct StaticLightingManager {
    config: LightmassConfig,
    channel_factory: SwarmChannelFactory,
    system: Option<StaticLightingSystem>,
    events: EventBus<BuildEvent>,
    cancel: CancelFlag,
    /// Enqueued flags left behind by a build torn down before its sweep.
    unreleased: Vec<ComponentId>,
    last_outcome: Option<BuildOutcome>,
}

impl StaticLightingManager {
    /// Creates an idle manager.
    pub fn new(config: LightmassConfig, channel_factory: SwarmChannelFactory) -> Self {
        Self {
            config,
            channel_factory,
            system: None,
            events: EventBus::new(),
            cancel: CancelFlag::new(),
            unreleased: Vec::new(),
            last_outcome: None,
        }
    }

    /// The configuration every build is created with.
    pub fn config(&self) -> &LightmassConfig {
        &self.config
    }

    /// Notifications for the host UI.
    pub fn events(&self) -> &EventBus<BuildEvent> {
        &self.events
    }

    /// A handle that cancels the active build from any thread.
    pub fn cancel_handle(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// The active build, if any.
    pub fn system(&self) -> Option<&StaticLightingSystem> {
        self.system.as_ref()
    }

    /// Stage of the active build, `NotRunning` when idle.
    pub fn stage(&self) -> BuildStage {
        self.system
            .as_ref()
            .map_or(BuildStage::NotRunning, |system| system.stage())
    }

    /// How the last torn-down build ended.
    pub fn last_outcome(&self) -> Option<BuildOutcome> {
        self.last_outcome
    }

    /// Whether a build exists.
    pub fn is_lighting_build_currently_running(&self) -> bool {
        self.system.is_some()
    }

    /// Starts a build. Its startup runs on the next tick.
    ///
    /// Fails with [`BuildError::AlreadyRunning`] and leaves the active build
    /// untouched if one exists.
    pub fn create_static_lighting_system(
        &mut self,
        options: BuildOptions,
    ) -> Result<(), BuildError> {
        if self.system.is_some() {
            let error = BuildError::AlreadyRunning;
            log::warn!("StaticLightingManager: {error}");
            self.events.publish(BuildEvent::Warning(error.to_string()));
            return Err(error);
        }

        self.cancel.reset();
        let channel = (self.channel_factory)();
        log::info!(
            "StaticLightingManager: Starting a {} quality lighting build.",
            options.quality
        );
        let system =
            StaticLightingSystem::new(options, self.config.clone(), channel, self.cancel.clone());
        self.events.publish(BuildEvent::StageChanged {
            stage: system.stage(),
            percent: 0.0,
        });
        self.system = Some(system);
        Ok(())
    }

    /// Advances the active build by one stage step.
    pub fn update_build_lighting(&mut self, context: &mut BuildContext<'_>) {
        for component in self.unreleased.drain(..) {
            context
                .world
                .set_static_lighting_build_enqueued(component, false);
        }

        let Some(system) = self.system.as_mut() else {
            return;
        };
        match system.update(context, &self.events) {
            TickOutcome::Continue => {}
            TickOutcome::Fail(reason) => self.fail_lighting_build(reason),
            TickOutcome::Abort(error) => {
                log::error!("StaticLightingManager: {error}");
                self.events.publish(BuildEvent::Dialog(error.to_string()));
                self.destroy_static_lighting_system(BuildOutcome::Aborted);
            }
            TickOutcome::AutoApply => {
                self.process_lighting_data(false, context.world);
            }
            TickOutcome::Completed => {
                self.destroy_static_lighting_system(BuildOutcome::Succeeded);
            }
        }
    }

    /// Cancels the active build.
    ///
    /// While the pool is processing, the request is left for the job client to
    /// honor on the next tick. Any other stage fails right away.
    pub fn cancel_lighting_build(&mut self) {
        let Some(system) = self.system.as_ref() else {
            return;
        };
        self.cancel.request();
        if system.is_async_building() {
            log::info!("StaticLightingManager: Cancel requested, waiting for the worker pool.");
            self.events.publish(BuildEvent::NotificationCleared);
        } else {
            self.fail_lighting_build(None);
        }
    }

    /// Ends the active build as failed. A no-op when idle.
    ///
    /// A pending cancel request turns the message into the cancel text;
    /// otherwise `reason` replaces the generic failure text.
    pub fn fail_lighting_build(&mut self, reason: Option<String>) {
        if self.system.is_none() {
            log::debug!("StaticLightingManager: No build to fail.");
            return;
        }

        let canceled = self.cancel.is_requested();
        let message = if canceled {
            BUILD_CANCELED_MESSAGE.to_string()
        } else {
            reason.unwrap_or_else(|| BUILD_FAILED_MESSAGE.to_string())
        };
        log::warn!("StaticLightingManager: {message}");
        self.events.publish(BuildEvent::Failed { message, canceled });

        let outcome = if canceled {
            BuildOutcome::Canceled
        } else {
            BuildOutcome::Failed
        };
        self.destroy_static_lighting_system(outcome);
    }

    /// Commits or discards the results of a finished build.
    ///
    /// Only valid once the remote run has succeeded, in `AutoApplyingImport`
    /// or `WaitingForImport`. Returns whether new lighting was committed.
    pub fn process_lighting_data(
        &mut self,
        discard: bool,
        world: &mut dyn StaticLightingWorld,
    ) -> bool {
        let Some(system) = self.system.as_mut() else {
            log::warn!("StaticLightingManager: No build results to process.");
            return false;
        };
        if !matches!(
            system.stage(),
            BuildStage::AutoApplyingImport | BuildStage::WaitingForImport
        ) {
            log::warn!(
                "StaticLightingManager: Build results are not ready in stage {}.",
                system.stage()
            );
            return false;
        }

        if discard {
            log::info!("StaticLightingManager: Discarding lighting build results.");
            self.destroy_static_lighting_system(BuildOutcome::Discarded);
            return false;
        }

        if system.finish_lightmass_process(world, &self.events) {
            log::info!("StaticLightingManager: {BUILD_COMPLETED_MESSAGE}");
            self.events.publish(BuildEvent::Progress {
                stage: BuildStage::Import,
                percent: 100.0,
                text: BUILD_COMPLETED_MESSAGE.to_string(),
            });
            self.destroy_static_lighting_system(BuildOutcome::Succeeded);
            true
        } else {
            self.fail_lighting_build(None);
            false
        }
    }

    /// Cancels any active build. Called once when the host shuts down.
    pub fn shutdown(&mut self) {
        if self.system.is_some() {
            log::info!("StaticLightingManager: Shutting down with a build in progress.");
            self.cancel.request();
            self.fail_lighting_build(None);
        }
    }

    /// The single teardown path.
    fn destroy_static_lighting_system(&mut self, outcome: BuildOutcome) {
        let Some(mut system) = self.system.take() else {
            return;
        };
        self.unreleased.extend(system.take_unreleased_components());
        log::info!(
            "StaticLightingManager: Lighting build {} in stage {}.",
            outcome,
            system.stage()
        );
        drop(system);

        self.cancel.reset();
        self.last_outcome = Some(outcome);
        self.events.publish(BuildEvent::NotificationCleared);
        self.events.publish(BuildEvent::Finished(outcome));
    }
}

impl Agent for StaticLightingManager {
    fn id(&self) -> AgentId {
        AgentId::StaticLighting
    }

    fn update(&mut self, context: &mut BuildContext<'_>) {
        self.update_build_lighting(context);
    }

    fn report_status(&self) -> AgentStatus {
        let (is_busy, progress, message) = match &self.system {
            Some(system) => (
                true,
                system.percent_done() / 100.0,
                format!("Stage: {}", system.stage()),
            ),
            None => (
                false,
                0.0,
                match self.last_outcome {
                    Some(outcome) => format!("Idle, last build {outcome}"),
                    None => "Idle".to_string(),
                },
            ),
        };
        AgentStatus {
            agent_id: self.id(),
            is_busy,
            progress,
            is_stalled: self.stage() == BuildStage::WaitingForImport,
            message,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
