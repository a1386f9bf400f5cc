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

use anyhow::{bail, Result};
use lumen_agents::StaticLightingManager;
use lumen_core::agent::Agent;
use lumen_core::event::{BuildEvent, BuildOutcome};
use lumen_core::math::{Aabb, Vec3};
use lumen_core::scene::{LightKind, Mobility};
use lumen_core::swarm::SwarmChannel;
use lumen_core::{BuildContext, BuildOptions, EditorConditions};
use lumen_infra::{InMemoryScene, LocalSwarm, LocalSwarmConfig};
use lumen_io::LightmassConfig;
use std::time::{Duration, Instant};

const CONFIG_PATH: &str = "lightmass.ron";
const BUILD_TIMEOUT: Duration = Duration::from_secs(30);

fn build_scene() -> InMemoryScene {
    let mut scene = InMemoryScene::new();
    let level = scene.persistent_level();
    let actor = scene.add_actor(level);
    for x in 0..4 {
        for z in 0..4 {
            let min = Vec3::new(x as f32 * 300.0, 0.0, z as f32 * 300.0);
            let bounds = Aabb::from_min_max(min, min + Vec3::splat(250.0));
            scene.add_static_mesh(actor, (32, 32), bounds);
        }
    }
    scene.add_light(LightKind::Directional, Mobility::Stationary);
    scene.add_light(LightKind::Point, Mobility::Static);
    scene
}

fn main() -> Result<()> {
    lumen_telemetry::init_logging("info");

    let config = LightmassConfig::load_or_default(CONFIG_PATH);
    let swarm = LocalSwarmConfig {
        mapping_delay: Duration::from_millis(5),
        ..LocalSwarmConfig::default()
    };
    let mut manager = StaticLightingManager::new(
        config,
        Box::new(move || -> Box<dyn SwarmChannel> { Box::new(LocalSwarm::new(swarm.clone())) }),
    );
    let mut scene = build_scene();

    manager.create_static_lighting_system(BuildOptions::default())?;

    let deadline = Instant::now() + BUILD_TIMEOUT;
    let outcome = loop {
        if Instant::now() > deadline {
            manager.shutdown();
            bail!("lighting build did not finish in {BUILD_TIMEOUT:?}");
        }

        let mut context = BuildContext::new(&mut scene).with_editor(EditorConditions::idle());
        manager.update(&mut context);

        let mut finished = None;
        for event in manager.events().drain() {
            match event {
                BuildEvent::Progress { text, .. } => log::info!("{text}"),
                BuildEvent::Warning(text) | BuildEvent::Dialog(text) => log::warn!("{text}"),
                BuildEvent::Failed { message, .. } => log::error!("{message}"),
                BuildEvent::BuildDone {
                    review_required: true,
                } => {
                    log::info!("Results ready, applying.");
                    manager.process_lighting_data(false, &mut scene);
                }
                BuildEvent::Finished(outcome) => finished = Some(outcome),
                _ => {}
            }
        }
        if let Some(outcome) = finished {
            break outcome;
        }
        std::thread::sleep(Duration::from_millis(1));
    };

    log::info!("Status: {}", manager.report_status().message);
    manager.shutdown();

    if outcome != BuildOutcome::Succeeded {
        bail!("lighting build ended: {outcome}");
    }
    Ok(())
}
