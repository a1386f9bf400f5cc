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

//! Selection of the lights that take part in a build.

use lumen_core::scene::{LightId, LightInfo, LightKind};

/// Lights eligible for static lighting, in scene order.
pub fn gather_lights(all: Vec<LightInfo>) -> Vec<LightInfo> {
    let total = all.len();
    let lights: Vec<LightInfo> = all
        .into_iter()
        .filter(LightInfo::is_eligible_for_static_lighting)
        .collect();
    log::debug!(
        "SceneGatherLane: {} of {} lights are eligible for static lighting.",
        lights.len(),
        total
    );
    lights
}

/// Lights that may enter a primitive's relevant-light list. Sky lights never do.
pub fn relevance_candidates(lights: &[LightInfo]) -> Vec<LightId> {
    lights
        .iter()
        .filter(|l| l.kind != LightKind::Sky)
        .map(|l| l.id)
        .collect()
}
