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

//! Results produced by the remote workers for one mapping.

use super::LightingGuid;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quantized lightmap texels for one mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedLightmapData {
    /// Width in texels.
    pub size_x: u32,
    /// Height in texels.
    pub size_y: u32,
    /// Per-channel scale applied when dequantizing.
    pub scale: [f32; 4],
    /// RGBA8 texels, row-major, `size_x * size_y` entries.
    pub texels: Vec<[u8; 4]>,
}

/// Quantized shadow visibility for one light over one mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowMapData {
    /// Persistent guid of the light this visibility belongs to.
    pub light: Uuid,
    /// Width in texels.
    pub size_x: u32,
    /// Height in texels.
    pub size_y: u32,
    /// Visibility texels, `0` fully shadowed to `255` fully lit.
    pub texels: Vec<u8>,
}

/// Everything imported for a single mapping, keyed by its deterministic guid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    /// Guid of the mapping's mesh.
    pub guid: LightingGuid,
    /// Lightmap texels, absent for shadow-only or visibility-only results.
    pub lightmap: Option<QuantizedLightmapData>,
    /// One entry per stationary light with static shadowing.
    pub shadow_maps: Vec<ShadowMapData>,
    /// Remote time spent on this mapping.
    pub execution_time_secs: f32,
}

impl MappingResult {
    /// Total number of texels carried by this result, lightmap and shadow maps combined.
    pub fn texel_count(&self) -> usize {
        self.lightmap.as_ref().map_or(0, |l| l.texels.len())
            + self.shadow_maps.iter().map(|s| s.texels.len()).sum::<usize>()
    }
}
