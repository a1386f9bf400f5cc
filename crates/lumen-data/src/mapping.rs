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

//! The destination of computed lighting texels for one mesh.

use crate::mesh::MeshIndex;

/// Receives computed lightmap and shadowmap texels for exactly one mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticLightingMapping {
    /// The mesh this mapping is for.
    pub mesh: MeshIndex,
    /// Lightmap width in texels.
    pub size_x: u32,
    /// Lightmap height in texels.
    pub size_y: u32,
    /// Results are written back. When false the mapping is solver context only.
    pub process_mapping: bool,
    /// Human readable description.
    pub description: String,
}

impl StaticLightingMapping {
    /// Number of texels of the mapping's lightmap.
    pub fn texel_count(&self) -> u64 {
        u64::from(self.size_x) * u64::from(self.size_y)
    }
}
