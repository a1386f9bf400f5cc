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

//! The 128-bit identifier of a static lighting mesh.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A 128-bit identifier split in four 32-bit words.
///
/// Meshes whose mapping is processed by a build receive a *deterministic* guid
/// of the form `(0, 0, 0, index)`, which remote workers use as a dense array
/// index. Every other mesh keeps the persistent guid of its scene component.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LightingGuid {
    /// First word.
    pub a: u32,
    /// Second word.
    pub b: u32,
    /// Third word.
    pub c: u32,
    /// Fourth word; holds the dense index for deterministic guids.
    pub d: u32,
}

impl LightingGuid {
    /// Creates a guid from its four words.
    #[inline]
    pub const fn new(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self { a, b, c, d }
    }

    /// The deterministic guid for the mapping at dense `index`.
    #[inline]
    pub const fn deterministic(index: u32) -> Self {
        Self::new(0, 0, 0, index)
    }

    /// Splits a persistent component uuid into guid words.
    pub fn from_uuid(uuid: Uuid) -> Self {
        let v = uuid.as_u128();
        Self::new(
            (v >> 96) as u32,
            (v >> 64) as u32,
            (v >> 32) as u32,
            v as u32,
        )
    }

    /// Returns the dense index if this guid has the deterministic shape and
    /// its index is below `count`.
    pub fn deterministic_index(&self, count: usize) -> Option<usize> {
        if self.a == 0 && self.b == 0 && self.c == 0 && (self.d as usize) < count {
            Some(self.d as usize)
        } else {
            None
        }
    }
}

impl fmt::Display for LightingGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}{:08X}{:08X}{:08X}", self.a, self.b, self.c, self.d)
    }
}
