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

//! Identity, quality and result types shared by every stage of the lighting build.

mod guid;
mod result;

pub use self::guid::LightingGuid;
pub use self::result::{MappingResult, QuantizedLightmapData, ShadowMapData};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality level requested for a lighting build.
///
/// Ordered from cheapest to most expensive.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum LightingQuality {
    /// Fast, low-precision preview.
    #[default]
    Preview,
    /// Medium quality.
    Medium,
    /// High quality.
    High,
    /// Final shipping quality.
    Production,
}

impl LightingQuality {
    /// The texture encoder quality level derived from the build quality.
    ///
    /// Preview builds encode at the lowest level, every other quality at level 2.
    pub fn encode_quality(&self) -> u32 {
        match self {
            LightingQuality::Preview => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for LightingQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightingQuality::Preview => write!(f, "Preview"),
            LightingQuality::Medium => write!(f, "Medium"),
            LightingQuality::High => write!(f, "High"),
            LightingQuality::Production => write!(f, "Production"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_quality_from_build_quality() {
        assert_eq!(LightingQuality::Preview.encode_quality(), 0);
        assert_eq!(LightingQuality::Medium.encode_quality(), 2);
        assert_eq!(LightingQuality::Production.encode_quality(), 2);
    }

    #[test]
    fn test_quality_ordering() {
        assert!(LightingQuality::Preview < LightingQuality::Medium);
        assert!(LightingQuality::High < LightingQuality::Production);
    }
}
