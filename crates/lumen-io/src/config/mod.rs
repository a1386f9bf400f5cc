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

//! Lighting build configuration, loaded from RON.
//!
//! Every section is `#[serde(default)]`, so a file only needs the values it
//! changes:
//!
//! ```ron
//! (
//!     debug: (sort_mappings: false, import_mode: Immediate),
//!     export: (items_per_tick: 16),
//! )
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or saving a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config I/O failed for {}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid RON for this configuration.
    #[error("config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The configuration could not be written as RON.
    #[error("config serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

/// How mapping results are brought back into the scene.
///
/// Chosen once per build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportMode {
    /// Import every mapping in one pass after the run completes.
    #[default]
    Deferred,
    /// Import and apply each mapping as soon as the pool reports it.
    Immediate,
}

/// Scene-wide static lighting switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticLightingConfig {
    /// Rebuild BSP geometry flagged as dirty before gathering.
    pub rebuild_dirty_geometry_for_lighting: bool,
    /// Color texels by error instead of lighting, for debugging.
    pub use_error_coloring: bool,
}

impl Default for StaticLightingConfig {
    fn default() -> Self {
        Self {
            rebuild_dirty_geometry_for_lighting: true,
            use_error_coloring: false,
        }
    }
}

/// Importance volume constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// A synthesized volume larger than this is clamped and reported.
    pub min_importance_volume_extent_without_warning: f32,
    /// Margin added to a synthesized volume of reasonable size.
    pub automatic_importance_volume_expand_by: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            min_importance_volume_extent_without_warning: 10000.0,
            automatic_importance_volume_expand_by: 500.0,
        }
    }
}

/// Developer switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Sort mappings by descending texel count before assigning guids.
    pub sort_mappings: bool,
    /// Import strategy.
    pub import_mode: ImportMode,
    /// Let BSP node groups span several model components.
    pub gather_bsp_surfaces_across_components: bool,
    /// Log the statistics report after every build.
    pub stats_enabled: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            sort_mappings: true,
            import_mode: ImportMode::Deferred,
            gather_bsp_surfaces_across_components: true,
            stats_enabled: true,
        }
    }
}

/// Amortized export tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Meshes plus mappings exported per tick.
    pub items_per_tick: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { items_per_tick: 64 }
    }
}

/// Editor integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Apply finished builds without asking when the editor allows it.
    pub auto_apply_lighting: bool,
    /// Drop old lightmaps when invalidating.
    pub purge_old_lightmaps: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            auto_apply_lighting: true,
            purge_old_lightmaps: true,
        }
    }
}

/// Diagnostic dump location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Directory cleared before each build that dumps binary results.
    pub directory: PathBuf,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("Saved/Logs/Lighting_Lightmass"),
        }
    }
}

/// The whole configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightmassConfig {
    /// Static lighting switches.
    pub static_lighting: StaticLightingConfig,
    /// Importance volume constants.
    pub scene: SceneConfig,
    /// Developer switches.
    pub debug: DebugConfig,
    /// Export tuning.
    pub export: ExportConfig,
    /// Editor integration.
    pub editor: EditorConfig,
    /// Dump location.
    pub dump: DumpConfig,
}

impl LightmassConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::de::from_str(text)?)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&text)?;
        log::info!("LightmassConfig: Loaded {}", path.display());
        Ok(config)
    }

    /// Loads a configuration file, falling back to defaults on any error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("LightmassConfig: {e}; using defaults");
                Self::default()
            }
        }
    }

    /// Pretty RON text for this configuration.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().indentor("    ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Writes this configuration to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = self.to_ron_string()?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = LightmassConfig::from_ron_str(
            "(debug: (sort_mappings: false, import_mode: Immediate), export: (items_per_tick: 3))",
        )
        .expect("valid RON");

        assert!(!config.debug.sort_mappings);
        assert_eq!(config.debug.import_mode, ImportMode::Immediate);
        assert!(config.debug.gather_bsp_surfaces_across_components);
        assert_eq!(config.export.items_per_tick, 3);
        assert_eq!(config.scene, SceneConfig::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = LightmassConfig::from_ron_str("()").expect("valid RON");
        assert_eq!(config, LightmassConfig::default());
    }

    #[test]
    fn test_invalid_text_is_parse_error() {
        let err = LightmassConfig::from_ron_str("(debug: (sort_mappings: maybe))").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
