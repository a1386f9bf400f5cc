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

//! Immutable configuration for a single lighting build.

use crate::lighting::LightingQuality;
use crate::scene::{LevelId, LevelInfo};

/// Which levels a build is allowed to touch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LevelFilter {
    /// Every level visible in the editor.
    #[default]
    All,
    /// Only the listed levels, and only if they are visible in the editor.
    Only(Vec<LevelId>),
}

/// Options for one build request. Created once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Requested quality level.
    pub quality: LightingQuality,
    /// Level filter.
    pub level_filter: LevelFilter,
    /// Restrict the build to selected actors and BSP surfaces.
    pub only_build_selected: bool,
    /// Only rebuild precomputed visibility, no lighting is written back.
    pub only_build_visibility: bool,
    /// Number of local cores the remote pool should leave unused.
    pub num_unused_local_cores: u32,
    /// Dump imported binary results to the diagnostic directory.
    pub dump_binary_results: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            quality: LightingQuality::default(),
            level_filter: LevelFilter::All,
            only_build_selected: false,
            only_build_visibility: false,
            num_unused_local_cores: 1,
            dump_binary_results: false,
        }
    }
}

impl BuildOptions {
    /// Sets the quality level.
    pub fn with_quality(mut self, quality: LightingQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Restricts the build to the given levels.
    pub fn with_levels(mut self, levels: Vec<LevelId>) -> Self {
        self.level_filter = LevelFilter::Only(levels);
        self
    }

    /// Whether the given level passes the editor visibility check and the level filter.
    pub fn should_build_lighting_for_level(&self, level: &LevelInfo) -> bool {
        if !level.visible_in_editor {
            return false;
        }
        match &self.level_filter {
            LevelFilter::All => true,
            LevelFilter::Only(levels) => levels.contains(&level.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(id: u32, visible: bool) -> LevelInfo {
        LevelInfo {
            id: LevelId(id),
            name: format!("Level{id}"),
            is_persistent: id == 0,
            visible_in_editor: visible,
            geometry_dirty_for_lighting: false,
        }
    }

    #[test]
    fn test_hidden_levels_are_never_built() {
        let options = BuildOptions::default();
        assert!(options.should_build_lighting_for_level(&level(0, true)));
        assert!(!options.should_build_lighting_for_level(&level(1, false)));
    }

    #[test]
    fn test_level_filter_restricts_levels() {
        let options = BuildOptions::default().with_levels(vec![LevelId(2)]);
        assert!(!options.should_build_lighting_for_level(&level(0, true)));
        assert!(options.should_build_lighting_for_level(&level(2, true)));
        assert!(!options.should_build_lighting_for_level(&level(2, false)));
    }
}
