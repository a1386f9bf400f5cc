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

//! Per-tick context handed to the lighting build by the host.

use crate::scene::StaticLightingWorld;

/// Snapshot of editor conditions that gate applying results without asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConditions {
    /// A blocking modal task is in progress.
    pub is_slow_task_active: bool,
    /// An interactive edit mode that conflicts with re-registration is active.
    pub is_interp_edit_mode_active: bool,
    /// A play session is running.
    pub is_play_session_active: bool,
    /// A blocking menu is open.
    pub any_menus_visible: bool,
    /// The user is dragging, typing or otherwise interacting.
    pub is_user_interacting: bool,
    /// A project or game context is loaded.
    pub has_project_loaded: bool,
}

impl EditorConditions {
    /// An idle editor with a project loaded.
    pub const fn idle() -> Self {
        Self {
            is_slow_task_active: false,
            is_interp_edit_mode_active: false,
            is_play_session_active: false,
            any_menus_visible: false,
            is_user_interacting: false,
            has_project_loaded: true,
        }
    }

    /// True when nothing in the editor prevents applying results immediately.
    pub fn allows_auto_apply(&self) -> bool {
        !self.is_slow_task_active
            && !self.is_interp_edit_mode_active
            && !self.is_play_session_active
            && !self.any_menus_visible
            && !self.is_user_interacting
            && self.has_project_loaded
    }
}

impl Default for EditorConditions {
    fn default() -> Self {
        Self::idle()
    }
}

/// Context providing access to the scene and the editor state for one tick.
pub struct BuildContext<'a> {
    /// The scene being lit. Only the gather and apply lanes mutate it.
    pub world: &'a mut dyn StaticLightingWorld,
    /// Editor conditions sampled by the host for this tick.
    pub editor: EditorConditions,
}

impl<'a> BuildContext<'a> {
    /// Creates a context for an idle editor.
    pub fn new(world: &'a mut dyn StaticLightingWorld) -> Self {
        Self {
            world,
            editor: EditorConditions::idle(),
        }
    }

    /// Replaces the editor conditions.
    pub fn with_editor(mut self, editor: EditorConditions) -> Self {
        self.editor = editor;
        self
    }
}
