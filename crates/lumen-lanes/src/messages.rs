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

use lumen_core::event::{BuildEvent, EventBus, Severity};

/// Logs `text` and publishes it to the message log.
pub(crate) fn publish_message(events: &EventBus<BuildEvent>, severity: Severity, text: String) {
    match severity {
        Severity::Info => log::info!("{text}"),
        Severity::Warning | Severity::PerformanceWarning => log::warn!("{text}"),
        Severity::Error => log::error!("{text}"),
    }
    events.publish(BuildEvent::MessageLog { severity, text });
}
