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

use crate::stage::BuildStage;
use std::fmt;

/// Severity of a message-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational.
    Info,
    /// Something the user should look at.
    Warning,
    /// Something went wrong but the build continues.
    Error,
    /// The build will be slow or use a lot of memory.
    PerformanceWarning,
}

/// How a build ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Results were applied.
    Succeeded,
    /// The build failed, remotely or while applying.
    Failed,
    /// The user or the system canceled.
    Canceled,
    /// The user discarded finished results.
    Discarded,
    /// Setup failed before any remote job was opened.
    Aborted,
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildOutcome::Succeeded => "succeeded",
            BuildOutcome::Failed => "failed",
            BuildOutcome::Canceled => "canceled",
            BuildOutcome::Discarded => "discarded",
            BuildOutcome::Aborted => "aborted",
        };
        write!(f, "{name}")
    }
}

/// Notification published by the lighting build.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    /// The build entered a new stage.
    StageChanged {
        /// New stage.
        stage: BuildStage,
        /// Overall percent done, `0..=100`.
        percent: f32,
    },
    /// Progress text for the current stage.
    Progress {
        /// Current stage.
        stage: BuildStage,
        /// Percent done for this stage, `0..=100`.
        percent: f32,
        /// Text to show.
        text: String,
    },
    /// The remote run finished and results are ready.
    BuildDone {
        /// The user has to choose Apply or Discard.
        review_required: bool,
    },
    /// The build failed or was canceled.
    Failed {
        /// Text to show.
        message: String,
        /// The user or the system canceled.
        canceled: bool,
    },
    /// Terminal event, published once per build.
    Finished(BuildOutcome),
    /// A blocking dialog.
    Dialog(String),
    /// A transient warning toast.
    Warning(String),
    /// An entry in the lighting message log.
    MessageLog {
        /// Severity.
        severity: Severity,
        /// Text.
        text: String,
    },
    /// The current notification should be dismissed.
    NotificationCleared,
}
