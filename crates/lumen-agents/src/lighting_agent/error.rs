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

//! Errors that stop a lighting build.

use lumen_core::swarm::SwarmError;
use lumen_lanes::ExportError;
use thiserror::Error;

/// Text of the failure notification when no more specific reason is known.
pub const BUILD_FAILED_MESSAGE: &str = "Lighting build failed.";

/// Text of the failure notification after a cancel request.
pub const BUILD_CANCELED_MESSAGE: &str = "Lighting build canceled.";

/// Text of the failure notification when the run could not be started.
pub const KICKOFF_FAILED_MESSAGE: &str = "Lighting build failed. Swarm failed to kick off.";

/// Errors raised while creating or running a build.
///
/// Every variant except [`BuildError::Export`] is a setup error: it is shown
/// to the user as a dialog and the build is destroyed without ever having
/// opened a remote job.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A build is already active.
    #[error("A lighting build is already in progress! Please cancel it before triggering a new build.")]
    AlreadyRunning,
    /// Visibility-only was requested for a world that does not precompute visibility.
    #[error("'Build Only Visibility' option was enabled but precomputed visibility is disabled!  Aborting build.")]
    VisibilityDisabled,
    /// The worker pool refused the connection.
    #[error("Failed to connect to Swarm.")]
    ConnectionFailed(#[source] SwarmError),
    /// The worker pool refused the job.
    #[error("Failed to open the lighting job: {0}")]
    JobOpenFailed(#[source] SwarmError),
    /// The scene could not be exported.
    #[error("Failed to export the scene: {0}")]
    Export(#[from] ExportError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_setup_errors_read_as_dialog_text() {
        assert_eq!(
            BuildError::ConnectionFailed(SwarmError::NotConnected).to_string(),
            "Failed to connect to Swarm."
        );
        assert!(BuildError::VisibilityDisabled
            .to_string()
            .starts_with("'Build Only Visibility'"));
    }

    #[test]
    fn test_swarm_failures_keep_their_source() {
        let err = BuildError::JobOpenFailed(SwarmError::NotConnected);
        assert!(err.source().is_some());
        assert!(BuildError::AlreadyRunning.source().is_none());
    }
}
