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

//! # Lane Abstraction
//!
//! A **Lane** is a swappable processing strategy owned by an agent. Each stage
//! of the lighting build delegates its work to one: gathering, indexing,
//! exporting, importing and applying.
//!
//! Domain-specific traits extend [`Lane`] with the methods their agent calls,
//! for example the import strategies in `lumen-lanes`.

use std::any::Any;
use std::fmt;

/// Error type for lane operations.
#[derive(Debug)]
pub enum LaneError {
    /// The lane was asked to do something its current state does not allow.
    InvalidState(String),
    /// A domain-specific error occurred during execution.
    ExecutionFailed(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for LaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneError::InvalidState(msg) => write!(f, "Invalid lane state: {msg}"),
            LaneError::ExecutionFailed(e) => write!(f, "Lane execution failed: {e}"),
        }
    }
}

impl std::error::Error for LaneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaneError::ExecutionFailed(e) => Some(e.as_ref()),
            LaneError::InvalidState(_) => None,
        }
    }
}

impl LaneError {
    /// Wraps a domain error.
    pub fn execution(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        LaneError::ExecutionFailed(Box::new(e))
    }
}

/// Classification of lane types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Scene gathering.
    Gather,
    /// Deterministic identity assignment.
    Index,
    /// Job input export.
    Export,
    /// Result import.
    Import,
    /// Result application and invalidation.
    Apply,
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneKind::Gather => write!(f, "Gather"),
            LaneKind::Index => write!(f, "Index"),
            LaneKind::Export => write!(f, "Export"),
            LaneKind::Import => write!(f, "Import"),
            LaneKind::Apply => write!(f, "Apply"),
        }
    }
}

/// The common interface shared by all lanes.
pub trait Lane: Send + Sync {
    /// Human-readable, unique name of this strategy, used in logs.
    fn strategy_name(&self) -> &'static str;

    /// What this lane does.
    fn lane_kind(&self) -> LaneKind;

    /// Allows downcasting to concrete lane types.
    fn as_any(&self) -> &dyn Any;

    /// Allows mutable downcasting to concrete lane types.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom")
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn test_lane_error_keeps_source() {
        use std::error::Error;

        let err = LaneError::execution(Boom);
        assert_eq!(err.to_string(), "Lane execution failed: boom");
        assert!(err.source().is_some());
        assert!(LaneError::InvalidState("x".into()).source().is_none());
    }
}
