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

//! Traits for autonomous subsystems (Agents) driven by the host tick loop.

use crate::context::BuildContext;
use std::any::Any;
use std::fmt;

/// Identifies an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentId {
    /// The static lighting build manager.
    StaticLighting,
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A snapshot of an agent's state for telemetry and UI.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStatus {
    /// The reporting agent.
    pub agent_id: AgentId,
    /// Whether the agent is doing work.
    pub is_busy: bool,
    /// Progress of the current work, `0.0..=1.0`.
    pub progress: f32,
    /// True if the agent is waiting on something outside its control.
    pub is_stalled: bool,
    /// Human-readable status message.
    pub message: String,
}

/// A subsystem updated once per host tick.
pub trait Agent: Send {
    /// Returns the unique identifier for this agent.
    fn id(&self) -> AgentId;

    /// Performs this tick's work. Must not block.
    fn update(&mut self, context: &mut BuildContext<'_>);

    /// Reports the current status of the agent.
    fn report_status(&self) -> AgentStatus;

    /// Allows downcasting to concrete agent types.
    fn as_any(&self) -> &dyn Any;

    /// Allows mutable downcasting to concrete agent types.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
