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

//! Event-driven communication between the build and the notification layer.
//!
//! The [`EventBus`] is generic; [`BuildEvent`] is what the lighting build
//! publishes on it. The UI drains the receiver and renders what it wants.

mod build_event;
mod bus;

pub use self::build_event::{BuildEvent, BuildOutcome, Severity};
pub use self::bus::EventBus;
