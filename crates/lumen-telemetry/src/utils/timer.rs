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

//! Provides an RAII timer that adds the duration of a scope to a statistic.

use crate::statistics::{LightmassStatistics, StatPhase};
use lumen_core::utils::timer::Stopwatch;

/// Times a scope and adds the result to one phase when dropped.
///
/// The timer owns a handle to the accumulator, so the scope it measures may
/// freely borrow the rest of its owner mutably.
pub struct ScopedGather {
    stopwatch: Stopwatch,
    statistics: LightmassStatistics,
    phase: StatPhase,
}

impl ScopedGather {
    /// Creates a timer for `phase` and starts it immediately.
    pub fn new(statistics: LightmassStatistics, phase: StatPhase) -> Self {
        Self {
            stopwatch: Stopwatch::new(),
            statistics,
            phase,
        }
    }
}

impl Drop for ScopedGather {
    fn drop(&mut self) {
        self.statistics.add(self.phase, self.stopwatch.elapsed());
    }
}
