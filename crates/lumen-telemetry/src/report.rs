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

//! Logs the statistics of a finished build.

use crate::statistics::{LightmassStatistics, StatPhase};

/// Formats one line per phase with its share of the total.
pub fn format_statistics(statistics: &LightmassStatistics) -> Vec<String> {
    let total = statistics.get(StatPhase::Total).as_secs_f64();
    StatPhase::ALL
        .iter()
        .map(|phase| {
            let secs = statistics.get(*phase).as_secs_f64();
            let share = if total > 0.0 {
                secs / total * 100.0
            } else {
                0.0
            };
            format!("{:<26} {:>9.3}s {:>6.1}%", phase.label(), secs, share)
        })
        .collect()
}

/// Logs the statistics at info level.
pub fn report_statistics(statistics: &LightmassStatistics) {
    log::info!(
        "Illumination: {:.3}s total",
        statistics.get(StatPhase::Total).as_secs_f64()
    );
    for line in format_statistics(statistics) {
        log::info!("   {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_share_of_total() {
        let stats = LightmassStatistics::new();
        stats.set(StatPhase::Total, Duration::from_secs(4));
        stats.set(StatPhase::Import, Duration::from_secs(1));

        let lines = format_statistics(&stats);
        let import = lines
            .iter()
            .find(|l| l.starts_with("Import "))
            .expect("import line present");
        assert!(import.ends_with("25.0%"), "{import}");
    }

    #[test]
    fn test_zero_total_does_not_divide() {
        let lines = format_statistics(&LightmassStatistics::new());
        assert!(lines.iter().all(|l| l.ends_with("0.0%")));
    }
}
