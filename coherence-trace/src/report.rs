//! Results reporting: one block of counters per core, then the bus.

use std::fmt::Write as _;
use std::path::Path;

use coherence_core::{BusTracker, CoreTracker};

use crate::error::TraceError;

#[must_use]
pub fn render(core_trackers: &[CoreTracker], bus_tracker: &BusTracker) -> String {
    let mut out = String::new();

    for (id, tracker) in core_trackers.iter().enumerate() {
        let _ = writeln!(out, "##### STATS FOR CORE {id} #####");
        let _ = writeln!(out, "Overall Execution Cycles: {}", tracker.overall_cycles());
        let _ = writeln!(out, "Hit Cycles: {}", tracker.hit_cycles());
        let _ = writeln!(out, "Compute Cycles: {}", tracker.compute_cycles());
        let _ = writeln!(out, "Idle cycles: {}", tracker.idle_cycles());
        let _ = writeln!(out, "Number of load operations: {}", tracker.num_load());
        let _ = writeln!(out, "Number of store operations: {}", tracker.num_store());
        let _ = writeln!(out, "Number of cache misses: {}", tracker.num_miss());
        let _ = writeln!(
            out,
            "Number of accesses to private data: {}",
            tracker.num_private_access()
        );
        let _ = writeln!(
            out,
            "Number of accesses to shared data: {}",
            tracker.num_shared_access()
        );
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "##### STATS FOR SHARED BUS #####");
    let _ = writeln!(out, "Data traffic: {} bytes", bus_tracker.data_traffic());
    let _ = writeln!(out, "Number of invalidations: {}", bus_tracker.num_invalidation());
    let _ = writeln!(out, "Number of updates: {}", bus_tracker.num_update());

    out
}

/// Write the rendered report to `path`.
///
/// # Errors
///
/// Returns [`TraceError::Write`] if the file cannot be created or written.
pub fn write_report(
    path: &Path,
    core_trackers: &[CoreTracker],
    bus_tracker: &BusTracker,
) -> Result<(), TraceError> {
    std::fs::write(path, render(core_trackers, bus_tracker)).map_err(|source| TraceError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_every_core_and_the_bus() {
        let trackers = vec![CoreTracker::new(), CoreTracker::new()];
        let bus = BusTracker::new();
        let report = render(&trackers, &bus);
        assert!(report.contains("STATS FOR CORE 0"));
        assert!(report.contains("STATS FOR CORE 1"));
        assert!(report.contains("STATS FOR SHARED BUS"));
    }
}
