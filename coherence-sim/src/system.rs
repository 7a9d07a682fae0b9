//! Builds the bus, spawns one thread per core, and collects the final
//! counters once every thread has finished.

use std::sync::{Arc, Mutex};
use std::thread;

use coherence_bus::Bus;
use coherence_core::{BusTracker, CacheConfig, CoreTracker, Protocol};
use coherence_trace::TraceRecord;

use crate::core::Core;

/// Final counters for a completed run: one [`CoreTracker`] per core plus
/// the shared [`BusTracker`].
pub struct SimulationReport {
    pub core_trackers: Vec<CoreTracker>,
    pub bus_tracker: BusTracker,
}

/// One protocol, one shared bus, `num_cores` processors each with one
/// L1 cache — the whole simulated machine.
pub struct System {
    bus: Arc<Mutex<Bus>>,
    num_cores: usize,
}

impl System {
    #[must_use]
    pub fn new(protocol: Protocol, num_cores: usize, config: CacheConfig) -> Self {
        Self {
            bus: Arc::new(Mutex::new(Bus::new(protocol, num_cores, config))),
            num_cores,
        }
    }

    /// Run one trace per core concurrently and return the final counters.
    ///
    /// `traces[i]` is replayed by core `i`; `traces` must have exactly
    /// `num_cores` entries, one per core built in [`System::new`].
    ///
    /// # Panics
    ///
    /// Panics if `traces.len()` does not match the configured core
    /// count, or if a core's thread panics while running its trace.
    #[must_use]
    pub fn run(&self, traces: Vec<Vec<TraceRecord>>) -> SimulationReport {
        assert_eq!(
            traces.len(),
            self.num_cores,
            "expected one trace per core ({} cores, {} traces)",
            self.num_cores,
            traces.len()
        );

        let handles: Vec<_> = traces
            .into_iter()
            .enumerate()
            .map(|(id, records)| {
                log::debug!("spawning core {id} with {} trace records", records.len());
                let core = Core::new(id, Arc::clone(&self.bus));
                thread::spawn(move || core.run(&records))
            })
            .collect();

        for handle in handles {
            handle.join().expect("core thread panicked");
        }
        log::info!("all {} core threads joined", self.num_cores);

        // Trackers are read only after every thread has joined, so this
        // final lock acquisition never contends.
        let bus = self.bus.lock().expect("bus mutex poisoned");
        let core_trackers = (0..self.num_cores).map(|id| *bus.core_tracker(id)).collect();
        let bus_tracker = *bus.bus_tracker();

        SimulationReport {
            core_trackers,
            bus_tracker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CacheConfig {
        CacheConfig::new(1024, 2, 32, 4).unwrap()
    }

    #[test]
    fn totals_are_deterministic_across_runs() {
        let traces = vec![
            vec![TraceRecord::Load(0x40), TraceRecord::Store(0x40)],
            vec![TraceRecord::Load(0x40)],
            vec![TraceRecord::Compute(10)],
            vec![],
        ];

        let system = System::new(Protocol::Mesi, 4, config());
        let report = system.run(traces);

        let total_loads: u64 = report.core_trackers.iter().map(CoreTracker::num_load).sum();
        let total_stores: u64 = report.core_trackers.iter().map(CoreTracker::num_store).sum();
        assert_eq!(total_loads, 2);
        assert_eq!(total_stores, 1);

        for tracker in &report.core_trackers {
            assert_eq!(
                tracker.overall_cycles(),
                tracker.hit_cycles() + tracker.compute_cycles() + tracker.idle_cycles()
            );
        }
    }

    #[test]
    #[should_panic(expected = "expected one trace per core")]
    fn mismatched_trace_count_panics() {
        let system = System::new(Protocol::Mesi, 4, config());
        system.run(vec![vec![]]);
    }
}
