//! A thin per-core driver: decode a trace record, acquire the bus once,
//! dispatch, release. All coherence logic lives in [`coherence_bus::Bus`];
//! `Core` exists only to give each simulated thread something to own.

use std::sync::{Arc, Mutex};

use coherence_bus::Bus;
use coherence_trace::TraceRecord;

/// One simulated processor. Runs on its own OS thread, replaying the
/// trace assigned to it against the bus shared with every other core.
pub struct Core {
    id: usize,
    bus: Arc<Mutex<Bus>>,
}

impl Core {
    #[must_use]
    pub fn new(id: usize, bus: Arc<Mutex<Bus>>) -> Self {
        Self { id, bus }
    }

    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Replay `records` in order, one bus-lock acquisition per record.
    pub fn run(&self, records: &[TraceRecord]) {
        for record in records {
            // Lock scope is exactly one memory reference: the bus is the
            // system's only serialization point, so nothing here holds
            // the lock across more than a single record.
            let mut bus = self.bus.lock().expect("bus mutex poisoned");
            match *record {
                TraceRecord::Load(address) => bus.load(self.id(), address),
                TraceRecord::Store(address) => bus.store(self.id(), address),
                TraceRecord::Compute(cycles) => bus.compute(self.id(), u64::from(cycles)),
            }
        }
        log::debug!("core {} exhausted its trace ({} records)", self.id(), records.len());
    }
}
