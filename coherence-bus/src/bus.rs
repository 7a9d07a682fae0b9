//! The shared snooping bus.
//!
//! `Bus` owns every cache, every core's tracker and the bus-wide
//! tracker. A `System` wraps one `Bus` in a single `Mutex` and every
//! core thread acquires it once per trace record — there is no
//! per-cache or per-tracker locking beneath it. This is what makes the
//! bus the sole serialization point for the whole memory system.

use coherence_cache::Cache;
use coherence_core::{decompose, BlockSource, BlockState, CacheConfig, CoreTracker, MemOperation, Protocol};

/// All shared, mutable simulator state: the caches, their owning cores'
/// trackers, and the bus's own counters.
pub struct Bus {
    protocol: Protocol,
    config: CacheConfig,
    caches: Vec<Cache>,
    core_trackers: Vec<CoreTracker>,
    bus_tracker: coherence_core::BusTracker,
}

impl Bus {
    #[must_use]
    pub fn new(protocol: Protocol, num_cores: usize, config: CacheConfig) -> Self {
        log::debug!(
            "bus up: protocol={protocol}, cores={num_cores}, sets={}, ways={}",
            config.sets_per_cache(),
            config.associativity()
        );
        let caches = (0..num_cores).map(|id| Cache::new(id, &config)).collect();
        let core_trackers = (0..num_cores).map(|_| CoreTracker::new()).collect();

        Self {
            protocol,
            config,
            caches,
            core_trackers,
            bus_tracker: coherence_core::BusTracker::new(),
        }
    }

    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    #[must_use]
    pub fn core_tracker(&self, id: usize) -> &CoreTracker {
        &self.core_trackers[id]
    }

    #[must_use]
    pub const fn bus_tracker(&self) -> &coherence_core::BusTracker {
        &self.bus_tracker
    }

    #[must_use]
    pub fn num_cores(&self) -> usize {
        self.caches.len()
    }

    /// A processor-initiated load at `address` by core `id`.
    pub fn load(&mut self, id: usize, address: u32) {
        let parts = decompose(address, &self.config);
        let state = self.caches[id].processor_load(parts.tag, parts.index, &mut self.core_trackers[id]);

        if matches!(state, BlockState::Invalid) {
            // `bus_load_request`/`pr_load_miss_request` already install the
            // block into this core's cache via `deliver_block`.
            match self.protocol {
                Protocol::Mesi => {
                    self.bus_load_request(id, parts.tag, parts.index);
                }
                Protocol::Dragon => {
                    self.pr_load_miss_request(id, parts.tag, parts.index);
                }
                Protocol::None => {}
            }
        }

        self.core_trackers[id].incr_load();
    }

    /// A processor-initiated store at `address` by core `id`.
    pub fn store(&mut self, id: usize, address: u32) {
        let parts = decompose(address, &self.config);

        match self.protocol {
            Protocol::Mesi => self.store_invalidate(id, parts.tag, parts.index),
            Protocol::Dragon => self.store_update(id, parts.tag, parts.index),
            Protocol::None => {}
        }

        self.core_trackers[id].incr_store();
    }

    fn store_invalidate(&mut self, id: usize, tag: u32, index: usize) {
        let old_state =
            self.caches[id].processor_invalidate_store(tag, index, &mut self.core_trackers[id]);

        match old_state {
            BlockState::Invalid => {
                // Delivers and installs the block (always `Modified`,
                // since `PrInvalidateStore` maps to `Modified` from any
                // prior state).
                self.bus_load_exclusive_request(id, tag, index);
            }
            BlockState::Shared => self.flush_request(id, tag, index),
            BlockState::Exclusive | BlockState::Modified => {}
            BlockState::SharedClean | BlockState::SharedModified => unreachable!(
                "invalidation protocol never produces a Dragon-only state"
            ),
        }
    }

    fn store_update(&mut self, id: usize, tag: u32, index: usize) {
        let old_state =
            self.caches[id].processor_update_store(tag, index, &mut self.core_trackers[id]);

        match old_state {
            BlockState::Invalid => {
                // A peer holding the block means we now own it as
                // `SharedModified` and must broadcast the word so peers
                // settle on `SharedClean`; from memory we land in
                // `Modified` with nobody else to tell.
                if self.pr_store_miss_request(id, tag, index) == BlockSource::RemoteCache {
                    self.bus_update_request(id, tag, index);
                }
            }
            BlockState::SharedClean | BlockState::SharedModified => {
                self.bus_update_request(id, tag, index);
            }
            BlockState::Exclusive | BlockState::Modified => {}
            BlockState::Shared => {
                unreachable!("update protocol never produces a MESI-only state")
            }
        }
    }

    /// Local compute: no bus traffic, just cycles on the issuing core.
    pub fn compute(&mut self, id: usize, cycles: u64) {
        self.core_trackers[id].track_compute(cycles);
    }

    // ---- Invalidation-based bus requests ----

    fn bus_load_request(&mut self, id: usize, tag: u32, index: usize) -> BlockSource {
        let mut found_in_remote_cache = false;
        for peer in 0..self.caches.len() {
            if peer == id {
                continue;
            }
            if self.caches[peer].bus_invalidate_load(tag, index, &mut self.core_trackers[peer])
                && !found_in_remote_cache
            {
                self.deliver_block(BlockSource::RemoteCache, MemOperation::PrInvalidateLoad, id, tag, index);
                found_in_remote_cache = true;
            }
        }
        if found_in_remote_cache {
            BlockSource::RemoteCache
        } else {
            self.deliver_block(BlockSource::Memory, MemOperation::PrInvalidateLoad, id, tag, index);
            BlockSource::Memory
        }
    }

    fn bus_load_exclusive_request(&mut self, id: usize, tag: u32, index: usize) -> BlockSource {
        let mut found_in_remote_cache = false;
        for peer in 0..self.caches.len() {
            if peer == id {
                continue;
            }
            if self.caches[peer].bus_invalidate_load_exclusive(tag, index, &mut self.core_trackers[peer]) {
                self.bus_tracker.track_invalidation();
                if !found_in_remote_cache {
                    self.deliver_block(BlockSource::RemoteCache, MemOperation::PrInvalidateStore, id, tag, index);
                    found_in_remote_cache = true;
                }
            }
        }
        if found_in_remote_cache {
            BlockSource::RemoteCache
        } else {
            self.deliver_block(BlockSource::Memory, MemOperation::PrInvalidateStore, id, tag, index);
            BlockSource::Memory
        }
    }

    // ---- Update-based bus requests ----

    fn pr_load_miss_request(&mut self, id: usize, tag: u32, index: usize) -> BlockSource {
        let mut found_in_remote_cache = false;
        for peer in 0..self.caches.len() {
            if peer == id {
                continue;
            }
            if self.caches[peer].bus_update_load(tag, index, &mut self.core_trackers[peer])
                && !found_in_remote_cache
            {
                self.deliver_block(BlockSource::RemoteCache, MemOperation::PrLoadMiss, id, tag, index);
                found_in_remote_cache = true;
            }
        }
        if found_in_remote_cache {
            BlockSource::RemoteCache
        } else {
            self.deliver_block(BlockSource::Memory, MemOperation::PrLoadMiss, id, tag, index);
            BlockSource::Memory
        }
    }

    fn pr_store_miss_request(&mut self, id: usize, tag: u32, index: usize) -> BlockSource {
        let mut found_in_remote_cache = false;
        for peer in 0..self.caches.len() {
            if peer == id {
                continue;
            }
            if self.caches[peer].bus_update_load(tag, index, &mut self.core_trackers[peer])
                && !found_in_remote_cache
            {
                self.deliver_block(BlockSource::RemoteCache, MemOperation::PrStoreMiss, id, tag, index);
                found_in_remote_cache = true;
            }
        }
        if found_in_remote_cache {
            BlockSource::RemoteCache
        } else {
            self.deliver_block(BlockSource::Memory, MemOperation::PrStoreMiss, id, tag, index);
            BlockSource::Memory
        }
    }

    /// Broadcast the updated word to every peer that already holds this
    /// block; the issuing core keeps ownership (`SharedModified`), peers
    /// settle back to `SharedClean`.
    fn bus_update_request(&mut self, id: usize, tag: u32, index: usize) {
        for peer in 0..self.caches.len() {
            if peer != id && self.caches[peer].find_block(tag, index).is_some() {
                self.bus_tracker.track_update();
                self.deliver_word(BlockSource::RemoteCache, MemOperation::BusUpdateUpdate, peer, tag, index);
            }
        }
    }

    // ---- Utility ----

    /// Force every peer holding this block to invalidate (and, if
    /// dirty, pay the writeback stall) because core `id` just took sole
    /// ownership of it via a store hit on a previously shared block.
    fn flush_request(&mut self, id: usize, tag: u32, index: usize) {
        for peer in 0..self.caches.len() {
            if peer != id && self.caches[peer].flush(tag, index, &mut self.core_trackers[peer], false) {
                self.bus_tracker.track_invalidation();
            }
        }
    }

    fn deliver_block(&mut self, source: BlockSource, op: MemOperation, target_id: usize, tag: u32, index: usize) {
        let words = self.config.words_per_block();
        self.caches[target_id].receive_block_from_bus(source, op, tag, index, &mut self.core_trackers[target_id], words);
        let bytes = (self.config.word_size() * words) as u64;
        self.bus_tracker.track_traffic(bytes);
    }

    fn deliver_word(&mut self, source: BlockSource, op: MemOperation, target_id: usize, tag: u32, index: usize) {
        self.caches[target_id].receive_word_from_bus(source, op, tag, index, &mut self.core_trackers[target_id]);
        self.bus_tracker.track_traffic(self.config.word_size() as u64);
    }
}
