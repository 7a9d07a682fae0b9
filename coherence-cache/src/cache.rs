//! A single core's L1 cache: a set-associative array of [`CacheBlock`]s
//! driven entirely by the coherence state machine in `coherence-core`.

use coherence_core::{BlockSource, BlockState, CacheConfig, CoreTracker, MemOperation};

use crate::block::CacheBlock;

/// An L1 cache: `sets_per_cache` sets of `associativity` blocks each.
///
/// A `Cache` holds no tracker of its own — every method that can charge
/// cycles or counts takes the owning core's [`CoreTracker`] by mutable
/// reference, so the bus can route a cache operation to any core's
/// tracker without the cache needing to know which core it belongs to.
#[derive(Debug, Clone)]
pub struct Cache {
    id: usize,
    sets: Vec<Vec<CacheBlock>>,
    num_operation: u64,
}

impl Cache {
    #[must_use]
    pub fn new(id: usize, config: &CacheConfig) -> Self {
        let sets = (0..config.sets_per_cache())
            .map(|_| {
                (0..config.associativity())
                    .map(|_| CacheBlock::new(config.words_per_block()))
                    .collect()
            })
            .collect();

        Self {
            id,
            sets,
            num_operation: 0,
        }
    }

    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Look up `tag` within set `index`. A block only counts as a hit
    /// if it carries a matching tag and is not `Invalid`.
    #[must_use]
    pub fn find_block(&self, tag: u32, index: usize) -> Option<usize> {
        self.sets[index]
            .iter()
            .position(|block| block.tag == tag && !block.is_invalid())
    }

    fn bump_operation(&mut self) -> u64 {
        let op = self.num_operation;
        self.num_operation += 1;
        op
    }

    /// A processor-issued load. Returns the block's state on a hit, or
    /// `Invalid` on a miss (the caller is responsible for driving the
    /// bus transaction that follows a miss).
    pub fn processor_load(
        &mut self,
        tag: u32,
        index: usize,
        tracker: &mut CoreTracker,
    ) -> BlockState {
        match self.find_block(tag, index) {
            Some(slot) => {
                let op = self.bump_operation();
                let block = &mut self.sets[index][slot];
                block.last_used = op;
                tracker.track_hit();
                tracker.incr_data_access(block.state);
                block.state
            }
            None => {
                tracker.incr_miss();
                self.bump_operation();
                BlockState::Invalid
            }
        }
    }

    /// A processor-issued store under the invalidation protocol. Returns
    /// the state the block had *before* the store (so the caller can
    /// tell whether a bus transaction is needed), or `Invalid` on a miss.
    pub fn processor_invalidate_store(
        &mut self,
        tag: u32,
        index: usize,
        tracker: &mut CoreTracker,
    ) -> BlockState {
        self.processor_store_hit(tag, index, tracker, MemOperation::PrInvalidateStore)
    }

    /// A processor-issued store under the update protocol. Same contract
    /// as [`Cache::processor_invalidate_store`].
    pub fn processor_update_store(
        &mut self,
        tag: u32,
        index: usize,
        tracker: &mut CoreTracker,
    ) -> BlockState {
        self.processor_store_hit(tag, index, tracker, MemOperation::PrUpdateStore)
    }

    fn processor_store_hit(
        &mut self,
        tag: u32,
        index: usize,
        tracker: &mut CoreTracker,
        op: MemOperation,
    ) -> BlockState {
        match self.find_block(tag, index) {
            Some(slot) => {
                let next_op = self.bump_operation();
                let block = &mut self.sets[index][slot];
                block.last_used = next_op;
                let old_state = block.state;
                block.state = old_state.next(op, BlockSource::LocalCache);
                tracker.track_hit();
                tracker.incr_data_access(old_state);
                old_state
            }
            None => {
                tracker.incr_miss();
                self.bump_operation();
                BlockState::Invalid
            }
        }
    }

    /// Snoop: a peer wants to load this block. If we hold it, downgrade
    /// per the invalidation table and report `true`.
    pub fn bus_invalidate_load(
        &mut self,
        tag: u32,
        index: usize,
        tracker: &mut CoreTracker,
    ) -> bool {
        self.bus_snoop(tag, index, tracker, MemOperation::BusInvalidateLoad, true)
    }

    /// Snoop: a peer wants exclusive ownership. If we hold the block,
    /// invalidate it (no access is charged — an eviction by a peer's
    /// store is not this core's data access).
    pub fn bus_invalidate_load_exclusive(
        &mut self,
        tag: u32,
        index: usize,
        tracker: &mut CoreTracker,
    ) -> bool {
        self.bus_snoop(tag, index, tracker, MemOperation::BusLoadExclusive, false)
    }

    /// Snoop: a peer missed on a load under the update protocol.
    pub fn bus_update_load(&mut self, tag: u32, index: usize, tracker: &mut CoreTracker) -> bool {
        self.bus_snoop(tag, index, tracker, MemOperation::BusUpdateLoad, true)
    }

    fn bus_snoop(
        &mut self,
        tag: u32,
        index: usize,
        tracker: &mut CoreTracker,
        op: MemOperation,
        count_access: bool,
    ) -> bool {
        let Some(slot) = self.find_block(tag, index) else {
            return false;
        };
        let next_op = self.bump_operation();
        let block = &mut self.sets[index][slot];
        if count_access {
            tracker.incr_data_access(block.state);
        }
        block.state = block.state.next(op, BlockSource::RemoteCache);
        block.last_used = next_op;
        true
    }

    /// Forcibly invalidate a block this core holds, as directed by a
    /// peer's exclusive request. `already_written_back` short-circuits
    /// the 100-cycle writeback stall when the caller already accounted
    /// for it; no caller in this simulator ever sets it, so it is always
    /// `false` in practice.
    pub fn flush(
        &mut self,
        tag: u32,
        index: usize,
        tracker: &mut CoreTracker,
        already_written_back: bool,
    ) -> bool {
        let Some(slot) = self.find_block(tag, index) else {
            return false;
        };
        let next_op = self.bump_operation();
        let block = &mut self.sets[index][slot];
        let dirty = matches!(block.state, BlockState::Modified | BlockState::Shared);
        if dirty && !already_written_back {
            tracker.track_evict();
        }
        block.state = BlockState::Invalid;
        block.last_used = next_op;
        !already_written_back
    }

    /// Install a freshly fetched block, evicting the LRU entry in its
    /// set if no invalid slot is available, then charge the stall for
    /// wherever the block came from.
    pub fn receive_block_from_bus(
        &mut self,
        source: BlockSource,
        op: MemOperation,
        tag: u32,
        index: usize,
        tracker: &mut CoreTracker,
        words_per_block: usize,
    ) {
        let id = self.id();
        let set = &mut self.sets[index];
        let target = set
            .iter()
            .position(CacheBlock::is_invalid)
            .unwrap_or_else(|| {
                set.iter()
                    .enumerate()
                    .min_by_key(|(_, block)| block.last_used)
                    .map(|(slot, _)| slot)
                    .expect("every set has at least one block")
            });

        if matches!(set[target].state, BlockState::Modified | BlockState::Shared) {
            let evicted = &set[target];
            log::debug!(
                "core {id}: evicting {:?} block (tag {}, last used at op {}, {} words) from set {index}",
                evicted.state(),
                evicted.tag(),
                evicted.last_used(),
                evicted.entries().len()
            );
            tracker.track_evict();
        }

        let next_op = self.bump_operation();
        let block = &mut self.sets[index][target];
        block.tag = tag;
        block.last_used = next_op;
        block.state = block.state.next(op, source);

        match source {
            BlockSource::RemoteCache => {
                tracker.track_load_words_from_remote_cache(words_per_block as u64);
            }
            BlockSource::Memory => tracker.track_load_from_mem(),
            BlockSource::LocalCache => {}
        }
    }

    /// Receive a single updated word from the bus (the Dragon update
    /// path): only the state changes, the block must already be resident.
    pub fn receive_word_from_bus(
        &mut self,
        source: BlockSource,
        op: MemOperation,
        tag: u32,
        index: usize,
        tracker: &mut CoreTracker,
    ) {
        let Some(slot) = self.find_block(tag, index) else {
            return;
        };
        let next_op = self.bump_operation();
        let block = &mut self.sets[index][slot];
        block.last_used = next_op;
        block.state = block.state.next(op, source);
        tracker.track_load_words_from_remote_cache(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CacheConfig {
        CacheConfig::new(1024, 2, 32, 4).unwrap()
    }

    #[test]
    fn load_miss_then_hit() {
        let mut cache = Cache::new(0, &config());
        let mut tracker = CoreTracker::new();

        assert_eq!(cache.processor_load(1, 0, &mut tracker), BlockState::Invalid);
        assert_eq!(tracker.num_miss(), 1);

        cache.receive_block_from_bus(
            BlockSource::Memory,
            MemOperation::PrInvalidateLoad,
            1,
            0,
            &mut tracker,
            8,
        );
        assert_eq!(cache.processor_load(1, 0, &mut tracker), BlockState::Exclusive);
        assert_eq!(tracker.hit_cycles(), 2); // one from receive_block_from_bus's memory load, one from the hit
    }

    #[test]
    fn store_hit_reports_old_state_and_transitions() {
        let mut cache = Cache::new(0, &config());
        let mut tracker = CoreTracker::new();
        cache.receive_block_from_bus(
            BlockSource::Memory,
            MemOperation::PrInvalidateLoad,
            7,
            0,
            &mut tracker,
            8,
        );
        let old = cache.processor_invalidate_store(7, 0, &mut tracker);
        assert_eq!(old, BlockState::Exclusive);
        assert_eq!(cache.find_block(7, 0).map(|s| cache.sets[0][s].state), Some(BlockState::Modified));
    }

    #[test]
    fn bus_invalidate_load_exclusive_skips_access_tracking() {
        let mut cache = Cache::new(0, &config());
        let mut tracker = CoreTracker::new();
        cache.receive_block_from_bus(
            BlockSource::Memory,
            MemOperation::PrInvalidateLoad,
            3,
            0,
            &mut tracker,
            8,
        );
        assert!(cache.bus_invalidate_load_exclusive(3, 0, &mut tracker));
        assert_eq!(tracker.num_shared_access(), 0);
        assert_eq!(tracker.num_private_access(), 0);
        assert_eq!(cache.find_block(3, 0), None); // now Invalid, so no longer findable
    }

    #[test]
    fn evicting_an_exclusive_block_charges_no_eviction_stall() {
        let config = CacheConfig::new(64, 1, 32, 4).unwrap(); // 2 sets, 1 way each
        let mut cache = Cache::new(0, &config);
        let mut tracker = CoreTracker::new();

        cache.receive_block_from_bus(BlockSource::Memory, MemOperation::PrInvalidateLoad, 10, 0, &mut tracker, 8);
        assert_eq!(tracker.idle_cycles(), 100);

        // same set, different tag -> evicts the resident Exclusive block,
        // which is not Modified/Shared so no extra eviction stall applies.
        cache.receive_block_from_bus(BlockSource::Memory, MemOperation::PrInvalidateLoad, 20, 0, &mut tracker, 8);
        assert_eq!(tracker.idle_cycles(), 200);
    }

    #[test]
    fn evicting_a_modified_block_charges_eviction_stall() {
        let config = CacheConfig::new(64, 1, 32, 4).unwrap(); // 2 sets, 1 way each
        let mut cache = Cache::new(0, &config);
        let mut tracker = CoreTracker::new();

        cache.receive_block_from_bus(BlockSource::Memory, MemOperation::PrInvalidateLoad, 10, 0, &mut tracker, 8);
        cache.processor_invalidate_store(10, 0, &mut tracker); // -> Modified
        let idle_before = tracker.idle_cycles();

        cache.receive_block_from_bus(BlockSource::Memory, MemOperation::PrInvalidateLoad, 20, 0, &mut tracker, 8);
        assert_eq!(tracker.idle_cycles(), idle_before + 100 + 100); // evict stall + memory-load stall
    }

    #[test]
    fn flush_of_modified_block_charges_evict_stall() {
        let mut cache = Cache::new(0, &config());
        let mut tracker = CoreTracker::new();
        cache.receive_block_from_bus(BlockSource::Memory, MemOperation::PrInvalidateLoad, 5, 0, &mut tracker, 8);
        cache.processor_invalidate_store(5, 0, &mut tracker);
        let idle_before = tracker.idle_cycles();
        assert!(cache.flush(5, 0, &mut tracker, false));
        assert_eq!(tracker.idle_cycles(), idle_before + 100);
        assert_eq!(cache.find_block(5, 0), None);
    }
}
