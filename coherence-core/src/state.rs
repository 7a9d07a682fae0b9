//! The cache-block coherence state machine.
//!
//! [`BlockState`] is the union of the MESI states (`Exclusive`,
//! `Modified`, `Shared`) and the Dragon states (`Exclusive`, `Modified`,
//! `SharedClean`, `SharedModified`), plus the `Invalid` state shared by
//! both. Only the subset relevant to the protocol a given run selected
//! is ever produced — nothing here is protocol-aware beyond the
//! `(state, op, source)` triple fed into [`BlockState::next`].

/// Coherence state of a single cache block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockState {
    Invalid,
    Exclusive,
    Modified,
    /// MESI-only shared state.
    Shared,
    /// Dragon shared state with no outstanding local write.
    SharedClean,
    /// Dragon shared state holding the only dirty copy's ownership.
    SharedModified,
}

impl BlockState {
    /// True for `Modified` or `Exclusive`: data this core owns alone.
    #[must_use]
    pub const fn is_private(self) -> bool {
        matches!(self, BlockState::Modified | BlockState::Exclusive)
    }

    /// True for any of the shared states.
    #[must_use]
    pub const fn is_shared(self) -> bool {
        matches!(
            self,
            BlockState::Shared | BlockState::SharedClean | BlockState::SharedModified
        )
    }
}

/// The operation driving a state transition.
///
/// `PR_*` operations are processor-initiated (a local load or store
/// hit/miss); `BUS_*` operations are bus-initiated (another core's
/// transaction snooping this block).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemOperation {
    // Invalidation protocol (MESI)
    PrInvalidateLoad,
    PrInvalidateStore,
    BusInvalidateLoad,
    BusLoadExclusive,
    // Update protocol (Dragon)
    PrLoadMiss,
    PrStoreMiss,
    PrUpdateStore,
    BusUpdateLoad,
    BusUpdateUpdate,
}

/// Where a block's contents came from when it was installed or updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockSource {
    /// Already resident in this cache (used for purely local transitions).
    LocalCache,
    /// Supplied by a peer cache over the bus.
    RemoteCache,
    /// Supplied by main memory (no peer had a copy).
    Memory,
}

impl BlockState {
    /// Pure state-transition function. Any `(state, op, source)` not
    /// covered by a protocol's table leaves the state unchanged.
    #[must_use]
    pub const fn next(self, op: MemOperation, source: BlockSource) -> BlockState {
        use BlockSource::{Memory, RemoteCache};
        use BlockState::{Exclusive, Invalid, Modified, Shared, SharedClean, SharedModified};
        use MemOperation::{
            BusInvalidateLoad, BusLoadExclusive, BusUpdateLoad, BusUpdateUpdate, PrInvalidateLoad,
            PrInvalidateStore, PrLoadMiss, PrStoreMiss, PrUpdateStore,
        };

        match (op, self, source) {
            // ---- Invalidation protocol (MESI) ----
            (PrInvalidateLoad, Invalid, Memory) => Exclusive,
            (PrInvalidateLoad, Invalid, RemoteCache) => Shared,
            (PrInvalidateLoad, _, _) => self,

            (PrInvalidateStore, _, _) => Modified,

            (BusInvalidateLoad, Exclusive | Modified, _) => Shared,
            (BusInvalidateLoad, _, _) => self,

            (BusLoadExclusive, _, _) => Invalid,

            // ---- Update protocol (Dragon) ----
            (PrLoadMiss, Invalid, Memory) => Exclusive,
            (PrLoadMiss, Invalid, RemoteCache) => SharedClean,
            (PrLoadMiss, _, _) => self,

            (PrStoreMiss, _, Memory) => Modified,
            (PrStoreMiss, _, RemoteCache) => SharedModified,
            (PrStoreMiss, _, _) => self,

            (PrUpdateStore, Exclusive, _) => Modified,
            (PrUpdateStore, SharedClean, _) => SharedModified,
            (PrUpdateStore, _, _) => self,

            (BusUpdateLoad, Exclusive, _) => SharedClean,
            (BusUpdateLoad, Modified, _) => Modified,
            (BusUpdateLoad, _, _) => self,

            (BusUpdateUpdate, SharedModified, _) => SharedClean,
            (BusUpdateUpdate, _, _) => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BlockSource::{LocalCache, Memory, RemoteCache};
    use BlockState::{Exclusive, Invalid, Modified, Shared, SharedClean, SharedModified};
    use MemOperation::{
        BusInvalidateLoad, BusLoadExclusive, BusUpdateLoad, BusUpdateUpdate, PrInvalidateLoad,
        PrInvalidateStore, PrLoadMiss, PrStoreMiss, PrUpdateStore,
    };

    #[test]
    fn mesi_load_miss_from_memory_goes_exclusive() {
        assert_eq!(Invalid.next(PrInvalidateLoad, Memory), Exclusive);
    }

    #[test]
    fn mesi_load_miss_from_peer_goes_shared() {
        assert_eq!(Invalid.next(PrInvalidateLoad, RemoteCache), Shared);
    }

    #[test]
    fn mesi_store_always_goes_modified() {
        for state in [Invalid, Exclusive, Modified, Shared] {
            assert_eq!(state.next(PrInvalidateStore, LocalCache), Modified);
        }
    }

    #[test]
    fn mesi_bus_invalidate_load_downgrades_owners_to_shared() {
        assert_eq!(Exclusive.next(BusInvalidateLoad, RemoteCache), Shared);
        assert_eq!(Modified.next(BusInvalidateLoad, RemoteCache), Shared);
        assert_eq!(Shared.next(BusInvalidateLoad, RemoteCache), Shared);
        assert_eq!(Invalid.next(BusInvalidateLoad, RemoteCache), Invalid);
    }

    #[test]
    fn mesi_bus_load_exclusive_always_invalidates() {
        for state in [Exclusive, Modified, Shared, Invalid] {
            assert_eq!(state.next(BusLoadExclusive, RemoteCache), Invalid);
        }
    }

    #[test]
    fn dragon_load_miss_from_peer_goes_shared_clean() {
        assert_eq!(Invalid.next(PrLoadMiss, RemoteCache), SharedClean);
        assert_eq!(Invalid.next(PrLoadMiss, Memory), Exclusive);
    }

    #[test]
    fn dragon_store_miss_picks_ownership_state_by_source() {
        assert_eq!(Invalid.next(PrStoreMiss, Memory), Modified);
        assert_eq!(Invalid.next(PrStoreMiss, RemoteCache), SharedModified);
    }

    #[test]
    fn dragon_update_store_promotes_ownership() {
        assert_eq!(Exclusive.next(PrUpdateStore, LocalCache), Modified);
        assert_eq!(SharedClean.next(PrUpdateStore, LocalCache), SharedModified);
        assert_eq!(Modified.next(PrUpdateStore, LocalCache), Modified);
    }

    #[test]
    fn dragon_bus_update_load_keeps_modified_but_demotes_exclusive() {
        assert_eq!(Exclusive.next(BusUpdateLoad, RemoteCache), SharedClean);
        assert_eq!(Modified.next(BusUpdateLoad, RemoteCache), Modified);
        assert_eq!(SharedClean.next(BusUpdateLoad, RemoteCache), SharedClean);
    }

    #[test]
    fn dragon_bus_update_update_releases_ownership() {
        assert_eq!(SharedModified.next(BusUpdateUpdate, RemoteCache), SharedClean);
        assert_eq!(SharedClean.next(BusUpdateUpdate, RemoteCache), SharedClean);
    }

    #[test]
    fn classification_helpers() {
        assert!(Modified.is_private());
        assert!(Exclusive.is_private());
        assert!(!Shared.is_private());

        assert!(Shared.is_shared());
        assert!(SharedClean.is_shared());
        assert!(SharedModified.is_shared());
        assert!(!Modified.is_shared());
    }
}
