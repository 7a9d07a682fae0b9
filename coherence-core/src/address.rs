//! Byte-address decomposition into (tag, set index, word offset).

use crate::config::CacheConfig;

/// The three fields a memory address decomposes into for a given cache
/// geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressParts {
    pub tag: u32,
    pub index: usize,
    pub offset: usize,
}

/// Split a byte address into (tag, set index, word offset).
///
/// Let `w` be `words_per_block` and `s` be `sets_per_cache`, both derived
/// from `config` as powers of two. Then:
///
/// - `offset = address mod w`
/// - `index  = (address / w) mod s`
/// - `tag    = address / (w * s)`
///
/// All divisions are integer, bit-shift based since `w` and `s` are
/// powers of two by construction of [`CacheConfig`] — no floating point
/// is ever involved.
#[must_use]
pub fn decompose(address: u32, config: &CacheConfig) -> AddressParts {
    let words_per_block = config.words_per_block() as u32;
    let sets_per_cache = config.sets_per_cache() as u32;

    let offset_bits = words_per_block.trailing_zeros();
    let index_bits = sets_per_cache.trailing_zeros();

    let offset = address & (words_per_block - 1);
    let index = (address >> offset_bits) & (sets_per_cache - 1);
    let tag = address >> (offset_bits + index_bits);

    AddressParts {
        tag,
        index: index as usize,
        offset: offset as usize,
    }
}
