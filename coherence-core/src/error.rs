//! Configuration-validation errors.

use thiserror::Error;

/// A cache geometry that violates the invariants `CacheConfig` is built on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("block size {0} must be a positive power of two")]
    BlockSizeNotPowerOfTwo(usize),

    #[error("cache size {0} must be a positive power of two")]
    SizeNotPowerOfTwo(usize),

    #[error("cache size {size} is not a multiple of block_size ({block_size}) * associativity ({associativity})")]
    SizeNotDivisible {
        size: usize,
        block_size: usize,
        associativity: usize,
    },

    #[error("word size {word_size} does not divide block size {block_size}")]
    WordSizeDoesNotDivideBlock {
        word_size: usize,
        block_size: usize,
    },

    #[error("associativity must be at least 1, got {0}")]
    ZeroAssociativity(usize),
}
