//! Cache geometry.

use crate::error::ConfigError;

/// Immutable cache geometry shared by every cache in the system.
///
/// `size`, `associativity`, `block_size` and `word_size` are the inputs;
/// `words_per_block` and `sets_per_cache` are derived once at
/// construction so the hot path never repeats the division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    size: usize,
    associativity: usize,
    block_size: usize,
    word_size: usize,
    words_per_block: usize,
    sets_per_cache: usize,
}

impl CacheConfig {
    /// Build a validated cache geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `block_size` or `size` is not a power of
    /// two, if `size` is not a multiple of `block_size * associativity`,
    /// or if `word_size` does not divide `block_size`.
    pub fn new(
        size: usize,
        associativity: usize,
        block_size: usize,
        word_size: usize,
    ) -> Result<Self, ConfigError> {
        if associativity == 0 {
            return Err(ConfigError::ZeroAssociativity(associativity));
        }
        if block_size == 0 || !block_size.is_power_of_two() {
            return Err(ConfigError::BlockSizeNotPowerOfTwo(block_size));
        }
        if size == 0 || !size.is_power_of_two() {
            return Err(ConfigError::SizeNotPowerOfTwo(size));
        }
        let set_bytes = block_size * associativity;
        if set_bytes == 0 || size % set_bytes != 0 {
            return Err(ConfigError::SizeNotDivisible {
                size,
                block_size,
                associativity,
            });
        }
        if word_size == 0 || block_size % word_size != 0 {
            return Err(ConfigError::WordSizeDoesNotDivideBlock {
                word_size,
                block_size,
            });
        }

        Ok(Self {
            size,
            associativity,
            block_size,
            word_size,
            words_per_block: block_size / word_size,
            sets_per_cache: size / set_bytes,
        })
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub const fn associativity(&self) -> usize {
        self.associativity
    }

    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    #[must_use]
    pub const fn word_size(&self) -> usize {
        self.word_size
    }

    #[must_use]
    pub const fn words_per_block(&self) -> usize {
        self.words_per_block
    }

    #[must_use]
    pub const fn sets_per_cache(&self) -> usize {
        self.sets_per_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_words_per_block_and_sets() {
        let config = CacheConfig::new(1024, 2, 32, 4).unwrap();
        assert_eq!(config.words_per_block(), 8);
        assert_eq!(config.sets_per_cache(), 16);
    }

    #[test]
    fn fully_associative_has_one_set() {
        let config = CacheConfig::new(1024, 32, 32, 4).unwrap();
        assert_eq!(config.sets_per_cache(), 1);
    }

    #[test]
    fn rejects_non_power_of_two_block_size() {
        assert_eq!(
            CacheConfig::new(1024, 2, 24, 4),
            Err(ConfigError::BlockSizeNotPowerOfTwo(24))
        );
    }

    #[test]
    fn rejects_size_not_divisible_by_set_bytes() {
        // 2048 is a power of two, but 32 * 3 = 96 does not divide it.
        assert!(matches!(
            CacheConfig::new(2048, 3, 32, 4),
            Err(ConfigError::SizeNotDivisible { .. })
        ));
    }

    #[test]
    fn rejects_word_size_not_dividing_block() {
        assert!(matches!(
            CacheConfig::new(1024, 2, 32, 3),
            Err(ConfigError::WordSizeDoesNotDivideBlock { .. })
        ));
    }
}
