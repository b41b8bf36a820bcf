//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for an [`Arena`](crate::Arena).
///
/// Validated at construction; immutable for the lifetime of the arena
/// (a re-`init` builds a fresh config from the new block size).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Standard payload size of a block, in bytes.
    ///
    /// Requests smaller than this are packed into shared blocks of this
    /// size; requests at least this large get a dedicated block sized to
    /// the request. Must be non-zero.
    pub default_block_size: usize,

    /// Maximum number of blocks the arena may hold at once.
    ///
    /// Hitting the limit when a new block is needed is reported as
    /// [`ArenaError::OutOfMemory`]. Default: `u32::MAX` (block slots are
    /// indexed by `u32`).
    pub max_blocks: u32,
}

impl ArenaConfig {
    /// Default block size: one 4 KiB page.
    pub const DEFAULT_BLOCK_SIZE: usize = 4096;

    /// Default maximum block count.
    pub const DEFAULT_MAX_BLOCKS: u32 = u32::MAX;

    /// Create a config with the given default block size.
    pub fn new(default_block_size: usize) -> Self {
        Self {
            default_block_size,
            max_blocks: Self::DEFAULT_MAX_BLOCKS,
        }
    }

    /// Set the maximum block count.
    pub fn with_max_blocks(mut self, max_blocks: u32) -> Self {
        self.max_blocks = max_blocks;
        self
    }

    /// Check that the config describes a usable arena.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.default_block_size == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "default_block_size must be > 0".to_string(),
            });
        }
        if self.max_blocks == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "max_blocks must be >= 1 (the arena starts with one block)".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_SIZE)
    }
}
