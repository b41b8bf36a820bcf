//! Arena error types.

use std::error::Error;
use std::fmt;

use crate::id::BlockId;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The backing store could not supply a region (or the block limit
    /// was reached).
    OutOfMemory {
        /// Number of bytes requested from the backing store.
        requested: usize,
    },
    /// Configuration rejected at construction.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The arena has been released and not re-initialised.
    Released,
    /// A handle that was not issued by this arena instance, or that names
    /// a block slot this arena does not hold.
    InvalidHandle {
        /// The block named by the handle.
        block: BlockId,
    },
    /// A handle whose block was recycled, reset, or trimmed since it was issued.
    StaleHandle {
        /// The block named by the handle.
        block: BlockId,
        /// The generation encoded in the handle.
        handle_generation: u32,
        /// The block slot's current generation.
        current_generation: u32,
    },
    /// `recycle_sized` was given a size that disagrees with the handle.
    SizeMismatch {
        /// Length recorded in the handle.
        expected: usize,
        /// Size supplied by the caller.
        actual: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: backing store refused {requested} bytes")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid arena config: {reason}")
            }
            Self::Released => write!(f, "arena has been released"),
            Self::InvalidHandle { block } => {
                write!(f, "handle does not belong to this arena (block {block})")
            }
            Self::StaleHandle {
                block,
                handle_generation,
                current_generation,
            } => {
                write!(
                    f,
                    "stale handle for block {block}: generation {handle_generation}, current {current_generation}"
                )
            }
            Self::SizeMismatch { expected, actual } => {
                write!(
                    f,
                    "recycle size mismatch: handle holds {expected} bytes, caller passed {actual}"
                )
            }
        }
    }
}

impl Error for ArenaError {}
