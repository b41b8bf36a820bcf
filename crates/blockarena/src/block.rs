//! Blocks: the fixed backing regions an arena is built from.
//!
//! A block is a contiguous byte payload with a bump cursor (`used`) and a
//! [`BlockState`] recording how its bytes are occupied. Blocks are chained
//! most-recent-first through `next`; the arena owns every block in the chain.

use std::fmt;

use crate::id::BlockId;

/// How a block's payload is currently occupied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockState {
    /// No live allocation; eligible for any new placement.
    Free,
    /// One or more sub-allocations have been packed in. Never reclaimed.
    Shared,
    /// A single allocation owns the whole block; eligible for recycle.
    Exclusive,
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Free => "free",
            Self::Shared => "shared",
            Self::Exclusive => "exclusive",
        };
        f.pad(name)
    }
}

/// A single block: payload, bump cursor, occupancy state and chain link.
///
/// Invariant: `used <= capacity()` at all times.
pub(crate) struct Block {
    /// Payload bytes, sized to the block's capacity at creation.
    data: Box<[u8]>,
    /// Bump cursor: bytes already handed out.
    used: usize,
    state: BlockState,
    /// Next (older) block in the arena chain.
    pub(crate) next: Option<BlockId>,
}

impl Block {
    /// Wrap a payload region. `used` must not exceed `data.len()`.
    pub(crate) fn new(data: Box<[u8]>, used: usize, state: BlockState, next: Option<BlockId>) -> Self {
        debug_assert!(used <= data.len());
        Self {
            data,
            used,
            state,
            next,
        }
    }

    /// Whether a request of `size` bytes may be placed here.
    ///
    /// A block is a candidate iff it is not `Exclusive` and has at least
    /// `size` bytes left.
    pub(crate) fn fits(&self, size: usize) -> bool {
        self.state != BlockState::Exclusive
            && self
                .used
                .checked_add(size)
                .is_some_and(|end| end <= self.data.len())
    }

    /// Advance the cursor by `size` and return the offset of the new region.
    ///
    /// Callers must check [`Block::fits`] first.
    pub(crate) fn bump(&mut self, size: usize, state: BlockState) -> usize {
        debug_assert!(self.fits(size));
        let offset = self.used;
        self.used += size;
        self.state = state;
        offset
    }

    /// Return an `Exclusive` block to `Free`. No-op for any other state.
    ///
    /// Returns whether the block was reclaimed.
    pub(crate) fn reclaim(&mut self) -> bool {
        if self.state != BlockState::Exclusive {
            return false;
        }
        self.state = BlockState::Free;
        self.used = 0;
        true
    }

    /// Forget every placement, whatever the current state.
    pub(crate) fn reset(&mut self) {
        self.state = BlockState::Free;
        self.used = 0;
    }

    /// Shared view of `len` bytes at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range exceeds the payload.
    pub(crate) fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    /// Mutable view of `len` bytes at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range exceeds the payload.
    pub(crate) fn slice_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.data[offset..offset + len]
    }

    /// Surrender the payload, e.g. to hand it back to the backing store.
    pub(crate) fn into_data(self) -> Box<[u8]> {
        self.data
    }

    pub(crate) fn state(&self) -> BlockState {
        self.state
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }

    pub(crate) fn capacity(&self) -> usize {
        self.data.len()
    }
}

/// Read-only snapshot of one block, as reported by
/// [`Arena::blocks`](crate::Arena::blocks).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Slot the block occupies.
    pub id: BlockId,
    /// Occupancy state.
    pub state: BlockState,
    /// Bytes already handed out.
    pub used: usize,
    /// Total payload bytes.
    pub capacity: usize,
    /// Current slot generation; handles carrying an older value are stale.
    pub generation: u32,
}

impl BlockInfo {
    /// Bytes still available for placement (ignoring state).
    pub fn remaining(&self) -> usize {
        self.capacity - self.used
    }
}
