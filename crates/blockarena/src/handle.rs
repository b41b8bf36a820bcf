//! Allocation handles.
//!
//! A [`Handle`] names the bytes an allocation owns: which arena issued it,
//! which block slot it lives in, and where inside that block's payload.
//! It is generation-scoped: the `generation` field lets the arena reject
//! a handle whose block has been recycled since, in O(1) and without a
//! lookup table.

use std::fmt;

use crate::id::{ArenaInstanceId, BlockId};

/// A region handed out by [`Arena::allocate`](crate::Arena::allocate).
///
/// Handles are plain values; they do not borrow the arena. Resolve one to
/// bytes with [`Arena::get`](crate::Arena::get) /
/// [`Arena::get_mut`](crate::Arena::get_mut).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct Handle {
    /// The arena instance that issued this handle.
    pub(crate) arena: ArenaInstanceId,
    /// The owning block slot.
    pub(crate) block: BlockId,
    /// Slot generation when this allocation was made.
    pub(crate) generation: u32,
    /// Byte offset within the block's payload.
    pub(crate) offset: usize,
    /// Length of the allocation in bytes.
    pub(crate) len: usize,
}

impl Handle {
    pub(crate) fn new(
        arena: ArenaInstanceId,
        block: BlockId,
        generation: u32,
        offset: usize,
        len: usize,
    ) -> Self {
        Self {
            arena,
            block,
            generation,
            offset,
            len,
        }
    }

    /// The arena instance that issued this handle.
    pub fn arena(&self) -> ArenaInstanceId {
        self.arena
    }

    /// The block this allocation lives in.
    pub fn block(&self) -> BlockId {
        self.block
    }

    /// The block slot generation this handle was issued under.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Byte offset of the allocation within its block's payload.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the allocation in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte range covered within the block's payload.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handle(arena={}, block={}, gen={}, off={}, len={})",
            self.arena, self.block, self.generation, self.offset, self.len
        )
    }
}
