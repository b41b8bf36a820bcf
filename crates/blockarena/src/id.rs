//! Strongly-typed identifiers for arenas and their blocks.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies a block slot within a single arena.
///
/// Slot indices are reused after [`Arena::trim`](crate::Arena::trim), so a
/// `BlockId` alone does not identify a block uniquely over time. Handles pair
/// it with a slot generation for that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BlockId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Counter for unique [`ArenaInstanceId`] allocation.
static ARENA_INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for an arena.
///
/// Allocated from a monotonic atomic counter via [`ArenaInstanceId::next`].
/// An arena draws a fresh ID at construction and again on every
/// [`Arena::init`](crate::Arena::init), so a handle issued before a release
/// never resolves against the re-initialised arena, nor against any other
/// arena in the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaInstanceId(u64);

impl ArenaInstanceId {
    /// Allocate a fresh, unique instance ID. Thread-safe.
    pub fn next() -> Self {
        Self(ARENA_INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArenaInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_ids_are_unique() {
        let a = ArenaInstanceId::next();
        let b = ArenaInstanceId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn block_id_display_and_from() {
        let id = BlockId::from(7);
        assert_eq!(id, BlockId(7));
        assert_eq!(id.to_string(), "7");
        assert_eq!(id.index(), 7);
    }
}
