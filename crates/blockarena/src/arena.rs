//! The block arena.
//!
//! [`Arena`] serves variable-size requests from a chain of blocks. Small
//! requests are packed into shared blocks of the default size; requests at
//! least that large get a dedicated block of their own, which can later be
//! recycled as a whole. There is no per-object free.
//!
//! # Layout
//!
//! ```text
//! Arena
//! ├── slots: Vec<Slot>        ←── generation + Option<Block>, indexed by BlockId
//! ├── vacant: Vec<BlockId>    ←── slots emptied by trim(), reused first
//! ├── head ─► block 3 ─► block 2 ─► block 1 ─► block 0   (newest first)
//! └── store: BackingStore     ←── source of block payloads
//! ```
//!
//! Placement is first-fit along the chain. A handle carries its block's slot
//! generation; recycling, resetting or trimming a block bumps that
//! generation, which turns every handle into the old contents into a
//! [`ArenaError::StaleHandle`].

use std::fmt;

use tracing::{debug, trace};

use crate::backing::{BackingStore, SystemStore};
use crate::block::{Block, BlockInfo, BlockState};
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::handle::Handle;
use crate::id::{ArenaInstanceId, BlockId};

/// One entry of the slot table.
struct Slot {
    /// Bumped whenever the block's previous contents become invalid.
    generation: u32,
    /// `None` while the slot sits on the vacant list.
    block: Option<Block>,
}

/// Outcome of [`Arena::recycle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recycle {
    /// The block was `Exclusive` and is now `Free` for reuse.
    Reclaimed,
    /// The block holds packed sub-allocations; nothing changed.
    Ignored,
}

/// Aggregate occupancy figures for an arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Blocks currently chained.
    pub block_count: usize,
    /// Blocks in the `Free` state.
    pub free_blocks: usize,
    /// Blocks in the `Shared` state.
    pub shared_blocks: usize,
    /// Blocks in the `Exclusive` state.
    pub exclusive_blocks: usize,
    /// Bytes handed out across all blocks.
    pub used_bytes: usize,
    /// Payload bytes held across all blocks.
    pub capacity_bytes: usize,
}

/// Fixed-block-size arena allocator.
///
/// Single-threaded: every operation takes `&mut self` or `&self` and runs to
/// completion. Wrap the arena in a lock if it has to be shared.
///
/// The arena is created with one `Free` block of the default size. It grows
/// by prepending a block whenever no existing block can take a request, and
/// gives memory back only on [`Arena::trim`], [`Arena::release`], or drop.
pub struct Arena<S: BackingStore = SystemStore> {
    id: ArenaInstanceId,
    config: ArenaConfig,
    store: S,
    slots: Vec<Slot>,
    vacant: Vec<BlockId>,
    /// Most recently created block.
    head: Option<BlockId>,
    block_count: usize,
    released: bool,
}

impl Arena<SystemStore> {
    /// Create an arena on the global heap with the given default block size.
    ///
    /// Returns `Err(ArenaError::InvalidConfig)` if `block_size` is zero, or
    /// `Err(ArenaError::OutOfMemory)` if the first block cannot be allocated.
    pub fn create(block_size: usize) -> Result<Self, ArenaError> {
        Self::new(ArenaConfig::new(block_size))
    }

    /// Create an arena on the global heap from a full config.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        Self::with_store(config, SystemStore)
    }
}

impl<S: BackingStore> Arena<S> {
    /// Create an arena drawing its blocks from `store`.
    ///
    /// The first block (`Free`, `default_block_size` bytes) is acquired
    /// immediately. If either the slot table or that block cannot be
    /// supplied, nothing is kept and `Err(ArenaError::OutOfMemory)` is
    /// returned.
    pub fn with_store(config: ArenaConfig, store: S) -> Result<Self, ArenaError> {
        config.validate()?;
        let mut arena = Self {
            id: ArenaInstanceId::next(),
            config,
            store,
            slots: Vec::new(),
            vacant: Vec::new(),
            head: None,
            block_count: 0,
            released: true,
        };
        arena.build()?;
        Ok(arena)
    }

    /// Re-initialise the arena with a new default block size.
    ///
    /// Any blocks still held are released first, and the arena takes a new
    /// instance ID, so handles from before the call are rejected with
    /// [`ArenaError::InvalidHandle`]. The block limit is carried over.
    ///
    /// An invalid `block_size` leaves the arena untouched. If the new first
    /// block cannot be allocated, the arena is left released.
    pub fn init(&mut self, block_size: usize) -> Result<(), ArenaError> {
        let config = ArenaConfig {
            default_block_size: block_size,
            ..self.config.clone()
        };
        config.validate()?;
        self.release();
        self.config = config;
        self.id = ArenaInstanceId::next();
        self.build()
    }

    /// Reserve the slot table and the first block.
    fn build(&mut self) -> Result<(), ArenaError> {
        debug_assert!(self.released && self.slots.is_empty());
        let block_size = self.config.default_block_size;
        self.slots
            .try_reserve(1)
            .map_err(|_| ArenaError::OutOfMemory {
                requested: std::mem::size_of::<Slot>(),
            })?;
        if let Err(e) = self.push_block(block_size, 0, BlockState::Free) {
            self.slots = Vec::new();
            return Err(e);
        }
        self.released = false;
        debug!(arena = %self.id, default_block_size = block_size, "arena created");
        Ok(())
    }

    /// Allocate `size` bytes.
    ///
    /// Walks the chain newest-first and places the request in the first
    /// block that is not `Exclusive` and has `size` bytes left. The block
    /// becomes `Exclusive` if `size` equals the default block size, and
    /// `Shared` otherwise.
    ///
    /// If no block fits, a new one is prepended: `default_block_size` bytes
    /// and `Shared` for a smaller request, exactly `size` bytes and
    /// `Exclusive` otherwise.
    ///
    /// The returned bytes are neither aligned beyond 1 nor zeroed.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::Released`] after [`Arena::release`].
    /// - [`ArenaError::OutOfMemory`] if a new block is needed and the
    ///   backing store or block limit refuses it. The chain is unchanged.
    pub fn allocate(&mut self, size: usize) -> Result<Handle, ArenaError> {
        self.ensure_live()?;
        let arena = self.id;
        let default = self.config.default_block_size;
        let placed = if size == default {
            BlockState::Exclusive
        } else {
            BlockState::Shared
        };

        let mut cursor = self.head;
        while let Some(id) = cursor {
            let slot = &mut self.slots[id.index()];
            // Vacant slots are never linked into the chain.
            let Some(block) = slot.block.as_mut() else {
                break;
            };
            if block.fits(size) {
                let offset = block.bump(size, placed);
                trace!(%arena, block = %id, size, offset, state = %placed, "placed in existing block");
                return Ok(Handle::new(arena, id, slot.generation, offset, size));
            }
            cursor = block.next;
        }

        let (capacity, state) = if size < default {
            (default, BlockState::Shared)
        } else {
            (size, BlockState::Exclusive)
        };
        let id = self.push_block(capacity, size, state)?;
        trace!(%arena, block = %id, size, capacity, state = %state, "no block fits, created new block");
        Ok(Handle::new(arena, id, self.slots[id.index()].generation, 0, size))
    }

    /// Acquire a payload and link it in as the new head of the chain.
    ///
    /// On failure nothing is changed.
    fn push_block(&mut self, capacity: usize, used: usize, state: BlockState) -> Result<BlockId, ArenaError> {
        let oom = ArenaError::OutOfMemory {
            requested: capacity,
        };
        if self.block_count >= self.config.max_blocks as usize {
            return Err(oom);
        }
        if self.vacant.is_empty() {
            self.slots.try_reserve(1).map_err(|_| oom.clone())?;
        }
        let data = self.store.acquire(capacity).ok_or(oom)?;
        let block = Block::new(data, used, state, self.head);

        let id = match self.vacant.pop() {
            Some(id) => {
                self.slots[id.index()].block = Some(block);
                id
            }
            None => {
                let id = BlockId(self.slots.len() as u32);
                self.slots.push(Slot {
                    generation: 0,
                    block: Some(block),
                });
                id
            }
        };
        self.head = Some(id);
        self.block_count += 1;
        Ok(id)
    }

    /// Return a handle's block to the `Free` state, if it owns the block.
    ///
    /// Only an `Exclusive` block is reclaimed: its usage drops to zero, its
    /// generation is bumped (so `handle` and any copy of it become stale),
    /// and it is eligible for any later request. For a `Shared` block this
    /// is a no-op returning [`Recycle::Ignored`].
    ///
    /// # Errors
    ///
    /// [`ArenaError::Released`], [`ArenaError::InvalidHandle`] or
    /// [`ArenaError::StaleHandle`] if the handle does not resolve.
    pub fn recycle(&mut self, handle: &Handle) -> Result<Recycle, ArenaError> {
        self.check_handle(handle)?;
        let slot = &mut self.slots[handle.block.index()];
        let Some(block) = slot.block.as_mut() else {
            return Err(ArenaError::InvalidHandle {
                block: handle.block,
            });
        };
        if !block.reclaim() {
            trace!(arena = %self.id, block = %handle.block, state = %block.state(), "recycle ignored");
            return Ok(Recycle::Ignored);
        }
        slot.generation = slot.generation.wrapping_add(1);
        debug!(arena = %self.id, block = %handle.block, capacity = block.capacity(), "recycled block");
        Ok(Recycle::Reclaimed)
    }

    /// Recycle, additionally checking the size the caller allocated.
    ///
    /// `size` must equal the handle's length. Requests smaller than the
    /// default block size were packed, so they are never recycled: such a
    /// call returns [`Recycle::Ignored`] even if the block has since been
    /// marked `Exclusive` by a later default-size placement.
    pub fn recycle_sized(&mut self, handle: &Handle, size: usize) -> Result<Recycle, ArenaError> {
        self.check_handle(handle)?;
        if size != handle.len {
            return Err(ArenaError::SizeMismatch {
                expected: handle.len,
                actual: size,
            });
        }
        if size < self.config.default_block_size {
            return Ok(Recycle::Ignored);
        }
        self.recycle(handle)
    }

    /// Mark every block `Free` with nothing used, keeping the memory.
    ///
    /// Every outstanding handle becomes stale.
    pub fn reset(&mut self) -> Result<(), ArenaError> {
        self.ensure_live()?;
        for slot in &mut self.slots {
            if let Some(block) = slot.block.as_mut() {
                block.reset();
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        debug!(arena = %self.id, blocks = self.block_count, "arena reset");
        Ok(())
    }

    /// Give every `Free` block's memory back to the backing store.
    ///
    /// Trimmed slots are reused by later block creation under a new
    /// generation. Returns the number of payload bytes released. The chain
    /// may end up empty; the next allocation then creates a fresh block.
    pub fn trim(&mut self) -> Result<usize, ArenaError> {
        self.ensure_live()?;
        let mut released = 0usize;
        let mut prev: Option<BlockId> = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let (next, is_free) = match self.slots[id.index()].block.as_ref() {
                Some(block) => (block.next, block.state() == BlockState::Free),
                None => break,
            };
            if is_free {
                let slot = &mut self.slots[id.index()];
                if let Some(block) = slot.block.take() {
                    let data = block.into_data();
                    released += data.len();
                    self.store.release(data);
                }
                slot.generation = slot.generation.wrapping_add(1);
                self.vacant.push(id);
                self.block_count -= 1;
                self.relink(prev, next);
            } else {
                prev = Some(id);
            }
            cursor = next;
        }
        debug!(arena = %self.id, bytes = released, blocks = self.block_count, "arena trimmed");
        Ok(released)
    }

    /// Point `prev` (or the head) at `next`.
    fn relink(&mut self, prev: Option<BlockId>, next: Option<BlockId>) {
        match prev {
            None => self.head = next,
            Some(p) => {
                if let Some(block) = self.slots[p.index()].block.as_mut() {
                    block.next = next;
                }
            }
        }
    }

    /// Release every block to the backing store.
    ///
    /// Afterwards every operation except [`Arena::init`] reports
    /// [`ArenaError::Released`]. Calling `release` again is a no-op.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        let mut bytes = 0usize;
        for slot in self.slots.drain(..) {
            if let Some(block) = slot.block {
                let data = block.into_data();
                bytes += data.len();
                self.store.release(data);
            }
        }
        let blocks = self.block_count;
        self.slots = Vec::new();
        self.vacant = Vec::new();
        self.head = None;
        self.block_count = 0;
        self.released = true;
        debug!(arena = %self.id, blocks, bytes, "arena released");
    }

    /// Bytes owned by `handle`.
    pub fn get(&self, handle: &Handle) -> Result<&[u8], ArenaError> {
        self.check_handle(handle)?;
        self.slots[handle.block.index()]
            .block
            .as_ref()
            .map(|block| block.slice(handle.offset, handle.len))
            .ok_or(ArenaError::InvalidHandle {
                block: handle.block,
            })
    }

    /// Mutable bytes owned by `handle`.
    pub fn get_mut(&mut self, handle: &Handle) -> Result<&mut [u8], ArenaError> {
        self.check_handle(handle)?;
        self.slots[handle.block.index()]
            .block
            .as_mut()
            .map(|block| block.slice_mut(handle.offset, handle.len))
            .ok_or(ArenaError::InvalidHandle {
                block: handle.block,
            })
    }

    /// Check that `handle` was issued by this arena instance and that its
    /// block has not been recycled, reset or trimmed since.
    pub fn check_handle(&self, handle: &Handle) -> Result<(), ArenaError> {
        self.ensure_live()?;
        let invalid = ArenaError::InvalidHandle {
            block: handle.block,
        };
        if handle.arena != self.id {
            return Err(invalid);
        }
        let slot = self.slots.get(handle.block.index()).ok_or(invalid.clone())?;
        if slot.generation != handle.generation {
            return Err(ArenaError::StaleHandle {
                block: handle.block,
                handle_generation: handle.generation,
                current_generation: slot.generation,
            });
        }
        if slot.block.is_none() {
            return Err(invalid);
        }
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), ArenaError> {
        if self.released {
            Err(ArenaError::Released)
        } else {
            Ok(())
        }
    }

    /// Iterate over the chain, newest block first.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            slots: &self.slots,
            cursor: self.head,
        }
    }

    /// Snapshot of a single block, if the slot is occupied.
    pub fn block(&self, id: BlockId) -> Option<BlockInfo> {
        let slot = self.slots.get(id.index())?;
        slot.block.as_ref().map(|block| info(id, slot.generation, block))
    }

    /// Aggregate occupancy across the chain.
    pub fn stats(&self) -> ArenaStats {
        self.blocks().fold(ArenaStats::default(), |mut stats, b| {
            stats.block_count += 1;
            match b.state {
                BlockState::Free => stats.free_blocks += 1,
                BlockState::Shared => stats.shared_blocks += 1,
                BlockState::Exclusive => stats.exclusive_blocks += 1,
            }
            stats.used_bytes += b.used;
            stats.capacity_bytes += b.capacity;
            stats
        })
    }

    /// Number of blocks currently chained.
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// The standard block payload size.
    pub fn default_block_size(&self) -> usize {
        self.config.default_block_size
    }

    /// The arena's configuration.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// This arena's current instance ID.
    pub fn id(&self) -> ArenaInstanceId {
        self.id
    }

    /// Whether [`Arena::release`] has been called without a later `init`.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: BackingStore> Drop for Arena<S> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<S: BackingStore> fmt::Debug for Arena<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("block_count", &self.block_count)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

fn info(id: BlockId, generation: u32, block: &Block) -> BlockInfo {
    BlockInfo {
        id,
        state: block.state(),
        used: block.used(),
        capacity: block.capacity(),
        generation,
    }
}

/// Iterator over an arena's blocks, newest first. See [`Arena::blocks`].
pub struct Blocks<'a> {
    slots: &'a [Slot],
    cursor: Option<BlockId>,
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let id = self.cursor?;
        let slot = &self.slots[id.index()];
        let block = slot.block.as_ref()?;
        self.cursor = block.next;
        Some(info(id, slot.generation, block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backing::BudgetStore;

    fn states(arena: &Arena<impl BackingStore>) -> Vec<(BlockState, usize, usize)> {
        arena.blocks().map(|b| (b.state, b.used, b.capacity)).collect()
    }

    #[test]
    fn create_builds_one_free_block() {
        let arena = Arena::create(12).unwrap();
        assert_eq!(arena.block_count(), 1);
        assert_eq!(arena.default_block_size(), 12);
        assert_eq!(states(&arena), vec![(BlockState::Free, 0, 12)]);
        assert!(!arena.is_released());
    }

    #[test]
    fn create_rejects_zero_block_size() {
        let err = Arena::create(0).unwrap_err();
        assert!(matches!(err, ArenaError::InvalidConfig { .. }));
    }

    #[test]
    fn create_reports_oom_when_first_block_refused() {
        let err = Arena::with_store(ArenaConfig::new(64), BudgetStore::new(32)).unwrap_err();
        assert_eq!(err, ArenaError::OutOfMemory { requested: 64 });
    }

    #[test]
    fn small_requests_pack_into_first_block() {
        let mut arena = Arena::create(12).unwrap();
        let a = arena.allocate(2).unwrap();
        let b = arena.allocate(4).unwrap();
        assert_eq!(a.block(), b.block());
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 2);
        assert_eq!(states(&arena), vec![(BlockState::Shared, 6, 12)]);
    }

    #[test]
    fn oversized_request_gets_dedicated_block_at_head() {
        let mut arena = Arena::create(12).unwrap();
        let h = arena.allocate(20).unwrap();
        assert_eq!(h.offset(), 0);
        assert_eq!(arena.blocks().next().unwrap().id, h.block());
        assert_eq!(
            states(&arena),
            vec![(BlockState::Exclusive, 20, 20), (BlockState::Free, 0, 12)]
        );
    }

    #[test]
    fn default_size_request_claims_free_block_exclusively() {
        let mut arena = Arena::create(12).unwrap();
        let h = arena.allocate(12).unwrap();
        assert_eq!(arena.block_count(), 1);
        assert_eq!(h.block(), BlockId(0));
        assert_eq!(states(&arena), vec![(BlockState::Exclusive, 12, 12)]);
    }

    #[test]
    fn failed_allocation_leaves_chain_unchanged() {
        let mut arena = Arena::with_store(ArenaConfig::new(16), BudgetStore::new(40)).unwrap();
        let _ = arena.allocate(16).unwrap();
        let before = states(&arena);
        let err = arena.allocate(30).unwrap_err();
        assert_eq!(err, ArenaError::OutOfMemory { requested: 30 });
        assert_eq!(states(&arena), before);
        assert_eq!(arena.block_count(), 1);
        assert_eq!(arena.store().outstanding(), 16);
    }

    #[test]
    fn max_blocks_limit_reports_oom() {
        let mut arena = Arena::new(ArenaConfig::new(8).with_max_blocks(2)).unwrap();
        let _ = arena.allocate(8).unwrap();
        let _ = arena.allocate(8).unwrap();
        let err = arena.allocate(1).unwrap_err();
        assert_eq!(err, ArenaError::OutOfMemory { requested: 8 });
    }

    #[test]
    fn get_mut_writes_are_visible_through_get() {
        let mut arena = Arena::create(16).unwrap();
        let a = arena.allocate(4).unwrap();
        let b = arena.allocate(4).unwrap();
        arena.get_mut(&a).unwrap().copy_from_slice(b"abcd");
        arena.get_mut(&b).unwrap().copy_from_slice(b"wxyz");
        assert_eq!(arena.get(&a).unwrap(), b"abcd");
        assert_eq!(arena.get(&b).unwrap(), b"wxyz");
    }

    #[test]
    fn recycle_exclusive_block_frees_it() {
        let mut arena = Arena::create(12).unwrap();
        let h = arena.allocate(13).unwrap();
        assert_eq!(arena.recycle(&h).unwrap(), Recycle::Reclaimed);
        let info = arena.block(h.block()).unwrap();
        assert_eq!(info.state, BlockState::Free);
        assert_eq!(info.used, 0);
        assert_eq!(info.generation, h.generation() + 1);
    }

    #[test]
    fn recycle_shared_block_is_ignored() {
        let mut arena = Arena::create(12).unwrap();
        let h = arena.allocate(3).unwrap();
        let before = states(&arena);
        assert_eq!(arena.recycle(&h).unwrap(), Recycle::Ignored);
        assert_eq!(states(&arena), before);
        assert!(arena.get(&h).is_ok());
    }

    #[test]
    fn recycled_handle_is_stale() {
        let mut arena = Arena::create(12).unwrap();
        let h = arena.allocate(13).unwrap();
        arena.recycle(&h).unwrap();
        let err = arena.recycle(&h).unwrap_err();
        assert!(matches!(err, ArenaError::StaleHandle { .. }));
        assert!(matches!(arena.get(&h), Err(ArenaError::StaleHandle { .. })));
    }

    #[test]
    fn foreign_handle_is_invalid() {
        let mut a = Arena::create(12).unwrap();
        let mut b = Arena::create(12).unwrap();
        let h = a.allocate(13).unwrap();
        let _ = b.allocate(13).unwrap();
        assert_eq!(
            b.recycle(&h).unwrap_err(),
            ArenaError::InvalidHandle { block: h.block() }
        );
    }

    #[test]
    fn recycle_sized_checks_size() {
        let mut arena = Arena::create(12).unwrap();
        let big = arena.allocate(13).unwrap();
        assert_eq!(
            arena.recycle_sized(&big, 14).unwrap_err(),
            ArenaError::SizeMismatch {
                expected: 13,
                actual: 14
            }
        );
        assert_eq!(arena.recycle_sized(&big, 13).unwrap(), Recycle::Reclaimed);
    }

    #[test]
    fn recycle_sized_ignores_packed_request_in_exclusive_block() {
        let mut arena = Arena::create(12).unwrap();
        // Recycle an oversized block, then pack a small request and a
        // default-size request into it; the latter marks it Exclusive.
        let big = arena.allocate(20).unwrap();
        arena.recycle(&big).unwrap();
        let small = arena.allocate(3).unwrap();
        let full = arena.allocate(12).unwrap();
        assert_eq!(small.block(), full.block());
        assert_eq!(arena.block(full.block()).unwrap().state, BlockState::Exclusive);

        assert_eq!(arena.recycle_sized(&small, 3).unwrap(), Recycle::Ignored);
        assert_eq!(arena.block(full.block()).unwrap().state, BlockState::Exclusive);
    }

    #[test]
    fn release_rejects_further_use() {
        let mut arena = Arena::create(12).unwrap();
        let h = arena.allocate(4).unwrap();
        arena.release();
        assert!(arena.is_released());
        assert_eq!(arena.block_count(), 0);
        assert_eq!(arena.allocate(4).unwrap_err(), ArenaError::Released);
        assert_eq!(arena.get(&h).unwrap_err(), ArenaError::Released);
        assert_eq!(arena.recycle(&h).unwrap_err(), ArenaError::Released);
        assert_eq!(arena.reset().unwrap_err(), ArenaError::Released);
        assert_eq!(arena.trim().unwrap_err(), ArenaError::Released);
        arena.release();
    }

    #[test]
    fn release_returns_memory_to_store() {
        let mut arena = Arena::with_store(ArenaConfig::new(16), BudgetStore::new(1024)).unwrap();
        let _ = arena.allocate(100).unwrap();
        let _ = arena.allocate(4).unwrap();
        assert_eq!(arena.store().outstanding(), 116);
        arena.release();
        assert_eq!(arena.store().outstanding(), 0);
    }

    #[test]
    fn init_after_release_starts_fresh() {
        let mut arena = Arena::create(12).unwrap();
        let old = arena.allocate(4).unwrap();
        let old_id = arena.id();
        arena.release();
        arena.init(32).unwrap();
        assert_ne!(arena.id(), old_id);
        assert_eq!(arena.default_block_size(), 32);
        assert_eq!(states(&arena), vec![(BlockState::Free, 0, 32)]);
        assert_eq!(
            arena.get(&old).unwrap_err(),
            ArenaError::InvalidHandle { block: old.block() }
        );
        assert!(arena.allocate(4).is_ok());
    }

    #[test]
    fn init_with_zero_size_leaves_arena_untouched() {
        let mut arena = Arena::create(12).unwrap();
        let h = arena.allocate(4).unwrap();
        assert!(matches!(arena.init(0), Err(ArenaError::InvalidConfig { .. })));
        assert!(arena.get(&h).is_ok());
    }

    #[test]
    fn init_failure_leaves_arena_released() {
        let mut arena = Arena::with_store(ArenaConfig::new(16), BudgetStore::new(64)).unwrap();
        assert_eq!(
            arena.init(128).unwrap_err(),
            ArenaError::OutOfMemory { requested: 128 }
        );
        assert!(arena.is_released());
        assert_eq!(arena.store().outstanding(), 0);
        arena.init(64).unwrap();
        assert_eq!(arena.block_count(), 1);
    }

    #[test]
    fn reset_frees_every_block_and_staleness_follows() {
        let mut arena = Arena::create(12).unwrap();
        let a = arena.allocate(5).unwrap();
        let b = arena.allocate(30).unwrap();
        arena.reset().unwrap();
        assert!(arena.blocks().all(|b| b.state == BlockState::Free && b.used == 0));
        assert!(matches!(arena.get(&a), Err(ArenaError::StaleHandle { .. })));
        assert!(matches!(arena.get(&b), Err(ArenaError::StaleHandle { .. })));
        assert_eq!(arena.block_count(), 2);

        // First-fit now reaches the 30-byte block first.
        let c = arena.allocate(20).unwrap();
        assert_eq!(c.block(), b.block());
    }

    #[test]
    fn trim_releases_free_blocks_and_reuses_slots() {
        let mut arena = Arena::with_store(ArenaConfig::new(12), BudgetStore::new(1024)).unwrap();
        let small = arena.allocate(5).unwrap();
        let big = arena.allocate(40).unwrap();
        arena.recycle(&big).unwrap();

        let released = arena.trim().unwrap();
        assert_eq!(released, 40);
        assert_eq!(arena.block_count(), 1);
        assert_eq!(arena.store().outstanding(), 12);
        assert!(arena.get(&small).is_ok());

        let again = arena.allocate(50).unwrap();
        assert_eq!(again.block(), big.block());
        assert_ne!(again.generation(), big.generation());
        assert!(matches!(arena.get(&big), Err(ArenaError::StaleHandle { .. })));
        assert_eq!(arena.blocks().next().unwrap().id, again.block());
    }

    #[test]
    fn trim_can_empty_the_chain() {
        let mut arena = Arena::create(12).unwrap();
        assert_eq!(arena.trim().unwrap(), 12);
        assert_eq!(arena.block_count(), 0);
        assert_eq!(arena.blocks().count(), 0);
        let h = arena.allocate(3).unwrap();
        assert_eq!(arena.block_count(), 1);
        assert_eq!(h.block(), BlockId(0));
    }

    #[test]
    fn trim_unlinks_middle_block() {
        let mut arena = Arena::create(8).unwrap();
        let _first = arena.allocate(3).unwrap(); // block 0, shared
        let mid = arena.allocate(9).unwrap(); // block 1, exclusive
        let _top = arena.allocate(10).unwrap(); // block 2, exclusive
        arena.recycle(&mid).unwrap();
        arena.trim().unwrap();
        let ids: Vec<_> = arena.blocks().map(|b| b.id).collect();
        assert_eq!(ids, vec![BlockId(2), BlockId(0)]);
    }

    #[test]
    fn recycle_through_one_handle_stales_the_other() {
        let mut arena = Arena::create(12).unwrap();
        let empty = arena.allocate(0).unwrap();
        let full = arena.allocate(12).unwrap();
        assert_eq!(empty.block(), full.block());
        assert_eq!(arena.block(full.block()).unwrap().state, BlockState::Exclusive);

        assert_eq!(arena.recycle(&full).unwrap(), Recycle::Reclaimed);
        assert!(matches!(arena.get(&empty), Err(ArenaError::StaleHandle { .. })));
        assert!(matches!(arena.recycle(&empty), Err(ArenaError::StaleHandle { .. })));
    }

    #[test]
    fn recycled_block_keeps_previous_bytes() {
        let mut arena = Arena::create(12).unwrap();
        let h = arena.allocate(13).unwrap();
        assert!(arena.get(&h).unwrap().iter().all(|&b| b == 0));
        arena.get_mut(&h).unwrap().fill(0xAB);
        arena.recycle(&h).unwrap();

        let again = arena.allocate(13).unwrap();
        assert_eq!(again.block(), h.block());
        assert!(arena.get(&again).unwrap().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn stats_summarise_chain() {
        let mut arena = Arena::create(12).unwrap();
        let _ = arena.allocate(2).unwrap();
        let _ = arena.allocate(13).unwrap();
        let stats = arena.stats();
        assert_eq!(stats.block_count, 2);
        assert_eq!(stats.shared_blocks, 1);
        assert_eq!(stats.exclusive_blocks, 1);
        assert_eq!(stats.free_blocks, 0);
        assert_eq!(stats.used_bytes, 15);
        assert_eq!(stats.capacity_bytes, 25);
    }
}
