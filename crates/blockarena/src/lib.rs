//! Fixed-block-size arena allocator.
//!
//! An [`Arena`] keeps a chain of blocks and serves variable-size byte
//! requests from it, either by packing several small requests into one
//! block or by dedicating an oversized block to a single request. Memory
//! is reclaimed coarsely: a dedicated block can be recycled as a whole,
//! the whole arena can be reset or trimmed, but individual packed
//! sub-allocations are never freed.
//!
//! # Architecture
//!
//! ```text
//! Arena (owner of everything below)
//! ├── ArenaConfig (default block size, block limit)
//! ├── slot table → Block (payload + used + BlockState + next)
//! │   └── chain: newest block first, first-fit placement
//! └── BackingStore (SystemStore | BudgetStore | caller-supplied)
//! ```
//!
//! # Block states
//!
//! - **Free:** nothing live; any request may be placed.
//! - **Shared:** sub-allocations packed in; never reclaimed individually.
//! - **Exclusive:** one allocation owns the block; eligible for recycle.
//!
//! # Handles
//!
//! [`Arena::allocate`] returns a [`Handle`] naming the owning block and a
//! generation. Handles whose block has been recycled, reset or trimmed are
//! rejected with [`ArenaError::StaleHandle`]; handles from another arena (or
//! from before a release) are rejected with [`ArenaError::InvalidHandle`].
//!
//! # Example
//!
//! ```
//! use blockarena::{Arena, BlockState, Recycle};
//!
//! let mut arena = Arena::create(12)?;
//! let small = arena.allocate(2)?;
//! let big = arena.allocate(13)?;
//! arena.get_mut(&small)?.copy_from_slice(b"hi");
//!
//! assert_eq!(arena.recycle(&big)?, Recycle::Reclaimed);
//! assert_eq!(arena.recycle(&small)?, Recycle::Ignored);
//! assert_eq!(arena.block(big.block()).unwrap().state, BlockState::Free);
//! # Ok::<(), blockarena::ArenaError>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod backing;
pub mod block;
pub mod config;
pub mod error;
pub mod handle;
pub mod id;

// Public re-exports for the primary API surface.
pub use arena::{Arena, ArenaStats, Blocks, Recycle};
pub use backing::{BackingStore, BudgetStore, SystemStore};
pub use block::{BlockInfo, BlockState};
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use handle::Handle;
pub use id::{ArenaInstanceId, BlockId};

#[cfg(doctest)]
#[doc = include_str!("../README.md")]
pub struct ReadmeDoctests;
