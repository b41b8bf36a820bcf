//! Workload profiles and utilities for benchmarking blockarena.
//!
//! - [`mixed_sizes`]: deterministic request sizes around a block size
//! - [`replay`]: feed a size sequence through an arena
//! - [`DEMO_SEQUENCE`]: the reference placement walk-through on a 12-byte arena

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::error::Error;
use std::fmt;

use blockarena::{Arena, ArenaError, BackingStore, Handle};

/// One step of a scripted arena session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Allocate this many bytes.
    Allocate(usize),
    /// Recycle the handle produced by the step at this index.
    Recycle(usize),
}

/// Default block size used by [`DEMO_SEQUENCE`].
pub const DEMO_BLOCK_SIZE: usize = 12;

/// Packs small requests, dedicates oversized ones, then recycles the
/// 13-byte block and reuses it.
pub const DEMO_SEQUENCE: [Step; 8] = [
    Step::Allocate(2),
    Step::Allocate(13),
    Step::Allocate(4),
    Step::Allocate(6),
    Step::Allocate(7),
    Step::Allocate(14),
    Step::Recycle(1),
    Step::Allocate(13),
];

/// Errors from running a scripted session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepError {
    /// A `Recycle` step names a step that is not an earlier `Allocate`.
    NoHandle {
        /// Position of the offending step.
        step: usize,
        /// Index it tried to recycle.
        target: usize,
    },
    /// The arena rejected an operation.
    Arena(ArenaError),
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHandle { step, target } => {
                write!(f, "step {step} recycles step {target}, which produced no handle")
            }
            Self::Arena(e) => write!(f, "arena error: {e}"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            Self::NoHandle { .. } => None,
        }
    }
}

impl From<ArenaError> for StepError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

/// Run a scripted session. Returns the handle produced by each step
/// (`None` for recycle steps).
///
/// A `Recycle(i)` step must name an earlier `Allocate` step; anything else
/// stops the session with [`StepError::NoHandle`].
pub fn run_steps<S: BackingStore>(
    arena: &mut Arena<S>,
    steps: &[Step],
) -> Result<Vec<Option<Handle>>, StepError> {
    let mut produced: Vec<Option<Handle>> = Vec::with_capacity(steps.len());
    for (position, step) in steps.iter().enumerate() {
        match *step {
            Step::Allocate(size) => produced.push(Some(arena.allocate(size)?)),
            Step::Recycle(index) => {
                let handle = produced
                    .get(index)
                    .copied()
                    .flatten()
                    .ok_or(StepError::NoHandle {
                        step: position,
                        target: index,
                    })?;
                arena.recycle(&handle)?;
                produced.push(None);
            }
        }
    }
    Ok(produced)
}

/// Generate `n` deterministic request sizes in `1..=2 * block_size`.
///
/// Roughly one request in eight is oversized (`>= block_size`), the rest
/// are small enough to pack.
pub fn mixed_sizes(n: usize, block_size: usize, seed: u64) -> Vec<usize> {
    let block_size = block_size.max(1);
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let r = (state >> 33) as usize;
            if r % 8 == 0 {
                block_size + r % (block_size + 1)
            } else {
                1 + r % (block_size / 4).max(1)
            }
        })
        .collect()
}

/// Allocate every size in `sizes`, in order.
pub fn replay<S: BackingStore>(arena: &mut Arena<S>, sizes: &[usize]) -> Result<Vec<Handle>, ArenaError> {
    sizes.iter().map(|&size| arena.allocate(size)).collect()
}
