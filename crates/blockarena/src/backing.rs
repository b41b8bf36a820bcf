//! Backing stores: where block payloads come from.
//!
//! The arena treats its memory source as an opaque provider of byte regions
//! that may refuse a request. [`SystemStore`] draws from the global heap with
//! fallible reservation; [`BudgetStore`] caps the outstanding total so that
//! exhaustion can be driven deterministically.

/// A source of block payload regions.
///
/// `acquire` returns `None` when the region cannot be supplied; the arena
/// turns that into [`ArenaError::OutOfMemory`](crate::ArenaError::OutOfMemory).
/// Every region handed out is eventually passed back through `release`.
pub trait BackingStore {
    /// Supply a region of exactly `bytes` bytes.
    fn acquire(&mut self, bytes: usize) -> Option<Box<[u8]>>;

    /// Take back a region previously returned by `acquire`.
    fn release(&mut self, region: Box<[u8]>);
}

/// Backing store over the global allocator.
///
/// Uses `try_reserve_exact`, so an allocation failure is reported as `None`
/// rather than aborting the process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemStore;

impl BackingStore for SystemStore {
    fn acquire(&mut self, bytes: usize) -> Option<Box<[u8]>> {
        let mut buf: Vec<u8> = Vec::new();
        buf.try_reserve_exact(bytes).ok()?;
        // Zero-fill only so the payload is initialised without `unsafe`.
        // Callers get no zeroing guarantee: recycled blocks keep old bytes.
        buf.resize(bytes, 0);
        Some(buf.into_boxed_slice())
    }

    fn release(&mut self, region: Box<[u8]>) {
        drop(region);
    }
}

/// Backing store with a fixed byte budget.
///
/// Refuses any request that would push the outstanding total past `limit`.
/// Released regions give their bytes back to the budget.
#[derive(Debug)]
pub struct BudgetStore {
    limit: usize,
    outstanding: usize,
    system: SystemStore,
}

impl BudgetStore {
    /// Create a store that will hand out at most `limit` bytes at a time.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            outstanding: 0,
            system: SystemStore,
        }
    }

    /// Total byte budget.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes currently handed out.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Bytes still available under the budget.
    pub fn remaining(&self) -> usize {
        self.limit - self.outstanding
    }
}

impl BackingStore for BudgetStore {
    fn acquire(&mut self, bytes: usize) -> Option<Box<[u8]>> {
        let next = self.outstanding.checked_add(bytes)?;
        if next > self.limit {
            return None;
        }
        let region = self.system.acquire(bytes)?;
        self.outstanding = next;
        Some(region)
    }

    fn release(&mut self, region: Box<[u8]>) {
        self.outstanding = self.outstanding.saturating_sub(region.len());
        self.system.release(region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_store_supplies_exact_size() {
        let mut store = SystemStore;
        let region = store.acquire(100).unwrap();
        assert_eq!(region.len(), 100);
        store.release(region);
    }

    #[test]
    fn system_store_refuses_impossible_request() {
        let mut store = SystemStore;
        assert!(store.acquire(usize::MAX).is_none());
    }

    #[test]
    fn budget_store_refuses_past_limit() {
        let mut store = BudgetStore::new(64);
        let a = store.acquire(40).unwrap();
        assert_eq!(store.outstanding(), 40);
        assert!(store.acquire(25).is_none());
        assert_eq!(store.outstanding(), 40);
        let b = store.acquire(24).unwrap();
        assert_eq!(store.remaining(), 0);
        store.release(a);
        store.release(b);
        assert_eq!(store.outstanding(), 0);
    }

    #[test]
    fn budget_store_release_restores_budget() {
        let mut store = BudgetStore::new(10);
        let region = store.acquire(10).unwrap();
        assert!(store.acquire(1).is_none());
        store.release(region);
        assert!(store.acquire(10).is_some());
    }
}
