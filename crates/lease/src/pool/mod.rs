//! Resource pool, a capacity-bounded set of leased items keyed by ticket.
//!
//! `Pool<T>` is a cheap handle: clones share the same underlying pool, so a
//! single pool can sit behind several allocators at once. [`Pool::lease`]
//! does not enforce capacity; allocators go through the checked lease, which
//! tests for a free slot and inserts under the same lock.

pub mod config;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::ticket::Ticket;

pub use config::{DEFAULT_CAPACITY, PoolConfig};

/// Pool statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Fixed capacity of the pool.
    pub capacity: usize,
    /// Items currently leased.
    pub occupied: usize,
    /// Free slots (`capacity - occupied`, never negative).
    pub available: usize,
    /// Total successful leases.
    pub total_leases: u64,
    /// Total successful releases.
    pub total_releases: u64,
}

/// Mutable state guarded by the pool lock.
struct PoolState<T> {
    occupied: HashMap<Ticket, T>,
    total_leases: u64,
    total_releases: u64,
}

/// Inner shared state for the pool.
struct PoolInner<T> {
    config: PoolConfig,
    state: Mutex<PoolState<T>>,
}

/// Capacity-bounded pool of leased items.
pub struct Pool<T> {
    inner: Arc<PoolInner<T>>,
}

impl<T> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool").field("stats", &self.stats()).finish()
    }
}

impl<T> Default for Pool<T> {
    /// A pool with [`DEFAULT_CAPACITY`] slots.
    fn default() -> Self {
        Self::from_valid_config(PoolConfig::default())
    }
}

impl<T> Pool<T> {
    /// Create a pool with the given capacity.
    ///
    /// # Errors
    /// Returns a configuration error if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(PoolConfig::with_capacity(capacity))
    }

    /// Create a pool from a [`PoolConfig`].
    ///
    /// # Errors
    /// Returns error if `config` is invalid (e.g. capacity == 0).
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: PoolConfig) -> Self {
        let capacity = config.capacity;
        Self {
            inner: Arc::new(PoolInner {
                config,
                state: Mutex::new(PoolState {
                    occupied: HashMap::with_capacity(capacity),
                    total_leases: 0,
                    total_releases: 0,
                }),
            }),
        }
    }

    /// Fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.config.capacity
    }

    /// Number of items currently leased.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.inner.state.lock().occupied.len()
    }

    /// Free slots: `capacity - occupied`.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.capacity().saturating_sub(self.occupied_count())
    }

    /// Free slots as a fraction of capacity, in `[0, 1]`.
    #[must_use]
    pub fn availability_rate(&self) -> f64 {
        self.available_count() as f64 / self.capacity() as f64
    }

    /// `true` when no slot is free.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.available_count() == 0
    }

    /// Store `item` under a freshly minted ticket.
    ///
    /// Capacity is not checked here. Leasing into a full pool over-subscribes it.
    pub fn lease(&self, item: T) -> Ticket {
        let ticket = Ticket::mint();
        let mut state = self.inner.state.lock();
        state.occupied.insert(ticket.clone(), item);
        state.total_leases += 1;
        ticket
    }

    /// Store `item` only if a slot is free, checking and inserting under one lock.
    ///
    /// Returns `None` (dropping `item`) when the pool is full.
    pub(crate) fn try_lease(&self, item: T) -> Option<Ticket> {
        let mut state = self.inner.state.lock();
        if state.occupied.len() >= self.capacity() {
            return None;
        }
        let ticket = Ticket::mint();
        state.occupied.insert(ticket.clone(), item);
        state.total_leases += 1;
        Some(ticket)
    }

    /// Remove and return the item stored under `ticket`, if any.
    pub fn release(&self, ticket: &Ticket) -> Option<T> {
        let mut state = self.inner.state.lock();
        let item = state.occupied.remove(ticket)?;
        state.total_releases += 1;
        Some(item)
    }

    /// `true` if `ticket` currently holds an item in this pool.
    #[must_use]
    pub fn holds(&self, ticket: &Ticket) -> bool {
        self.inner.state.lock().occupied.contains_key(ticket)
    }

    /// Snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        let capacity = self.capacity();
        let occupied = state.occupied.len();
        PoolStats {
            capacity,
            occupied,
            available: capacity.saturating_sub(occupied),
            total_leases: state.total_leases,
            total_releases: state.total_releases,
        }
    }

    /// `true` if both handles refer to the same pool.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
