//! Allocator: leases items into its pools under a fixed [`Policy`].
//!
//! An allocator remembers which pool every outstanding ticket came from, so
//! a ticket is only honoured by the allocator that issued it, even when two
//! allocators share pools.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::policy::Policy;
use crate::pool::Pool;
use crate::ticket::Ticket;

/// Stable identity of an allocator, shared by all clones of its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocatorId(Uuid);

impl fmt::Display for AllocatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Mutable state guarded by the allocator lock.
struct AllocatorState<T> {
    /// ticket -> pool it was leased into, for tickets issued here and not yet released
    issued: HashMap<Ticket, Pool<T>>,
    last_error: Option<Error>,
}

struct AllocatorInner<T> {
    id: AllocatorId,
    policy: Policy,
    pools: Vec<Pool<T>>,
    state: Mutex<AllocatorState<T>>,
}

/// Agent that leases and releases items against an ordered list of pools.
///
/// Cloning yields another handle to the same allocator (same
/// [`AllocatorId`], same outstanding tickets).
pub struct Allocator<T> {
    inner: Arc<AllocatorInner<T>>,
}

impl<T> Clone for Allocator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Allocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocator")
            .field("id", &self.inner.id)
            .field("policy", &self.inner.policy)
            .field("pools", &self.inner.pools.len())
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

impl<T> Allocator<T> {
    /// Create an allocator over `pools` (in selection order) using `policy`.
    pub fn new(policy: Policy, pools: impl IntoIterator<Item = Pool<T>>) -> Self {
        Self {
            inner: Arc::new(AllocatorInner {
                id: AllocatorId(Uuid::new_v4()),
                policy,
                pools: pools.into_iter().collect(),
                state: Mutex::new(AllocatorState {
                    issued: HashMap::new(),
                    last_error: None,
                }),
            }),
        }
    }

    /// Allocator that fills pools in list order.
    pub fn sequential(pools: impl IntoIterator<Item = Pool<T>>) -> Self {
        Self::new(Policy::Sequential, pools)
    }

    /// Allocator that picks the pool with the most free slots.
    pub fn most_available(pools: impl IntoIterator<Item = Pool<T>>) -> Self {
        Self::new(Policy::MostAvailable, pools)
    }

    /// Allocator that picks the pool with the highest free-slot ratio.
    pub fn highest_availability_rate(pools: impl IntoIterator<Item = Pool<T>>) -> Self {
        Self::new(Policy::HighestAvailabilityRate, pools)
    }

    /// Identity of this allocator.
    #[must_use]
    pub fn id(&self) -> AllocatorId {
        self.inner.id
    }

    /// Selection policy, fixed at construction.
    #[must_use]
    pub fn policy(&self) -> Policy {
        self.inner.policy
    }

    /// Pools in selection order.
    #[must_use]
    pub fn pools(&self) -> &[Pool<T>] {
        &self.inner.pools
    }

    /// Number of tickets issued here and not yet released.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.inner.state.lock().issued.len()
    }

    /// `true` if `ticket` was issued here and is still outstanding.
    #[must_use]
    pub fn recognizes(&self, ticket: &Ticket) -> bool {
        self.inner.state.lock().issued.contains_key(ticket)
    }

    /// Lease `item` into the pool chosen by the policy.
    ///
    /// # Errors
    /// [`Error::CapacityExhausted`] if no pool has a free slot (or there are no pools).
    pub fn lease(&self, item: T) -> Result<Ticket> {
        let inner = &self.inner;
        let mut state = inner.state.lock();

        // Selection reads counts without holding the pool lock, so the chosen
        // pool may fill up before we lease; the checked lease settles it.
        let leased = inner
            .policy
            .select(&inner.pools)
            .and_then(|pool| pool.try_lease(item).map(|ticket| (pool, ticket)));

        let Some((pool, ticket)) = leased else {
            tracing::warn!(
                allocator = %inner.id,
                policy = %inner.policy,
                pools = inner.pools.len(),
                "no pool has a free slot"
            );
            state.last_error = Some(Error::CapacityExhausted);
            return Err(Error::CapacityExhausted);
        };

        state.last_error = None;
        state.issued.insert(ticket.clone(), pool.clone());
        tracing::debug!(
            allocator = %inner.id,
            %ticket,
            pool_capacity = pool.capacity(),
            available = pool.available_count(),
            "leased"
        );
        Ok(ticket)
    }

    /// Release the item held under `ticket`.
    ///
    /// # Errors
    /// [`Error::MissingTicket`] when `ticket` is `None`;
    /// [`Error::UnrecognizedTicket`] when it was not issued here or was already released.
    pub fn release(&self, ticket: Option<&Ticket>) -> Result<T> {
        let inner = &self.inner;
        let mut state = inner.state.lock();

        let Some(ticket) = ticket else {
            tracing::debug!(allocator = %inner.id, "release without ticket");
            state.last_error = Some(Error::MissingTicket);
            return Err(Error::MissingTicket);
        };

        // The pool entry can only be gone if someone bypassed this allocator
        // and released straight from the pool; treat that like a spent ticket.
        let item = state
            .issued
            .remove(ticket)
            .and_then(|pool| pool.release(ticket));

        match item {
            Some(item) => {
                state.last_error = None;
                tracing::debug!(allocator = %inner.id, %ticket, "released");
                Ok(item)
            }
            None => {
                tracing::debug!(allocator = %inner.id, %ticket, "unrecognized ticket");
                state.last_error = Some(Error::UnrecognizedTicket);
                Err(Error::UnrecognizedTicket)
            }
        }
    }

    /// Error from the most recent lease or release, `None` after a success.
    #[must_use]
    pub fn last_error(&self) -> Option<Error> {
        self.inner.state.lock().last_error.clone()
    }

    /// Message of [`last_error`](Self::last_error).
    #[must_use]
    pub fn last_error_message(&self) -> Option<String> {
        self.last_error().map(|err| err.to_string())
    }

    /// `true` if both handles refer to the same allocator.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
