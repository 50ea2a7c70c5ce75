//! Manager: authorization gate in front of a roster of allocators.
//!
//! A manager forwards lease/release calls only to allocators it has
//! authorized. It keeps two error channels: its own (rejected delegation,
//! or its own direct leases) and the one copied back from the delegate.

use std::fmt;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::allocator::{Allocator, AllocatorId};
use crate::error::{Error, Result};
use crate::policy::Policy;
use crate::pool::Pool;
use crate::ticket::Ticket;

/// Delegation layer over a set of authorized allocators.
///
/// A manager also owns a sequential allocator over its own pools (possibly
/// none) so it can lease and release directly.
pub struct Manager<T> {
    /// Authorized allocators, keyed by identity.
    roster: DashMap<AllocatorId, Allocator<T>>,
    /// Allocator used for the manager's own leases.
    desk: Allocator<T>,
    last_error: Mutex<Option<Error>>,
    last_error_from_delegate: Mutex<Option<Error>>,
}

impl<T> Manager<T> {
    /// Create a manager whose own leases go into `pools`, filled in order.
    pub fn new(pools: impl IntoIterator<Item = Pool<T>>) -> Self {
        Self {
            roster: DashMap::new(),
            desk: Allocator::new(Policy::Sequential, pools),
            last_error: Mutex::new(None),
            last_error_from_delegate: Mutex::new(None),
        }
    }

    /// Create a manager with no pools of its own.
    #[must_use]
    pub fn without_pools() -> Self {
        Self::new(Vec::new())
    }

    /// Add `allocator` to the roster. Authorizing twice is a no-op.
    pub fn authorize(&self, allocator: &Allocator<T>) {
        let id = allocator.id();
        if self.roster.insert(id, allocator.clone()).is_none() {
            tracing::debug!(allocator = %id, policy = %allocator.policy(), "authorized");
        }
    }

    /// Remove `allocator` from the roster, returning whether it was present.
    ///
    /// Tickets it already issued stay valid when released through it directly.
    pub fn revoke(&self, allocator: &Allocator<T>) -> bool {
        let removed = self.roster.remove(&allocator.id()).is_some();
        if removed {
            tracing::debug!(allocator = %allocator.id(), "revoked");
        }
        removed
    }

    /// `true` if `allocator` is on the roster.
    #[must_use]
    pub fn is_authorized(&self, allocator: &Allocator<T>) -> bool {
        self.roster.contains_key(&allocator.id())
    }

    /// Number of authorized allocators.
    #[must_use]
    pub fn authorized_count(&self) -> usize {
        self.roster.len()
    }

    /// Have `allocator` lease `item`.
    ///
    /// # Errors
    /// [`Error::UnauthorizedAgent`] if `allocator` is not on the roster (the
    /// allocator is not touched and the item is dropped); otherwise whatever
    /// the allocator's own lease returns.
    pub fn delegate_lease(&self, allocator: &Allocator<T>, item: T) -> Result<Ticket> {
        self.check_authorized(allocator)?;
        let result = allocator.lease(item);
        *self.last_error_from_delegate.lock() = allocator.last_error();
        result
    }

    /// Have `allocator` release the item held under `ticket`.
    ///
    /// # Errors
    /// [`Error::UnauthorizedAgent`] if `allocator` is not on the roster;
    /// otherwise whatever the allocator's own release returns.
    pub fn delegate_release(&self, allocator: &Allocator<T>, ticket: Option<&Ticket>) -> Result<T> {
        self.check_authorized(allocator)?;
        let result = allocator.release(ticket);
        *self.last_error_from_delegate.lock() = allocator.last_error();
        result
    }

    /// Lease `item` into the manager's own pools.
    ///
    /// # Errors
    /// [`Error::CapacityExhausted`] if every own pool is full or there are none.
    pub fn lease(&self, item: T) -> Result<Ticket> {
        let result = self.desk.lease(item);
        self.record(result.as_ref().err());
        result
    }

    /// Release a ticket the manager issued itself.
    ///
    /// # Errors
    /// [`Error::MissingTicket`] or [`Error::UnrecognizedTicket`].
    pub fn release(&self, ticket: Option<&Ticket>) -> Result<T> {
        let result = self.desk.release(ticket);
        self.record(result.as_ref().err());
        result
    }

    /// The manager's own pools, in fill order.
    #[must_use]
    pub fn pools(&self) -> &[Pool<T>] {
        self.desk.pools()
    }

    /// Error from the manager's last own operation or rejected delegation.
    #[must_use]
    pub fn last_error(&self) -> Option<Error> {
        self.last_error.lock().clone()
    }

    /// Message of [`last_error`](Self::last_error).
    #[must_use]
    pub fn last_error_message(&self) -> Option<String> {
        self.last_error().map(|err| err.to_string())
    }

    /// Error the last delegated allocator reported, `None` if it succeeded.
    #[must_use]
    pub fn last_error_from_delegate(&self) -> Option<Error> {
        self.last_error_from_delegate.lock().clone()
    }

    /// Message of [`last_error_from_delegate`](Self::last_error_from_delegate).
    #[must_use]
    pub fn last_error_message_from_delegate(&self) -> Option<String> {
        self.last_error_from_delegate().map(|err| err.to_string())
    }

    fn check_authorized(&self, allocator: &Allocator<T>) -> Result<()> {
        if self.is_authorized(allocator) {
            return Ok(());
        }
        tracing::warn!(allocator = %allocator.id(), "delegation to unmanaged allocator rejected");
        *self.last_error.lock() = Some(Error::UnauthorizedAgent);
        Err(Error::UnauthorizedAgent)
    }

    fn record(&self, error: Option<&Error>) {
        *self.last_error.lock() = error.cloned();
    }
}

impl<T> Default for Manager<T> {
    fn default() -> Self {
        Self::without_pools()
    }
}

impl<T> fmt::Debug for Manager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("authorized", &self.roster.len())
            .field("pools", &self.desk.pools().len())
            .field("last_error", &self.last_error())
            .field("last_error_from_delegate", &self.last_error_from_delegate())
            .finish()
    }
}
