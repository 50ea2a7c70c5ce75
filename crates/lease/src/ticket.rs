//! Opaque lease tickets

use std::fmt;

use uuid::Uuid;

/// Proof of a lease, minted by a [`Pool`](crate::Pool) on every successful lease.
///
/// Equality is identity: two tickets compare equal only when one is a clone
/// of the other. There is no public constructor, so a ticket can only come
/// from a pool. A ticket is honoured by exactly one release.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ticket {
    id: Uuid,
}

impl Ticket {
    pub(crate) fn mint() -> Self {
        Self { id: Uuid::new_v4() }
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ticket").field(&self.id).finish()
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id.simple())
    }
}
