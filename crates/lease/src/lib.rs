//! # Valet Lease
//!
//! Ticket-based leasing of capacity-bounded pools.
//! Provides pools, single-use tickets, pool selection policies, allocators
//! that lease under a policy, and a manager that authorizes and forwards
//! to allocators.

pub mod allocator;
pub mod error;
pub mod layout;
pub mod manager;
pub mod policy;
pub mod pool;
pub mod ticket;

pub use allocator::{Allocator, AllocatorId};
pub use error::{Error, Result};
pub use layout::{AllocatorSpec, Layout, LayoutConfig, ManagerSpec, PoolSpec};
pub use manager::Manager;
pub use policy::Policy;
pub use pool::{DEFAULT_CAPACITY, Pool, PoolConfig, PoolStats};
pub use ticket::Ticket;
