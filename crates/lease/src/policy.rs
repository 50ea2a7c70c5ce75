//! Pool selection policies

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pool::Pool;

/// Rule an allocator uses to pick the pool for the next lease.
///
/// Every policy is read-only: it inspects availability and never mutates a
/// pool. A pool with no free slot is never selected, so `None` means every
/// pool is full or the list is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Default)]
pub enum Policy {
    /// First pool, in list order, with a free slot
    #[default]
    Sequential,
    /// Pool with the most free slots; the earliest pool wins a tie
    MostAvailable,
    /// Pool with the highest free-slot ratio; the earliest pool wins a tie
    ///
    /// Suited to pools of different capacities, where raw headroom would
    /// always favour the largest one.
    HighestAvailabilityRate,
}

impl Policy {
    /// Pick a pool from `pools`, or `None` if none has room.
    #[must_use]
    pub fn select<'a, T>(&self, pools: &'a [Pool<T>]) -> Option<&'a Pool<T>> {
        match self {
            Self::Sequential => pools.iter().find(|pool| pool.available_count() > 0),
            Self::MostAvailable => {
                let mut best = None;
                let mut max_available = 0;
                for pool in pools {
                    let available = pool.available_count();
                    if available > max_available {
                        max_available = available;
                        best = Some(pool);
                    }
                }
                best
            }
            Self::HighestAvailabilityRate => {
                let mut best = None;
                let mut max_rate = 0.0;
                for pool in pools {
                    let rate = pool.availability_rate();
                    if rate > max_rate {
                        max_rate = rate;
                        best = Some(pool);
                    }
                }
                best
            }
        }
    }

    /// Stable snake_case name, matching the serialized form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::MostAvailable => "most_available",
            Self::HighestAvailabilityRate => "highest_availability_rate",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
