//! Declarative wiring of pools, allocators and a manager.
//!
//! A [`LayoutConfig`] names every pool once; allocators and the manager refer
//! to pools by name, so the same pool can back several allocators.
//!
//! ```json
//! {
//!   "pools": [{ "name": "north", "capacity": 5 }, { "name": "south" }],
//!   "allocators": [
//!     { "name": "smart", "policy": "most_available", "pools": ["north", "south"] }
//!   ],
//!   "manager": { "pools": ["south"], "manages": ["smart"] }
//! }
//! ```

use std::collections::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::allocator::Allocator;
use crate::error::{Error, Result};
use crate::manager::Manager;
use crate::policy::Policy;
use crate::pool::{Pool, PoolConfig};

#[cfg(feature = "serde")]
fn default_capacity() -> usize {
    crate::pool::DEFAULT_CAPACITY
}

/// A named pool.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolSpec {
    /// Unique pool name
    pub name: String,
    /// Pool capacity (defaults to 10)
    #[cfg_attr(feature = "serde", serde(default = "default_capacity"))]
    pub capacity: usize,
}

impl PoolSpec {
    /// Pool spec with an explicit capacity.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }
}

/// A named allocator bound to an ordered list of pools.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AllocatorSpec {
    /// Unique allocator name
    pub name: String,
    /// Selection policy
    #[cfg_attr(feature = "serde", serde(default))]
    pub policy: Policy,
    /// Pool names, in selection order
    pub pools: Vec<String>,
}

/// The manager's own pools and the allocators it authorizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ManagerSpec {
    /// Pool names the manager fills itself, in order
    pub pools: Vec<String>,
    /// Allocator names to authorize
    pub manages: Vec<String>,
}

/// Full layout description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayoutConfig {
    /// Every pool in the layout
    pub pools: Vec<PoolSpec>,
    /// Every allocator in the layout
    pub allocators: Vec<AllocatorSpec>,
    /// Optional manager
    pub manager: Option<ManagerSpec>,
}

impl LayoutConfig {
    /// Check names, references and capacities without building anything.
    pub fn validate(&self) -> Result<()> {
        let mut pool_names = HashSet::new();
        for spec in &self.pools {
            if spec.name.is_empty() {
                return Err(Error::configuration("pool name must not be empty"));
            }
            if !pool_names.insert(spec.name.as_str()) {
                return Err(Error::configuration(format!("duplicate pool '{}'", spec.name)));
            }
            PoolConfig::with_capacity(spec.capacity)
                .validate()
                .map_err(|_| {
                    Error::configuration(format!(
                        "pool '{}': capacity must be greater than 0",
                        spec.name
                    ))
                })?;
        }

        let mut allocator_names = HashSet::new();
        for spec in &self.allocators {
            if spec.name.is_empty() {
                return Err(Error::configuration("allocator name must not be empty"));
            }
            if !allocator_names.insert(spec.name.as_str()) {
                return Err(Error::configuration(format!("duplicate allocator '{}'", spec.name)));
            }
            if spec.pools.is_empty() {
                return Err(Error::configuration(format!(
                    "allocator '{}' has no pools",
                    spec.name
                )));
            }
            check_pool_refs(&pool_names, &spec.pools, &spec.name)?;
        }

        if let Some(manager) = &self.manager {
            check_pool_refs(&pool_names, &manager.pools, "manager")?;
            for name in &manager.manages {
                if !allocator_names.contains(name.as_str()) {
                    return Err(Error::configuration(format!(
                        "manager manages unknown allocator '{name}'"
                    )));
                }
            }
        }

        Ok(())
    }
}

fn check_pool_refs(known: &HashSet<&str>, refs: &[String], owner: &str) -> Result<()> {
    match refs.iter().find(|name| !known.contains(name.as_str())) {
        Some(name) => Err(Error::configuration(format!(
            "{owner} refers to unknown pool '{name}'"
        ))),
        None => Ok(()),
    }
}

/// Pools, allocators and manager built from a [`LayoutConfig`].
pub struct Layout<T> {
    pools: HashMap<String, Pool<T>>,
    allocators: HashMap<String, Allocator<T>>,
    manager: Option<Manager<T>>,
}

impl<T> Layout<T> {
    /// Validate `config` and build every pool, allocator and the manager.
    ///
    /// # Errors
    /// Returns a configuration error naming the first invalid entry.
    pub fn build(config: &LayoutConfig) -> Result<Self> {
        config.validate()?;

        let mut pools = HashMap::with_capacity(config.pools.len());
        for spec in &config.pools {
            pools.insert(spec.name.clone(), Pool::new(spec.capacity)?);
        }

        let pick = |names: &[String]| -> Vec<Pool<T>> {
            names
                .iter()
                .filter_map(|name| pools.get(name).cloned())
                .collect()
        };

        let mut allocators = HashMap::with_capacity(config.allocators.len());
        for spec in &config.allocators {
            let allocator = Allocator::new(spec.policy, pick(&spec.pools));
            tracing::debug!(
                name = %spec.name,
                id = %allocator.id(),
                policy = %spec.policy,
                "allocator built"
            );
            allocators.insert(spec.name.clone(), allocator);
        }

        let manager = config.manager.as_ref().map(|spec| {
            let manager = Manager::new(pick(&spec.pools));
            for name in &spec.manages {
                if let Some(allocator) = allocators.get(name) {
                    manager.authorize(allocator);
                }
            }
            manager
        });

        Ok(Self {
            pools,
            allocators,
            manager,
        })
    }

    /// Pool by name.
    #[must_use]
    pub fn pool(&self, name: &str) -> Option<&Pool<T>> {
        self.pools.get(name)
    }

    /// Allocator by name.
    #[must_use]
    pub fn allocator(&self, name: &str) -> Option<&Allocator<T>> {
        self.allocators.get(name)
    }

    /// The manager, if the layout declares one.
    #[must_use]
    pub fn manager(&self) -> Option<&Manager<T>> {
        self.manager.as_ref()
    }
}

impl<T> std::fmt::Debug for Layout<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("pools", &self.pools.len())
            .field("allocators", &self.allocators.len())
            .field("manager", &self.manager.is_some())
            .finish()
    }
}
