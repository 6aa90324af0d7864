//! Storage for the component container
//!
//! Uses DashMap for lock-free concurrent access. Three maps keyed by
//! identifier: registry entries, cached singleton instances, and augmented
//! factories.

use crate::{Factory, Options, Resolved};
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// A registered factory and the options it was registered with
#[derive(Clone, Debug)]
pub(crate) struct RegistryEntry {
    pub factory: Factory,
    pub options: Options,
}

/// Slot for an identifier's augmented factory, filled at most once
pub(crate) type AugmentedSlot = Arc<OnceCell<Factory>>;

/// Slot for an identifier's singleton, filled at most once
pub(crate) type InstanceSlot = Arc<OnceCell<Resolved>>;

/// Thread-safe storage for registrations and caches.
///
/// Accessors clone values out instead of handing back map guards, so no
/// shard lock is held while a resolution recurses into the container.
pub(crate) struct ComponentStorage {
    entries: DashMap<String, RegistryEntry, RandomState>,
    instances: DashMap<String, InstanceSlot, RandomState>,
    augmented: DashMap<String, AugmentedSlot, RandomState>,
}

/// Pick a shard count from the expected number of components.
///
/// Default DashMap uses num_cpus * 4 shards which is overkill for
/// typical containers with <50 components.
fn shard_amount(capacity: usize) -> usize {
    if capacity <= 16 {
        8
    } else if capacity <= 64 {
        16
    } else {
        32
    }
}

fn map_with_capacity<V>(capacity: usize) -> DashMap<String, V, RandomState> {
    DashMap::with_capacity_and_hasher_and_shard_amount(
        capacity,
        RandomState::new(),
        shard_amount(capacity),
    )
}

impl ComponentStorage {
    /// Create with pre-allocated capacity
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: map_with_capacity(capacity),
            instances: map_with_capacity(capacity),
            augmented: map_with_capacity(0),
        }
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Insert an entry, replacing any earlier one for the identifier
    #[inline]
    pub fn insert(&self, id: &str, factory: Factory, options: Options) {
        self.entries
            .insert(id.to_owned(), RegistryEntry { factory, options });
    }

    /// Look up a registry entry
    #[inline]
    pub fn entry(&self, id: &str) -> Option<RegistryEntry> {
        self.entries.get(id).map(|e| e.value().clone())
    }

    /// Options the identifier was registered with
    #[inline]
    pub fn options(&self, id: &str) -> Option<Options> {
        self.entries.get(id).map(|e| e.options.clone())
    }

    /// Check if an identifier is registered
    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Get number of registered identifiers
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get all registered identifiers
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|r| r.key().clone()).collect()
    }

    // =========================================================================
    // Instance cache
    // =========================================================================

    /// Cached component for an identifier, if already built
    #[inline]
    pub fn cached_instance(&self, id: &str) -> Option<Resolved> {
        self.instances
            .get(id)
            .and_then(|slot| slot.value().get().cloned())
    }

    /// The slot for an identifier's singleton, created if missing
    #[inline]
    pub fn instance_slot(&self, id: &str) -> InstanceSlot {
        self.instances
            .entry(id.to_owned())
            .or_default()
            .value()
            .clone()
    }

    // =========================================================================
    // Augmented factory cache
    // =========================================================================

    /// The augmented factory for an identifier, if already built
    #[inline]
    pub fn augmented(&self, id: &str) -> Option<Factory> {
        self.augmented
            .get(id)
            .and_then(|slot| slot.value().get().cloned())
    }

    /// The slot for an identifier's augmented factory, created if missing
    #[inline]
    pub fn augmented_slot(&self, id: &str) -> AugmentedSlot {
        self.augmented
            .entry(id.to_owned())
            .or_default()
            .value()
            .clone()
    }
}

impl std::fmt::Debug for ComponentStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentStorage")
            .field("count", &self.len())
            .field("cached_instances", &self.instances.len())
            .field("augmented", &self.augmented.len())
            .finish()
    }
}
