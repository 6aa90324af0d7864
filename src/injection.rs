//! Injection rules and injected properties
//!
//! Rules come in two independent vectors. Property rules fill named slots on
//! the [`Properties`] handed to a factory; constructor rules produce the
//! positional arguments. A rule registered under a bare type applies to
//! every identifier of that type, one registered under a full identifier
//! applies to that identifier only.

use crate::container::WeakContainer;
use crate::key::{is_type, type_of};
use crate::{Container, Injectable, Resolved};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use crate::logging::TARGET;
#[cfg(feature = "logging")]
use tracing::debug;

/// Name of the slot reserved for the container handle
pub const CONTAINER_SLOT: &str = "container";

/// The two independent injection vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectionVector {
    /// Named slot on the injected properties
    Property,
    /// Positional constructor argument
    Constructor,
}

/// A single registered injection rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionRule {
    /// Identifier or bare type the rule was registered under
    pub source: String,
    /// Which vector the rule feeds
    pub vector: InjectionVector,
    /// Identifier to resolve and inject
    pub target: String,
    /// Slot name (property vector only)
    pub slot: Option<String>,
    /// Declared position (constructor vector only); arguments are still
    /// passed in registration order
    pub position: Option<usize>,
}

impl InjectionRule {
    /// A property-injection rule
    pub fn property(
        source: impl Into<String>,
        slot: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            vector: InjectionVector::Property,
            target: target.into(),
            slot: Some(slot.into()),
            position: None,
        }
    }

    /// A constructor-injection rule
    pub fn constructor(source: impl Into<String>, position: usize, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            vector: InjectionVector::Constructor,
            target: target.into(),
            slot: None,
            position: Some(position),
        }
    }

    /// True if the rule applies to every identifier of a type
    #[inline]
    pub fn is_type_level(&self) -> bool {
        is_type(&self.source)
    }
}

type RuleMap = DashMap<(InjectionVector, String), Vec<InjectionRule>, RandomState>;

/// Append-only store of injection rules
pub(crate) struct InjectionRules {
    by_type: RuleMap,
    by_instance: RuleMap,
}

impl InjectionRules {
    pub fn new() -> Self {
        Self {
            by_type: DashMap::with_hasher(RandomState::new()),
            by_instance: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Record a rule under its type or instance scope
    pub fn add(&self, rule: InjectionRule) {
        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            source = %rule.source,
            target_id = %rule.target,
            vector = ?rule.vector,
            type_level = rule.is_type_level(),
            "Registering injection rule"
        );

        let map = if rule.is_type_level() {
            &self.by_type
        } else {
            &self.by_instance
        };
        map.entry((rule.vector, rule.source.clone()))
            .or_default()
            .push(rule);
    }

    /// Rules that apply to `id` in `vector`, type-level first.
    ///
    /// Type-level rules targeting `id` itself are left out so a type-wide
    /// default never injects a component into itself.
    pub fn rules_for(&self, id: &str, vector: InjectionVector) -> Vec<InjectionRule> {
        let mut rules: Vec<InjectionRule> = self
            .by_type
            .get(&(vector, type_of(id).to_owned()))
            .map(|rules| rules.iter().filter(|r| r.target != id).cloned().collect())
            .unwrap_or_default();

        // A bare-type id is looked up in both maps under the same key; the
        // instance map never holds bare types, so nothing is doubled.
        if let Some(instance_rules) = self.by_instance.get(&(vector, id.to_owned())) {
            rules.extend(instance_rules.iter().cloned());
        }

        rules
    }
}

/// Injected properties handed to factories.
///
/// Holds one resolved component per injected slot, plus a handle back to the
/// container so injected components can resolve further dependencies.
#[derive(Clone, Default)]
pub struct Properties {
    slots: Vec<(String, Resolved)>,
    container: WeakContainer,
}

impl Properties {
    /// Properties with no slots and no container handle
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn for_container(container: &Container) -> Self {
        Self {
            slots: Vec::new(),
            container: container.downgrade(),
        }
    }

    /// Set a slot, replacing any earlier value under the same name
    pub fn insert(&mut self, slot: impl Into<String>, value: Resolved) {
        let slot = slot.into();
        match self.slots.iter_mut().find(|(name, _)| *name == slot) {
            Some(existing) => existing.1 = value,
            None => self.slots.push((slot, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, slot: impl Into<String>, value: Resolved) -> Self {
        self.insert(slot, value);
        self
    }

    /// The component injected into `slot`
    pub fn get(&self, slot: &str) -> Option<&Resolved> {
        self.slots
            .iter()
            .find(|(name, _)| name == slot)
            .map(|(_, value)| value)
    }

    /// The instance injected into `slot`, downcast to `T`
    pub fn get_as<T: Injectable>(&self, slot: &str) -> Option<Arc<T>> {
        self.get(slot).and_then(Resolved::downcast::<T>)
    }

    /// Check if a slot was injected
    pub fn contains(&self, slot: &str) -> bool {
        self.get(slot).is_some()
    }

    /// Handle to the container that produced these properties.
    ///
    /// `None` if the properties were built by hand or the container is gone.
    pub fn container(&self) -> Option<Container> {
        self.container.upgrade()
    }

    /// Iterate slots in injection order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolved)> {
        self.slots.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of injected slots (the container handle is not counted)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no slots were injected
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for Properties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Properties")
            .field("slots", &self.slots.iter().map(|(name, _)| name).collect::<Vec<_>>())
            .field("has_container", &self.container.upgrade().is_some())
            .finish()
    }
}
