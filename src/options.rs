//! Layered component options
//!
//! Each identifier's effective options are its type-level defaults overlaid
//! with the options it was registered with. Instance-level keys always win.

use crate::key::is_type;
use crate::{DiError, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::collections::BTreeMap;

#[cfg(feature = "logging")]
use crate::logging::TARGET;
#[cfg(feature = "logging")]
use tracing::debug;

/// Options governing instantiation and caching of a component.
///
/// Unset keys fall through to the next layer; an option unset at every layer
/// takes its default (`singleton: true`, `instantiate: true`).
///
/// ```rust
/// use component_container::Options;
///
/// let type_level = Options::new().instantiate(false);
/// let instance_level = Options::new().instantiate(true);
///
/// let effective = type_level.merge(&instance_level);
/// assert!(effective.is_instantiated());
/// assert!(effective.is_singleton());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Cache the resolved component and reuse it
    pub singleton: Option<bool>,
    /// Construct an instance, or hand back the factory itself
    pub instantiate: Option<bool>,
    /// Unrecognized keys, carried through merges with no effect on resolution
    pub extra: BTreeMap<String, String>,
}

impl Options {
    /// Empty options (every key unset)
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `singleton` option
    #[inline]
    pub fn singleton(mut self, singleton: bool) -> Self {
        self.singleton = Some(singleton);
        self
    }

    /// Shorthand for `singleton(false)`
    #[inline]
    pub fn transient() -> Self {
        Self::new().singleton(false)
    }

    /// Set the `instantiate` option
    #[inline]
    pub fn instantiate(mut self, instantiate: bool) -> Self {
        self.instantiate = Some(instantiate);
        self
    }

    /// Set an unrecognized pass-through key
    #[inline]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Effective `singleton` value (anything but an explicit `false` is true)
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.singleton != Some(false)
    }

    /// Effective `instantiate` value (anything but an explicit `false` is true)
    #[inline]
    pub fn is_instantiated(&self) -> bool {
        self.instantiate != Some(false)
    }

    /// Overlay `over` on top of `self`; keys set in `over` win.
    pub fn merge(&self, over: &Options) -> Options {
        let mut merged = self.clone();
        merged.extend_from(over);
        merged
    }

    /// In-place variant of [`merge`](Self::merge)
    pub fn extend_from(&mut self, over: &Options) {
        if over.singleton.is_some() {
            self.singleton = over.singleton;
        }
        if over.instantiate.is_some() {
            self.instantiate = over.instantiate;
        }
        for (key, value) in &over.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// Type-level default options, accumulated per type
pub(crate) struct TypeOptions {
    by_type: DashMap<String, Options, RandomState>,
}

impl TypeOptions {
    pub fn new() -> Self {
        Self {
            by_type: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Merge `options` into the stored options for `type_name`.
    ///
    /// Fails without mutating anything if `type_name` is not a bare type.
    pub fn set(&self, type_name: &str, options: &Options) -> Result<()> {
        if !is_type(type_name) {
            return Err(DiError::invalid_type_name(type_name));
        }

        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            type_name = type_name,
            singleton = ?options.singleton,
            instantiate = ?options.instantiate,
            "Merging type-level options"
        );

        self.by_type
            .entry(type_name.to_owned())
            .or_default()
            .extend_from(options);
        Ok(())
    }

    /// Stored options for a type (empty if none were set)
    pub fn get(&self, type_name: &str) -> Options {
        self.by_type
            .get(type_name)
            .map(|opts| opts.value().clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = Options::new();
        assert!(opts.is_singleton());
        assert!(opts.is_instantiated());

        let opts = Options::transient();
        assert!(!opts.is_singleton());
    }

    #[test]
    fn test_merge_instance_wins() {
        let type_level = Options::new().singleton(false).instantiate(false);
        let instance_level = Options::new().instantiate(true);

        let merged = type_level.merge(&instance_level);
        assert_eq!(merged.singleton, Some(false));
        assert_eq!(merged.instantiate, Some(true));
    }

    #[test]
    fn test_merge_carries_extra_keys() {
        let a = Options::new().with("tag", "a").with("color", "red");
        let b = Options::new().with("tag", "b");

        let merged = a.merge(&b);
        assert_eq!(merged.extra.get("tag").map(String::as_str), Some("b"));
        assert_eq!(merged.extra.get("color").map(String::as_str), Some("red"));
    }

    #[test]
    fn test_type_options_accumulate() {
        let store = TypeOptions::new();
        store.set("thing", &Options::new().singleton(false)).unwrap();
        store.set("thing", &Options::new().instantiate(false)).unwrap();

        let opts = store.get("thing");
        assert_eq!(opts.singleton, Some(false));
        assert_eq!(opts.instantiate, Some(false));

        store.set("thing", &Options::new().singleton(true)).unwrap();
        let opts = store.get("thing");
        assert_eq!(opts.singleton, Some(true));
        assert_eq!(opts.instantiate, Some(false));
    }

    #[test]
    fn test_type_options_reject_delimiter() {
        let store = TypeOptions::new();
        let err = store
            .set("thing:main", &Options::new().singleton(false))
            .unwrap_err();

        assert!(err.is_type_error());
        assert_eq!(store.get("thing:main"), Options::new());
        assert_eq!(store.get("thing"), Options::new());
    }
}
