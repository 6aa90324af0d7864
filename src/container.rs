//! String-keyed component container
//!
//! The `Container` maps identifiers to factories and resolves them on demand,
//! applying property and constructor injection and caching singletons.

use crate::factory::FactoryKind;
use crate::injection::{CONTAINER_SLOT, InjectionRule, InjectionRules, InjectionVector};
use crate::key::type_of;
use crate::options::TypeOptions;
use crate::storage::ComponentStorage;
use crate::{DiError, Factory, Injectable, Instance, Instantiable, Options, Properties, Resolved, Result};
use ahash::RandomState;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use crate::logging::TARGET;
#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// Callback consulted for identifiers missing from the registry
pub type FallbackResolver = Arc<dyn Fn(&str) -> Option<Factory> + Send + Sync>;

// =============================================================================
// Cycle detection
// =============================================================================

thread_local! {
    /// Identifiers being resolved on this thread, keyed by container
    static RESOLVING: RefCell<HashSet<(usize, String), RandomState>> =
        RefCell::new(HashSet::default());
}

/// RAII marker for an identifier whose resolution is in progress.
///
/// Entering an identifier that is already in progress on this thread means
/// the injection rules form a cycle.
struct ResolutionGuard {
    key: (usize, String),
}

impl ResolutionGuard {
    fn enter(container: &Container, id: &str) -> Result<Self> {
        let key = (Arc::as_ptr(&container.inner) as usize, id.to_owned());

        let inserted = RESOLVING.with(|set| set.borrow_mut().insert(key.clone()));
        if !inserted {
            #[cfg(feature = "logging")]
            debug!(
                target: TARGET,
                id = id,
                "Circular dependency detected"
            );
            return Err(DiError::circular(id));
        }

        Ok(Self { key })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|set| {
            set.borrow_mut().remove(&self.key);
        });
    }
}

// =============================================================================
// Container
// =============================================================================

struct ContainerInner {
    storage: ComponentStorage,
    type_options: TypeOptions,
    rules: InjectionRules,
    resolver: Option<FallbackResolver>,
}

/// Inversion-of-control container keyed by string identifiers.
///
/// Cloning is cheap: clones share the same registry and caches.
///
/// # Examples
///
/// ```rust
/// use component_container::{Container, Factory};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Option<Arc<Database>> }
///
/// let container = Container::new();
/// container.register("db:main", Factory::constructor(|_, _| Database {
///     url: "postgres://localhost".into(),
/// }));
/// container.register("service:users", Factory::constructor(|props, _| UserService {
///     db: props.get_as::<Database>("db"),
/// }));
/// container.inject("service", "db", "db:main");
///
/// let users = container.resolve_as::<UserService>("service:users").unwrap().unwrap();
/// assert_eq!(users.db.as_ref().unwrap().url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

/// Non-owning handle to a container
#[derive(Clone, Default)]
pub(crate) struct WeakContainer(Weak<ContainerInner>);

impl WeakContainer {
    pub fn upgrade(&self) -> Option<Container> {
        self.0.upgrade().map(|inner| Container { inner })
    }
}

impl Container {
    /// Create a new container with no fallback resolver.
    #[inline]
    pub fn new() -> Self {
        ContainerBuilder::new().build()
    }

    /// Create a container with pre-allocated capacity.
    ///
    /// Use this when you know approximately how many components will be registered.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        ContainerBuilder::new().capacity(capacity).build()
    }

    /// Create a container that consults `resolver` for unregistered identifiers.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use component_container::{Container, Factory};
    ///
    /// struct Fallback;
    ///
    /// let container = Container::with_resolver(|id| {
    ///     id.starts_with("auto:").then(|| Factory::constructor(|_, _| Fallback))
    /// });
    ///
    /// assert!(container.resolve("auto:thing").unwrap().is_some());
    /// assert!(container.resolve("other:thing").unwrap().is_none());
    /// ```
    #[inline]
    pub fn with_resolver<F>(resolver: F) -> Self
    where
        F: Fn(&str) -> Option<Factory> + Send + Sync + 'static,
    {
        ContainerBuilder::new().resolver(resolver).build()
    }

    /// Start configuring a container.
    #[inline]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub(crate) fn downgrade(&self) -> WeakContainer {
        WeakContainer(Arc::downgrade(&self.inner))
    }

    /// Reference identity: both handles share the same container
    #[inline]
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Register a factory with default options.
    ///
    /// Replaces any earlier registration for `id`.
    #[inline]
    pub fn register(&self, id: &str, factory: Factory) {
        self.register_with(id, factory, Options::new());
    }

    /// Register a factory with instance-level options.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use component_container::{Container, Factory, Options};
    ///
    /// struct RequestId;
    ///
    /// let container = Container::new();
    /// container.register_with(
    ///     "request:id",
    ///     Factory::constructor(|_, _| RequestId),
    ///     Options::transient(),
    /// );
    ///
    /// let a = container.resolve("request:id").unwrap().unwrap();
    /// let b = container.resolve("request:id").unwrap().unwrap();
    /// assert!(!a.ptr_eq(&b));
    /// ```
    #[inline]
    pub fn register_with(&self, id: &str, factory: Factory, options: Options) {
        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            id = id,
            component = factory.type_name(),
            singleton = ?options.singleton,
            instantiate = ?options.instantiate,
            component_count = self.inner.storage.len() + 1,
            "Registering component"
        );

        self.inner.storage.insert(id, factory, options);
    }

    /// Register a property injection.
    ///
    /// `id` may be a bare type (applies to every identifier of that type) or
    /// a full identifier (applies to it alone). The component resolved for
    /// `target` is injected into `slot`.
    #[inline]
    pub fn inject(&self, id: &str, slot: &str, target: &str) {
        self.inner.rules.add(InjectionRule::property(id, slot, target));
    }

    /// Register a constructor injection.
    ///
    /// Scoped like [`inject`](Self::inject). Resolved targets are passed as
    /// positional arguments in registration order, type-level rules first.
    #[inline]
    pub fn inject_constructor(&self, id: &str, position: usize, target: &str) {
        self.inner
            .rules
            .add(InjectionRule::constructor(id, position, target));
    }

    /// Merge type-level default options for every identifier of `type_name`.
    ///
    /// Fails with [`DiError::InvalidTypeName`] if `type_name` contains the
    /// delimiter.
    #[inline]
    pub fn options_for_type(&self, type_name: &str, options: Options) -> Result<()> {
        self.inner.type_options.set(type_name, &options)
    }

    /// Start a fluent batch registration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use component_container::{Container, Factory, Options};
    ///
    /// struct Database;
    /// struct Cache;
    ///
    /// let container = Container::new();
    /// container.register_batch()
    ///     .register("db:main", Factory::constructor(|_, _| Database))
    ///     .register_with("cache:main", Factory::constructor(|_, _| Cache), Options::transient())
    ///     .done();
    ///
    /// assert!(container.contains("db:main"));
    /// assert!(container.contains("cache:main"));
    /// ```
    #[inline]
    pub fn register_batch(&self) -> BatchBuilder<'_> {
        BatchBuilder {
            container: self,
            #[cfg(feature = "logging")]
            count: 0,
        }
    }

    // =========================================================================
    // Options
    // =========================================================================

    /// Type-level options stored for `type_name`.
    #[inline]
    pub fn type_options(&self, type_name: &str) -> Options {
        self.inner.type_options.get(type_name)
    }

    /// Effective options for an identifier: type-level options overlaid with
    /// the options it was registered with.
    #[inline]
    pub fn effective_options(&self, id: &str) -> Options {
        let type_level = self.inner.type_options.get(type_of(id));
        match self.inner.storage.options(id) {
            Some(instance_level) => type_level.merge(&instance_level),
            None => type_level,
        }
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve an identifier.
    ///
    /// Returns `Ok(None)` if the identifier is neither registered nor
    /// provided by the fallback resolver. Fails if an injected dependency
    /// cannot be resolved or the injection rules form a cycle.
    pub fn resolve(&self, id: &str) -> Result<Option<Resolved>> {
        let _guard = ResolutionGuard::enter(self, id)?;

        let opts = self.effective_options(id);
        let factory = self.find_factory(id, &opts)?;

        if opts.is_singleton() {
            if let Some(cached) = self.inner.storage.cached_instance(id) {
                #[cfg(feature = "logging")]
                trace!(
                    target: TARGET,
                    id = id,
                    location = "instance_cache",
                    "Component resolved from cache"
                );
                return Ok(Some(cached));
            }
        }

        let Some(factory) = factory else {
            #[cfg(feature = "logging")]
            debug!(
                target: TARGET,
                id = id,
                "Component not found in registry or fallback resolver"
            );
            return Ok(None);
        };

        if !opts.is_singleton() {
            return self.build(id, factory, &opts).map(Some);
        }

        // Racing threads share the slot; only one runs the factory
        let slot = self.inner.storage.instance_slot(id);
        let resolved = slot.get_or_try_init(|| self.build(id, factory, &opts))?;

        Ok(Some(resolved.clone()))
    }

    /// Resolve and downcast to `T`.
    ///
    /// Fails with [`DiError::TypeMismatch`] if the identifier resolves to a
    /// factory or to an instance of another type.
    pub fn resolve_as<T: Injectable>(&self, id: &str) -> Result<Option<Arc<T>>> {
        match self.resolve(id)? {
            Some(resolved) => resolved
                .downcast::<T>()
                .map(Some)
                .ok_or_else(|| DiError::type_mismatch::<T>(id)),
            None => Ok(None),
        }
    }

    /// Resolve, discarding errors.
    #[inline]
    pub fn try_resolve(&self, id: &str) -> Option<Resolved> {
        self.resolve(id).ok().flatten()
    }

    /// The factory `resolve` would use for an identifier.
    ///
    /// Extendable factories are augmented with their injections on first
    /// request and the augmented form is cached for later calls.
    pub fn factory_for(&self, id: &str) -> Result<Option<Factory>> {
        let _guard = ResolutionGuard::enter(self, id)?;
        let opts = self.effective_options(id);
        self.find_factory(id, &opts)
    }

    fn find_factory(&self, id: &str, opts: &Options) -> Result<Option<Factory>> {
        let storage = &self.inner.storage;

        if let Some(augmented) = storage.augmented(id) {
            #[cfg(feature = "logging")]
            trace!(
                target: TARGET,
                id = id,
                "Using cached augmented factory"
            );
            return Ok(Some(augmented));
        }

        let raw = match storage.entry(id) {
            Some(entry) => Some(entry.factory),
            None => self.fallback(id),
        };

        let Some(raw) = raw else {
            return Ok(None);
        };

        if !raw.is_extendable() || !opts.is_instantiated() {
            return Ok(Some(raw));
        }

        let slot = storage.augmented_slot(id);
        let augmented = slot.get_or_try_init(|| {
            let props = self.property_injections(id)?;
            let args = self.constructor_injections(id)?;

            #[cfg(feature = "logging")]
            debug!(
                target: TARGET,
                id = id,
                component = raw.type_name(),
                properties = props.len(),
                arguments = args.len(),
                "Augmenting extendable factory with injections"
            );

            raw.extend(props, args)
                .ok_or_else(|| DiError::Internal(format!("factory for {id} is not extendable")))
        })?;

        Ok(Some(augmented.clone()))
    }

    fn build(&self, id: &str, factory: Factory, opts: &Options) -> Result<Resolved> {
        if opts.is_instantiated() {
            Ok(Resolved::Instance(self.instantiate(id, &factory)?))
        } else {
            Ok(Resolved::Factory(factory))
        }
    }

    fn fallback(&self, id: &str) -> Option<Factory> {
        let resolver = self.inner.resolver.as_ref()?;

        #[cfg(feature = "logging")]
        trace!(
            target: TARGET,
            id = id,
            "Identifier not registered, consulting fallback resolver"
        );

        resolver(id)
    }

    fn instantiate(&self, id: &str, factory: &Factory) -> Result<Instance> {
        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            id = id,
            component = factory.type_name(),
            "Constructing component"
        );

        let instance = match factory.kind() {
            FactoryKind::Create(_) => {
                let props = self.property_injections(id)?;
                factory.instantiate(&props, &[])
            }
            FactoryKind::Augmented(augmented) => augmented.construct(&[]),
            FactoryKind::Constructor(_) | FactoryKind::Extendable(_) => {
                let props = self.property_injections(id)?;
                let args = self.constructor_injections(id)?;
                factory.instantiate(&props, &args)
            }
        };

        Ok(instance)
    }

    // =========================================================================
    // Injection
    // =========================================================================

    /// Resolve an injection target; a miss is a hard failure.
    fn resolve_dependency(&self, target: &str) -> Result<Resolved> {
        self.resolve(target)?
            .ok_or_else(|| DiError::unknown_injection(target))
    }

    /// Property injections for an identifier, resolved through the container.
    pub fn property_injections(&self, id: &str) -> Result<Properties> {
        let mut props = Properties::for_container(self);

        for rule in self.inner.rules.rules_for(id, InjectionVector::Property) {
            let value = self.resolve_dependency(&rule.target)?;
            let slot = rule.slot.unwrap_or_default();

            if slot == CONTAINER_SLOT {
                #[cfg(feature = "logging")]
                warn!(
                    target: TARGET,
                    id = id,
                    target_id = %rule.target,
                    "Injection into the reserved container slot ignored"
                );
                continue;
            }

            props.insert(slot, value);
        }

        Ok(props)
    }

    /// Constructor injections for an identifier, in argument order.
    pub fn constructor_injections(&self, id: &str) -> Result<Vec<Resolved>> {
        self.inner
            .rules
            .rules_for(id, InjectionVector::Constructor)
            .iter()
            .map(|rule| self.resolve_dependency(&rule.target))
            .collect()
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Check if an identifier is registered.
    ///
    /// The fallback resolver is not consulted.
    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.inner.storage.contains(id)
    }

    /// Get the number of registered identifiers.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.storage.len()
    }

    /// Check if nothing is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.storage.is_empty()
    }

    /// Get all registered identifiers.
    pub fn identifiers(&self) -> Vec<String> {
        self.inner.storage.ids()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("storage", &self.inner.storage)
            .field("has_resolver", &self.inner.resolver.is_some())
            .finish()
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Builder for a [`Container`]
#[derive(Default)]
pub struct ContainerBuilder {
    capacity: usize,
    resolver: Option<FallbackResolver>,
}

impl ContainerBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Expected number of registered components
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Fallback resolver for unregistered identifiers
    pub fn resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> Option<Factory> + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Build the container
    pub fn build(self) -> Container {
        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            capacity = self.capacity,
            has_resolver = self.resolver.is_some(),
            "Creating new component container"
        );

        Container {
            inner: Arc::new(ContainerInner {
                storage: ComponentStorage::with_capacity(self.capacity),
                type_options: TypeOptions::new(),
                rules: InjectionRules::new(),
                resolver: self.resolver,
            }),
        }
    }
}

/// Fluent batch registration builder.
///
/// Provides a chainable API for registering multiple components.
pub struct BatchBuilder<'a> {
    container: &'a Container,
    #[cfg(feature = "logging")]
    count: usize,
}

impl<'a> BatchBuilder<'a> {
    /// Register a factory with default options and continue the chain
    #[inline]
    pub fn register(self, id: &str, factory: Factory) -> Self {
        self.register_with(id, factory, Options::new())
    }

    /// Register a factory with options and continue the chain
    #[inline]
    pub fn register_with(self, id: &str, factory: Factory, options: Options) -> Self {
        self.container.inner.storage.insert(id, factory, options);
        Self {
            container: self.container,
            #[cfg(feature = "logging")]
            count: self.count + 1,
        }
    }

    /// Finish the batch registration
    #[inline]
    pub fn done(self) {
        #[cfg(feature = "logging")]
        debug!(
            target: TARGET,
            components_registered = self.count,
            "Batch registration completed"
        );
    }
}
