//! Factory types for creating component instances
//!
//! A factory's capabilities are fixed when it is created and recorded in
//! [`FactoryKind`]. The container dispatches on the kind instead of probing
//! factories at resolution time:
//!
//! - `Constructor` - built by generic construction from injected properties
//!   and constructor arguments, recomputed on every instantiation
//! - `Extendable` - can be augmented once with injected defaults, producing
//!   an `Augmented` factory that the container caches per identifier
//! - `Create` - a factory function taking the injected properties
//! - `Augmented` - the output of [`Factory::extend`]

use crate::{Injectable, Instance, Properties, Resolved};
use std::sync::Arc;

#[cfg(feature = "logging")]
use crate::logging::TARGET;
#[cfg(feature = "logging")]
use tracing::trace;

/// Type-erased construction function
pub type ConstructFn = Arc<dyn Fn(&Properties, &[Resolved]) -> Instance + Send + Sync>;

/// Type-erased factory function
pub type CreateFn = Arc<dyn Fn(&Properties) -> Instance + Send + Sync>;

/// Anything that can produce an instance from positional arguments
pub trait Instantiable {
    /// Construct a new instance.
    ///
    /// `extra_args` are caller-supplied positional arguments; implementations
    /// with baked-in constructor arguments ignore them.
    fn construct(&self, extra_args: &[Resolved]) -> Instance;
}

/// What a factory is able to do
pub enum FactoryKind {
    /// Plain constructor: receives properties and positional arguments
    Constructor(ConstructFn),
    /// Constructor that supports augmentation via [`Factory::extend`]
    Extendable(ConstructFn),
    /// Factory function receiving the injected properties
    Create(CreateFn),
    /// Extendable factory with baked-in defaults and constructor arguments
    Augmented(AugmentedFactory),
}

impl FactoryKind {
    fn name(&self) -> &'static str {
        match self {
            FactoryKind::Constructor(_) => "constructor",
            FactoryKind::Extendable(_) => "extendable",
            FactoryKind::Create(_) => "create",
            FactoryKind::Augmented(_) => "augmented",
        }
    }
}

struct FactoryInner {
    kind: FactoryKind,
    type_name: &'static str,
}

/// A shareable, type-erased factory.
///
/// Cloning is cheap and preserves identity: clones compare equal under
/// [`Factory::ptr_eq`].
///
/// # Examples
///
/// ```rust
/// use component_container::{Factory, Instantiable};
///
/// struct Greeter { greeting: String }
///
/// let factory = Factory::constructor(|_props, _args| Greeter {
///     greeting: "hello".into(),
/// });
///
/// let greeter = factory.construct(&[]).downcast::<Greeter>().unwrap();
/// assert_eq!(greeter.greeting, "hello");
/// ```
#[derive(Clone)]
pub struct Factory {
    inner: Arc<FactoryInner>,
}

impl Factory {
    fn from_kind(kind: FactoryKind, type_name: &'static str) -> Self {
        Self {
            inner: Arc::new(FactoryInner { kind, type_name }),
        }
    }

    /// A plain constructor.
    ///
    /// Called with the injected properties and the resolved constructor
    /// arguments every time an instance is needed.
    pub fn constructor<T: Injectable, F>(f: F) -> Self
    where
        F: Fn(&Properties, &[Resolved]) -> T + Send + Sync + 'static,
    {
        Self::from_kind(
            FactoryKind::Constructor(Arc::new(move |props, args| Arc::new(f(props, args)) as Instance)),
            std::any::type_name::<T>(),
        )
    }

    /// An extendable constructor.
    ///
    /// The container augments it once per identifier with the injected
    /// defaults, and constructs bare instances of the augmented form after
    /// that.
    pub fn extendable<T: Injectable, F>(f: F) -> Self
    where
        F: Fn(&Properties, &[Resolved]) -> T + Send + Sync + 'static,
    {
        Self::from_kind(
            FactoryKind::Extendable(Arc::new(move |props, args| Arc::new(f(props, args)) as Instance)),
            std::any::type_name::<T>(),
        )
    }

    /// A factory function, invoked with the injected properties.
    pub fn with_create<T: Injectable, F>(f: F) -> Self
    where
        F: Fn(&Properties) -> T + Send + Sync + 'static,
    {
        Self::from_kind(
            FactoryKind::Create(Arc::new(move |props| Arc::new(f(props)) as Instance)),
            std::any::type_name::<T>(),
        )
    }

    /// The factory's capability
    #[inline]
    pub fn kind(&self) -> &FactoryKind {
        &self.inner.kind
    }

    /// Name of the type this factory produces
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name
    }

    /// Check if this factory can be augmented
    #[inline]
    pub fn is_extendable(&self) -> bool {
        matches!(self.inner.kind, FactoryKind::Extendable(_))
    }

    /// Check if this factory is the augmented form of an extendable one
    #[inline]
    pub fn is_augmented(&self) -> bool {
        matches!(self.inner.kind, FactoryKind::Augmented(_))
    }

    /// Reference identity
    #[inline]
    pub fn ptr_eq(&self, other: &Factory) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Augment an extendable factory with injected defaults.
    ///
    /// Non-empty `constructor_args` supersede caller-supplied arguments on
    /// every construction. Returns `None` if the factory is not extendable.
    pub fn extend(&self, defaults: Properties, constructor_args: Vec<Resolved>) -> Option<Factory> {
        if !self.is_extendable() {
            return None;
        }

        Some(Self::from_kind(
            FactoryKind::Augmented(AugmentedFactory {
                base: self.clone(),
                defaults,
                constructor_args,
            }),
            self.inner.type_name,
        ))
    }

    /// Produce an instance with the given injections.
    ///
    /// `Create` factories receive only the properties; augmented factories
    /// ignore both arguments and use what was baked in.
    pub fn instantiate(&self, props: &Properties, args: &[Resolved]) -> Instance {
        #[cfg(feature = "logging")]
        trace!(
            target: TARGET,
            component = self.inner.type_name,
            kind = self.inner.kind.name(),
            properties = props.len(),
            arguments = args.len(),
            "Instantiating component"
        );

        match &self.inner.kind {
            FactoryKind::Create(f) => f(props),
            FactoryKind::Augmented(augmented) => augmented.construct(&[]),
            FactoryKind::Constructor(f) | FactoryKind::Extendable(f) => f(props, args),
        }
    }
}

impl Instantiable for Factory {
    fn construct(&self, extra_args: &[Resolved]) -> Instance {
        match &self.inner.kind {
            FactoryKind::Augmented(augmented) => augmented.construct(extra_args),
            _ => self.instantiate(&Properties::new(), extra_args),
        }
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("type_name", &self.inner.type_name)
            .field("kind", &self.inner.kind.name())
            .finish()
    }
}

/// An extendable factory with injected defaults baked in
pub struct AugmentedFactory {
    base: Factory,
    defaults: Properties,
    constructor_args: Vec<Resolved>,
}

impl AugmentedFactory {
    /// The factory this one was extended from
    pub fn base(&self) -> &Factory {
        &self.base
    }

    /// Baked-in property defaults
    pub fn defaults(&self) -> &Properties {
        &self.defaults
    }

    /// Baked-in constructor arguments
    pub fn constructor_args(&self) -> &[Resolved] {
        &self.constructor_args
    }
}

impl Instantiable for AugmentedFactory {
    fn construct(&self, extra_args: &[Resolved]) -> Instance {
        let args = if self.constructor_args.is_empty() {
            extra_args
        } else {
            &self.constructor_args
        };
        self.base.instantiate(&self.defaults, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Widget {
        label: Option<Arc<String>>,
        args: usize,
    }

    fn widget_factory() -> Factory {
        Factory::extendable(|props, args| Widget {
            label: props.get_as::<String>("label"),
            args: args.len(),
        })
    }

    #[test]
    fn test_constructor_receives_injections() {
        let factory = Factory::constructor(|props, args| Widget {
            label: props.get_as::<String>("label"),
            args: args.len(),
        });

        let props = Properties::new().with("label", Resolved::instance(String::from("hi")));
        let args = [Resolved::instance(1u8), Resolved::instance(2u8)];

        let widget = factory.instantiate(&props, &args).downcast::<Widget>().unwrap();
        assert_eq!(widget.label.as_deref().map(String::as_str), Some("hi"));
        assert_eq!(widget.args, 2);
    }

    #[test]
    fn test_create_factory() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let factory = Factory::with_create(|props| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            props.len()
        });

        let props = Properties::new().with("a", Resolved::instance(0u8));
        let n = factory.instantiate(&props, &[]).downcast::<usize>().unwrap();

        assert_eq!(*n, 1);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_extend_only_extendable() {
        let plain = Factory::constructor(|_, _| 0u8);
        assert!(plain.extend(Properties::new(), Vec::new()).is_none());

        let augmented = widget_factory()
            .extend(Properties::new(), Vec::new())
            .unwrap();
        assert!(augmented.is_augmented());
        assert!(augmented.extend(Properties::new(), Vec::new()).is_none());
    }

    #[test]
    fn test_augmented_bakes_in_defaults() {
        let defaults = Properties::new().with("label", Resolved::instance(String::from("baked")));
        let augmented = widget_factory().extend(defaults, Vec::new()).unwrap();

        let widget = augmented.construct(&[]).downcast::<Widget>().unwrap();
        assert_eq!(widget.label.as_deref().map(String::as_str), Some("baked"));

        // Injections passed at instantiation are ignored
        let widget = augmented
            .instantiate(&Properties::new(), &[Resolved::instance(0u8)])
            .downcast::<Widget>()
            .unwrap();
        assert!(widget.label.is_some());
        assert_eq!(widget.args, 0);
    }

    #[test]
    fn test_augmented_constructor_args_supersede_caller() {
        let injected = vec![Resolved::instance(1u8)];
        let augmented = widget_factory().extend(Properties::new(), injected).unwrap();

        let caller = [Resolved::instance(1u8), Resolved::instance(2u8), Resolved::instance(3u8)];
        let widget = augmented.construct(&caller).downcast::<Widget>().unwrap();
        assert_eq!(widget.args, 1);
    }

    #[test]
    fn test_augmented_without_args_forwards_caller_args() {
        let augmented = widget_factory().extend(Properties::new(), Vec::new()).unwrap();

        let caller = [Resolved::instance(1u8), Resolved::instance(2u8)];
        let widget = augmented.construct(&caller).downcast::<Widget>().unwrap();
        assert_eq!(widget.args, 2);
    }

    #[test]
    fn test_identity() {
        let a = widget_factory();
        let b = a.clone();
        let c = widget_factory();

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert!(a.type_name().ends_with("Widget"));
    }
}
