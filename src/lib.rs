//! # Component Container - String-Keyed Inversion of Control for Rust
//!
//! A registry mapping string identifiers to factories. Components are
//! resolved on demand, injected with other components by property or by
//! constructor argument, and cached as singletons unless told otherwise.
//!
//! ## Features
//!
//! - 🏷️ **Named components** - Identifiers of the form `"type:instance"`
//! - 🧩 **Two injection vectors** - Named properties and positional constructor arguments
//! - 🗂️ **Layered options** - Type-wide defaults overridden per identifier
//! - 🏭 **Lazy singletons** - Created on first resolve, shared afterwards
//! - ♻️ **Transient components** - Fresh instance on every resolve with `singleton: false`
//! - 🔁 **Cycle detection** - Circular injections fail fast instead of overflowing the stack
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use component_container::{Container, Factory};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Option<Arc<Database>>,
//! }
//!
//! let container = Container::new();
//!
//! // Register factories under identifiers
//! container.register("db:main", Factory::constructor(|_, _| Database {
//!     url: "postgres://localhost".into(),
//! }));
//! container.register("service:users", Factory::constructor(|props, _| UserService {
//!     db: props.get_as::<Database>("db"),
//! }));
//!
//! // Every "service" gets the main database in its "db" slot
//! container.inject("service", "db", "db:main");
//!
//! let users = container.resolve_as::<UserService>("service:users").unwrap().unwrap();
//! assert_eq!(users.db.as_ref().unwrap().url, "postgres://localhost");
//! ```
//!
//! ## Options
//!
//! ```rust
//! use component_container::{Container, Factory, Options};
//!
//! struct Handler;
//!
//! let container = Container::new();
//!
//! // Every "handler" is transient...
//! container.options_for_type("handler", Options::transient()).unwrap();
//! container.register("handler:get", Factory::constructor(|_, _| Handler));
//!
//! // ...except where an identifier says otherwise
//! container.register_with(
//!     "handler:health",
//!     Factory::constructor(|_, _| Handler),
//!     Options::new().singleton(true),
//! );
//!
//! let a = container.resolve("handler:get").unwrap().unwrap();
//! let b = container.resolve("handler:get").unwrap().unwrap();
//! assert!(!a.ptr_eq(&b));
//!
//! let a = container.resolve("handler:health").unwrap().unwrap();
//! let b = container.resolve("handler:health").unwrap().unwrap();
//! assert!(a.ptr_eq(&b));
//! ```
//!
//! ## Factory Kinds
//!
//! - [`Factory::constructor`] - receives injected properties and constructor arguments
//! - [`Factory::extendable`] - augmented once per identifier with its injections
//! - [`Factory::with_create`] - factory function receiving the injected properties

mod container;
mod error;
mod factory;
mod injection;
mod key;
#[cfg(feature = "logging")]
pub mod logging;
mod options;
mod provider;
mod storage;

pub use container::*;
pub use error::*;
pub use factory::*;
pub use injection::{CONTAINER_SLOT, InjectionRule, InjectionVector, Properties};
pub use key::*;
pub use options::Options;
pub use provider::*;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BatchBuilder, Container, ContainerBuilder, DiError, Factory, FactoryKind, Injectable,
        Instantiable, Options, Properties, Resolved, Result,
    };
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Thing {
        prop: &'static str,
        injectable: Option<Arc<Dependency>>,
    }

    struct Dependency;

    fn counted_thing(counter: &'static AtomicU32) -> Factory {
        Factory::constructor(move |props, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Thing {
                prop: "hello",
                injectable: props.get_as::<Dependency>("injectable"),
            }
        })
    }

    fn clank_thing() -> Factory {
        Factory::extendable(|props, _| Thing {
            prop: "hello",
            injectable: props.get_as::<Dependency>("injectable"),
        })
    }

    // =========================================================================
    // Resolving objects
    // =========================================================================

    #[test]
    fn test_returns_an_instance() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register("thing:main", counted_thing(&CALLS));

        let thing = container.resolve_as::<Thing>("thing:main").unwrap().unwrap();
        assert_eq!(thing.prop, "hello");
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_uses_create_when_present() {
        static CREATED: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register(
            "thing:main",
            Factory::with_create(|_| {
                CREATED.fetch_add(1, Ordering::SeqCst);
                Thing {
                    prop: "created",
                    injectable: None,
                }
            }),
        );

        let thing = container.resolve_as::<Thing>("thing:main").unwrap().unwrap();
        assert_eq!(thing.prop, "created");
        assert_eq!(CREATED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_respects_instantiate_option() {
        let container = Container::new();
        let factory = clank_thing();

        container.register("thing:main", factory.clone());
        assert!(container.resolve("thing:main").unwrap().unwrap().is::<Thing>());

        container.register_with("thing:second", factory.clone(), Options::new().instantiate(false));
        let first = container.resolve("thing:second").unwrap().unwrap();
        let second = container.resolve("thing:second").unwrap().unwrap();

        assert!(first.as_factory().unwrap().ptr_eq(&factory));
        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn test_respects_instantiate_type_option() {
        let container = Container::new();
        let factory = clank_thing();

        container
            .options_for_type("thing", Options::new().instantiate(false))
            .unwrap();
        container.register("thing:main", factory.clone());

        let resolved = container.resolve("thing:main").unwrap().unwrap();
        assert!(resolved.as_factory().unwrap().ptr_eq(&factory));
    }

    #[test]
    fn test_respects_singleton_option() {
        let container = Container::new();
        container.register("thing:main", clank_thing());
        container.register_with("thing:second", clank_thing(), Options::transient());

        let a = container.resolve_as::<Thing>("thing:main").unwrap().unwrap();
        let b = container.resolve_as::<Thing>("thing:main").unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let a = container.resolve_as::<Thing>("thing:second").unwrap().unwrap();
        let b = container.resolve_as::<Thing>("thing:second").unwrap().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_respects_singleton_type_option() {
        let container = Container::new();
        container.options_for_type("thing", Options::transient()).unwrap();
        container.register("thing:main", clank_thing());

        let a = container.resolve_as::<Thing>("thing:main").unwrap().unwrap();
        let b = container.resolve_as::<Thing>("thing:main").unwrap().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_instance_options_beat_type_options() {
        let container = Container::new();
        let factory = clank_thing();

        container
            .options_for_type("thing", Options::new().instantiate(false))
            .unwrap();
        container.register_with("thing:main", factory.clone(), Options::new().instantiate(true));

        let resolved = container.resolve("thing:main").unwrap().unwrap();
        assert!(resolved.is::<Thing>());
        assert!(resolved.as_factory().is_none());
    }

    #[test]
    fn test_plain_constructor_type_option_transient() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.options_for_type("thing", Options::transient()).unwrap();
        container.register("thing:main", counted_thing(&CALLS));

        let a = container.resolve("thing:main").unwrap().unwrap();
        let b = container.resolve("thing:main").unwrap().unwrap();
        assert!(!a.ptr_eq(&b));
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    // =========================================================================
    // Resolving items not in the registry
    // =========================================================================

    #[test]
    fn test_calls_the_resolver() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let container = Container::with_resolver(|id| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            assert_eq!(id, "not-in-registry:main");
            Some(Factory::constructor(|_, _| Dependency))
        });

        let resolved = container.resolve("not-in-registry:main").unwrap().unwrap();
        assert!(resolved.is::<Dependency>());
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolver_results_respect_type_options() {
        let container = Container::with_resolver(|_| Some(clank_thing()));

        let a = container.resolve("thing").unwrap().unwrap();
        let b = container.resolve("thing").unwrap().unwrap();
        assert!(a.ptr_eq(&b));

        container.options_for_type("thing", Options::transient()).unwrap();

        let a = container.resolve("thing").unwrap().unwrap();
        let b = container.resolve("thing").unwrap().unwrap();
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_only_types_take_type_options() {
        let container = Container::new();

        assert!(container.options_for_type("thing", Options::transient()).is_ok());

        let err = container
            .options_for_type("thing:main", Options::transient())
            .unwrap_err();
        assert!(err.is_type_error());
        assert!(matches!(err, DiError::InvalidTypeName { .. }));
    }

    #[test]
    fn test_no_resolver_silent_miss() {
        let container = Container::new();
        assert!(container.resolve("ghost:main").unwrap().is_none());
        assert!(container.factory_for("ghost:main").unwrap().is_none());
    }

    // =========================================================================
    // Injecting objects
    // =========================================================================

    #[test]
    fn test_injections_for_registered_factory() {
        let container = Container::new();
        container.register("thing:main", clank_thing());
        container.register("thing:second", clank_thing());
        container.register("injectable:main", Factory::extendable(|_, _| Dependency));

        container.inject("thing:main", "injectable", "injectable:main");

        let main = container.resolve_as::<Thing>("thing:main").unwrap().unwrap();
        assert!(main.injectable.is_some());

        let second = container.resolve_as::<Thing>("thing:second").unwrap().unwrap();
        assert!(second.injectable.is_none());
    }

    #[test]
    fn test_injections_for_type() {
        let container = Container::new();
        container.register("thing:main", clank_thing());
        container.register("thing:second", clank_thing());
        container.register("injectable:main", Factory::extendable(|_, _| Dependency));

        container.inject("thing", "injectable", "injectable:main");

        let main = container.resolve_as::<Thing>("thing:main").unwrap().unwrap();
        let second = container.resolve_as::<Thing>("thing:second").unwrap().unwrap();
        assert!(main.injectable.is_some());
        assert!(second.injectable.is_some());
    }

    #[test]
    fn test_prelude_exports() {
        use crate::prelude::*;

        let container: Container = ContainerBuilder::new().capacity(4).build();
        container.register("thing:main", Factory::constructor(|_, _| 1u8));

        let resolved: Resolved = container.resolve("thing:main").unwrap().unwrap();
        assert_eq!(*resolved.downcast::<u8>().unwrap(), 1);
    }
}
