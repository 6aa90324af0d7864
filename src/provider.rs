//! Provider traits and resolved components
//!
//! These define what types can be produced by factories and what the
//! container hands back from a resolution.

use crate::Factory;
use std::any::Any;
use std::sync::Arc;

/// Marker trait for types that factories can produce.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// A type-erased constructed instance
pub type Instance = Arc<dyn Any + Send + Sync>;

/// The outcome of resolving an identifier.
///
/// Usually an instance. Identifiers whose effective `instantiate` option is
/// `false` resolve to their factory instead, so class references can be
/// injected like any other component.
#[derive(Clone)]
pub enum Resolved {
    /// A constructed instance
    Instance(Instance),
    /// The factory itself (`instantiate: false`)
    Factory(Factory),
}

impl Resolved {
    /// Wrap a concrete value as a resolved instance
    #[inline]
    pub fn instance<T: Injectable>(value: T) -> Self {
        Resolved::Instance(Arc::new(value))
    }

    /// Downcast to a concrete instance type
    ///
    /// Returns `None` for factories and for instances of another type.
    #[inline]
    pub fn downcast<T: Injectable>(&self) -> Option<Arc<T>> {
        match self {
            Resolved::Instance(inst) => Arc::clone(inst).downcast::<T>().ok(),
            Resolved::Factory(_) => None,
        }
    }

    /// Check whether this is an instance of `T`
    #[inline]
    pub fn is<T: Injectable>(&self) -> bool {
        match self {
            Resolved::Instance(inst) => inst.is::<T>(),
            Resolved::Factory(_) => false,
        }
    }

    /// The type-erased instance, if this is one
    #[inline]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Resolved::Instance(inst) => Some(inst),
            Resolved::Factory(_) => None,
        }
    }

    /// The factory, if this resolved to one
    #[inline]
    pub fn as_factory(&self) -> Option<&Factory> {
        match self {
            Resolved::Factory(f) => Some(f),
            Resolved::Instance(_) => None,
        }
    }

    /// Reference identity: both sides point at the same allocation
    #[inline]
    pub fn ptr_eq(&self, other: &Resolved) -> bool {
        match (self, other) {
            (Resolved::Instance(a), Resolved::Instance(b)) => Arc::ptr_eq(a, b),
            (Resolved::Factory(a), Resolved::Factory(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Factory> for Resolved {
    fn from(factory: Factory) -> Self {
        Resolved::Factory(factory)
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolved::Instance(_) => f.write_str("Resolved::Instance(..)"),
            Resolved::Factory(factory) => f.debug_tuple("Resolved::Factory").field(factory).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Marker(u8);

    #[test]
    fn test_downcast() {
        let resolved = Resolved::instance(Marker(7));
        assert!(resolved.is::<Marker>());
        assert_eq!(*resolved.downcast::<Marker>().unwrap(), Marker(7));
        assert!(resolved.downcast::<String>().is_none());
        assert!(resolved.as_factory().is_none());
    }

    #[test]
    fn test_ptr_eq() {
        let a = Resolved::instance(Marker(1));
        let b = a.clone();
        let c = Resolved::instance(Marker(1));

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn test_factory_variant() {
        let factory = Factory::constructor(|_, _| Marker(0));
        let resolved = Resolved::from(factory.clone());

        assert!(!resolved.is::<Marker>());
        assert!(resolved.downcast::<Marker>().is_none());
        assert!(resolved.as_factory().unwrap().ptr_eq(&factory));
        assert!(!resolved.ptr_eq(&Resolved::instance(Marker(0))));
    }
}
