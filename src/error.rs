//! Error types for dependency injection

use thiserror::Error;

/// Errors that can occur during container operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// Type-level options were registered under a name containing the delimiter
    #[error("The type name ({type_name}) cannot contain the delimiter \":\"")]
    InvalidTypeName { type_name: String },

    /// An injection rule's target resolved to nothing
    #[error("unknown injection: {target}")]
    UnknownInjection { target: String },

    /// Circular dependency detected during resolution
    #[error("Circular dependency detected while resolving: {id}")]
    CircularDependency { id: String },

    /// The resolved component is not of the requested type
    #[error("Component {id} is not a {expected}")]
    TypeMismatch { id: String, expected: &'static str },

    /// Internal error
    #[error("Internal DI error: {0}")]
    Internal(String),
}

impl DiError {
    /// Create an InvalidTypeName error
    #[inline]
    pub fn invalid_type_name(type_name: impl Into<String>) -> Self {
        Self::InvalidTypeName {
            type_name: type_name.into(),
        }
    }

    /// Create an UnknownInjection error
    #[inline]
    pub fn unknown_injection(target: impl Into<String>) -> Self {
        Self::UnknownInjection {
            target: target.into(),
        }
    }

    /// Create a CircularDependency error
    #[inline]
    pub fn circular(id: impl Into<String>) -> Self {
        Self::CircularDependency { id: id.into() }
    }

    /// Create a TypeMismatch error for type T
    #[inline]
    pub fn type_mismatch<T: 'static>(id: impl Into<String>) -> Self {
        Self::TypeMismatch {
            id: id.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// True for errors caused by a malformed argument (a `TypeError` in spirit)
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::InvalidTypeName { .. } | Self::TypeMismatch { .. })
    }

    /// True for errors caused by a failed lookup
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, Self::UnknownInjection { .. })
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;
