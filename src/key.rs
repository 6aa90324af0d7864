//! Identifier parsing
//!
//! Components are named by string identifiers of the form `"type:instance"`.
//! An identifier without the delimiter names a bare type and is its own type.

/// Separator between the type and instance parts of an identifier
pub const DELIMITER: char = ':';

/// Extract the type portion of an identifier.
///
/// Returns everything before the first delimiter, or the whole identifier if
/// there is none.
///
/// ```rust
/// use component_container::type_of;
///
/// assert_eq!(type_of("thing:main"), "thing");
/// assert_eq!(type_of("thing"), "thing");
/// ```
#[inline]
pub fn type_of(id: &str) -> &str {
    match id.split_once(DELIMITER) {
        Some((ty, _)) => ty,
        None => id,
    }
}

/// True if the identifier names a bare type (no delimiter)
#[inline]
pub fn is_type(id: &str) -> bool {
    !id.contains(DELIMITER)
}
