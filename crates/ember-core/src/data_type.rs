//! DataType - the static type of an expression or parameter.
//!
//! Ember's type system is deliberately small: the built-in primitives from
//! [`primitives`](crate::primitives), plus `any` for dynamically checked values.
//!
//! # Example
//!
//! ```
//! use ember_core::{DataType, primitives};
//!
//! let int_type = DataType::int();
//! assert_eq!(int_type.type_hash, primitives::INT);
//! assert!(int_type.is_numeric());
//! assert_eq!(int_type.to_string(), "int");
//! ```

use std::fmt::{self, Display, Formatter};

use crate::TypeHash;
use crate::type_hash::primitives;

/// A static type, identified by its [`TypeHash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataType {
    /// The base type hash.
    pub type_hash: TypeHash,
}

impl DataType {
    /// Create a type from a hash.
    #[inline]
    pub const fn simple(type_hash: TypeHash) -> Self {
        Self { type_hash }
    }

    /// `void`
    #[inline]
    pub const fn void() -> Self {
        Self::simple(primitives::VOID)
    }

    /// `bool`
    #[inline]
    pub const fn bool() -> Self {
        Self::simple(primitives::BOOL)
    }

    /// `int`
    #[inline]
    pub const fn int() -> Self {
        Self::simple(primitives::INT)
    }

    /// `long`
    #[inline]
    pub const fn long() -> Self {
        Self::simple(primitives::LONG)
    }

    /// `double`
    #[inline]
    pub const fn double() -> Self {
        Self::simple(primitives::DOUBLE)
    }

    /// `string`
    #[inline]
    pub const fn string() -> Self {
        Self::simple(primitives::STRING)
    }

    /// `any`
    #[inline]
    pub const fn any() -> Self {
        Self::simple(primitives::ANY)
    }

    /// Type of the `null` literal.
    #[inline]
    pub const fn null() -> Self {
        Self::simple(primitives::NULL)
    }

    /// Check if this is `void`.
    pub fn is_void(&self) -> bool {
        self.type_hash == primitives::VOID
    }

    /// Check if this is `any`.
    pub fn is_any(&self) -> bool {
        self.type_hash == primitives::ANY
    }

    /// Check if this is one of the numeric primitives.
    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Widening order of numeric types: `int < long < double`.
    ///
    /// Returns `None` for non-numeric types.
    pub fn numeric_rank(&self) -> Option<u8> {
        match self.type_hash {
            primitives::INT => Some(0),
            primitives::LONG => Some(1),
            primitives::DOUBLE => Some(2),
            _ => None,
        }
    }

    /// Check if a `null` value is a valid inhabitant of this type.
    pub fn accepts_null(&self) -> bool {
        matches!(self.type_hash, primitives::STRING | primitives::ANY)
    }
}

impl Default for DataType {
    fn default() -> Self {
        Self::void()
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match primitives::name_of(self.type_hash) {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.type_hash),
        }
    }
}
