//! Deterministic hash-based identity for types, local functions, and bindings.
//!
//! A [`TypeHash`] is computed from a name (and, for callables, the parameter
//! types), so the compiler can refer to a function or binding before the
//! executor ever sees it, and the same signature always yields the same hash.
//!
//! # Examples
//!
//! ```
//! use ember_core::TypeHash;
//!
//! let int_hash = TypeHash::from_name("int");
//! assert_eq!(int_hash, TypeHash::from_name("int"));
//!
//! let f1 = TypeHash::from_function("double", &[TypeHash::from_name("int")]);
//! let f2 = TypeHash::from_function("double", &[TypeHash::from_name("long")]);
//! assert_ne!(f1, f2);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
///
/// Types, local functions and bindings with the same name must not collide.
pub mod hash_constants {
    /// Separator constant for path components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for script-local function hashes.
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for binding hashes.
    pub const BINDING: u64 = 0x7d3c8b4a92e15f6d;

    /// Parameter position mixing constants, so `(int, long)` and
    /// `(long, int)` hash differently.
    pub const PARAM_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x123456789abcdef0,
    ];
}

/// A deterministic 64-bit hash identifying a type, function, or binding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a script-local function hash from name and parameter types.
    #[inline]
    pub fn from_function(name: &str, param_hashes: &[TypeHash]) -> Self {
        let seed = hash_constants::FUNCTION ^ xxh64(name.as_bytes(), 0);
        TypeHash(mix_params(seed, param_hashes))
    }

    /// Create a binding hash from the binding object type, the binding name,
    /// and the full parameter list (constructor parameters first).
    #[inline]
    pub fn from_binding(object_type: TypeHash, name: &str, param_hashes: &[TypeHash]) -> Self {
        let seed = hash_constants::BINDING ^ object_type.0 ^ xxh64(name.as_bytes(), 0);
        TypeHash(mix_params(seed, param_hashes))
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

fn mix_params(mut hash: u64, param_hashes: &[TypeHash]) -> u64 {
    for (i, param) in param_hashes.iter().enumerate() {
        let marker = hash_constants::PARAM_MARKERS
            .get(i)
            .copied()
            .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
        // wrapping_mul keeps the mix order-dependent
        hash = hash
            .wrapping_mul(hash_constants::SEP)
            .wrapping_add(marker ^ param.0);
    }
    hash
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Precomputed hashes for the built-in script types.
///
/// Each value equals `TypeHash::from_name(<name>)`.
pub mod primitives {
    use super::TypeHash;

    /// `void`
    pub const VOID: TypeHash = TypeHash(0xe4b3797ddcf989ea);
    /// `bool`
    pub const BOOL: TypeHash = TypeHash(0x1e0c8fa4cced99c1);
    /// `int` (32-bit signed)
    pub const INT: TypeHash = TypeHash(0x4f5e5320cd1c92bf);
    /// `long` (64-bit signed)
    pub const LONG: TypeHash = TypeHash(0x4c4e14cbc59a4ec9);
    /// `double`
    pub const DOUBLE: TypeHash = TypeHash(0xeb125587f6c2a79b);
    /// `string`
    pub const STRING: TypeHash = TypeHash(0x7a8d5fb1ba695978);
    /// `any`, the dynamically checked type.
    pub const ANY: TypeHash = TypeHash(0xb06767d17185d1d3);
    /// The type of the `null` literal.
    pub const NULL: TypeHash = TypeHash(0x1165f1b6597b5a46);

    /// Name of a built-in type, if `hash` is one.
    pub fn name_of(hash: TypeHash) -> Option<&'static str> {
        Some(match hash {
            VOID => "void",
            BOOL => "bool",
            INT => "int",
            LONG => "long",
            DOUBLE => "double",
            STRING => "string",
            ANY => "any",
            NULL => "null",
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_constants_match_computed() {
        for (name, hash) in [
            ("void", primitives::VOID),
            ("bool", primitives::BOOL),
            ("int", primitives::INT),
            ("long", primitives::LONG),
            ("double", primitives::DOUBLE),
            ("string", primitives::STRING),
            ("any", primitives::ANY),
            ("null", primitives::NULL),
        ] {
            assert_eq!(TypeHash::from_name(name), hash, "hash mismatch for {name}");
            assert_eq!(primitives::name_of(hash), Some(name));
        }
    }

    #[test]
    fn parameter_order_matters() {
        let a = TypeHash::from_function("f", &[primitives::INT, primitives::LONG]);
        let b = TypeHash::from_function("f", &[primitives::LONG, primitives::INT]);
        assert_ne!(a, b);
    }

    #[test]
    fn binding_and_function_domains_differ() {
        let object = TypeHash::from_name("Counter");
        let function = TypeHash::from_function("counter", &[primitives::INT]);
        let binding = TypeHash::from_binding(object, "counter", &[primitives::INT]);
        assert_ne!(function, binding);
    }

    #[test]
    fn binding_hash_includes_object_type() {
        let a = TypeHash::from_binding(TypeHash::from_name("A"), "make", &[]);
        let b = TypeHash::from_binding(TypeHash::from_name("B"), "make", &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn many_parameters_still_hash() {
        let params = vec![primitives::INT; 20];
        let a = TypeHash::from_function("wide", &params);
        let b = TypeHash::from_function("wide", &params[..19]);
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(format!("{}", TypeHash(0x10)), "0x0000000000000010");
        assert!(TypeHash::EMPTY.is_empty());
    }
}
