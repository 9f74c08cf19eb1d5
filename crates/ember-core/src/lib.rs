//! Ember core types
//!
//! Shared building blocks used by the registry, the compiler and the executor:
//!
//! - [`Span`]: source locations for diagnostics and debug info
//! - [`TypeHash`]: deterministic identity for types, functions and bindings
//! - [`DataType`]: static types of expressions and parameters
//! - [`Dynamic`] / [`ObjectRef`]: runtime values and binding-object handles
//! - error types for every phase, unified under [`EmberError`]

pub mod data_type;
pub mod dynamic;
pub mod error;
pub mod span;
pub mod type_hash;

pub use data_type::DataType;
pub use dynamic::{Dynamic, ObjectRef};
pub use error::{CompilationError, EmberError, NativeError, RegistrationError, RuntimeError};
pub use span::Span;
pub use type_hash::{TypeHash, hash_constants, primitives};
