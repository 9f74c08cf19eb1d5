//! Ember binding registry.
//!
//! Host applications describe callable objects as [`BindingDef`]s, register
//! them on a [`RegistryBuilder`], and seal the result into a
//! [`SymbolRegistry`] that the compiler and executor share.

mod binding;
mod registry;

pub use binding::{BindingBuilder, BindingDef, ConstructorFn, MAX_BINDING_PARAMS, MethodFn};
pub use registry::{RegistryBuilder, SymbolRegistry};
