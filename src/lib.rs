//! Ember: call compilation and construct-once binding objects for a small
//! embedded scripting language.
//!
//! - [`Context`] registers host bindings, seals them, and compiles scripts.
//! - [`Unit`] is a compiled script; [`UnitInstance`] runs it and owns the
//!   binding objects its calls construct.
//! - [`vm`] is the stack executor behind [`UnitInstance`].
//!
//! Scripts are built with the AST constructors re-exported here
//! ([`Expr`], [`Stmt`], [`Script`]).

pub mod context;
pub mod unit;
pub mod vm;

pub use context::{Context, ContextError};
pub use unit::{Unit, UnitInstance};

pub use ember_compiler::expr::{BinaryOp, Expr};
pub use ember_compiler::stmt::Stmt;
pub use ember_compiler::{BindingCacheScope, CompiledUnit, CompilerOptions, FunctionDecl, Script};
pub use ember_core::{
    CompilationError, DataType, Dynamic, EmberError, NativeError, ObjectRef, RegistrationError,
    RuntimeError, Span, TypeHash,
};
pub use ember_registry::{BindingBuilder, BindingDef, SymbolRegistry};
