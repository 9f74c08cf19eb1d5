//! Host-side setup: bindings, options, and compilation.
//!
//! A `Context` collects binding registrations, seals them into an immutable
//! [`SymbolRegistry`], and compiles scripts against it.
//!
//! # Example
//!
//! ```
//! use ember::{BindingDef, Context, DataType, Dynamic, Expr, Script, Span, Stmt};
//!
//! struct Greeter(String);
//!
//! let mut ctx = Context::new();
//! ctx.register(
//!     BindingDef::builder("greet", "Greeter")
//!         .constructor_params([DataType::string()])
//!         .method_params([DataType::string()])
//!         .returns(DataType::string())
//!         .constructor(|args: &[Dynamic]| {
//!             Ok(Greeter(args[0].as_str().unwrap_or_default().to_string()))
//!         })
//!         .method(|g: &mut Greeter, args: &[Dynamic]| {
//!             Ok(format!("{}, {}!", g.0, args[0].as_str().unwrap_or_default()).into())
//!         })
//!         .build()
//!         .unwrap(),
//! )
//! .unwrap();
//! ctx.seal().unwrap();
//!
//! let at = Span::point(1, 1);
//! let unit = ctx
//!     .compile(Script::new().input("who", DataType::string()).body([Stmt::return_value(
//!         Expr::call("greet", vec![Expr::string("Hello", at), Expr::variable("who", at)], at),
//!         at,
//!     )]))
//!     .unwrap();
//!
//! let mut instance = unit.instantiate();
//! let out = instance.execute(&[("who", "world".into())]).unwrap();
//! assert_eq!(out.as_str(), Some("Hello, world!"));
//! ```

use std::sync::Arc;

use log::debug;
use thiserror::Error;

use ember_compiler::{CompilationError, Compiler, CompilerOptions, Script};
use ember_core::{EmberError, RegistrationError};
use ember_registry::{BindingDef, RegistryBuilder, SymbolRegistry};

use crate::unit::Unit;

/// Owns the binding registry and compiler options.
///
/// Bindings may only be registered before [`seal`](Self::seal); scripts may
/// only be compiled after it.
#[derive(Debug)]
pub struct Context {
    /// Collects registrations (consumed on seal)
    builder: Option<RegistryBuilder>,
    /// Sealed registry (available after seal)
    registry: Option<Arc<SymbolRegistry>>,
    options: CompilerOptions,
}

impl Context {
    /// Create an unsealed context with default options.
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    /// Create an unsealed context with the given options.
    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            builder: Some(RegistryBuilder::new()),
            registry: None,
            options,
        }
    }

    /// Register a binding.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::AlreadySealed` after [`seal`](Self::seal), or
    /// the registry's error for a duplicate name and arity.
    pub fn register(&mut self, binding: BindingDef) -> Result<(), ContextError> {
        let builder = match self.builder.as_mut() {
            Some(builder) if self.registry.is_none() => builder,
            _ => return Err(ContextError::AlreadySealed),
        };
        builder.register(binding)?;
        Ok(())
    }

    /// Seal the registry. Calling this more than once is a no-op.
    pub fn seal(&mut self) -> Result<(), ContextError> {
        if self.registry.is_some() {
            return Ok(());
        }
        let registry = self.builder.take().unwrap_or_default().seal();
        debug!("sealed registry with {} bindings", registry.len());
        self.registry = Some(Arc::new(registry));
        Ok(())
    }

    /// Check if the context has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.registry.is_some()
    }

    /// The sealed registry.
    pub fn registry(&self) -> Option<&Arc<SymbolRegistry>> {
        self.registry.as_ref()
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Replace the compiler options used for later compilations.
    pub fn set_options(&mut self, options: CompilerOptions) {
        self.options = options;
    }

    /// Compile a script against the sealed registry.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::NotSealed` before [`seal`](Self::seal), or the
    /// first compilation error.
    pub fn compile(&self, script: Script) -> Result<Unit, ContextError> {
        let registry = self.registry.as_ref().ok_or(ContextError::NotSealed)?;
        let compiled = Compiler::new(registry, &self.options).compile(script)?;
        Ok(Unit::new(Arc::new(compiled), Arc::clone(registry)))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during context operations.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Context is already sealed - cannot register bindings
    #[error("context is already sealed - cannot register bindings after seal()")]
    AlreadySealed,

    /// Context is not sealed - must call seal() before compiling
    #[error("context is not sealed - call seal() before compile()")]
    NotSealed,

    /// A binding could not be registered
    #[error("failed to register binding: {0}")]
    Registration(#[from] RegistrationError),

    /// The script did not compile
    #[error("compilation failed: {0}")]
    Compilation(#[from] CompilationError),
}

impl ContextError {
    /// Get the underlying error as an `EmberError`, if any.
    ///
    /// `AlreadySealed` and `NotSealed` are host misuse and carry none.
    pub fn first_error(&self) -> Option<EmberError> {
        match self {
            ContextError::Registration(err) => Some(EmberError::from(err.clone())),
            ContextError::Compilation(err) => Some(EmberError::from(err.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_compiler::expr::Expr;
    use ember_compiler::stmt::Stmt;
    use ember_core::{DataType, Dynamic, Span};

    fn counter() -> BindingDef {
        BindingDef::builder("tick", "Counter")
            .returns(DataType::int())
            .constructor(|_: &[Dynamic]| Ok(0_i32))
            .method(|n: &mut i32, _: &[Dynamic]| {
                *n += 1;
                Ok(Dynamic::Int(*n))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn register_after_seal_fails() {
        let mut ctx = Context::new();
        ctx.register(counter()).unwrap();
        ctx.seal().unwrap();
        ctx.seal().unwrap();

        assert!(ctx.is_sealed());
        assert!(matches!(ctx.register(counter()), Err(ContextError::AlreadySealed)));
        assert_eq!(ctx.registry().map(|r| r.len()), Some(1));
    }

    #[test]
    fn duplicate_binding_is_registration_error() {
        let mut ctx = Context::new();
        ctx.register(counter()).unwrap();
        let err = ctx.register(counter()).unwrap_err();

        assert!(matches!(
            err.first_error(),
            Some(EmberError::Registration(RegistrationError::DuplicateBinding { .. }))
        ));
    }

    #[test]
    fn compile_requires_seal() {
        let ctx = Context::new();
        let err = ctx.compile(Script::new()).unwrap_err();
        assert!(matches!(err, ContextError::NotSealed));
        assert!(err.first_error().is_none());
    }

    #[test]
    fn compilation_errors_surface() {
        let mut ctx = Context::new();
        ctx.seal().unwrap();
        let at = Span::point(3, 7);
        let err = ctx
            .compile(Script::new().body([Stmt::expr(Expr::call("nope", vec![], at))]))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "compilation failed: at 3:7: unknown call [nope] with [0] arguments"
        );
    }
}
