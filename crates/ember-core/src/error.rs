//! Unified error types for Ember.
//!
//! One error enum per phase, plus a top-level wrapper:
//!
//! ```text
//! EmberError (top-level wrapper)
//! ├── RegistrationError - binding registration errors
//! ├── CompilationError  - analysis and emission errors
//! └── RuntimeError      - execution errors (wraps NativeError)
//! ```
//!
//! Phase errors convert into [`EmberError`] with `?`:
//!
//! ```
//! use ember_core::{CompilationError, EmberError, Span};
//!
//! fn compile() -> Result<(), EmberError> {
//!     Err(CompilationError::UnknownCall {
//!         name: "log".into(),
//!         arg_count: 2,
//!         span: Span::new(1, 1, 3),
//!     })?
//! }
//!
//! assert!(compile().unwrap_err().to_string().contains("unknown call [log] with [2] arguments"));
//! ```

use thiserror::Error;

use crate::{DataType, Span, TypeHash};

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while building the binding registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A binding with the same name and total arity already exists.
    #[error("binding '{name}' with {arity} parameters is already registered")]
    DuplicateBinding { name: String, arity: usize },

    /// The binding builder was finished without a required part.
    #[error("binding '{name}' is missing its {missing}")]
    IncompleteBinding { name: String, missing: &'static str },

    /// The constructor produces a different Rust type than the method expects.
    #[error("binding '{name}': constructor builds {constructor} but method expects {method}")]
    ObjectTypeMismatch {
        name: String,
        constructor: &'static str,
        method: &'static str,
    },

    /// An object type name is already bound to a different Rust type.
    #[error("binding '{name}': object type '{object_name}' is {registered}, not {found}")]
    ConflictingObjectType {
        name: String,
        object_name: String,
        registered: &'static str,
        found: &'static str,
    },

    /// A registry limit was exceeded.
    #[error("binding '{name}': {what} exceeds the limit of {limit}")]
    LimitExceeded {
        name: String,
        what: &'static str,
        limit: usize,
    },
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Errors raised during analysis and emission.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// No local function or binding matches the name and argument count.
    #[error("at {span}: unknown call [{name}] with [{arg_count}] arguments")]
    UnknownCall {
        name: String,
        arg_count: usize,
        span: Span,
    },

    /// A call argument cannot be converted to its parameter type.
    #[error(
        "at {span}: argument {position} of call [{call}] cannot be converted from '{from}' to '{to}'"
    )]
    ArgumentCoercion {
        call: String,
        position: usize,
        from: DataType,
        to: DataType,
        span: Span,
    },

    /// Parameter and argument lists of a resolved call disagree in length.
    #[error("internal error: call [{name}] expects {expected} arguments, found {found}")]
    MalformedCall {
        name: String,
        expected: usize,
        found: usize,
    },

    /// The compiler reached a state it should never be in.
    #[error("internal error: {message}")]
    Internal { message: String },

    /// An expression does not have the type required here.
    #[error("at {span}: type mismatch: expected '{expected}', found '{actual}'")]
    TypeMismatch {
        expected: DataType,
        actual: DataType,
        span: Span,
    },

    /// A variable was read that is neither a local nor an input.
    #[error("at {span}: undefined variable '{name}'")]
    UnknownVariable { name: String, span: Span },

    /// A variable was declared twice in the same function.
    #[error("at {span}: variable '{name}' is already declared")]
    DuplicateVariable { name: String, span: Span },

    /// Two local functions share a name and arity.
    #[error("at {span}: function '{name}' with {arity} parameters is already declared")]
    DuplicateFunction {
        name: String,
        arity: usize,
        span: Span,
    },

    /// An expression statement whose expression cannot stand alone.
    #[error("at {span}: expression is not a statement")]
    NotAStatement { span: Span },

    /// An operator was applied to operands it does not support.
    #[error("at {span}: {message}")]
    InvalidOperation { message: String, span: Span },

    /// A non-void function can finish without returning a value.
    #[error("at {span}: function '{function}' must end with a return statement")]
    MissingReturn { function: String, span: Span },

    /// Too many locals, constants, slots or similar.
    #[error("at {span}: too many {what} (limit {limit})")]
    LimitExceeded {
        what: &'static str,
        limit: usize,
        span: Span,
    },
}

impl CompilationError {
    /// Get the span where this error occurred.
    ///
    /// Internal errors carry no location and report `Span::default()`.
    pub fn span(&self) -> Span {
        match self {
            CompilationError::UnknownCall { span, .. } => *span,
            CompilationError::ArgumentCoercion { span, .. } => *span,
            CompilationError::TypeMismatch { span, .. } => *span,
            CompilationError::UnknownVariable { span, .. } => *span,
            CompilationError::DuplicateVariable { span, .. } => *span,
            CompilationError::DuplicateFunction { span, .. } => *span,
            CompilationError::NotAStatement { span } => *span,
            CompilationError::InvalidOperation { span, .. } => *span,
            CompilationError::MissingReturn { span, .. } => *span,
            CompilationError::LimitExceeded { span, .. } => *span,
            CompilationError::MalformedCall { .. } | CompilationError::Internal { .. } => {
                Span::default()
            }
        }
    }

    /// Whether this is a compiler consistency failure rather than a script error.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CompilationError::MalformedCall { .. } | CompilationError::Internal { .. }
        )
    }

    /// Shorthand for [`CompilationError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        CompilationError::Internal {
            message: message.into(),
        }
    }

    /// Re-label a type mismatch on a call argument as an argument coercion
    /// failure. Other errors pass through untouched.
    pub fn for_argument(self, call: &str, position: usize) -> Self {
        match self {
            CompilationError::TypeMismatch {
                expected,
                actual,
                span,
            } => CompilationError::ArgumentCoercion {
                call: call.to_string(),
                position,
                from: actual,
                to: expected,
                span,
            },
            other => other,
        }
    }
}

// ============================================================================
// Native Errors
// ============================================================================

/// Errors reported by binding constructors and methods.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// The cached object is already borrowed by an outer binding call.
    #[error("binding object is already in use")]
    ObjectBusy,

    /// The cached object is not of the type the binding expects.
    #[error("binding object is not a '{expected}'")]
    WrongObjectType { expected: &'static str },

    /// An argument had an unexpected runtime type.
    #[error("argument {position}: expected {expected}, got {actual}")]
    BadArgument {
        position: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// The callback failed for its own reasons.
    #[error("{0}")]
    Failed(String),
}

impl NativeError {
    /// Create a free-form failure.
    pub fn failed(message: impl Into<String>) -> Self {
        NativeError::Failed(message.into())
    }
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors raised while executing compiled bytecode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// An instruction popped more values than were on the stack.
    #[error("stack underflow")]
    StackUnderflow,

    /// The call depth limit was reached.
    #[error("stack overflow: call depth exceeded {limit}")]
    StackOverflow { limit: usize },

    /// A dynamically checked cast failed.
    #[error("cannot cast {actual} to {expected}")]
    InvalidCast {
        expected: &'static str,
        actual: &'static str,
    },

    /// A call referenced a function hash missing from the unit.
    #[error("unknown function {hash}")]
    UnknownFunction { hash: TypeHash },

    /// A binding instruction referenced a hash missing from the registry.
    #[error("unknown binding {hash}")]
    UnknownBinding { hash: TypeHash },

    /// The host asked for a function the unit does not declare.
    #[error("no function '{name}' with {arity} parameters")]
    UnknownEntry { name: String, arity: usize },

    /// A declared input was not supplied by the host.
    #[error("missing input '{name}'")]
    MissingInput { name: String },

    /// A host-supplied argument has the wrong type.
    #[error("argument {position} of '{function}': expected {expected}, got {actual}")]
    ArgumentType {
        function: String,
        position: usize,
        expected: String,
        actual: &'static str,
    },

    /// A binding constructor or method failed.
    #[error("binding '{binding}' failed: {source}")]
    Native {
        binding: String,
        #[source]
        source: NativeError,
    },

    /// Integer division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// The bytecode is malformed.
    #[error("invalid bytecode: {message}")]
    InvalidBytecode { message: String },
}

impl RuntimeError {
    /// Shorthand for [`RuntimeError::InvalidBytecode`].
    pub fn bytecode(message: impl Into<String>) -> Self {
        RuntimeError::InvalidBytecode {
            message: message.into(),
        }
    }
}

// ============================================================================
// Unified Error
// ============================================================================

/// Top-level error covering every phase.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmberError {
    /// A registration error.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A compilation error.
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// A runtime error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
