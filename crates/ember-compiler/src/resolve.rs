//! Call resolution.
//!
//! An unqualified call `name(a, b, ...)` is looked up by name and argument
//! count, first among the script's own functions and then among registered
//! bindings. A local function therefore shadows a binding with the same
//! name and arity. Argument types play no part in the choice.

use std::sync::Arc;

use log::debug;

use ember_core::{CompilationError, DataType, Span};
use ember_registry::BindingDef;

use crate::function_table::FunctionDef;
use crate::scope::Scope;

/// What a call resolved to.
#[derive(Debug, Clone)]
pub enum ResolvedTarget {
    /// A function declared by the script.
    Local(FunctionDef),
    /// A host-registered binding.
    Binding(Arc<BindingDef>),
}

impl ResolvedTarget {
    /// Parameter types in argument order.
    pub fn param_types(&self) -> Vec<DataType> {
        match self {
            ResolvedTarget::Local(function) => function.params.clone(),
            ResolvedTarget::Binding(binding) => binding.param_types(),
        }
    }

    /// Type of the call's value.
    pub fn return_type(&self) -> DataType {
        match self {
            ResolvedTarget::Local(function) => function.return_type,
            ResolvedTarget::Binding(binding) => binding.return_type,
        }
    }
}

/// Resolve a call by name and argument count.
pub fn resolve_call(
    name: &str,
    arg_count: usize,
    scope: &Scope<'_>,
    span: Span,
) -> Result<ResolvedTarget, CompilationError> {
    if let Some(function) = scope.lookup_local_function(name, arg_count) {
        debug!("{span}: call {name}/{arg_count} resolved to local function");
        return Ok(ResolvedTarget::Local(function.clone()));
    }

    if let Some(binding) = scope.lookup_binding(name, arg_count) {
        debug!(
            "{span}: call {name}/{arg_count} resolved to binding on {}",
            binding.object_name
        );
        return Ok(ResolvedTarget::Binding(Arc::clone(binding)));
    }

    Err(CompilationError::UnknownCall {
        name: name.to_string(),
        arg_count,
        span,
    })
}
