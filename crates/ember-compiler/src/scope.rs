//! Symbol lookup during analysis.
//!
//! [`LocalScope`] tracks the variables of the function being compiled.
//! [`Scope`] layers it over the script's local functions and the binding
//! registry, and is what nodes query while they are analyzed.

use std::sync::Arc;

use ember_core::{CompilationError, DataType, Span};
use ember_registry::{BindingDef, SymbolRegistry};
use rustc_hash::FxHashMap;

use crate::function_table::{FunctionDef, FunctionTable};

/// Maximum number of locals (parameters included) per function.
pub const MAX_LOCALS: usize = u8::MAX as usize + 1;

// ============================================================================
// LocalScope
// ============================================================================

/// Information about a local variable.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    /// Variable name
    pub name: String,
    /// Declared type
    pub data_type: DataType,
    /// Frame slot
    pub slot: u8,
    /// Declaration site
    pub span: Span,
}

/// Variables of one function body.
///
/// The statement set has no nested blocks, so every variable lives until the
/// function returns and slots are never reused.
#[derive(Debug, Default)]
pub struct LocalScope {
    variables: FxHashMap<String, LocalVar>,
    next_slot: usize,
}

impl LocalScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable in the next free slot.
    pub fn declare(
        &mut self,
        name: &str,
        data_type: DataType,
        span: Span,
    ) -> Result<u8, CompilationError> {
        if self.variables.contains_key(name) {
            return Err(CompilationError::DuplicateVariable {
                name: name.to_string(),
                span,
            });
        }
        let slot = u8::try_from(self.next_slot).map_err(|_| CompilationError::LimitExceeded {
            what: "local variables",
            limit: MAX_LOCALS,
            span,
        })?;
        self.next_slot += 1;
        self.variables.insert(
            name.to_string(),
            LocalVar {
                name: name.to_string(),
                data_type,
                slot,
                span,
            },
        );
        Ok(slot)
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&LocalVar> {
        self.variables.get(name)
    }

    /// Number of slots the frame needs.
    pub fn slot_count(&self) -> usize {
        self.next_slot
    }
}

// ============================================================================
// Scope
// ============================================================================

/// Everything a node can see while it is analyzed.
pub struct Scope<'a> {
    functions: &'a FunctionTable,
    registry: &'a SymbolRegistry,
    locals: LocalScope,
    function_name: String,
    return_type: DataType,
}

impl<'a> Scope<'a> {
    /// Create the scope for one function body.
    pub fn new(
        functions: &'a FunctionTable,
        registry: &'a SymbolRegistry,
        function_name: impl Into<String>,
        return_type: DataType,
    ) -> Self {
        Self {
            functions,
            registry,
            locals: LocalScope::new(),
            function_name: function_name.into(),
            return_type,
        }
    }

    /// Find a script-local function by name and arity.
    pub fn lookup_local_function(&self, name: &str, arity: usize) -> Option<&'a FunctionDef> {
        self.functions.lookup(name, arity)
    }

    /// Find a binding by name and total arity.
    pub fn lookup_binding(&self, name: &str, arity: usize) -> Option<&'a Arc<BindingDef>> {
        self.registry.lookup(name, arity)
    }

    /// Find a local variable or parameter.
    pub fn lookup_variable(&self, name: &str) -> Option<&LocalVar> {
        self.locals.get(name)
    }

    /// Declare a local variable or parameter.
    pub fn declare_variable(
        &mut self,
        name: &str,
        data_type: DataType,
        span: Span,
    ) -> Result<u8, CompilationError> {
        self.locals.declare(name, data_type, span)
    }

    /// Name of the function being compiled.
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Declared return type of the function being compiled.
    pub fn return_type(&self) -> DataType {
        self.return_type
    }

    /// Number of frame slots used so far.
    pub fn local_count(&self) -> usize {
        self.locals.slot_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_sequential() {
        let mut locals = LocalScope::new();
        assert_eq!(locals.declare("a", DataType::int(), Span::default()), Ok(0));
        assert_eq!(locals.declare("b", DataType::long(), Span::default()), Ok(1));
        assert_eq!(locals.get("b").unwrap().data_type, DataType::long());
        assert_eq!(locals.slot_count(), 2);
    }

    #[test]
    fn redeclaration_is_rejected() {
        let mut locals = LocalScope::new();
        locals.declare("a", DataType::int(), Span::default()).unwrap();
        let err = locals
            .declare("a", DataType::int(), Span::point(3, 1))
            .unwrap_err();
        assert_eq!(
            err,
            CompilationError::DuplicateVariable {
                name: "a".into(),
                span: Span::point(3, 1),
            }
        );
    }

    #[test]
    fn local_limit() {
        let mut locals = LocalScope::new();
        for i in 0..MAX_LOCALS {
            locals
                .declare(&format!("v{i}"), DataType::int(), Span::default())
                .unwrap();
        }
        let err = locals
            .declare("overflow", DataType::int(), Span::default())
            .unwrap_err();
        assert!(matches!(err, CompilationError::LimitExceeded { .. }));
    }

    #[test]
    fn scope_sees_functions_and_bindings() {
        let mut functions = FunctionTable::new();
        functions
            .register(FunctionDef::new(
                "f",
                vec![],
                DataType::void(),
                Span::default(),
            ))
            .unwrap();
        let registry = SymbolRegistry::new();
        let scope = Scope::new(&functions, &registry, "<main>", DataType::any());

        assert!(scope.lookup_local_function("f", 0).is_some());
        assert!(scope.lookup_binding("f", 0).is_none());
        assert_eq!(scope.function_name(), "<main>");
    }
}
