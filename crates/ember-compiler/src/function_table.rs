//! Script-local function signatures.
//!
//! The first compilation pass collects every function declared by a script
//! into a [`FunctionTable`], so bodies compiled in the second pass can call
//! any function regardless of declaration order, including themselves.

use log::debug;
use rustc_hash::FxHashMap;

use ember_core::{CompilationError, DataType, Span, TypeHash};

/// Maximum number of parameters of a local function.
pub const MAX_FUNCTION_PARAMS: usize = u8::MAX as usize;

/// Signature of a script-local function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Function name.
    pub name: String,
    /// Parameter types, in order.
    pub params: Vec<DataType>,
    /// Return type.
    pub return_type: DataType,
    /// Identity used by call instructions.
    pub hash: TypeHash,
    /// Location of the declaration.
    pub span: Span,
}

impl FunctionDef {
    /// Create a signature, computing its hash from name and parameter types.
    pub fn new(
        name: impl Into<String>,
        params: Vec<DataType>,
        return_type: DataType,
        span: Span,
    ) -> Self {
        let name = name.into();
        let param_hashes: Vec<TypeHash> = params.iter().map(|ty| ty.type_hash).collect();
        let hash = TypeHash::from_function(&name, &param_hashes);
        Self {
            name,
            params,
            return_type,
            hash,
            span,
        }
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Local functions of one script, keyed by name and arity.
#[derive(Debug, Default)]
pub struct FunctionTable {
    by_name: FxHashMap<String, Vec<FunctionDef>>,
    len: usize,
}

impl FunctionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function signature.
    pub fn register(&mut self, def: FunctionDef) -> Result<(), CompilationError> {
        if def.arity() > MAX_FUNCTION_PARAMS {
            return Err(CompilationError::LimitExceeded {
                what: "parameters",
                limit: MAX_FUNCTION_PARAMS,
                span: def.span,
            });
        }
        if self.lookup(&def.name, def.arity()).is_some() {
            return Err(CompilationError::DuplicateFunction {
                name: def.name,
                arity: def.params.len(),
                span: def.span,
            });
        }

        debug!("declared function {}/{} ({})", def.name, def.arity(), def.hash);
        self.by_name.entry(def.name.clone()).or_default().push(def);
        self.len += 1;
        Ok(())
    }

    /// Find the function called `name` with `arity` parameters.
    pub fn lookup(&self, name: &str, arity: usize) -> Option<&FunctionDef> {
        self.by_name
            .get(name)?
            .iter()
            .find(|def| def.arity() == arity)
    }

    /// Number of functions.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, params: Vec<DataType>) -> FunctionDef {
        FunctionDef::new(name, params, DataType::int(), Span::point(1, 1))
    }

    #[test]
    fn lookup_by_arity() {
        let mut table = FunctionTable::new();
        table.register(def("f", vec![])).unwrap();
        table.register(def("f", vec![DataType::int()])).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("f", 1).unwrap().arity(), 1);
        assert!(table.lookup("f", 2).is_none());
    }

    #[test]
    fn same_name_and_arity_is_a_duplicate() {
        let mut table = FunctionTable::new();
        table.register(def("f", vec![DataType::int()])).unwrap();
        let err = table.register(def("f", vec![DataType::long()])).unwrap_err();
        assert!(matches!(err, CompilationError::DuplicateFunction { arity: 1, .. }));
    }

    #[test]
    fn hash_reflects_parameter_types() {
        let a = def("f", vec![DataType::int()]);
        let b = def("f", vec![DataType::long()]);
        assert_ne!(a.hash, b.hash);
        assert_eq!(a.hash, def("f", vec![DataType::int()]).hash);
    }

    #[test]
    fn too_many_parameters() {
        let mut table = FunctionTable::new();
        let params = vec![DataType::int(); MAX_FUNCTION_PARAMS + 1];
        let err = table.register(def("wide", params)).unwrap_err();
        assert!(matches!(err, CompilationError::LimitExceeded { .. }));
    }
}
