//! Script containers handed to the compiler.
//!
//! A [`Script`] is what a parser would produce: host inputs the main body
//! may read, local function declarations, and the main body itself.
//!
//! ```
//! use ember_compiler::expr::Expr;
//! use ember_compiler::script::{FunctionDecl, Script};
//! use ember_compiler::stmt::Stmt;
//! use ember_core::{DataType, Span};
//!
//! let at = Span::point(1, 1);
//! let script = Script::new()
//!     .input("n", DataType::int())
//!     .function(
//!         FunctionDecl::new("double", DataType::int(), at)
//!             .param("x", DataType::int())
//!             .body([Stmt::return_value(Expr::variable("x", at), at)]),
//!     )
//!     .body([Stmt::return_value(
//!         Expr::call("double", vec![Expr::variable("n", at)], at),
//!         at,
//!     )]);
//!
//! assert_eq!(script.functions.len(), 1);
//! ```

use ember_core::{DataType, Span};
use rustc_hash::FxHashSet;

use crate::stmt::Stmt;

/// A value supplied by the host on every execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub name: String,
    pub ty: DataType,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: DataType,
}

/// A script-local function declaration.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: DataType,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, return_type: DataType, span: Span) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type,
            body: Vec::new(),
            span,
        }
    }

    /// Append a parameter.
    pub fn param(mut self, name: impl Into<String>, ty: DataType) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
        });
        self
    }

    /// Append statements to the body.
    pub fn body(mut self, stmts: impl IntoIterator<Item = Stmt>) -> Self {
        self.body.extend(stmts);
        self
    }

    /// Parameter types in order.
    pub fn param_types(&self) -> Vec<DataType> {
        self.params.iter().map(|p| p.ty).collect()
    }
}

/// A whole script.
#[derive(Debug, Default)]
pub struct Script {
    pub inputs: Vec<Input>,
    pub functions: Vec<FunctionDecl>,
    pub body: Vec<Stmt>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a host input.
    pub fn input(mut self, name: impl Into<String>, ty: DataType) -> Self {
        self.inputs.push(Input {
            name: name.into(),
            ty,
        });
        self
    }

    /// Add a local function.
    pub fn function(mut self, decl: FunctionDecl) -> Self {
        self.functions.push(decl);
        self
    }

    /// Append statements to the main body.
    pub fn body(mut self, stmts: impl IntoIterator<Item = Stmt>) -> Self {
        self.body.extend(stmts);
        self
    }

    /// Inputs the main body reads, in declaration order.
    ///
    /// Local functions cannot see inputs, so only the main body counts.
    pub fn used_inputs(&self) -> Vec<String> {
        let mut read = FxHashSet::default();
        for stmt in &self.body {
            stmt.collect_free_variables(&mut read);
        }
        self.inputs
            .iter()
            .filter(|input| read.contains(&input.name))
            .map(|input| input.name.clone())
            .collect()
    }
}
