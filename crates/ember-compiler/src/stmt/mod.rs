//! Statements.
//!
//! The statement set is deliberately small: calls used for their effect,
//! `let` declarations, and `return`. Every statement leaves the operand
//! stack as it found it, except `return`.

mod return_stmt;
mod var_decl;

pub use return_stmt::ReturnStmt;
pub use var_decl::LetStmt;

use ember_core::{CompilationError, DataType, Span};
use rustc_hash::FxHashSet;

use crate::emit::{CodeSink, EmitContext};
use crate::expr::Expr;
use crate::scope::Scope;

type Result<T> = std::result::Result<T, CompilationError>;

/// A statement.
#[derive(Debug)]
pub enum Stmt {
    /// An expression evaluated for its effect; its value is discarded.
    Expr(Expr),
    Let(LetStmt),
    Return(ReturnStmt),
}

impl Stmt {
    /// `expr;`
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }

    /// `let name = init;` with the type taken from `init`.
    pub fn let_infer(name: impl Into<String>, init: Expr, span: Span) -> Self {
        Stmt::Let(LetStmt::new(name, None, init, span))
    }

    /// `let name: ty = init;`
    pub fn let_typed(name: impl Into<String>, ty: DataType, init: Expr, span: Span) -> Self {
        Stmt::Let(LetStmt::new(name, Some(ty), init, span))
    }

    /// `return value;`
    pub fn return_value(value: Expr, span: Span) -> Self {
        Stmt::Return(ReturnStmt::new(Some(value), span))
    }

    /// `return;`
    pub fn return_void(span: Span) -> Self {
        Stmt::Return(ReturnStmt::new(None, span))
    }

    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(e) => e.span(),
            Stmt::Let(s) => s.span,
            Stmt::Return(s) => s.span,
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Stmt::Return(_))
    }

    /// Analyze the statement, declaring any variable it introduces.
    pub fn analyze(&mut self, scope: &mut Scope<'_>) -> Result<()> {
        match self {
            Stmt::Expr(expr) => {
                expr.analyze(scope)?;
                if !expr.is_statement() {
                    return Err(CompilationError::NotAStatement { span: expr.span() });
                }
                Ok(())
            }
            Stmt::Let(s) => s.analyze(scope),
            Stmt::Return(s) => s.analyze(scope),
        }
    }

    pub fn emit<S: CodeSink>(&mut self, cx: &mut EmitContext<'_, S>) -> Result<()> {
        match self {
            Stmt::Expr(expr) => {
                expr.emit(cx)?;
                cx.sink.set_span(expr.span());
                cx.sink.emit_pop();
                Ok(())
            }
            Stmt::Let(s) => s.emit(cx),
            Stmt::Return(s) => s.emit(cx),
        }
    }

    /// Add every variable name this statement reads to `out`.
    pub fn collect_free_variables(&self, out: &mut FxHashSet<String>) {
        match self {
            Stmt::Expr(expr) => expr.collect_free_variables(out),
            Stmt::Let(s) => s.init.collect_free_variables(out),
            Stmt::Return(s) => {
                if let Some(value) = &s.value {
                    value.collect_free_variables(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::OpCode;
    use crate::cache::CacheSlots;
    use crate::emit::{Instr, RecordingSink};
    use crate::expr::test_support::{registry, span};
    use crate::function_table::FunctionTable;
    use crate::options::CompilerOptions;

    #[test]
    fn expression_statement_pops_call_value() {
        let registry = registry();
        let functions = FunctionTable::new();
        let options = CompilerOptions::default();
        let mut scope = Scope::new(&functions, &registry, "<test>", DataType::any());
        let mut stmt = Stmt::expr(Expr::call(
            "log",
            vec![Expr::string("p", span(5)), Expr::string("m", span(10))],
            span(1),
        ));
        stmt.analyze(&mut scope).unwrap();

        let mut sink = RecordingSink::new();
        let mut slots = CacheSlots::new();
        stmt.emit(&mut EmitContext::new(&mut sink, &mut slots, &options))
            .unwrap();

        assert_eq!(sink.instrs().last(), Some(&Instr::Op(OpCode::Pop)));
    }

    #[test]
    fn bare_value_is_not_a_statement() {
        let registry = registry();
        let functions = FunctionTable::new();
        let mut scope = Scope::new(&functions, &registry, "<test>", DataType::any());
        let mut stmt = Stmt::expr(Expr::int(3, span(4)));

        let err = stmt.analyze(&mut scope).unwrap_err();
        assert_eq!(err, CompilationError::NotAStatement { span: span(4) });
    }

    #[test]
    fn free_variables_skip_literals() {
        let stmts = [
            Stmt::let_infer("x", Expr::variable("input", span(9)), span(1)),
            Stmt::return_value(Expr::variable("x", span(8)), span(1)),
            Stmt::return_void(span(1)),
        ];
        let mut vars = FxHashSet::default();
        for stmt in &stmts {
            stmt.collect_free_variables(&mut vars);
        }
        assert_eq!(vars.len(), 2);
        assert!(vars.contains("input"));
        assert!(stmts[1].is_return());
    }
}
