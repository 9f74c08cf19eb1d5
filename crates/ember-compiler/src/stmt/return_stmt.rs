//! Return statements, checked against the enclosing function's return type.

use ember_core::{CompilationError, DataType, Span};

use crate::emit::{CodeSink, EmitContext};
use crate::expr::Expr;
use crate::scope::Scope;

use super::Result;

/// `return [value];`
#[derive(Debug)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

impl ReturnStmt {
    pub fn new(value: Option<Expr>, span: Span) -> Self {
        Self { value, span }
    }

    pub(super) fn analyze(&mut self, scope: &mut Scope<'_>) -> Result<()> {
        let return_type = scope.return_type();

        match (self.value.take(), return_type.is_void()) {
            (Some(mut value), false) => {
                value.state_mut().mark_internal(Some(return_type));
                value.analyze(scope)?;
                self.value = Some(value.coerce_to(return_type)?);
                Ok(())
            }
            (None, true) => Ok(()),
            (Some(_), true) => Err(CompilationError::InvalidOperation {
                message: format!("void function '{}' cannot return a value", scope.function_name()),
                span: self.span,
            }),
            (None, false) => Err(CompilationError::TypeMismatch {
                expected: return_type,
                actual: DataType::void(),
                span: self.span,
            }),
        }
    }

    pub(super) fn emit<S: CodeSink>(&mut self, cx: &mut EmitContext<'_, S>) -> Result<()> {
        match &mut self.value {
            Some(value) => {
                value.emit(cx)?;
                cx.sink.set_span(self.span);
                cx.sink.emit_return();
            }
            None => {
                cx.sink.set_span(self.span);
                cx.sink.emit_return_void();
            }
        }
        Ok(())
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
    use crate::stmt::Stmt;

    fn analyze(stmt: &mut Stmt, return_type: DataType) -> Result<()> {
        let registry = registry();
        let functions = FunctionTable::new();
        let mut scope = Scope::new(&functions, &registry, "f", return_type);
        stmt.analyze(&mut scope)
    }

    #[test]
    fn value_is_coerced_to_return_type() {
        let mut stmt = Stmt::return_value(Expr::int(7, span(8)), span(1));
        analyze(&mut stmt, DataType::long()).unwrap();

        let options = CompilerOptions::default();
        let mut sink = RecordingSink::new();
        let mut slots = CacheSlots::new();
        stmt.emit(&mut EmitContext::new(&mut sink, &mut slots, &options))
            .unwrap();
        assert_eq!(
            sink.instrs(),
            vec![
                Instr::Int(7),
                Instr::Op(OpCode::I32toI64),
                Instr::Op(OpCode::Return),
            ]
        );
    }

    #[test]
    fn void_function_rejects_value() {
        let mut stmt = Stmt::return_value(Expr::int(7, span(8)), span(1));
        let err = analyze(&mut stmt, DataType::void()).unwrap_err();
        assert!(matches!(err, CompilationError::InvalidOperation { .. }));
    }

    #[test]
    fn missing_value_is_a_mismatch() {
        let mut stmt = Stmt::return_void(span(3));
        let err = analyze(&mut stmt, DataType::int()).unwrap_err();
        assert_eq!(
            err,
            CompilationError::TypeMismatch {
                expected: DataType::int(),
                actual: DataType::void(),
                span: span(3),
            }
        );
    }
}
