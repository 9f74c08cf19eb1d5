//! Variable declarations.

use ember_core::{CompilationError, DataType, Span};

use crate::emit::{CodeSink, EmitContext};
use crate::expr::Expr;
use crate::scope::Scope;

use super::Result;

/// `let name[: ty] = init;`
///
/// The variable is declared after its initializer is analyzed, so the
/// initializer cannot read it.
#[derive(Debug)]
pub struct LetStmt {
    pub name: String,
    pub ty: Option<DataType>,
    pub init: Expr,
    pub span: Span,
    slot: Option<u8>,
}

impl LetStmt {
    pub fn new(name: impl Into<String>, ty: Option<DataType>, init: Expr, span: Span) -> Self {
        Self {
            name: name.into(),
            ty,
            init,
            span,
            slot: None,
        }
    }

    pub(super) fn analyze(&mut self, scope: &mut Scope<'_>) -> Result<()> {
        self.init.state_mut().mark_internal(self.ty);
        self.init.analyze(scope)?;

        let ty = match self.ty {
            Some(ty) => {
                let init = std::mem::replace(&mut self.init, Expr::null(self.span));
                self.init = init.coerce_to(ty)?;
                ty
            }
            None => {
                let ty = self.init.actual();
                if ty.is_void() || ty == DataType::null() {
                    return Err(CompilationError::InvalidOperation {
                        message: format!("cannot infer the type of '{}' from '{ty}'", self.name),
                        span: self.span,
                    });
                }
                ty
            }
        };

        self.slot = Some(scope.declare_variable(&self.name, ty, self.span)?);
        Ok(())
    }

    pub(super) fn emit<S: CodeSink>(&mut self, cx: &mut EmitContext<'_, S>) -> Result<()> {
        let slot = self.slot.ok_or_else(|| {
            CompilationError::internal(format!("'{}' emitted before analysis", self.name))
        })?;
        self.init.emit(cx)?;
        cx.sink.set_span(self.span);
        cx.sink.emit_set_local(slot);
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

    #[test]
    fn typed_let_widens_initializer() {
        let registry = registry();
        let functions = FunctionTable::new();
        let options = CompilerOptions::default();
        let mut scope = Scope::new(&functions, &registry, "<test>", DataType::any());
        let mut stmt = Stmt::let_typed("x", DataType::double(), Expr::int(2, span(17)), span(1));
        stmt.analyze(&mut scope).unwrap();
        assert_eq!(
            scope.lookup_variable("x").map(|v| v.data_type),
            Some(DataType::double())
        );

        let mut sink = RecordingSink::new();
        let mut slots = CacheSlots::new();
        stmt.emit(&mut EmitContext::new(&mut sink, &mut slots, &options))
            .unwrap();
        assert_eq!(
            sink.instrs(),
            vec![
                Instr::Int(2),
                Instr::Op(OpCode::I32toF64),
                Instr::SetLocal(0),
            ]
        );
    }

    #[test]
    fn initializer_cannot_see_its_variable() {
        let registry = registry();
        let functions = FunctionTable::new();
        let mut scope = Scope::new(&functions, &registry, "<test>", DataType::any());
        let mut stmt = Stmt::let_infer("x", Expr::variable("x", span(9)), span(1));

        let err = stmt.analyze(&mut scope).unwrap_err();
        assert!(matches!(err, CompilationError::UnknownVariable { .. }));
    }

    #[test]
    fn null_cannot_be_inferred() {
        let registry = registry();
        let functions = FunctionTable::new();
        let mut scope = Scope::new(&functions, &registry, "<test>", DataType::any());
        let mut stmt = Stmt::let_infer("x", Expr::null(span(9)), span(1));

        let err = stmt.analyze(&mut scope).unwrap_err();
        assert!(matches!(err, CompilationError::InvalidOperation { .. }));
    }

    #[test]
    fn redeclaration_is_rejected() {
        let registry = registry();
        let functions = FunctionTable::new();
        let mut scope = Scope::new(&functions, &registry, "<test>", DataType::any());
        Stmt::let_infer("x", Expr::int(1, span(9)), span(1))
            .analyze(&mut scope)
            .unwrap();

        let err = Stmt::let_infer("x", Expr::int(2, span(9)), span(2))
            .analyze(&mut scope)
            .unwrap_err();
        assert!(matches!(err, CompilationError::DuplicateVariable { .. }));
    }
}
