//! Variable reads.

use ember_core::{CompilationError, Span};

use crate::emit::CodeSink;
use crate::expr_state::ExprState;
use crate::scope::Scope;

use super::Result;

/// A read of a local variable, parameter, or script input.
#[derive(Debug)]
pub struct VariableExpr {
    pub name: String,
    pub span: Span,
    slot: Option<u8>,
    pub(crate) state: ExprState,
}

impl VariableExpr {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            slot: None,
            state: ExprState::default(),
        }
    }

    pub(super) fn analyze(&mut self, scope: &mut Scope<'_>) -> Result<()> {
        let var = scope
            .lookup_variable(&self.name)
            .ok_or_else(|| CompilationError::UnknownVariable {
                name: self.name.clone(),
                span: self.span,
            })?;
        self.slot = Some(var.slot);
        self.state.actual = var.data_type;
        Ok(())
    }

    pub(super) fn emit<S: CodeSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        let slot = self.slot.ok_or_else(|| {
            CompilationError::internal(format!("variable '{}' emitted before analysis", self.name))
        })?;
        sink.emit_get_local(slot);
        Ok(())
    }
}
