//! Inserted conversions.

use ember_core::{DataType, Span};

use crate::conversion::Conversion;
use crate::emit::{CodeSink, EmitContext};
use crate::expr_state::ExprState;

use super::{Expr, Result};

/// Converts an analyzed child to another type.
///
/// Created by [`Expr::coerce_to`]; never written by hand.
#[derive(Debug)]
pub struct CoerceExpr {
    pub inner: Expr,
    pub conversion: Conversion,
    pub span: Span,
    pub(crate) state: ExprState,
}

impl CoerceExpr {
    pub(super) fn new(inner: Expr, conversion: Conversion, target: DataType) -> Self {
        let inner_state = *inner.state();
        Self {
            span: inner.span(),
            inner,
            conversion,
            state: ExprState {
                actual: target,
                ..inner_state
            },
        }
    }

    pub(super) fn emit<S: CodeSink>(&mut self, cx: &mut EmitContext<'_, S>) -> Result<()> {
        self.inner.emit(cx)?;
        cx.sink.set_span(self.span);
        self.conversion.emit(&mut *cx.sink);
        Ok(())
    }
}
