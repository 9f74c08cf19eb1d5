//! Numeric arithmetic.
//!
//! Both operands are promoted to the wider of their two types
//! (`int < long < double`) before the operation.

use std::fmt;

use ember_core::{CompilationError, DataType, Span};

use crate::bytecode::OpCode;
use crate::emit::{CodeSink, EmitContext};
use crate::expr_state::ExprState;
use crate::scope::Scope;

use super::{Expr, Result, coerce_in_place};

/// Arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Opcode for this operator on operands of `ty`.
    fn opcode(self, ty: DataType) -> Option<OpCode> {
        let ops = match ty.numeric_rank()? {
            0 => [OpCode::AddI32, OpCode::SubI32, OpCode::MulI32, OpCode::DivI32],
            1 => [OpCode::AddI64, OpCode::SubI64, OpCode::MulI64, OpCode::DivI64],
            _ => [OpCode::AddF64, OpCode::SubF64, OpCode::MulF64, OpCode::DivF64],
        };
        Some(ops[self as usize])
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        })
    }
}

/// `lhs op rhs`
#[derive(Debug)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Expr,
    pub rhs: Expr,
    pub span: Span,
    pub(crate) state: ExprState,
}

impl BinaryExpr {
    pub fn new(op: BinaryOp, lhs: Expr, rhs: Expr, span: Span) -> Self {
        Self {
            op,
            lhs,
            rhs,
            span,
            state: ExprState::default(),
        }
    }

    pub(super) fn analyze(&mut self, scope: &mut Scope<'_>) -> Result<()> {
        for operand in [&mut self.lhs, &mut self.rhs] {
            operand.state_mut().mark_internal(None);
            operand.analyze(scope)?;
        }

        let (lhs, rhs) = (self.lhs.actual(), self.rhs.actual());
        let result = match (lhs.numeric_rank(), rhs.numeric_rank()) {
            (Some(l), Some(r)) => {
                if l >= r {
                    lhs
                } else {
                    rhs
                }
            }
            _ => {
                return Err(CompilationError::InvalidOperation {
                    message: format!(
                        "operator '{}' cannot be applied to '{lhs}' and '{rhs}'",
                        self.op
                    ),
                    span: self.span,
                });
            }
        };

        coerce_in_place(&mut self.lhs, result)?;
        coerce_in_place(&mut self.rhs, result)?;
        self.state.actual = result;
        Ok(())
    }

    pub(super) fn emit<S: CodeSink>(&mut self, cx: &mut EmitContext<'_, S>) -> Result<()> {
        let op = self.op.opcode(self.state.actual).ok_or_else(|| {
            CompilationError::internal(format!("operator '{}' emitted before analysis", self.op))
        })?;
        self.lhs.emit(cx)?;
        self.rhs.emit(cx)?;
        cx.sink.set_span(self.span);
        cx.sink.emit(op);
        Ok(())
    }
}
