//! Literal values.

use ember_core::{DataType, Span};

use crate::emit::CodeSink;
use crate::expr_state::ExprState;

use super::Result;

/// Value of a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    String(String),
    Null,
}

impl LiteralValue {
    /// Static type of the value.
    pub fn data_type(&self) -> DataType {
        match self {
            LiteralValue::Int(_) => DataType::int(),
            LiteralValue::Long(_) => DataType::long(),
            LiteralValue::Double(_) => DataType::double(),
            LiteralValue::Bool(_) => DataType::bool(),
            LiteralValue::String(_) => DataType::string(),
            LiteralValue::Null => DataType::null(),
        }
    }
}

/// A literal expression.
#[derive(Debug)]
pub struct LiteralExpr {
    pub value: LiteralValue,
    pub span: Span,
    pub(crate) state: ExprState,
}

impl LiteralExpr {
    pub fn new(value: LiteralValue, span: Span) -> Self {
        Self {
            value,
            span,
            state: ExprState::default(),
        }
    }

    pub(super) fn analyze(&mut self) -> Result<()> {
        self.state.actual = self.value.data_type();
        Ok(())
    }

    pub(super) fn emit<S: CodeSink + ?Sized>(&self, sink: &mut S) {
        match &self.value {
            LiteralValue::Int(v) => sink.emit_int(*v),
            LiteralValue::Long(v) => sink.emit_long(*v),
            LiteralValue::Double(v) => sink.emit_double(*v),
            LiteralValue::Bool(v) => sink.emit_bool(*v),
            LiteralValue::String(s) => sink.emit_string(s),
            LiteralValue::Null => sink.emit_null(),
        }
    }
}
