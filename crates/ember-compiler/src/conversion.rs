//! Implicit type conversions.
//!
//! | from | to | code |
//! |---|---|---|
//! | T | T | none |
//! | `int` | `long` / `double` | widening opcode |
//! | `long` | `double` | widening opcode |
//! | any non-void T | `any` | none |
//! | `any` | any non-void T | runtime-checked cast |
//! | `null` | `string` | none |
//!
//! Narrowing and conversions between `bool` and numbers are rejected.

use ember_core::{DataType, TypeHash};

use crate::bytecode::OpCode;
use crate::emit::CodeSink;

/// A conversion from one type to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Same type.
    Identity,
    /// Numeric widening through the given opcode.
    Widen(OpCode),
    /// Value becomes `any`; representation is unchanged.
    ToAny,
    /// `any` narrowed to a concrete type, checked at run time.
    FromAny(TypeHash),
    /// `null` used as a nullable type.
    FromNull,
}

impl Conversion {
    /// Emit the conversion code, if any.
    pub fn emit<S: CodeSink + ?Sized>(&self, sink: &mut S) {
        match self {
            Conversion::Identity | Conversion::ToAny | Conversion::FromNull => {}
            Conversion::Widen(op) => sink.emit(*op),
            Conversion::FromAny(target) => sink.emit_cast_dynamic(*target),
        }
    }
}

/// Find the implicit conversion from `from` to `to`.
pub fn find_conversion(from: DataType, to: DataType) -> Option<Conversion> {
    if from == to {
        return Some(Conversion::Identity);
    }
    if from.is_void() || to.is_void() {
        return None;
    }
    if to.is_any() {
        return Some(Conversion::ToAny);
    }
    if from.is_any() {
        return Some(Conversion::FromAny(to.type_hash));
    }
    if from == DataType::null() {
        return to.accepts_null().then_some(Conversion::FromNull);
    }
    widening(from, to).map(Conversion::Widen)
}

fn widening(from: DataType, to: DataType) -> Option<OpCode> {
    match (from.numeric_rank()?, to.numeric_rank()?) {
        (0, 1) => Some(OpCode::I32toI64),
        (0, 2) => Some(OpCode::I32toF64),
        (1, 2) => Some(OpCode::I64toF64),
        _ => None,
    }
}
