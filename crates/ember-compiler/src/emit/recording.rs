//! A sink that records instructions as a flat list.

use ember_core::{Span, TypeHash};

use super::{CodeSink, JumpLabel};
use crate::bytecode::OpCode;
use crate::cache::SlotHandle;

/// One recorded instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Op(OpCode),
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    Str(String),
    Null,
    GetLocal(u8),
    SetLocal(u8),
    CastDynamic(TypeHash),
    GetSlot(SlotHandle),
    SetSlot(SlotHandle),
    /// Label id.
    JumpIfNotNull(usize),
    /// Label id.
    Mark(usize),
    NewBinding(TypeHash, u8),
    CallBinding(TypeHash, u8),
    Call(TypeHash, u8),
}

/// Records every instruction in emission order, with the span active when
/// it was emitted.
#[derive(Debug, Default)]
pub struct RecordingSink {
    instrs: Vec<(Instr, Span)>,
    span: Span,
    next_label: usize,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded instructions.
    pub fn instrs(&self) -> Vec<Instr> {
        self.instrs.iter().map(|(instr, _)| instr.clone()).collect()
    }

    /// Span active when the instruction at `index` was emitted.
    pub fn span_at(&self, index: usize) -> Option<Span> {
        self.instrs.get(index).map(|(_, span)| *span)
    }

    fn push(&mut self, instr: Instr) {
        self.instrs.push((instr, self.span));
    }
}

impl CodeSink for RecordingSink {
    fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    fn emit(&mut self, op: OpCode) {
        self.push(Instr::Op(op));
    }

    fn emit_int(&mut self, value: i32) {
        self.push(Instr::Int(value));
    }

    fn emit_long(&mut self, value: i64) {
        self.push(Instr::Long(value));
    }

    fn emit_double(&mut self, value: f64) {
        self.push(Instr::Double(value));
    }

    fn emit_bool(&mut self, value: bool) {
        self.push(Instr::Bool(value));
    }

    fn emit_string(&mut self, value: &str) {
        self.push(Instr::Str(value.to_string()));
    }

    fn emit_null(&mut self) {
        self.push(Instr::Null);
    }

    fn emit_get_local(&mut self, slot: u8) {
        self.push(Instr::GetLocal(slot));
    }

    fn emit_set_local(&mut self, slot: u8) {
        self.push(Instr::SetLocal(slot));
    }

    fn emit_cast_dynamic(&mut self, target: TypeHash) {
        self.push(Instr::CastDynamic(target));
    }

    fn emit_get_slot(&mut self, slot: SlotHandle) {
        self.push(Instr::GetSlot(slot));
    }

    fn emit_set_slot(&mut self, slot: SlotHandle) {
        self.push(Instr::SetSlot(slot));
    }

    fn emit_jump_if_not_null(&mut self) -> JumpLabel {
        let id = self.next_label;
        self.next_label += 1;
        self.push(Instr::JumpIfNotNull(id));
        JumpLabel(id)
    }

    fn mark(&mut self, label: JumpLabel) {
        self.push(Instr::Mark(label.0));
    }

    fn emit_new_binding(&mut self, binding: TypeHash, arg_count: u8) {
        self.push(Instr::NewBinding(binding, arg_count));
    }

    fn emit_call_binding(&mut self, binding: TypeHash, arg_count: u8) {
        self.push(Instr::CallBinding(binding, arg_count));
    }

    fn emit_call(&mut self, function: TypeHash, arg_count: u8) {
        self.push(Instr::Call(function, arg_count));
    }
}
