//! Code emission.
//!
//! Nodes emit through the [`CodeSink`] trait. [`BytecodeEmitter`] is the
//! production sink writing a [`BytecodeChunk`]; [`RecordingSink`] keeps a
//! flat instruction list and is used to inspect emission order.
//!
//! # Example
//!
//! ```
//! use ember_compiler::bytecode::{ConstantPool, OpCode};
//! use ember_compiler::emit::{BytecodeEmitter, CodeSink};
//! use ember_core::Span;
//!
//! let mut constants = ConstantPool::new();
//! let mut emitter = BytecodeEmitter::new(&mut constants, true);
//!
//! emitter.set_span(Span::point(1, 1));
//! emitter.emit_int(42);
//! emitter.emit_int(10);
//! emitter.emit(OpCode::AddI32);
//!
//! let chunk = emitter.finish().unwrap();
//! chunk.assert_opcodes(&[OpCode::Constant, OpCode::Constant, OpCode::AddI32]);
//! ```

mod recording;

use ember_core::{CompilationError, Span, TypeHash};

use crate::bytecode::{BytecodeChunk, Constant, ConstantPool, OpCode};
use crate::cache::{CacheSlots, SlotHandle};
use crate::options::CompilerOptions;

pub use recording::{Instr, RecordingSink};

/// A forward jump awaiting its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpLabel(pub(crate) usize);

impl JumpLabel {
    /// Sink-specific position of the jump operand.
    pub fn offset(&self) -> usize {
        self.0
    }
}

/// Target of code emission.
pub trait CodeSink {
    /// Set the source location for subsequent instructions.
    fn set_span(&mut self, span: Span);

    /// Emit an instruction without operands.
    fn emit(&mut self, op: OpCode);

    /// Push an `int`.
    fn emit_int(&mut self, value: i32);

    /// Push a `long`.
    fn emit_long(&mut self, value: i64);

    /// Push a `double`.
    fn emit_double(&mut self, value: f64);

    /// Push a `bool`.
    fn emit_bool(&mut self, value: bool);

    /// Push a string literal.
    fn emit_string(&mut self, value: &str);

    /// Push `null`.
    fn emit_null(&mut self);

    /// Push a local variable.
    fn emit_get_local(&mut self, slot: u8);

    /// Pop into a local variable.
    fn emit_set_local(&mut self, slot: u8);

    /// Check the `any` value on top of the stack against `target`.
    fn emit_cast_dynamic(&mut self, target: TypeHash);

    /// Push the contents of a cache slot.
    fn emit_get_slot(&mut self, slot: SlotHandle);

    /// Pop an object into a cache slot.
    fn emit_set_slot(&mut self, slot: SlotHandle);

    /// Pop a value and jump to the label if it is not null.
    fn emit_jump_if_not_null(&mut self) -> JumpLabel;

    /// Bind a label to the current position.
    fn mark(&mut self, label: JumpLabel);

    /// Run a binding constructor over the top `arg_count` values.
    fn emit_new_binding(&mut self, binding: TypeHash, arg_count: u8);

    /// Invoke a binding method over the top `arg_count` values and the
    /// object beneath them.
    fn emit_call_binding(&mut self, binding: TypeHash, arg_count: u8);

    /// Call a script-local function.
    fn emit_call(&mut self, function: TypeHash, arg_count: u8);

    /// Discard the top of stack.
    fn emit_pop(&mut self) {
        self.emit(OpCode::Pop);
    }

    /// Return the top of stack.
    fn emit_return(&mut self) {
        self.emit(OpCode::Return);
    }

    /// Return `void`.
    fn emit_return_void(&mut self) {
        self.emit(OpCode::ReturnVoid);
    }
}

/// State shared by all nodes while one function body is emitted.
pub struct EmitContext<'a, S: CodeSink> {
    /// Where instructions go.
    pub sink: &'a mut S,
    /// Unit-wide cache-slot allocator.
    pub slots: &'a mut CacheSlots,
    /// Active compiler options.
    pub options: &'a CompilerOptions,
}

impl<'a, S: CodeSink> EmitContext<'a, S> {
    /// Bundle emission state.
    pub fn new(sink: &'a mut S, slots: &'a mut CacheSlots, options: &'a CompilerOptions) -> Self {
        Self {
            sink,
            slots,
            options,
        }
    }
}

/// Writes bytecode for a single function.
///
/// Constants go to the unit-wide pool so identical literals and hashes are
/// stored once. Encoding limits (pool size, jump distance) are checked as
/// instructions are written and reported by [`finish`](Self::finish).
pub struct BytecodeEmitter<'pool> {
    chunk: BytecodeChunk,
    constants: &'pool mut ConstantPool,
    debug_info: bool,
    current_span: Span,
    overflow: Option<(&'static str, usize, Span)>,
}

impl<'pool> BytecodeEmitter<'pool> {
    /// Create an emitter writing constants to `constants`.
    pub fn new(constants: &'pool mut ConstantPool, debug_info: bool) -> Self {
        Self {
            chunk: BytecodeChunk::new(),
            constants,
            debug_info,
            current_span: Span::default(),
            overflow: None,
        }
    }

    fn line(&self) -> u32 {
        if self.debug_info {
            self.current_span.line
        } else {
            0
        }
    }

    fn fail(&mut self, what: &'static str, limit: usize) {
        if self.overflow.is_none() {
            self.overflow = Some((what, limit, self.current_span));
        }
    }

    fn emit_byte_op(&mut self, op: OpCode, byte: u8) {
        let line = self.line();
        self.chunk.write_op(op, line);
        self.chunk.write_byte(byte, line);
    }

    fn emit_u16_op(&mut self, op: OpCode, value: u16) {
        let line = self.line();
        self.chunk.write_op(op, line);
        self.chunk.write_u16(value, line);
    }

    /// Add a constant, reporting pool overflow.
    fn constant_index(&mut self, constant: Constant) -> u16 {
        let index = self.constants.add(constant);
        match u16::try_from(index) {
            Ok(index) => index,
            Err(_) => {
                self.fail("constants", u16::MAX as usize + 1);
                0
            }
        }
    }

    fn emit_constant(&mut self, constant: Constant) {
        let index = self.constant_index(constant);
        match u8::try_from(index) {
            Ok(narrow) => self.emit_byte_op(OpCode::Constant, narrow),
            Err(_) => self.emit_u16_op(OpCode::ConstantWide, index),
        }
    }

    fn emit_hash_call(&mut self, op: OpCode, hash: TypeHash, arg_count: u8) {
        let index = self.constant_index(Constant::TypeHash(hash));
        self.emit_u16_op(op, index);
        let line = self.line();
        self.chunk.write_byte(arg_count, line);
    }

    /// Current bytecode length.
    pub fn code_size(&self) -> usize {
        self.chunk.len()
    }

    /// Finish the function.
    pub fn finish(self) -> Result<BytecodeChunk, CompilationError> {
        match self.overflow {
            Some((what, limit, span)) => Err(CompilationError::LimitExceeded { what, limit, span }),
            None => Ok(self.chunk),
        }
    }
}

impl CodeSink for BytecodeEmitter<'_> {
    fn set_span(&mut self, span: Span) {
        self.current_span = span;
    }

    fn emit(&mut self, op: OpCode) {
        let line = self.line();
        self.chunk.write_op(op, line);
    }

    fn emit_int(&mut self, value: i32) {
        match value {
            0 => self.emit(OpCode::PushZero),
            1 => self.emit(OpCode::PushOne),
            _ => self.emit_constant(Constant::Int(value)),
        }
    }

    fn emit_long(&mut self, value: i64) {
        self.emit_constant(Constant::Long(value));
    }

    fn emit_double(&mut self, value: f64) {
        self.emit_constant(Constant::Double(value));
    }

    fn emit_bool(&mut self, value: bool) {
        self.emit(if value {
            OpCode::PushTrue
        } else {
            OpCode::PushFalse
        });
    }

    fn emit_string(&mut self, value: &str) {
        self.emit_constant(Constant::StringData(value.to_string()));
    }

    fn emit_null(&mut self) {
        self.emit(OpCode::PushNull);
    }

    fn emit_get_local(&mut self, slot: u8) {
        self.emit_byte_op(OpCode::GetLocal, slot);
    }

    fn emit_set_local(&mut self, slot: u8) {
        self.emit_byte_op(OpCode::SetLocal, slot);
    }

    fn emit_cast_dynamic(&mut self, target: TypeHash) {
        let index = self.constant_index(Constant::TypeHash(target));
        self.emit_u16_op(OpCode::CastDynamic, index);
    }

    fn emit_get_slot(&mut self, slot: SlotHandle) {
        self.emit_u16_op(OpCode::GetSlot, slot.index());
    }

    fn emit_set_slot(&mut self, slot: SlotHandle) {
        self.emit_u16_op(OpCode::SetSlot, slot.index());
    }

    fn emit_jump_if_not_null(&mut self) -> JumpLabel {
        let line = self.line();
        JumpLabel(self.chunk.emit_jump(OpCode::JumpIfNotNull, line))
    }

    fn mark(&mut self, label: JumpLabel) {
        if self.chunk.patch_jump(label.0).is_none() {
            self.fail("jump distance", u16::MAX as usize);
        }
    }

    fn emit_new_binding(&mut self, binding: TypeHash, arg_count: u8) {
        self.emit_hash_call(OpCode::NewBinding, binding, arg_count);
    }

    fn emit_call_binding(&mut self, binding: TypeHash, arg_count: u8) {
        self.emit_hash_call(OpCode::CallBinding, binding, arg_count);
    }

    fn emit_call(&mut self, function: TypeHash, arg_count: u8) {
        self.emit_hash_call(OpCode::Call, function, arg_count);
    }
}
