//! Bytecode chunk for compiled functions.
//!
//! A `BytecodeChunk` holds the code of one function together with the source
//! line of every byte.

use super::OpCode;

/// A chunk of compiled bytecode for a single function.
///
/// Constants live in the unit-wide `ConstantPool`, not per chunk.
#[derive(Debug, Clone, Default)]
pub struct BytecodeChunk {
    code: Vec<u8>,
    /// Parallel to `code`; 0 when debug info is disabled.
    lines: Vec<u32>,
}

impl BytecodeChunk {
    /// Create a new empty bytecode chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an opcode.
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write_byte(op as u8, line);
    }

    /// Write a byte operand.
    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Write a 16-bit operand (big-endian).
    pub fn write_u16(&mut self, value: u16, line: u32) {
        for byte in value.to_be_bytes() {
            self.write_byte(byte, line);
        }
    }

    /// Current code offset.
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    /// Emit a forward jump with a placeholder offset; returns the operand
    /// offset to patch later.
    pub fn emit_jump(&mut self, op: OpCode, line: u32) -> usize {
        self.write_op(op, line);
        let offset = self.code.len();
        self.write_u16(0xFFFF, line);
        offset
    }

    /// Patch a forward jump so it lands on the current position.
    ///
    /// Returns `None` if the distance does not fit in 16 bits.
    pub fn patch_jump(&mut self, offset: usize) -> Option<()> {
        let distance = self.code.len().checked_sub(offset + 2)?;
        let distance = u16::try_from(distance).ok()?;
        let [hi, lo] = distance.to_be_bytes();
        *self.code.get_mut(offset)? = hi;
        *self.code.get_mut(offset + 1)? = lo;
        Some(())
    }

    /// Get the bytecode.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Get the line number for a given offset.
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.lines.get(offset).copied()
    }

    /// Get the length of the bytecode.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Check if the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Read a byte at the given offset.
    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// Read a u16 at the given offset (big-endian).
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let hi = *self.code.get(offset)?;
        let lo = *self.code.get(offset + 1)?;
        Some(u16::from_be_bytes([hi, lo]))
    }

    /// Read an opcode at the given offset.
    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.code.get(offset).and_then(|&b| OpCode::from_u8(b))
    }

    /// Extract all opcodes from the chunk, skipping operands.
    pub fn opcodes(&self) -> Vec<OpCode> {
        let mut ops = Vec::new();
        let mut offset = 0;

        while offset < self.code.len() {
            match self.read_op(offset) {
                Some(op) => {
                    ops.push(op);
                    offset += 1 + op.operand_size();
                }
                None => offset += 1,
            }
        }

        ops
    }

    /// Assert that this chunk contains exactly the given opcode sequence,
    /// ignoring operand values.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_op_records_lines() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Constant, 3);
        chunk.write_byte(42, 3);

        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.read_op(0), Some(OpCode::Constant));
        assert_eq!(chunk.read_byte(1), Some(42));
        assert_eq!(chunk.line_at(1), Some(3));
        assert_eq!(chunk.line_at(2), None);
    }

    #[test]
    fn write_u16_big_endian() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_u16(0x1234, 1);
        assert_eq!(chunk.code(), &[0x12, 0x34]);
        assert_eq!(chunk.read_u16(0), Some(0x1234));
        assert_eq!(chunk.read_u16(1), None);
    }

    #[test]
    fn emit_and_patch_jump() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::PushNull, 1);
        let jump = chunk.emit_jump(OpCode::JumpIfNotNull, 1);
        chunk.write_op(OpCode::PushOne, 1);
        chunk.write_op(OpCode::Pop, 1);
        chunk.patch_jump(jump).unwrap();

        assert_eq!(chunk.read_u16(jump), Some(2));
    }

    #[test]
    fn patch_jump_too_far() {
        let mut chunk = BytecodeChunk::new();
        let jump = chunk.emit_jump(OpCode::JumpIfNotNull, 1);
        for _ in 0..=u16::MAX as usize {
            chunk.write_op(OpCode::Pop, 1);
        }
        assert!(chunk.patch_jump(jump).is_none());
    }

    #[test]
    fn opcodes_skip_operands() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::GetSlot, 1);
        chunk.write_u16(0, 1);
        chunk.write_op(OpCode::CallBinding, 1);
        chunk.write_u16(7, 1);
        chunk.write_byte(1, 1);
        chunk.write_op(OpCode::Pop, 1);

        chunk.assert_opcodes(&[OpCode::GetSlot, OpCode::CallBinding, OpCode::Pop]);
    }

    #[test]
    #[should_panic(expected = "Bytecode mismatch")]
    fn assert_opcodes_failure() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Pop, 1);
        chunk.assert_opcodes(&[OpCode::Return]);
    }
}
