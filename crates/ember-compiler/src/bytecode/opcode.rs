//! Bytecode operation codes.
//!
//! Each opcode is a single byte, with operands following inline. Multi-byte
//! operands are big-endian.

/// Bytecode operation codes.
///
/// The executor is a stack machine. Operations pop their operands and push
/// their result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants
    // =========================================================================
    /// Push constant from pool (8-bit index).
    /// Operand: u8 constant index
    Constant = 0,
    /// Push constant from pool (16-bit index).
    /// Operand: u16 constant index
    ConstantWide,
    /// Push null.
    PushNull,
    /// Push boolean true.
    PushTrue,
    /// Push boolean false.
    PushFalse,
    /// Push int 0.
    PushZero,
    /// Push int 1.
    PushOne,

    // =========================================================================
    // Stack and Locals
    // =========================================================================
    /// Pop top of stack.
    Pop,
    /// Load local variable.
    /// Operand: u8 slot index
    GetLocal,
    /// Pop into local variable.
    /// Operand: u8 slot index
    SetLocal,

    // =========================================================================
    // Arithmetic
    // =========================================================================
    /// int + int (wrapping)
    AddI32,
    /// int - int (wrapping)
    SubI32,
    /// int * int (wrapping)
    MulI32,
    /// int / int; fails on division by zero
    DivI32,
    /// long + long (wrapping)
    AddI64,
    /// long - long (wrapping)
    SubI64,
    /// long * long (wrapping)
    MulI64,
    /// long / long; fails on division by zero
    DivI64,
    /// double + double
    AddF64,
    /// double - double
    SubF64,
    /// double * double
    MulF64,
    /// double / double
    DivF64,

    // =========================================================================
    // Conversions
    // =========================================================================
    /// Widen int to long.
    I32toI64,
    /// Widen int to double.
    I32toF64,
    /// Widen long to double.
    I64toF64,
    /// Check that an `any` value holds the target type.
    /// Operand: u16 constant index (TypeHash of the target type)
    CastDynamic,

    // =========================================================================
    // Binding Cache
    // =========================================================================
    /// Pop a value; jump forward if it is not null.
    /// Operand: u16 forward offset
    JumpIfNotNull,
    /// Push the contents of a cache slot (null while empty).
    /// Operand: u16 slot index
    GetSlot,
    /// Pop an object into a cache slot.
    /// Operand: u16 slot index
    SetSlot,

    // =========================================================================
    // Calls
    // =========================================================================
    /// Call a script-local function.
    /// Operands: u16 constant index (function TypeHash), u8 argument count
    Call,
    /// Run a binding constructor; pushes the new object.
    /// Operands: u16 constant index (binding TypeHash), u8 argument count
    NewBinding,
    /// Invoke a binding method on the object below the arguments.
    /// Operands: u16 constant index (binding TypeHash), u8 argument count
    CallBinding,
    /// Return the top of stack.
    Return,
    /// Return `void`.
    ReturnVoid,
}

impl OpCode {
    /// Convert from u8, returning None for invalid values.
    pub fn from_u8(value: u8) -> Option<Self> {
        if value <= OpCode::ReturnVoid as u8 {
            // SAFETY: OpCode is repr(u8) with contiguous discriminants and the
            // value is in range
            Some(unsafe { std::mem::transmute::<u8, OpCode>(value) })
        } else {
            None
        }
    }

    /// Size of the operands in bytes, not counting the opcode byte.
    pub fn operand_size(&self) -> usize {
        match self {
            OpCode::PushNull
            | OpCode::PushTrue
            | OpCode::PushFalse
            | OpCode::PushZero
            | OpCode::PushOne
            | OpCode::Pop
            | OpCode::AddI32
            | OpCode::SubI32
            | OpCode::MulI32
            | OpCode::DivI32
            | OpCode::AddI64
            | OpCode::SubI64
            | OpCode::MulI64
            | OpCode::DivI64
            | OpCode::AddF64
            | OpCode::SubF64
            | OpCode::MulF64
            | OpCode::DivF64
            | OpCode::I32toI64
            | OpCode::I32toF64
            | OpCode::I64toF64
            | OpCode::Return
            | OpCode::ReturnVoid => 0,

            OpCode::Constant | OpCode::GetLocal | OpCode::SetLocal => 1,

            OpCode::ConstantWide
            | OpCode::CastDynamic
            | OpCode::JumpIfNotNull
            | OpCode::GetSlot
            | OpCode::SetSlot => 2,

            OpCode::Call | OpCode::NewBinding | OpCode::CallBinding => 3,
        }
    }

    /// Get the name of this opcode for debugging.
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::Constant => "CONSTANT",
            OpCode::ConstantWide => "CONSTANT_WIDE",
            OpCode::PushNull => "PUSH_NULL",
            OpCode::PushTrue => "PUSH_TRUE",
            OpCode::PushFalse => "PUSH_FALSE",
            OpCode::PushZero => "PUSH_ZERO",
            OpCode::PushOne => "PUSH_ONE",
            OpCode::Pop => "POP",
            OpCode::GetLocal => "GET_LOCAL",
            OpCode::SetLocal => "SET_LOCAL",
            OpCode::AddI32 => "ADD_I32",
            OpCode::SubI32 => "SUB_I32",
            OpCode::MulI32 => "MUL_I32",
            OpCode::DivI32 => "DIV_I32",
            OpCode::AddI64 => "ADD_I64",
            OpCode::SubI64 => "SUB_I64",
            OpCode::MulI64 => "MUL_I64",
            OpCode::DivI64 => "DIV_I64",
            OpCode::AddF64 => "ADD_F64",
            OpCode::SubF64 => "SUB_F64",
            OpCode::MulF64 => "MUL_F64",
            OpCode::DivF64 => "DIV_F64",
            OpCode::I32toI64 => "I32_TO_I64",
            OpCode::I32toF64 => "I32_TO_F64",
            OpCode::I64toF64 => "I64_TO_F64",
            OpCode::CastDynamic => "CAST_DYNAMIC",
            OpCode::JumpIfNotNull => "JUMP_IF_NOT_NULL",
            OpCode::GetSlot => "GET_SLOT",
            OpCode::SetSlot => "SET_SLOT",
            OpCode::Call => "CALL",
            OpCode::NewBinding => "NEW_BINDING",
            OpCode::CallBinding => "CALL_BINDING",
            OpCode::Return => "RETURN",
            OpCode::ReturnVoid => "RETURN_VOID",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_from_u8() {
        assert_eq!(OpCode::from_u8(0), Some(OpCode::Constant));
        assert_eq!(OpCode::from_u8(1), Some(OpCode::ConstantWide));
        let last = OpCode::ReturnVoid as u8;
        assert_eq!(OpCode::from_u8(last), Some(OpCode::ReturnVoid));
        assert_eq!(OpCode::from_u8(last + 1), None);
    }

    #[test]
    fn every_byte_round_trips() {
        for byte in 0..=OpCode::ReturnVoid as u8 {
            let op = OpCode::from_u8(byte).unwrap();
            assert_eq!(op as u8, byte, "{}", op.name());
        }
    }

    #[test]
    fn operand_sizes() {
        assert_eq!(OpCode::Pop.operand_size(), 0);
        assert_eq!(OpCode::GetLocal.operand_size(), 1);
        assert_eq!(OpCode::GetSlot.operand_size(), 2);
        assert_eq!(OpCode::JumpIfNotNull.operand_size(), 2);
        assert_eq!(OpCode::Call.operand_size(), 3);
        assert_eq!(OpCode::NewBinding.operand_size(), 3);
        assert_eq!(OpCode::CallBinding.operand_size(), 3);
    }

    #[test]
    fn opcode_name() {
        assert_eq!(OpCode::JumpIfNotNull.name(), "JUMP_IF_NOT_NULL");
        assert_eq!(OpCode::CallBinding.name(), "CALL_BINDING");
    }
}
