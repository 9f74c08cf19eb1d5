//! Stack executor for compiled units.
//!
//! The executor runs one [`CompiledFunction`] at a time on a shared value
//! stack. Script-local calls recurse into a new [`StackFrame`]; binding
//! instructions go through the sealed registry, with binding objects kept in
//! the instance's [`SlotCells`].

mod slots;

pub use slots::SlotCells;

use log::trace;

use ember_compiler::bytecode::{BytecodeChunk, Constant, OpCode};
use ember_compiler::{CompiledFunction, CompiledUnit};
use ember_core::{DataType, Dynamic, ObjectRef, RuntimeError, TypeHash, primitives};
use ember_registry::{BindingDef, SymbolRegistry};

type Result<T> = std::result::Result<T, RuntimeError>;

/// Deepest allowed nesting of script-local calls.
pub const MAX_CALL_DEPTH: usize = 256;

/// Whether a run-time value is acceptable where `ty` is expected.
pub fn value_matches(ty: DataType, value: &Dynamic) -> bool {
    match (ty.type_hash, value) {
        (primitives::ANY, _) => true,
        (_, Dynamic::Null) => ty.accepts_null(),
        (primitives::BOOL, Dynamic::Bool(_))
        | (primitives::INT, Dynamic::Int(_))
        | (primitives::LONG, Dynamic::Long(_))
        | (primitives::DOUBLE, Dynamic::Double(_))
        | (primitives::STRING, Dynamic::String(_)) => true,
        _ => false,
    }
}

/// Accept a host-supplied value for a parameter of type `ty`, widening
/// integers the same way the compiler does.
pub fn accept_host_value(ty: DataType, value: Dynamic) -> Option<Dynamic> {
    if value_matches(ty, &value) {
        return Some(value);
    }
    match ty.type_hash {
        primitives::LONG => value.as_long().map(Dynamic::Long),
        primitives::DOUBLE => value.as_double().map(Dynamic::Double),
        _ => None,
    }
}

/// Activation record of one script function.
struct StackFrame<'u> {
    function: &'u CompiledFunction,
    locals: Vec<Dynamic>,
    /// Value-stack height when the frame was entered.
    base: usize,
    ip: usize,
}

impl StackFrame<'_> {
    fn chunk(&self) -> &BytecodeChunk {
        &self.function.chunk
    }

    fn read_byte(&mut self) -> Result<u8> {
        let byte = self
            .chunk()
            .read_byte(self.ip)
            .ok_or_else(|| self.truncated())?;
        self.ip += 1;
        Ok(byte)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let value = self
            .chunk()
            .read_u16(self.ip)
            .ok_or_else(|| self.truncated())?;
        self.ip += 2;
        Ok(value)
    }

    fn read_op(&mut self) -> Result<OpCode> {
        let byte = self.read_byte()?;
        OpCode::from_u8(byte).ok_or_else(|| {
            RuntimeError::bytecode(format!(
                "unknown opcode {byte:#04x} in '{}'",
                self.function.name
            ))
        })
    }

    fn local(&self, slot: u8) -> Result<&Dynamic> {
        self.locals
            .get(slot as usize)
            .ok_or_else(|| RuntimeError::bytecode(format!("local {slot} out of range")))
    }

    fn local_mut(&mut self, slot: u8) -> Result<&mut Dynamic> {
        self.locals
            .get_mut(slot as usize)
            .ok_or_else(|| RuntimeError::bytecode(format!("local {slot} out of range")))
    }

    fn truncated(&self) -> RuntimeError {
        RuntimeError::bytecode(format!("truncated code in '{}'", self.function.name))
    }
}

/// Executes bytecode for one unit instance.
pub struct Vm<'u> {
    unit: &'u CompiledUnit,
    registry: &'u SymbolRegistry,
    slots: &'u mut SlotCells,
    stack: Vec<Dynamic>,
    depth: usize,
}

impl<'u> Vm<'u> {
    pub fn new(
        unit: &'u CompiledUnit,
        registry: &'u SymbolRegistry,
        slots: &'u mut SlotCells,
    ) -> Self {
        Self {
            unit,
            registry,
            slots,
            stack: Vec::with_capacity(64),
            depth: 0,
        }
    }

    /// Run `function` with `args` in its first local slots.
    ///
    /// Arguments are not type-checked here; callers outside the executor
    /// check them against the function's parameter types first.
    pub fn run(
        &mut self,
        function: &'u CompiledFunction,
        mut args: Vec<Dynamic>,
    ) -> Result<Dynamic> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::StackOverflow {
                limit: MAX_CALL_DEPTH,
            });
        }

        let local_count = function.local_count.max(args.len());
        args.resize(local_count, Dynamic::Void);
        let mut frame = StackFrame {
            function,
            locals: args,
            base: self.stack.len(),
            ip: 0,
        };

        self.depth += 1;
        let result = self.run_frame(&mut frame);
        self.depth -= 1;
        self.stack.truncate(frame.base);
        result
    }

    fn run_frame(&mut self, frame: &mut StackFrame<'u>) -> Result<Dynamic> {
        loop {
            let op = frame.read_op()?;
            match op {
                OpCode::Constant => {
                    let index = frame.read_byte()?;
                    self.push_constant(index as u32)?;
                }
                OpCode::ConstantWide => {
                    let index = frame.read_u16()?;
                    self.push_constant(index as u32)?;
                }
                OpCode::PushNull => self.stack.push(Dynamic::Null),
                OpCode::PushTrue => self.stack.push(Dynamic::Bool(true)),
                OpCode::PushFalse => self.stack.push(Dynamic::Bool(false)),
                OpCode::PushZero => self.stack.push(Dynamic::Int(0)),
                OpCode::PushOne => self.stack.push(Dynamic::Int(1)),
                OpCode::Pop => {
                    self.pop(frame)?;
                }

                OpCode::GetLocal => {
                    let slot = frame.read_byte()?;
                    let value = frame.local(slot)?.clone();
                    self.stack.push(value);
                }
                OpCode::SetLocal => {
                    let slot = frame.read_byte()?;
                    let value = self.pop(frame)?;
                    *frame.local_mut(slot)? = value;
                }

                OpCode::AddI32 | OpCode::SubI32 | OpCode::MulI32 | OpCode::DivI32 => {
                    let rhs = self.pop_typed(frame, Dynamic::as_int, "int")?;
                    let lhs = self.pop_typed(frame, Dynamic::as_int, "int")?;
                    let value = match op {
                        OpCode::AddI32 => lhs.wrapping_add(rhs),
                        OpCode::SubI32 => lhs.wrapping_sub(rhs),
                        OpCode::MulI32 => lhs.wrapping_mul(rhs),
                        _ if rhs == 0 => return Err(RuntimeError::DivisionByZero),
                        _ => lhs.wrapping_div(rhs),
                    };
                    self.stack.push(Dynamic::Int(value));
                }
                OpCode::AddI64 | OpCode::SubI64 | OpCode::MulI64 | OpCode::DivI64 => {
                    let rhs = self.pop_typed(frame, long_only, "long")?;
                    let lhs = self.pop_typed(frame, long_only, "long")?;
                    let value = match op {
                        OpCode::AddI64 => lhs.wrapping_add(rhs),
                        OpCode::SubI64 => lhs.wrapping_sub(rhs),
                        OpCode::MulI64 => lhs.wrapping_mul(rhs),
                        _ if rhs == 0 => return Err(RuntimeError::DivisionByZero),
                        _ => lhs.wrapping_div(rhs),
                    };
                    self.stack.push(Dynamic::Long(value));
                }
                OpCode::AddF64 | OpCode::SubF64 | OpCode::MulF64 | OpCode::DivF64 => {
                    let rhs = self.pop_typed(frame, double_only, "double")?;
                    let lhs = self.pop_typed(frame, double_only, "double")?;
                    let value = match op {
                        OpCode::AddF64 => lhs + rhs,
                        OpCode::SubF64 => lhs - rhs,
                        OpCode::MulF64 => lhs * rhs,
                        _ => lhs / rhs,
                    };
                    self.stack.push(Dynamic::Double(value));
                }

                OpCode::I32toI64 => {
                    let value = self.pop_typed(frame, Dynamic::as_int, "int")?;
                    self.stack.push(Dynamic::Long(i64::from(value)));
                }
                OpCode::I32toF64 => {
                    let value = self.pop_typed(frame, Dynamic::as_int, "int")?;
                    self.stack.push(Dynamic::Double(f64::from(value)));
                }
                OpCode::I64toF64 => {
                    let value = self.pop_typed(frame, long_only, "long")?;
                    self.stack.push(Dynamic::Double(value as f64));
                }
                OpCode::CastDynamic => {
                    let target = self.hash_operand(frame)?;
                    let value = self.stack.last().ok_or(RuntimeError::StackUnderflow)?;
                    if !value_matches(DataType::simple(target), value) {
                        return Err(RuntimeError::InvalidCast {
                            expected: primitives::name_of(target).unwrap_or("object"),
                            actual: value.type_name(),
                        });
                    }
                }

                OpCode::JumpIfNotNull => {
                    let distance = frame.read_u16()?;
                    if !self.pop(frame)?.is_null() {
                        frame.ip += distance as usize;
                    }
                }
                OpCode::GetSlot => {
                    let slot = frame.read_u16()?;
                    let value = match self.slots.get(slot)? {
                        Some(object) => Dynamic::Object(object.clone()),
                        None => Dynamic::Null,
                    };
                    self.stack.push(value);
                }
                OpCode::SetSlot => {
                    let slot = frame.read_u16()?;
                    match self.pop(frame)? {
                        Dynamic::Object(object) => self.slots.set(slot, object)?,
                        other => {
                            return Err(RuntimeError::bytecode(format!(
                                "cache slot {slot} given a {}",
                                other.type_name()
                            )));
                        }
                    }
                }

                OpCode::Call => {
                    let hash = self.hash_operand(frame)?;
                    let arg_count = frame.read_byte()?;
                    let unit: &'u CompiledUnit = self.unit;
                    let callee = unit
                        .function_by_hash(hash)
                        .ok_or(RuntimeError::UnknownFunction { hash })?;
                    let args = self.pop_args(frame, arg_count)?;
                    let value = self.run(callee, args)?;
                    self.stack.push(value);
                }
                OpCode::NewBinding => {
                    let binding = self.binding_operand(frame)?;
                    let arg_count = frame.read_byte()?;
                    let args = self.pop_args(frame, arg_count)?;
                    trace!("constructing {} for binding {}", binding.object_name, binding.name);
                    let object = binding
                        .construct(&args)
                        .map_err(|source| native_error(binding, source))?;
                    self.stack.push(Dynamic::Object(ObjectRef::new(object)));
                }
                OpCode::CallBinding => {
                    let binding = self.binding_operand(frame)?;
                    let arg_count = frame.read_byte()?;
                    let args = self.pop_args(frame, arg_count)?;
                    let object = match self.pop(frame)? {
                        Dynamic::Object(object) => object,
                        other => {
                            return Err(RuntimeError::bytecode(format!(
                                "binding '{}' invoked on a {}",
                                binding.name,
                                other.type_name()
                            )));
                        }
                    };
                    let value = {
                        let mut guard = object
                            .borrow_mut()
                            .map_err(|source| native_error(binding, source))?;
                        binding
                            .invoke(&mut **guard, &args)
                            .map_err(|source| native_error(binding, source))?
                    };
                    self.stack.push(value);
                }

                OpCode::Return => return self.pop(frame),
                OpCode::ReturnVoid => return Ok(Dynamic::Void),
            }
        }
    }

    fn pop(&mut self, frame: &StackFrame<'_>) -> Result<Dynamic> {
        if self.stack.len() <= frame.base {
            return Err(RuntimeError::StackUnderflow);
        }
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    fn pop_typed<T>(
        &mut self,
        frame: &StackFrame<'_>,
        extract: fn(&Dynamic) -> Option<T>,
        expected: &'static str,
    ) -> Result<T> {
        let value = self.pop(frame)?;
        extract(&value).ok_or(RuntimeError::InvalidCast {
            expected,
            actual: value.type_name(),
        })
    }

    /// Pop `count` values, returning them in push order.
    fn pop_args(&mut self, frame: &StackFrame<'_>, count: u8) -> Result<Vec<Dynamic>> {
        let count = count as usize;
        if self.stack.len() < frame.base + count {
            return Err(RuntimeError::StackUnderflow);
        }
        Ok(self.stack.split_off(self.stack.len() - count))
    }

    fn push_constant(&mut self, index: u32) -> Result<()> {
        let value = match self.unit.constants.get(index) {
            Some(Constant::Int(v)) => Dynamic::Int(*v),
            Some(Constant::Long(v)) => Dynamic::Long(*v),
            Some(Constant::Double(v)) => Dynamic::Double(*v),
            Some(Constant::StringData(s)) => Dynamic::from(s.as_str()),
            Some(Constant::TypeHash(_)) | None => {
                return Err(RuntimeError::bytecode(format!(
                    "constant {index} is not a value"
                )));
            }
        };
        self.stack.push(value);
        Ok(())
    }

    fn hash_operand(&self, frame: &mut StackFrame<'_>) -> Result<TypeHash> {
        let index = frame.read_u16()?;
        self.unit
            .constants
            .get_hash(index as u32)
            .ok_or_else(|| RuntimeError::bytecode(format!("constant {index} is not a hash")))
    }

    fn binding_operand(&self, frame: &mut StackFrame<'_>) -> Result<&'u BindingDef> {
        let hash = self.hash_operand(frame)?;
        let registry: &'u SymbolRegistry = self.registry;
        registry
            .get(hash)
            .map(|binding| &**binding)
            .ok_or(RuntimeError::UnknownBinding { hash })
    }
}

fn long_only(value: &Dynamic) -> Option<i64> {
    match value {
        Dynamic::Long(v) => Some(*v),
        _ => None,
    }
}

fn double_only(value: &Dynamic) -> Option<f64> {
    match value {
        Dynamic::Double(v) => Some(*v),
        _ => None,
    }
}

fn native_error(binding: &BindingDef, source: ember_core::NativeError) -> RuntimeError {
    RuntimeError::Native {
        binding: binding.name.clone(),
        source,
    }
}
