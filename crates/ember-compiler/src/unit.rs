//! Compiler output.

use rustc_hash::FxHashMap;

use ember_core::{DataType, TypeHash};

use crate::bytecode::{BytecodeChunk, ConstantPool};
use crate::cache::SlotInfo;
use crate::script::Input;

/// A compiled function.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    /// Function name.
    pub name: String,
    /// Identity used by `CALL` operands.
    pub hash: TypeHash,
    /// Parameter types; parameters occupy the first local slots.
    pub params: Vec<DataType>,
    /// Declared return type.
    pub return_type: DataType,
    /// Frame size, parameters included.
    pub local_count: usize,
    /// Compiled bytecode.
    pub chunk: BytecodeChunk,
}

/// Everything produced by compiling one script.
///
/// The unit is immutable; per-execution state (the cache-slot cells) lives
/// in the runtime instance built from it.
#[derive(Debug)]
pub struct CompiledUnit {
    /// Local functions, in declaration order.
    pub functions: Vec<CompiledFunction>,
    /// The main body. Script inputs occupy its first local slots.
    pub main: CompiledFunction,
    /// Unit-wide constant pool.
    pub constants: ConstantPool,
    /// Binding cache slots, indexed by `SlotHandle`.
    pub slots: Vec<SlotInfo>,
    /// Declared inputs, in slot order.
    pub inputs: Vec<Input>,
    used_inputs: Vec<String>,
    by_hash: FxHashMap<TypeHash, usize>,
}

impl CompiledUnit {
    pub(crate) fn new(
        functions: Vec<CompiledFunction>,
        main: CompiledFunction,
        constants: ConstantPool,
        slots: Vec<SlotInfo>,
        inputs: Vec<Input>,
        used_inputs: Vec<String>,
    ) -> Self {
        let by_hash = functions
            .iter()
            .enumerate()
            .map(|(index, f)| (f.hash, index))
            .collect();
        Self {
            functions,
            main,
            constants,
            slots,
            inputs,
            used_inputs,
            by_hash,
        }
    }

    /// Find a local function by its hash.
    pub fn function_by_hash(&self, hash: TypeHash) -> Option<&CompiledFunction> {
        self.by_hash.get(&hash).map(|&index| &self.functions[index])
    }

    /// Find a local function by name and arity.
    pub fn function(&self, name: &str, arity: usize) -> Option<&CompiledFunction> {
        self.functions
            .iter()
            .find(|f| f.name == name && f.params.len() == arity)
    }

    /// Inputs the main body actually reads.
    pub fn used_inputs(&self) -> &[String] {
        &self.used_inputs
    }

    /// Number of binding cache slots an instance must provide.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
