//! Compiled units and their runtime instances.
//!
//! A [`Unit`] is an immutable compiled script tied to the registry it was
//! compiled against. It can be shared freely. Running it requires a
//! [`UnitInstance`], which owns the binding objects built by the script's
//! calls: each instance constructs a binding object at most once per cache
//! slot and reuses it on every later execution.
//!
//! Instances hold binding objects behind `Rc`, so they stay on the thread
//! that created them.

use std::sync::Arc;

use ember_compiler::CompiledUnit;
use ember_core::{Dynamic, RuntimeError};
use ember_registry::SymbolRegistry;

use crate::vm::{SlotCells, Vm, accept_host_value};

/// A compiled script ready to be instantiated.
#[derive(Debug, Clone)]
pub struct Unit {
    compiled: Arc<CompiledUnit>,
    registry: Arc<SymbolRegistry>,
}

impl Unit {
    pub(crate) fn new(compiled: Arc<CompiledUnit>, registry: Arc<SymbolRegistry>) -> Self {
        Self { compiled, registry }
    }

    /// The compiler output.
    pub fn compiled(&self) -> &CompiledUnit {
        &self.compiled
    }

    /// Inputs the main body reads; the host must supply these.
    pub fn used_inputs(&self) -> &[String] {
        self.compiled.used_inputs()
    }

    /// Create an instance with empty cache slots.
    pub fn instantiate(&self) -> UnitInstance {
        UnitInstance {
            slots: SlotCells::new(self.compiled.slot_count()),
            unit: self.clone(),
        }
    }
}

/// A runnable instance of a [`Unit`].
#[derive(Debug)]
pub struct UnitInstance {
    unit: Unit,
    slots: SlotCells,
}

impl UnitInstance {
    /// Run the main body.
    ///
    /// Every input the body reads must be supplied; inputs it never reads
    /// may be omitted. Extra names are ignored.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn execute(&mut self, inputs: &[(&str, Dynamic)]) -> Result<Dynamic, RuntimeError> {
        let compiled = &*self.unit.compiled;
        let main = &compiled.main;

        let mut locals = Vec::with_capacity(compiled.inputs.len());
        for (position, input) in compiled.inputs.iter().enumerate() {
            let supplied = inputs
                .iter()
                .find(|(name, _)| *name == input.name)
                .map(|(_, value)| value.clone());
            let value = match supplied {
                Some(value) => {
                    let actual = value.type_name();
                    accept_host_value(input.ty, value).ok_or_else(|| {
                        RuntimeError::ArgumentType {
                            function: main.name.clone(),
                            position,
                            expected: input.ty.to_string(),
                            actual,
                        }
                    })?
                }
                None if compiled.used_inputs().contains(&input.name) => {
                    return Err(RuntimeError::MissingInput {
                        name: input.name.clone(),
                    });
                }
                None => Dynamic::Null,
            };
            locals.push(value);
        }

        Vm::new(compiled, &self.unit.registry, &mut self.slots).run(main, locals)
    }

    /// Call a local function of the script directly.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call(&mut self, name: &str, args: &[Dynamic]) -> Result<Dynamic, RuntimeError> {
        let compiled = &*self.unit.compiled;
        let function = compiled
            .function(name, args.len())
            .ok_or_else(|| RuntimeError::UnknownEntry {
                name: name.to_string(),
                arity: args.len(),
            })?;

        let args = function
            .params
            .iter()
            .zip(args)
            .enumerate()
            .map(|(position, (&ty, value))| {
                accept_host_value(ty, value.clone()).ok_or_else(|| RuntimeError::ArgumentType {
                    function: function.name.clone(),
                    position,
                    expected: ty.to_string(),
                    actual: value.type_name(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Vm::new(compiled, &self.unit.registry, &mut self.slots).run(function, args)
    }

    /// The unit this instance runs.
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Number of cache slots whose binding object has been constructed.
    pub fn constructed_objects(&self) -> usize {
        self.slots.filled()
    }

    /// The instance's cache cells.
    pub fn slots(&self) -> &SlotCells {
        &self.slots
    }
}
