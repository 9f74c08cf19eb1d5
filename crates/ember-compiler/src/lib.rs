//! Ember Compiler
//!
//! A two-pass compiler turning a [`Script`] into a [`CompiledUnit`].
//!
//! ## Architecture
//!
//! - **Pass 1 (Registration)**: every local function signature goes into the
//!   [`FunctionTable`], so bodies may call functions declared later and
//!   functions may recurse.
//! - **Pass 2 (Compilation)**: each body is analyzed (names resolved, types
//!   checked, coercions inserted) and then emitted as bytecode.
//!
//! ## Modules
//!
//! - [`bytecode`]: instruction set, chunks, constant pool
//! - [`cache`]: binding cache-slot allocation
//! - [`conversion`]: implicit conversions
//! - [`emit`]: the [`CodeSink`](emit::CodeSink) trait and its bytecode writer
//! - [`expr`]: expression nodes, including [`CallExpr`](expr::CallExpr)
//! - [`resolve`]: call resolution
//! - [`scope`]: names visible while a body is analyzed
//! - [`stmt`]: statement nodes
//! - [`script`]: compiler input

pub mod bytecode;
pub mod cache;
pub mod conversion;
pub mod emit;
pub mod expr;
mod expr_state;
mod function_table;
mod options;
pub mod resolve;
pub mod scope;
pub mod script;
pub mod stmt;
mod unit;

pub use cache::{CacheSlots, SlotHandle, SlotInfo};
pub use expr_state::{ExprFlags, ExprState};
pub use function_table::{FunctionDef, FunctionTable, MAX_FUNCTION_PARAMS};
pub use options::{BindingCacheScope, CompilerOptions};
pub use resolve::{ResolvedTarget, resolve_call};
pub use scope::{LocalScope, LocalVar, Scope};
pub use script::{FunctionDecl, Input, Param, Script};
pub use unit::{CompiledFunction, CompiledUnit};

// Re-export CompilationError from core for convenience
pub use ember_core::CompilationError;

use log::debug;

use ember_core::{DataType, Span, TypeHash};
use ember_registry::SymbolRegistry;

use crate::bytecode::ConstantPool;
use crate::emit::{BytecodeEmitter, CodeSink, EmitContext};
use crate::stmt::Stmt;

type Result<T> = std::result::Result<T, CompilationError>;

/// Name given to the main body.
pub const MAIN_NAME: &str = "<main>";

/// The main compiler entry point.
pub struct Compiler<'a> {
    registry: &'a SymbolRegistry,
    options: &'a CompilerOptions,
}

/// State shared by every body of one unit.
struct UnitState<'u> {
    functions: &'u FunctionTable,
    constants: ConstantPool,
    slots: CacheSlots,
}

/// One body to compile.
struct Body<'b> {
    name: &'b str,
    params: Vec<(&'b str, DataType)>,
    return_type: DataType,
    stmts: &'b mut [Stmt],
    span: Span,
}

impl<'a> Compiler<'a> {
    pub fn new(registry: &'a SymbolRegistry, options: &'a CompilerOptions) -> Self {
        Self { registry, options }
    }

    /// Compile a script. The first error aborts compilation.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&self, mut script: Script) -> Result<CompiledUnit> {
        let used_inputs = script.used_inputs();

        let mut functions = FunctionTable::new();
        for decl in &script.functions {
            functions.register(FunctionDef::new(
                decl.name.as_str(),
                decl.param_types(),
                decl.return_type,
                decl.span,
            ))?;
        }
        debug!("registered {} local functions", functions.len());

        let mut unit = UnitState {
            functions: &functions,
            constants: ConstantPool::new(),
            slots: CacheSlots::new(),
        };

        let mut compiled = Vec::with_capacity(script.functions.len());
        for decl in &mut script.functions {
            let body = Body {
                name: &decl.name,
                params: decl
                    .params
                    .iter()
                    .map(|p| (p.name.as_str(), p.ty))
                    .collect(),
                return_type: decl.return_type,
                stmts: &mut decl.body,
                span: decl.span,
            };
            compiled.push(self.compile_body(body, &mut unit)?);
        }

        let main_span = script.body.first().map(Stmt::span).unwrap_or_default();
        let main = self.compile_body(
            Body {
                name: MAIN_NAME,
                params: script
                    .inputs
                    .iter()
                    .map(|input| (input.name.as_str(), input.ty))
                    .collect(),
                return_type: DataType::any(),
                stmts: &mut script.body,
                span: main_span,
            },
            &mut unit,
        )?;

        let UnitState {
            constants, slots, ..
        } = unit;
        debug!(
            "compiled unit: {} functions, {} constants, {} cache slots",
            compiled.len(),
            constants.len(),
            slots.len()
        );

        Ok(CompiledUnit::new(
            compiled,
            main,
            constants,
            slots.into_slots(),
            script.inputs,
            used_inputs,
        ))
    }

    fn compile_body(&self, body: Body<'_>, unit: &mut UnitState<'_>) -> Result<CompiledFunction> {
        let mut scope = Scope::new(unit.functions, self.registry, body.name, body.return_type);
        for (name, ty) in &body.params {
            scope.declare_variable(name, *ty, body.span)?;
        }
        for stmt in body.stmts.iter_mut() {
            stmt.analyze(&mut scope)?;
        }

        let ends_with_return = body.stmts.last().is_some_and(Stmt::is_return);
        let is_main = body.name == MAIN_NAME;
        if !ends_with_return && !is_main && !body.return_type.is_void() {
            return Err(CompilationError::MissingReturn {
                function: body.name.to_string(),
                span: body.span,
            });
        }

        let mut emitter = BytecodeEmitter::new(&mut unit.constants, self.options.debug_info);
        let mut cx = EmitContext::new(&mut emitter, &mut unit.slots, self.options);
        for stmt in body.stmts.iter_mut() {
            stmt.emit(&mut cx)?;
        }
        if !ends_with_return {
            cx.sink.set_span(body.span);
            cx.sink.emit_return_void();
        }
        let chunk = emitter.finish()?;

        let params: Vec<DataType> = body.params.iter().map(|(_, ty)| *ty).collect();
        let hash = if is_main {
            TypeHash::from_function(MAIN_NAME, &[])
        } else {
            let param_hashes: Vec<TypeHash> = params.iter().map(|ty| ty.type_hash).collect();
            TypeHash::from_function(body.name, &param_hashes)
        };

        Ok(CompiledFunction {
            name: body.name.to_string(),
            hash,
            params: if is_main { Vec::new() } else { params },
            return_type: body.return_type,
            local_count: scope.local_count(),
            chunk,
        })
    }
}
