//! Unqualified calls: `name(args...)`.
//!
//! A call resolves to either a script-local function or a host binding (see
//! [`resolve_call`]). Arguments are analyzed left to right and coerced to
//! their parameter types in place.
//!
//! # Binding calls
//!
//! A binding owns an object that is built once and reused. The leading
//! arguments feed the constructor, the rest feed the method. The emitted
//! sequence is
//!
//! ```text
//!     GET_SLOT s
//!     JUMP_IF_NOT_NULL L
//!     <constructor args>
//!     NEW_BINDING b, n_ctor
//!     SET_SLOT s
//! L:  GET_SLOT s
//!     <method args>
//!     CALL_BINDING b, n_method
//! ```
//!
//! so constructor arguments are evaluated only on the run that fills the
//! slot, while method arguments are evaluated on every run. Which slot a
//! call site uses depends on [`BindingCacheScope`].
//!
//! # Local calls
//!
//! All arguments in order, then `CALL f, n`. Nothing is cached.

use log::trace;

use ember_core::{CompilationError, DataType, Span};
use ember_registry::BindingDef;

use crate::cache::SlotHandle;
use crate::emit::{CodeSink, EmitContext};
use crate::expr_state::{ExprFlags, ExprState};
use crate::function_table::FunctionDef;
use crate::options::BindingCacheScope;
use crate::resolve::{ResolvedTarget, resolve_call};
use crate::scope::Scope;

use super::{Expr, Result, coerce_in_place};

/// Lifecycle of a call node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallPhase {
    #[default]
    Unanalyzed,
    Analyzed,
    Emitted,
}

/// A call expression.
#[derive(Debug)]
pub struct CallExpr {
    pub span: Span,
    pub name: String,
    pub args: Vec<Expr>,
    target: Option<ResolvedTarget>,
    state: ExprState,
    phase: CallPhase,
}

impl CallExpr {
    pub fn new(name: impl Into<String>, args: Vec<Expr>, span: Span) -> Self {
        Self {
            span,
            name: name.into(),
            args,
            target: None,
            state: ExprState::default(),
            phase: CallPhase::Unanalyzed,
        }
    }

    /// What the call resolved to, once analyzed.
    pub fn target(&self) -> Option<&ResolvedTarget> {
        self.target.as_ref()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    pub(super) fn state(&self) -> &ExprState {
        &self.state
    }

    pub(super) fn state_mut(&mut self) -> &mut ExprState {
        &mut self.state
    }

    /// Resolve the target and coerce every argument to its parameter type.
    pub fn analyze(&mut self, scope: &mut Scope<'_>) -> Result<()> {
        if self.phase != CallPhase::Unanalyzed {
            return Err(CompilationError::internal(format!(
                "call [{}] analyzed twice",
                self.name
            )));
        }

        let target = resolve_call(&self.name, self.args.len(), scope, self.span)?;
        coerce_arguments(&self.name, &target.param_types(), &mut self.args, scope)?;

        self.state.actual = target.return_type();
        self.state.flags.insert(ExprFlags::STATEMENT);
        self.target = Some(target);
        self.phase = CallPhase::Analyzed;
        Ok(())
    }

    /// Emit the call through the strategy matching its target.
    pub fn emit<S: CodeSink>(&mut self, cx: &mut EmitContext<'_, S>) -> Result<()> {
        match self.phase {
            CallPhase::Analyzed => {}
            CallPhase::Unanalyzed => {
                return Err(CompilationError::internal(format!(
                    "call [{}] emitted before analysis",
                    self.name
                )));
            }
            CallPhase::Emitted => {
                return Err(CompilationError::internal(format!(
                    "call [{}] emitted twice",
                    self.name
                )));
            }
        }

        match self.target.clone() {
            Some(ResolvedTarget::Local(function)) => self.emit_local_call(&function, cx)?,
            Some(ResolvedTarget::Binding(binding)) => self.emit_binding_call(&binding, cx)?,
            None => {
                return Err(CompilationError::internal(format!(
                    "call [{}] has no target",
                    self.name
                )));
            }
        }

        self.phase = CallPhase::Emitted;
        Ok(())
    }

    /// Construct-once, invoke-every-time emission for a binding.
    fn emit_binding_call<S: CodeSink>(
        &mut self,
        binding: &BindingDef,
        cx: &mut EmitContext<'_, S>,
    ) -> Result<()> {
        self.check_arity(binding.arity())?;
        let slot = self.cache_slot(binding, cx)?;
        let ctor_count = binding.constructor_params.len();
        let method_count = self.args.len() - ctor_count;
        let ctor_operand = arg_operand(ctor_count, self.span)?;
        let method_operand = arg_operand(method_count, self.span)?;

        trace!(
            "{}: binding call {} via slot {:?} ({} ctor, {} method args)",
            self.span, binding.name, slot, ctor_count, method_count
        );

        let (ctor_args, method_args) = self.args.split_at_mut(ctor_count);

        cx.sink.set_span(self.span);
        cx.sink.emit_get_slot(slot);
        let filled = cx.sink.emit_jump_if_not_null();
        for arg in ctor_args {
            arg.emit(cx)?;
        }
        cx.sink.set_span(self.span);
        cx.sink.emit_new_binding(binding.hash, ctor_operand);
        cx.sink.emit_set_slot(slot);
        cx.sink.mark(filled);

        cx.sink.emit_get_slot(slot);
        for arg in method_args {
            arg.emit(cx)?;
        }
        cx.sink.set_span(self.span);
        cx.sink.emit_call_binding(binding.hash, method_operand);
        Ok(())
    }

    /// Plain call emission for a script-local function.
    fn emit_local_call<S: CodeSink>(
        &mut self,
        function: &FunctionDef,
        cx: &mut EmitContext<'_, S>,
    ) -> Result<()> {
        self.check_arity(function.arity())?;
        let operand = arg_operand(self.args.len(), self.span)?;

        trace!("{}: local call {} ({})", self.span, function.name, function.hash);

        for arg in &mut self.args {
            arg.emit(cx)?;
        }
        cx.sink.set_span(self.span);
        cx.sink.emit_call(function.hash, operand);
        Ok(())
    }

    fn cache_slot<S: CodeSink>(
        &self,
        binding: &BindingDef,
        cx: &mut EmitContext<'_, S>,
    ) -> Result<SlotHandle> {
        let slot = match cx.options.binding_cache {
            BindingCacheScope::PerType => cx
                .slots
                .get_or_allocate(binding.object_type, &binding.object_name),
            BindingCacheScope::PerCallSite => cx
                .slots
                .allocate_unique(binding.object_type, &binding.object_name),
        };
        slot.ok_or(CompilationError::LimitExceeded {
            what: "binding cache slots",
            limit: u16::MAX as usize + 1,
            span: self.span,
        })
    }

    fn check_arity(&self, expected: usize) -> Result<()> {
        if self.args.len() == expected {
            Ok(())
        } else {
            Err(CompilationError::MalformedCall {
                name: self.name.clone(),
                expected,
                found: self.args.len(),
            })
        }
    }
}

/// Analyze each argument against its parameter type, left to right, and
/// replace it with its coercion to that type.
///
/// A conversion failure is reported at the argument's own span, with the
/// argument's zero-based position.
pub fn coerce_arguments(
    name: &str,
    params: &[DataType],
    args: &mut [Expr],
    scope: &mut Scope<'_>,
) -> Result<()> {
    if params.len() != args.len() {
        return Err(CompilationError::MalformedCall {
            name: name.to_string(),
            expected: params.len(),
            found: args.len(),
        });
    }

    for (position, (arg, &expected)) in args.iter_mut().zip(params).enumerate() {
        arg.state_mut().mark_internal(Some(expected));
        arg.analyze(scope)?;
        coerce_in_place(arg, expected).map_err(|err| err.for_argument(name, position))?;
    }
    Ok(())
}

fn arg_operand(count: usize, span: Span) -> Result<u8> {
    u8::try_from(count).map_err(|_| CompilationError::LimitExceeded {
        what: "call arguments",
        limit: u8::MAX as usize,
        span,
    })
}
