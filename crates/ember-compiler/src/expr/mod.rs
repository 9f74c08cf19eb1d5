//! Expression nodes.
//!
//! Every node follows the same two-phase contract:
//!
//! - `analyze` resolves names, computes the node's type, and rewrites
//!   children (inserting [`CoerceExpr`] where a child's type must change);
//! - `emit` writes the node's code through a [`CodeSink`].
//!
//! Nodes are built with the constructor helpers on [`Expr`]:
//!
//! ```
//! use ember_compiler::expr::{BinaryOp, Expr};
//! use ember_core::Span;
//!
//! let span = Span::point(1, 1);
//! let expr = Expr::call(
//!     "log",
//!     vec![Expr::binary(BinaryOp::Add, Expr::int(1, span), Expr::variable("x", span), span)],
//!     span,
//! );
//! assert_eq!(expr.span(), span);
//! ```

mod binary;
mod calls;
mod cast;
mod identifiers;
mod literals;

pub use binary::{BinaryExpr, BinaryOp};
pub use calls::{CallExpr, CallPhase, coerce_arguments};
pub use cast::CoerceExpr;
pub use identifiers::VariableExpr;
pub use literals::{LiteralExpr, LiteralValue};

use ember_core::{CompilationError, DataType, Span};
use rustc_hash::FxHashSet;

use crate::conversion::find_conversion;
use crate::emit::{CodeSink, EmitContext};
use crate::expr_state::{ExprFlags, ExprState};
use crate::scope::Scope;

type Result<T> = std::result::Result<T, CompilationError>;

/// An expression node.
#[derive(Debug)]
pub enum Expr {
    Literal(LiteralExpr),
    Variable(VariableExpr),
    Binary(Box<BinaryExpr>),
    Coerce(Box<CoerceExpr>),
    Call(CallExpr),
}

impl Expr {
    // ==========================================================================
    // Constructors
    // ==========================================================================

    /// `int` literal.
    pub fn int(value: i32, span: Span) -> Self {
        Expr::Literal(LiteralExpr::new(LiteralValue::Int(value), span))
    }

    /// `long` literal.
    pub fn long(value: i64, span: Span) -> Self {
        Expr::Literal(LiteralExpr::new(LiteralValue::Long(value), span))
    }

    /// `double` literal.
    pub fn double(value: f64, span: Span) -> Self {
        Expr::Literal(LiteralExpr::new(LiteralValue::Double(value), span))
    }

    /// `bool` literal.
    pub fn bool(value: bool, span: Span) -> Self {
        Expr::Literal(LiteralExpr::new(LiteralValue::Bool(value), span))
    }

    /// String literal.
    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Expr::Literal(LiteralExpr::new(LiteralValue::String(value.into()), span))
    }

    /// `null` literal.
    pub fn null(span: Span) -> Self {
        Expr::Literal(LiteralExpr::new(LiteralValue::Null, span))
    }

    /// Variable read.
    pub fn variable(name: impl Into<String>, span: Span) -> Self {
        Expr::Variable(VariableExpr::new(name, span))
    }

    /// Arithmetic.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, span: Span) -> Self {
        Expr::Binary(Box::new(BinaryExpr::new(op, lhs, rhs, span)))
    }

    /// Unqualified call.
    pub fn call(name: impl Into<String>, args: Vec<Expr>, span: Span) -> Self {
        Expr::Call(CallExpr::new(name, args, span))
    }

    // ==========================================================================
    // Accessors
    // ==========================================================================

    /// Source location.
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(e) => e.span,
            Expr::Variable(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Coerce(e) => e.span,
            Expr::Call(e) => e.span,
        }
    }

    /// Analysis state.
    pub fn state(&self) -> &ExprState {
        match self {
            Expr::Literal(e) => &e.state,
            Expr::Variable(e) => &e.state,
            Expr::Binary(e) => &e.state,
            Expr::Coerce(e) => &e.state,
            Expr::Call(e) => e.state(),
        }
    }

    /// Mutable analysis state, for parents preparing a child.
    pub fn state_mut(&mut self) -> &mut ExprState {
        match self {
            Expr::Literal(e) => &mut e.state,
            Expr::Variable(e) => &mut e.state,
            Expr::Binary(e) => &mut e.state,
            Expr::Coerce(e) => &mut e.state,
            Expr::Call(e) => e.state_mut(),
        }
    }

    /// Type this node produces.
    pub fn actual(&self) -> DataType {
        self.state().actual
    }

    /// Whether this node may stand alone as a statement.
    pub fn is_statement(&self) -> bool {
        self.state().flags.contains(ExprFlags::STATEMENT)
    }

    // ==========================================================================
    // Node contract
    // ==========================================================================

    /// Analyze this node and its children.
    pub fn analyze(&mut self, scope: &mut Scope<'_>) -> Result<()> {
        match self {
            Expr::Literal(e) => e.analyze(),
            Expr::Variable(e) => e.analyze(scope),
            Expr::Binary(e) => e.analyze(scope),
            Expr::Coerce(_) => Ok(()),
            Expr::Call(e) => e.analyze(scope),
        }
    }

    /// Emit this node's code.
    pub fn emit<S: CodeSink>(&mut self, cx: &mut EmitContext<'_, S>) -> Result<()> {
        cx.sink.set_span(self.span());
        match self {
            Expr::Literal(e) => {
                e.emit(&mut *cx.sink);
                Ok(())
            }
            Expr::Variable(e) => e.emit(&mut *cx.sink),
            Expr::Binary(e) => e.emit(cx),
            Expr::Coerce(e) => e.emit(cx),
            Expr::Call(e) => e.emit(cx),
        }
    }

    /// Wrap an analyzed node so it produces `target`.
    ///
    /// Returns the node unchanged when it already has that type.
    pub fn coerce_to(self, target: DataType) -> Result<Expr> {
        let actual = self.actual();
        if actual == target {
            return Ok(self);
        }
        match find_conversion(actual, target) {
            Some(conversion) => Ok(Expr::Coerce(Box::new(CoerceExpr::new(
                self, conversion, target,
            )))),
            None => Err(CompilationError::TypeMismatch {
                expected: target,
                actual,
                span: self.span(),
            }),
        }
    }

    /// Add every variable name this node reads to `out`.
    pub fn collect_free_variables(&self, out: &mut FxHashSet<String>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Variable(e) => {
                out.insert(e.name.clone());
            }
            Expr::Binary(e) => {
                e.lhs.collect_free_variables(out);
                e.rhs.collect_free_variables(out);
            }
            Expr::Coerce(e) => e.inner.collect_free_variables(out),
            Expr::Call(e) => {
                for arg in &e.args {
                    arg.collect_free_variables(out);
                }
            }
        }
    }
}

/// Replace an analyzed node in place with its coercion to `target`.
pub(crate) fn coerce_in_place(slot: &mut Expr, target: DataType) -> Result<()> {
    let span = slot.span();
    let node = std::mem::replace(slot, Expr::null(span));
    *slot = node.coerce_to(target)?;
    Ok(())
}
