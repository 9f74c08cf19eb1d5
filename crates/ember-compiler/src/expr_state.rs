//! Per-node analysis state.

use bitflags::bitflags;
use ember_core::DataType;

bitflags! {
    /// Context flags of an expression node.
    ///
    /// `INTERNAL` and the cleared `STATEMENT` are set by the parent before
    /// the node is analyzed; a node that may stand alone as a statement sets
    /// `STATEMENT` on itself during analysis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExprFlags: u8 {
        /// The value is consumed by an enclosing expression.
        const INTERNAL = 1 << 0;
        /// The expression is valid as a standalone statement.
        const STATEMENT = 1 << 1;
    }
}

/// Types and flags of one expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExprState {
    /// Type the parent wants, if it asked for one.
    pub expected: Option<DataType>,
    /// Type the node produces; `void` until analyzed.
    pub actual: DataType,
    /// Context flags.
    pub flags: ExprFlags,
}

impl ExprState {
    /// Prepare a node for use as an operand or argument.
    pub fn mark_internal(&mut self, expected: Option<DataType>) {
        self.expected = expected;
        self.flags.insert(ExprFlags::INTERNAL);
        self.flags.remove(ExprFlags::STATEMENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_internal_clears_statement() {
        let mut state = ExprState {
            flags: ExprFlags::STATEMENT,
            ..ExprState::default()
        };
        state.mark_internal(Some(DataType::int()));

        assert_eq!(state.flags, ExprFlags::INTERNAL);
        assert_eq!(state.expected, Some(DataType::int()));
    }
}
