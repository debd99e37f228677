//! Swap the operands of a non-commutative comparison.

use super::{render_operand, target_mut, MutationCtx};
use mutest_core::Result;
use mutest_ir::{Function, InstKind, Instruction};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmpSwap;

impl CmpSwap {
    pub const NAME: &'static str = "cmp-swap";

    /// Swapping EQ/NE operands is a no-op, so only non-commutative
    /// predicates are points
    pub fn can_mutate(&self, inst: &Instruction) -> bool {
        match &inst.kind {
            InstKind::ICmp { pred, .. } => !pred.is_commutative(),
            _ => false,
        }
    }

    pub fn describe_original(&self, inst: &Instruction) -> String {
        if !self.can_mutate(inst) {
            return String::new();
        }
        match &inst.kind {
            InstKind::ICmp { lhs, rhs, .. } => {
                format!("{}/{}", render_operand(lhs), render_operand(rhs))
            }
            _ => String::new(),
        }
    }

    pub fn apply(
        &self,
        func: &mut Function,
        ordinal: usize,
        _ctx: &mut MutationCtx<'_>,
    ) -> Result<Option<Value>> {
        swap_operands(target_mut(func, ordinal));
        Ok(Some(json!({})))
    }

    pub fn replay(&self, func: &mut Function, ordinal: usize, _package: &Value) -> Result<()> {
        swap_operands(target_mut(func, ordinal));
        Ok(())
    }
}

fn swap_operands(inst: &mut Instruction) {
    if let InstKind::ICmp { lhs, rhs, .. } = &mut inst.kind {
        std::mem::swap(lhs, rhs);
    }
}
