//! Swap the two successors of a conditional branch.

use super::{target_mut, MutationCtx};
use mutest_core::Result;
use mutest_ir::{Function, InstKind, Instruction};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchSwap;

impl BranchSwap {
    pub const NAME: &'static str = "branch-swap";

    pub fn can_mutate(&self, inst: &Instruction) -> bool {
        matches!(inst.kind, InstKind::CondBr { .. })
    }

    pub fn describe_original(&self, inst: &Instruction) -> String {
        match &inst.kind {
            InstKind::CondBr {
                on_true, on_false, ..
            } => format!("b{}/b{}", on_true, on_false),
            _ => String::new(),
        }
    }

    pub fn apply(
        &self,
        func: &mut Function,
        ordinal: usize,
        _ctx: &mut MutationCtx<'_>,
    ) -> Result<Option<Value>> {
        swap_successors(target_mut(func, ordinal));
        Ok(Some(json!({})))
    }

    pub fn replay(&self, func: &mut Function, ordinal: usize, _package: &Value) -> Result<()> {
        swap_successors(target_mut(func, ordinal));
        Ok(())
    }
}

fn swap_successors(inst: &mut Instruction) {
    if let InstKind::CondBr {
        on_true, on_false, ..
    } = &mut inst.kind
    {
        std::mem::swap(on_true, on_false);
    }
}
