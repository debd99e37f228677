//! Swap the true-value and false-value of a select.

use super::{render_operand, target_mut, MutationCtx};
use mutest_core::Result;
use mutest_ir::{Function, InstKind, Instruction};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectSwap;

impl SelectSwap {
    pub const NAME: &'static str = "select-swap";

    pub fn can_mutate(&self, inst: &Instruction) -> bool {
        matches!(inst.kind, InstKind::Select { .. })
    }

    pub fn describe_original(&self, inst: &Instruction) -> String {
        match &inst.kind {
            InstKind::Select {
                on_true, on_false, ..
            } => format!("{}/{}", render_operand(on_true), render_operand(on_false)),
            _ => String::new(),
        }
    }

    pub fn apply(
        &self,
        func: &mut Function,
        ordinal: usize,
        _ctx: &mut MutationCtx<'_>,
    ) -> Result<Option<Value>> {
        swap_values(target_mut(func, ordinal));
        Ok(Some(json!({})))
    }

    pub fn replay(&self, func: &mut Function, ordinal: usize, _package: &Value) -> Result<()> {
        swap_values(target_mut(func, ordinal));
        Ok(())
    }
}

fn swap_values(inst: &mut Instruction) {
    if let InstKind::Select {
        on_true, on_false, ..
    } = &mut inst.kind
    {
        std::mem::swap(on_true, on_false);
    }
}
