//! The mutation rule catalog.
//!
//! The catalog is a closed, fixed set: one variant per concrete rule,
//! dispatched through a single capability surface. Discovery, application
//! and replay all go through [`Rule`]; the concrete edits live in the
//! per-rule modules.

mod binop_replace;
mod branch_swap;
mod cmp_replace;
mod cmp_swap;
mod const_replace;
mod select_swap;

pub use binop_replace::BinOpIntReplace;
pub use branch_swap::BranchSwap;
pub use cmp_replace::CmpIntReplace;
pub use cmp_swap::CmpSwap;
pub use const_replace::ConstReplace;
pub use select_swap::SelectSwap;

use crate::history::HistoryStore;
use mutest_core::Result;
use mutest_ir::{Function, Instruction, Operand};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

/// Context a rule needs beyond the function it edits: the randomness
/// source, the optional non-repetition history, the retry budget, and the
/// identity of the point being mutated (for history keys and errors).
pub struct MutationCtx<'a> {
    pub rng: &'a mut ChaCha8Rng,
    pub history: Option<&'a mut HistoryStore>,
    pub max_draw_attempts: usize,
    pub function: &'a str,
    pub ordinal: usize,
}

/// One concrete mutation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    BranchSwap(BranchSwap),
    SelectSwap(SelectSwap),
    CmpSwap(CmpSwap),
    CmpIntReplace(CmpIntReplace),
    BinOpIntReplace(BinOpIntReplace),
    ConstReplace(ConstReplace),
}

impl Rule {
    /// The full catalog, in its fixed order
    pub fn all() -> Vec<Rule> {
        vec![
            Rule::BranchSwap(BranchSwap),
            Rule::SelectSwap(SelectSwap),
            Rule::CmpSwap(CmpSwap),
            Rule::CmpIntReplace(CmpIntReplace),
            Rule::BinOpIntReplace(BinOpIntReplace),
            Rule::ConstReplace(ConstReplace),
        ]
    }

    /// Stable identifier used in points, packages, and trace lookup
    pub fn name(&self) -> &'static str {
        match self {
            Rule::BranchSwap(_) => BranchSwap::NAME,
            Rule::SelectSwap(_) => SelectSwap::NAME,
            Rule::CmpSwap(_) => CmpSwap::NAME,
            Rule::CmpIntReplace(_) => CmpIntReplace::NAME,
            Rule::BinOpIntReplace(_) => BinOpIntReplace::NAME,
            Rule::ConstReplace(_) => ConstReplace::NAME,
        }
    }

    /// Whether mutants from this rule participate in the second-mutation
    /// accounting track. Reported in point records, never consulted here.
    pub fn supports_second_mutation(&self) -> bool {
        match self {
            Rule::BranchSwap(_) | Rule::SelectSwap(_) | Rule::CmpSwap(_) => false,
            Rule::CmpIntReplace(_) | Rule::BinOpIntReplace(_) | Rule::ConstReplace(_) => true,
        }
    }

    /// Pure predicate: can this rule produce a mutant at this instruction?
    pub fn can_mutate(&self, inst: &Instruction) -> bool {
        match self {
            Rule::BranchSwap(r) => r.can_mutate(inst),
            Rule::SelectSwap(r) => r.can_mutate(inst),
            Rule::CmpSwap(r) => r.can_mutate(inst),
            Rule::CmpIntReplace(r) => r.can_mutate(inst),
            Rule::BinOpIntReplace(r) => r.can_mutate(inst),
            Rule::ConstReplace(r) => r.can_mutate(inst),
        }
    }

    /// Render the pre-mutation value(s) this rule would touch; empty when
    /// `can_mutate` is false
    pub fn describe_original(&self, inst: &Instruction) -> String {
        match self {
            Rule::BranchSwap(r) => r.describe_original(inst),
            Rule::SelectSwap(r) => r.describe_original(inst),
            Rule::CmpSwap(r) => r.describe_original(inst),
            Rule::CmpIntReplace(r) => r.describe_original(inst),
            Rule::BinOpIntReplace(r) => r.describe_original(inst),
            Rule::ConstReplace(r) => r.describe_original(inst),
        }
    }

    /// Perform the edit in place; `Ok(None)` means no valid distinct
    /// replacement existed and nothing changed
    pub fn apply(
        &self,
        func: &mut Function,
        ordinal: usize,
        ctx: &mut MutationCtx<'_>,
    ) -> Result<Option<Value>> {
        match self {
            Rule::BranchSwap(r) => r.apply(func, ordinal, ctx),
            Rule::SelectSwap(r) => r.apply(func, ordinal, ctx),
            Rule::CmpSwap(r) => r.apply(func, ordinal, ctx),
            Rule::CmpIntReplace(r) => r.apply(func, ordinal, ctx),
            Rule::BinOpIntReplace(r) => r.apply(func, ordinal, ctx),
            Rule::ConstReplace(r) => r.apply(func, ordinal, ctx),
        }
    }

    /// Re-apply a recorded package exactly: no randomness, no history
    pub fn replay(&self, func: &mut Function, ordinal: usize, package: &Value) -> Result<()> {
        match self {
            Rule::BranchSwap(r) => r.replay(func, ordinal, package),
            Rule::SelectSwap(r) => r.replay(func, ordinal, package),
            Rule::CmpSwap(r) => r.replay(func, ordinal, package),
            Rule::CmpIntReplace(r) => r.replay(func, ordinal, package),
            Rule::BinOpIntReplace(r) => r.replay(func, ordinal, package),
            Rule::ConstReplace(r) => r.replay(func, ordinal, package),
        }
    }
}

/// Uniform draw from a non-empty slice
pub(crate) fn choose<T: Copy>(rng: &mut ChaCha8Rng, options: &[T]) -> T {
    options[rng.gen_range(0..options.len())]
}

/// Fetch the instruction a rule was pointed at. The engine resolves every
/// ordinal before dispatching, so a miss here is a caller contract bug.
pub(crate) fn target_mut(func: &mut Function, ordinal: usize) -> &mut Instruction {
    let name = func.name.clone();
    func.instruction_at_mut(ordinal)
        .unwrap_or_else(|| panic!("unresolved mutation point {}::{}", name, ordinal))
}

pub(crate) fn render_operand(operand: &Operand) -> String {
    match operand {
        Operand::Const(c) => c.as_signed().to_string(),
        Operand::Inst(id) => id.to_string(),
        Operand::Arg(n) => format!("arg{}", n),
    }
}
