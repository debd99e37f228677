//! Replace the opcode of an integer binary operation.
//!
//! Each opcode's replacement pool is every other opcode minus its
//! opposite-signedness sibling (UDiv/SDiv, URem/SRem, LShr/AShr): flipping
//! only the sign behavior yields a mutant too close to the original to be a
//! useful fault model. Remainder opcodes are de-prioritized by rerolling,
//! since they tend to produce trivial divide-by-zero crashes instead of
//! subtle logic faults. The edit rebuilds the instruction rather than
//! patching it: a fresh instruction is inserted at the same position, all
//! consumers are redirected, and the old one is removed, keeping the
//! function's instruction count (and therefore every ordinal) stable.

use super::{choose, target_mut, MutationCtx};
use mutest_core::{Error, Result};
use mutest_ir::{BinOpcode, Function, InstKind, Instruction, Operand};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Reroll attempts when the draw lands on a remainder opcode
const REMAINDER_REROLLS: usize = 3;
/// Probability of swapping the operands alongside the opcode change
const SWAP_PROBABILITY: f64 = 0.2;

#[derive(Debug, Serialize, Deserialize)]
struct Package {
    repl: String,
    swap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinOpIntReplace;

impl BinOpIntReplace {
    pub const NAME: &'static str = "binop-int-replace";

    pub fn can_mutate(&self, inst: &Instruction) -> bool {
        matches!(inst.kind, InstKind::BinOp { .. })
    }

    pub fn describe_original(&self, inst: &Instruction) -> String {
        match &inst.kind {
            InstKind::BinOp { op, .. } => op.name().to_string(),
            _ => String::new(),
        }
    }

    pub fn apply(
        &self,
        func: &mut Function,
        ordinal: usize,
        ctx: &mut MutationCtx<'_>,
    ) -> Result<Option<Value>> {
        let op = match target_mut(func, ordinal).kind {
            InstKind::BinOp { op, .. } => op,
            _ => return Ok(None),
        };

        let options = replacement_pool(op);
        let mut repl = choose(ctx.rng, &options);
        for _ in 1..REMAINDER_REROLLS {
            if !repl.is_remainder() {
                break;
            }
            repl = choose(ctx.rng, &options);
        }
        let swap = ctx.rng.gen_bool(SWAP_PROBABILITY);

        rebuild(func, ordinal, repl, swap);
        Ok(Some(json!(Package {
            repl: repl.name().to_string(),
            swap,
        })))
    }

    pub fn replay(&self, func: &mut Function, ordinal: usize, package: &Value) -> Result<()> {
        let package: Package = serde_json::from_value(package.clone())
            .map_err(|e| Error::MalformedPackage(e.to_string()))?;
        let repl = BinOpcode::from_name(&package.repl)
            .ok_or_else(|| Error::MalformedPackage(format!("unknown opcode {}", package.repl)))?;
        rebuild(func, ordinal, repl, package.swap);
        Ok(())
    }
}

/// All other opcodes, minus the opposite-signedness sibling
fn replacement_pool(op: BinOpcode) -> Vec<BinOpcode> {
    let sibling = op.signedness_sibling();
    BinOpcode::ALL
        .iter()
        .copied()
        .filter(|candidate| *candidate != op && Some(*candidate) != sibling)
        .collect()
}

/// Insert the replacement before the old instruction, redirect all uses of
/// the old result, then remove the old instruction
fn rebuild(func: &mut Function, ordinal: usize, repl: BinOpcode, swap: bool) {
    let old = target_mut(func, ordinal);
    let old_id = old.id;
    let (lhs, rhs) = match old.kind {
        InstKind::BinOp { lhs, rhs, .. } => (lhs, rhs),
        _ => return,
    };
    let (lhs, rhs): (Operand, Operand) = if swap { (rhs, lhs) } else { (lhs, rhs) };

    let new_id = func.fresh_id();
    func.insert_before(ordinal, Instruction::binop(new_id, repl, lhs, rhs));
    func.replace_all_uses(old_id, new_id);
    func.remove_at(ordinal + 1);
}
