//! Replace a constant-integer operand with a derived value.
//!
//! Operand eligibility depends on the instruction kind so the edit cannot
//! produce a structurally invalid mutant: call arguments are fair game
//! except for the memory-bulk intrinsics whose constants encode size and
//! alignment invariants, stores only expose the stored value (never the
//! address), and allocations expose nothing. The replacement value comes
//! from a fixed vocabulary of named actions; candidates equal to the
//! original value are rejected, and with a history store attached so are
//! values already produced at the same point and operand.

use super::{choose, target_mut, MutationCtx};
use crate::history::HistoryStore;
use mutest_core::{Error, Result};
use mutest_ir::{ConstInt, Function, InstKind, Instruction, Operand};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const ACTIONS: [&str; 17] = [
    // constants
    "set-0",
    "set-1",
    "set-2",
    "set-minus-1",
    "set-minus-2",
    "set-max-signed",
    "set-max-unsigned",
    "set-min",
    // arithmetics
    "add-1",
    "add-2",
    "sub-1",
    "sub-2",
    "mul-2",
    "mul-3",
    "div-2",
    "div-3",
    // bit ops
    "flip",
];

#[derive(Debug, Serialize, Deserialize)]
struct Package {
    operand: usize,
    action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstReplace;

impl ConstReplace {
    pub const NAME: &'static str = "const-replace";

    pub fn can_mutate(&self, inst: &Instruction) -> bool {
        !eligible_operands(inst).is_empty()
    }

    pub fn describe_original(&self, inst: &Instruction) -> String {
        eligible_operands(inst)
            .into_iter()
            .filter_map(|index| inst.operand(index).as_const())
            .map(|c| c.as_signed().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn apply(
        &self,
        func: &mut Function,
        ordinal: usize,
        ctx: &mut MutationCtx<'_>,
    ) -> Result<Option<Value>> {
        let inst = target_mut(func, ordinal);
        let eligible = eligible_operands(inst);
        if eligible.is_empty() {
            return Ok(None);
        }

        let operand_index = choose(ctx.rng, &eligible);
        let original = match inst.operand(operand_index).as_const() {
            Some(c) => c,
            None => return Ok(None),
        };

        let key = HistoryStore::key(ctx.function, ctx.ordinal, Some(operand_index));
        if let Some(history) = ctx.history.as_deref_mut() {
            history.seed(&key, json!(original.value()));
        }

        let (action, result) = if original.bits() == 1 {
            // every other action degenerates at width 1
            ("flip", original.flipped())
        } else {
            let mut accepted = None;
            for _ in 0..ctx.max_draw_attempts {
                let action = choose(ctx.rng, &ACTIONS);
                let result = match run_action(original, action) {
                    Some(result) => result,
                    None => continue,
                };
                if result == original {
                    continue;
                }
                // flip has a single possible outcome, so it skips the
                // history filter
                if action != "flip" {
                    if let Some(history) = ctx.history.as_deref_mut() {
                        if history.contains(&key, &json!(result.value())) {
                            continue;
                        }
                    }
                }
                accepted = Some((action, result));
                break;
            }
            accepted.ok_or_else(|| Error::PointsExhausted {
                function: ctx.function.to_string(),
                ordinal: ctx.ordinal,
                attempts: ctx.max_draw_attempts,
            })?
        };

        if let Some(history) = ctx.history.as_deref_mut() {
            if !history.contains(&key, &json!(result.value())) {
                history.append(&key, json!(result.value()));
            }
        }

        inst.set_operand(operand_index, Operand::Const(result));
        Ok(Some(json!(Package {
            operand: operand_index,
            action: action.to_string(),
        })))
    }

    pub fn replay(&self, func: &mut Function, ordinal: usize, package: &Value) -> Result<()> {
        let package: Package = serde_json::from_value(package.clone())
            .map_err(|e| Error::MalformedPackage(e.to_string()))?;

        let inst = target_mut(func, ordinal);
        let original = inst
            .operands()
            .get(package.operand)
            .and_then(|op| op.as_const())
            .ok_or_else(|| {
                Error::MalformedPackage(format!(
                    "operand {} is not a constant int",
                    package.operand
                ))
            })?;
        let result = run_action(original, &package.action)
            .ok_or_else(|| Error::MalformedPackage(format!("unknown action {}", package.action)))?;

        inst.set_operand(package.operand, Operand::Const(result));
        Ok(())
    }
}

/// Indexes of the constant-integer operands this rule may touch
fn eligible_operands(inst: &Instruction) -> Vec<usize> {
    let const_positions = |operands: Vec<&Operand>| -> Vec<usize> {
        operands
            .iter()
            .enumerate()
            .filter(|(_, op)| op.is_const())
            .map(|(index, _)| index)
            .collect()
    };

    match &inst.kind {
        InstKind::Call { callee, .. } => {
            if is_memory_intrinsic(callee) {
                vec![]
            } else {
                const_positions(inst.operands())
            }
        }
        // only the stored value; the address encodes a location, not a
        // quantity
        InstKind::Store { value, .. } => {
            if value.is_const() {
                vec![0]
            } else {
                vec![]
            }
        }
        InstKind::Alloca { .. } => vec![],
        InstKind::ICmp { .. }
        | InstKind::BinOp { .. }
        | InstKind::UnOp { .. }
        | InstKind::Phi { .. }
        | InstKind::Ret { .. }
        | InstKind::Select { .. } => const_positions(inst.operands()),
        InstKind::CondBr { .. } | InstKind::Br { .. } => vec![],
    }
}

/// Calls whose constant operands encode size/alignment invariants a naive
/// edit would violate
fn is_memory_intrinsic(callee: &str) -> bool {
    callee.starts_with("llvm.memset")
        || callee.starts_with("llvm.memcpy")
        || callee.starts_with("llvm.memmove")
}

fn run_action(val: ConstInt, action: &str) -> Option<ConstInt> {
    let bits = val.bits();
    let result = match action {
        "set-0" => ConstInt::new(bits, 0),
        "set-1" => ConstInt::new(bits, 1),
        "set-2" => ConstInt::new(bits, 2),
        "set-minus-1" => ConstInt::from_i64(bits, -1),
        "set-minus-2" => ConstInt::from_i64(bits, -2),
        "set-max-signed" => ConstInt::max_signed(bits),
        "set-max-unsigned" => ConstInt::max_unsigned(bits),
        "set-min" => ConstInt::min_signed(bits),
        "add-1" => val.wrapping_add(1),
        "add-2" => val.wrapping_add(2),
        "sub-1" => val.wrapping_sub(1),
        "sub-2" => val.wrapping_sub(2),
        "mul-2" => val.wrapping_mul(2),
        "mul-3" => val.wrapping_mul(3),
        "div-2" => val.signed_div(2),
        "div-3" => val.signed_div(3),
        "flip" => val.flipped(),
        _ => return None,
    };
    Some(result)
}
