//! Replace the predicate of an integer comparison.
//!
//! Candidates come from two fixed pools, one per signedness; a predicate's
//! pool is every predicate of its pool except itself. EQ and NE belong to
//! both pools, so their pool is chosen by fair coin. With a history store
//! attached, predicates already produced at the point are rejected, so
//! repeated mutation of the same point walks through distinct predicates.

use super::{choose, target_mut, MutationCtx};
use crate::history::HistoryStore;
use mutest_core::{Error, Result};
use mutest_ir::{Function, InstKind, Instruction, Predicate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const POOL_SIGNED: [Predicate; 6] = [
    Predicate::Eq,
    Predicate::Ne,
    Predicate::Sgt,
    Predicate::Sge,
    Predicate::Slt,
    Predicate::Sle,
];

const POOL_UNSIGNED: [Predicate; 6] = [
    Predicate::Eq,
    Predicate::Ne,
    Predicate::Ugt,
    Predicate::Uge,
    Predicate::Ult,
    Predicate::Ule,
];

#[derive(Debug, Serialize, Deserialize)]
struct Package {
    repl: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmpIntReplace;

impl CmpIntReplace {
    pub const NAME: &'static str = "cmp-int-replace";

    pub fn can_mutate(&self, inst: &Instruction) -> bool {
        matches!(inst.kind, InstKind::ICmp { .. })
    }

    pub fn describe_original(&self, inst: &Instruction) -> String {
        match &inst.kind {
            InstKind::ICmp { pred, .. } => pred.name().to_string(),
            _ => String::new(),
        }
    }

    pub fn apply(
        &self,
        func: &mut Function,
        ordinal: usize,
        ctx: &mut MutationCtx<'_>,
    ) -> Result<Option<Value>> {
        let inst = target_mut(func, ordinal);
        let pred = match inst.kind {
            InstKind::ICmp { pred, .. } => pred,
            _ => return Ok(None),
        };

        let key = HistoryStore::key(ctx.function, ctx.ordinal, None);
        if let Some(history) = ctx.history.as_deref_mut() {
            history.seed(&key, json!(pred.name()));
        }

        // draw until the candidate is fresh, within the retry budget
        let mut accepted = None;
        for _ in 0..ctx.max_draw_attempts {
            let candidate = draw_candidate(ctx.rng, pred);
            if let Some(history) = ctx.history.as_deref_mut() {
                if history.contains(&key, &json!(candidate.name())) {
                    continue;
                }
            }
            accepted = Some(candidate);
            break;
        }
        let repl = accepted.ok_or_else(|| Error::PointsExhausted {
            function: ctx.function.to_string(),
            ordinal: ctx.ordinal,
            attempts: ctx.max_draw_attempts,
        })?;

        if let Some(history) = ctx.history.as_deref_mut() {
            history.append(&key, json!(repl.name()));
        }

        set_predicate(inst, repl);
        Ok(Some(json!(Package {
            repl: repl.name().to_string(),
        })))
    }

    pub fn replay(&self, func: &mut Function, ordinal: usize, package: &Value) -> Result<()> {
        let package: Package = serde_json::from_value(package.clone())
            .map_err(|e| Error::MalformedPackage(e.to_string()))?;
        let repl = Predicate::from_name(&package.repl)
            .ok_or_else(|| Error::MalformedPackage(format!("unknown predicate {}", package.repl)))?;
        set_predicate(target_mut(func, ordinal), repl);
        Ok(())
    }
}

/// One uniform draw from the pool matching `pred`'s signedness; EQ/NE pick
/// their pool by fair coin first
fn draw_candidate(rng: &mut rand_chacha::ChaCha8Rng, pred: Predicate) -> Predicate {
    let use_signed = if pred.is_sign_agnostic() {
        rng.gen_bool(0.5)
    } else {
        pred.is_signed()
    };
    let pool: Vec<Predicate> = if use_signed {
        POOL_SIGNED.iter().copied().filter(|p| *p != pred).collect()
    } else {
        POOL_UNSIGNED.iter().copied().filter(|p| *p != pred).collect()
    };
    choose(rng, &pool)
}

fn set_predicate(inst: &mut Instruction, repl: Predicate) {
    if let InstKind::ICmp { pred, .. } = &mut inst.kind {
        *pred = repl;
    }
}
