//! Discover, mutate, and replay.
//!
//! Points are addressed by (function name, 1-based ordinal) and re-resolved
//! by scanning on every request; nothing is cached between discovery and
//! application, because the module may have been mutated in between. Every
//! rule edit preserves per-function instruction count, so ordinals recorded
//! before a replay stay valid for every later record of the same trace.

use crate::history::HistoryStore;
use crate::point::{MutateRequest, MutateResponse, MutationPoint, TraceRecord};
use crate::rules::{MutationCtx, Rule};
use mutest_core::{EngineConfig, Error, Result};
use mutest_ir::Module;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use tracing::{debug, info};

pub struct MutationEngine {
    config: EngineConfig,
    rules: Vec<Rule>,
    rng: ChaCha8Rng,
}

impl MutationEngine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            rules: Rule::all(),
            rng,
        }
    }

    /// Walk every function in `scope`, assign ordinals in block order, and
    /// emit one point per (instruction, matching rule) pair.
    ///
    /// The returned iterator is lazy and restartable; no module mutation
    /// occurs, and running it twice over an unmutated module yields the
    /// same points.
    pub fn discover<'a>(
        &'a self,
        module: &'a Module,
        scope: &'a HashSet<String>,
    ) -> impl Iterator<Item = MutationPoint> + 'a {
        debug!(
            "Discovering mutation points in {} of {} functions",
            scope.len(),
            module.num_functions()
        );
        module
            .functions
            .iter()
            .filter(|func| scope.contains(&func.name))
            .flat_map(move |func| {
                func.ordinals().flat_map(move |(ordinal, inst)| {
                    self.rules
                        .iter()
                        .filter(|rule| rule.can_mutate(inst))
                        .map(move |rule| MutationPoint {
                            rule: rule.name().to_string(),
                            function: func.name.clone(),
                            instruction: ordinal,
                            second_mutation: rule.supports_second_mutation(),
                            origin_mutate: rule.describe_original(inst),
                            instruction_line: None,
                        })
                })
            })
    }

    /// Apply one rule at one point. The point is re-resolved by scanning
    /// and re-checked against the rule before the edit; any mismatch is a
    /// fatal error, never silently skipped.
    pub fn mutate(&mut self, module: &mut Module, request: &MutateRequest) -> Result<MutateResponse> {
        let rule = self.resolve(module, &request.rule, &request.function, request.instruction)?;

        let mut history = self
            .config
            .history_path
            .as_deref()
            .map(HistoryStore::load);

        let func = module
            .get_function_mut(&request.function)
            .ok_or_else(|| Error::NoSuchFunction(request.function.clone()))?;

        let mut ctx = MutationCtx {
            rng: &mut self.rng,
            history: history.as_mut(),
            max_draw_attempts: self.config.max_draw_attempts,
            function: &request.function,
            ordinal: request.instruction,
        };
        let package = rule.apply(func, request.instruction, &mut ctx)?;

        match package {
            Some(package) => {
                if let (Some(history), Some(path)) = (&history, self.config.history_path.as_deref())
                {
                    history.save(path)?;
                }
                info!(
                    "Mutated {}::{} with {}",
                    request.function, request.instruction, request.rule
                );
                Ok(MutateResponse::changed(package))
            }
            None => {
                debug!(
                    "Rule {} declined {}::{}",
                    request.rule, request.function, request.instruction
                );
                Ok(MutateResponse::unchanged())
            }
        }
    }

    /// Replay an ordered trace of recorded packages against the module.
    /// Returns whether anything was applied (true iff the trace is
    /// non-empty).
    pub fn replay(&mut self, module: &mut Module, trace: &[TraceRecord]) -> Result<bool> {
        for record in trace {
            let rule = self.resolve(module, &record.rule, &record.function, record.instruction)?;
            let func = module
                .get_function_mut(&record.function)
                .ok_or_else(|| Error::NoSuchFunction(record.function.clone()))?;
            rule.replay(func, record.instruction, &record.package)?;
            debug!(
                "Replayed {} at {}::{}",
                record.rule, record.function, record.instruction
            );
        }
        info!("Replayed {} trace records", trace.len());
        Ok(!trace.is_empty())
    }

    /// Resolve a named point: the rule must exist, the function must exist,
    /// the ordinal must land on an instruction, and the rule must still
    /// accept that instruction.
    fn resolve(
        &self,
        module: &Module,
        rule_name: &str,
        function: &str,
        ordinal: usize,
    ) -> Result<Rule> {
        let rule = *self
            .rules
            .iter()
            .find(|rule| rule.name() == rule_name)
            .ok_or_else(|| Error::NoSuchRule(rule_name.to_string()))?;

        let func = module
            .get_function(function)
            .ok_or_else(|| Error::NoSuchFunction(function.to_string()))?;

        let inst = func
            .instruction_at(ordinal)
            .ok_or_else(|| Error::NoSuchInstruction {
                function: function.to_string(),
                ordinal,
            })?;

        // drift between discovery and application is a consistency bug
        if !rule.can_mutate(inst) {
            return Err(Error::RuleMismatch {
                rule: rule_name.to_string(),
                function: function.to_string(),
                ordinal,
            });
        }

        Ok(rule)
    }
}
