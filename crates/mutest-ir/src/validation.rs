//! Structural validation for modules.

use crate::instruction::{InstKind, Operand};
use crate::module::{Function, Module};
use mutest_core::{Error, Result};
use std::collections::HashSet;

/// Validate that a module is well-formed
pub fn validate_module(module: &Module) -> Result<()> {
    for func in &module.functions {
        validate_function(func)?;
    }
    Ok(())
}

fn validate_function(func: &Function) -> Result<()> {
    if func.blocks.is_empty() {
        return Err(Error::Validation(format!(
            "function {} has no basic blocks",
            func.name
        )));
    }

    let defined: HashSet<_> = func
        .ordinals()
        .map(|(_, inst)| inst.id)
        .collect();

    for (block_index, block) in func.blocks.iter().enumerate() {
        if block.is_empty() {
            return Err(Error::Validation(format!(
                "function {} block {} is empty",
                func.name, block_index
            )));
        }

        for (position, inst) in block.instructions.iter().enumerate() {
            let last = position == block.len() - 1;
            if inst.is_terminator() != last {
                return Err(Error::Validation(format!(
                    "function {} block {}: terminator misplaced at position {}",
                    func.name, block_index, position
                )));
            }

            // successor references must stay inside the function
            let targets: Vec<u32> = match &inst.kind {
                InstKind::Br { dest } => vec![*dest],
                InstKind::CondBr {
                    on_true, on_false, ..
                } => vec![*on_true, *on_false],
                InstKind::Phi { incoming } => incoming.iter().map(|(b, _)| *b).collect(),
                _ => vec![],
            };
            for target in targets {
                if target as usize >= func.blocks.len() {
                    return Err(Error::Validation(format!(
                        "function {} block {}: reference to missing block {}",
                        func.name, block_index, target
                    )));
                }
            }

            for operand in inst.operands() {
                match operand {
                    Operand::Inst(id) if !defined.contains(id) => {
                        return Err(Error::Validation(format!(
                            "function {}: use of undefined value {}",
                            func.name, id
                        )));
                    }
                    Operand::Arg(n) if *n >= func.num_params => {
                        return Err(Error::Validation(format!(
                            "function {}: argument index {} out of range",
                            func.name, n
                        )));
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}
