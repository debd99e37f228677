//! Module structure: functions, basic blocks, ordinal addressing.

use crate::instruction::{InstId, Instruction};
use serde::{Deserialize, Serialize};

/// A basic block is an ordered sequence of instructions with no internal
/// control flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
        }
    }

    pub fn with_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn add_instruction(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }
}

impl Default for BasicBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// A function contains multiple basic blocks and mints the result ids of
/// its instructions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub num_params: u32,
    pub blocks: Vec<BasicBlock>,
    next_id: u32,
}

impl Function {
    pub fn new(name: impl Into<String>, num_params: u32) -> Self {
        Self {
            name: name.into(),
            num_params,
            blocks: vec![BasicBlock::new()],
            next_id: 0,
        }
    }

    pub fn add_block(&mut self, block: BasicBlock) -> u32 {
        self.blocks.push(block);
        (self.blocks.len() - 1) as u32
    }

    pub fn get_block_mut(&mut self, index: usize) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(index)
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Mint a fresh result id, unique within this function
    pub fn fresh_id(&mut self) -> InstId {
        let id = InstId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Count total instructions in the function
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }

    /// Walk the instructions in block order with their 1-based ordinal.
    ///
    /// Ordinal 0 is a reserved sentinel and never produced. The walk is
    /// re-derived on every call; nothing is cached across mutations.
    pub fn ordinals(&self) -> impl Iterator<Item = (usize, &Instruction)> {
        self.blocks
            .iter()
            .flat_map(|b| b.instructions.iter())
            .enumerate()
            .map(|(i, inst)| (i + 1, inst))
    }

    /// Resolve an ordinal to its (block index, index within block) position
    pub fn locate(&self, ordinal: usize) -> Option<(usize, usize)> {
        if ordinal == 0 {
            return None;
        }
        let mut remaining = ordinal - 1;
        for (block_index, block) in self.blocks.iter().enumerate() {
            if remaining < block.len() {
                return Some((block_index, remaining));
            }
            remaining -= block.len();
        }
        None
    }

    pub fn instruction_at(&self, ordinal: usize) -> Option<&Instruction> {
        let (b, i) = self.locate(ordinal)?;
        Some(&self.blocks[b].instructions[i])
    }

    pub fn instruction_at_mut(&mut self, ordinal: usize) -> Option<&mut Instruction> {
        let (b, i) = self.locate(ordinal)?;
        Some(&mut self.blocks[b].instructions[i])
    }

    /// Redirect every consumer of `old`'s result to `new`, across all blocks
    pub fn replace_all_uses(&mut self, old: InstId, new: InstId) {
        for block in &mut self.blocks {
            for inst in &mut block.instructions {
                inst.redirect_uses(old, new);
            }
        }
    }

    /// Insert `inst` immediately before the instruction at `ordinal`.
    ///
    /// Panics if the ordinal does not resolve; resolving it is the caller's
    /// contract.
    pub fn insert_before(&mut self, ordinal: usize, inst: Instruction) {
        let (b, i) = self
            .locate(ordinal)
            .unwrap_or_else(|| panic!("ordinal {} out of range in {}", ordinal, self.name));
        self.blocks[b].instructions.insert(i, inst);
    }

    /// Remove and return the instruction at `ordinal`. Same contract as
    /// [`Function::insert_before`].
    pub fn remove_at(&mut self, ordinal: usize) -> Instruction {
        let (b, i) = self
            .locate(ordinal)
            .unwrap_or_else(|| panic!("ordinal {} out of range in {}", ordinal, self.name));
        self.blocks[b].instructions.remove(i)
    }
}

/// A complete module: the unit the engine discovers over and mutates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
        }
    }

    pub fn with_functions(functions: Vec<Function>) -> Self {
        Self { functions }
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn get_function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.name == name)
    }

    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    /// Count total instructions in the module
    pub fn total_instructions(&self) -> usize {
        self.functions.iter().map(|f| f.instruction_count()).sum()
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{BinOpcode, ConstInt, InstKind, Operand};

    fn two_block_function() -> Function {
        let mut func = Function::new("f", 2);
        let a = func.fresh_id();
        let b = func.fresh_id();
        let r = func.fresh_id();
        func.get_block_mut(0).unwrap().add_instruction(Instruction::binop(
            a,
            BinOpcode::Add,
            Operand::Arg(0),
            Operand::Arg(1),
        ));
        func.get_block_mut(0)
            .unwrap()
            .add_instruction(Instruction::br(b, 1));
        let exit = func.add_block(BasicBlock::new());
        func.get_block_mut(exit as usize)
            .unwrap()
            .add_instruction(Instruction::ret(r, Some(Operand::Inst(a))));
        func
    }

    #[test]
    fn test_ordinals_cross_blocks() {
        let func = two_block_function();
        let ordinals: Vec<usize> = func.ordinals().map(|(n, _)| n).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);

        // ordinal 3 lands in the second block
        assert_eq!(func.locate(3), Some((1, 0)));
        assert!(matches!(
            func.instruction_at(3).unwrap().kind,
            InstKind::Ret { .. }
        ));
    }

    #[test]
    fn test_locate_rejects_sentinel_and_overflow() {
        let func = two_block_function();
        assert_eq!(func.locate(0), None);
        assert_eq!(func.locate(4), None);
    }

    #[test]
    fn test_replace_all_uses() {
        let mut func = two_block_function();
        let new_id = func.fresh_id();
        func.replace_all_uses(InstId(0), new_id);

        match &func.instruction_at(3).unwrap().kind {
            InstKind::Ret { value } => assert_eq!(*value, Some(Operand::Inst(new_id))),
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_insert_before_and_remove_preserve_count() {
        let mut func = two_block_function();
        let before = func.instruction_count();

        let id = func.fresh_id();
        let repl = Instruction::binop(
            id,
            BinOpcode::Sub,
            Operand::Arg(0),
            Operand::Const(ConstInt::new(32, 1)),
        );
        func.insert_before(1, repl);
        func.replace_all_uses(InstId(0), id);
        func.remove_at(2);

        assert_eq!(func.instruction_count(), before);
        assert!(matches!(
            func.instruction_at(1).unwrap().kind,
            InstKind::BinOp {
                op: BinOpcode::Sub,
                ..
            }
        ));
    }

    #[test]
    fn test_module_serialization() {
        let module = Module::with_functions(vec![two_block_function()]);
        let json = serde_json::to_string(&module).unwrap();
        let deserialized: Module = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, module);
    }

    #[test]
    fn test_module_lookup() {
        let mut module = Module::new();
        module.add_function(two_block_function());
        assert_eq!(module.num_functions(), 1);
        assert!(module.get_function("f").is_some());
        assert!(module.get_function("g").is_none());
        assert_eq!(module.total_instructions(), 3);
    }
}
