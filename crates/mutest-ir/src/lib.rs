//! Operation model for the mutest mutation-testing engine.
//!
//! This crate defines the minimal view of a compiled program the engine
//! needs: functions made of basic blocks, blocks made of instructions,
//! instructions carrying a kind plus an ordered operand list. Instructions
//! are addressed by their 1-based ordinal within the function's linear
//! block-order stream, so a point recorded in one pass can be relocated in
//! an independently loaded copy of the same module.

pub mod instruction;
pub mod module;
pub mod validation;

pub use instruction::{
    BinOpcode, ConstInt, InstId, InstKind, Instruction, Operand, Predicate, UnOpcode,
};
pub use module::{BasicBlock, Function, Module};
pub use validation::validate_module;
