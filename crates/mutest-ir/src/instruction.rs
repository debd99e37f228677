//! Instruction set for the mutest operation model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an instruction's result value, unique within its function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstId(pub u32);

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// An integer constant with an explicit bit width (1..=64).
///
/// The raw value is always truncated to the width; arithmetic helpers wrap
/// at the width and signed helpers interpret the top bit as the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstInt {
    bits: u32,
    value: u64,
}

impl ConstInt {
    pub fn new(bits: u32, value: u64) -> Self {
        assert!((1..=64).contains(&bits), "unsupported bit width: {}", bits);
        Self {
            bits,
            value: value & Self::mask(bits),
        }
    }

    pub fn from_i64(bits: u32, value: i64) -> Self {
        Self::new(bits, value as u64)
    }

    fn mask(bits: u32) -> u64 {
        if bits == 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Raw value, zero-extended to 64 bits
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Value sign-extended to 64 bits
    pub fn as_signed(&self) -> i64 {
        if self.bits < 64 && self.value & (1u64 << (self.bits - 1)) != 0 {
            (self.value | !Self::mask(self.bits)) as i64
        } else {
            self.value as i64
        }
    }

    pub fn wrapping_add(&self, rhs: u64) -> Self {
        Self::new(self.bits, self.value.wrapping_add(rhs))
    }

    pub fn wrapping_sub(&self, rhs: u64) -> Self {
        Self::new(self.bits, self.value.wrapping_sub(rhs))
    }

    pub fn wrapping_mul(&self, rhs: u64) -> Self {
        Self::new(self.bits, self.value.wrapping_mul(rhs))
    }

    /// Signed division by a non-zero divisor, truncating toward zero
    pub fn signed_div(&self, rhs: i64) -> Self {
        Self::from_i64(self.bits, self.as_signed().wrapping_div(rhs))
    }

    /// Complement of every bit within the width
    pub fn flipped(&self) -> Self {
        Self::new(self.bits, !self.value)
    }

    pub fn max_signed(bits: u32) -> Self {
        Self::new(bits, Self::mask(bits) >> 1)
    }

    pub fn max_unsigned(bits: u32) -> Self {
        Self::new(bits, Self::mask(bits))
    }

    pub fn min_signed(bits: u32) -> Self {
        Self::new(bits, 1u64 << (bits - 1))
    }
}

impl fmt::Display for ConstInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{} {}", self.bits, self.as_signed())
    }
}

/// An instruction operand: a constant, another instruction's result, or a
/// function argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    Const(ConstInt),
    Inst(InstId),
    Arg(u32),
}

impl Operand {
    pub fn as_const(&self) -> Option<ConstInt> {
        match self {
            Operand::Const(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Operand::Const(_))
    }
}

/// Integer comparison predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    Eq,
    Ne,
    Ugt,
    Uge,
    Ult,
    Ule,
    Sgt,
    Sge,
    Slt,
    Sle,
}

impl Predicate {
    pub const ALL: [Predicate; 10] = [
        Predicate::Eq,
        Predicate::Ne,
        Predicate::Ugt,
        Predicate::Uge,
        Predicate::Ult,
        Predicate::Ule,
        Predicate::Sgt,
        Predicate::Sge,
        Predicate::Slt,
        Predicate::Sle,
    ];

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            Predicate::Sgt | Predicate::Sge | Predicate::Slt | Predicate::Sle
        )
    }

    /// EQ/NE hold regardless of how the operand bits are interpreted
    pub fn is_sign_agnostic(&self) -> bool {
        matches!(self, Predicate::Eq | Predicate::Ne)
    }

    /// Swapping the operands of EQ/NE does not change the result
    pub fn is_commutative(&self) -> bool {
        self.is_sign_agnostic()
    }

    /// Stable name used in packages and traces
    pub fn name(&self) -> &'static str {
        match self {
            Predicate::Eq => "EQ",
            Predicate::Ne => "NE",
            Predicate::Ugt => "UGT",
            Predicate::Uge => "UGE",
            Predicate::Ult => "ULT",
            Predicate::Ule => "ULE",
            Predicate::Sgt => "SGT",
            Predicate::Sge => "SGE",
            Predicate::Slt => "SLT",
            Predicate::Sle => "SLE",
        }
    }

    pub fn from_name(name: &str) -> Option<Predicate> {
        Predicate::ALL.iter().copied().find(|p| p.name() == name)
    }
}

/// Integer binary opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOpcode {
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
}

impl BinOpcode {
    pub const ALL: [BinOpcode; 13] = [
        BinOpcode::Add,
        BinOpcode::Sub,
        BinOpcode::Mul,
        BinOpcode::UDiv,
        BinOpcode::SDiv,
        BinOpcode::URem,
        BinOpcode::SRem,
        BinOpcode::Shl,
        BinOpcode::LShr,
        BinOpcode::AShr,
        BinOpcode::And,
        BinOpcode::Or,
        BinOpcode::Xor,
    ];

    pub fn is_remainder(&self) -> bool {
        matches!(self, BinOpcode::URem | BinOpcode::SRem)
    }

    /// The opcode that differs from this one only in signedness, if any
    pub fn signedness_sibling(&self) -> Option<BinOpcode> {
        match self {
            BinOpcode::UDiv => Some(BinOpcode::SDiv),
            BinOpcode::SDiv => Some(BinOpcode::UDiv),
            BinOpcode::URem => Some(BinOpcode::SRem),
            BinOpcode::SRem => Some(BinOpcode::URem),
            BinOpcode::LShr => Some(BinOpcode::AShr),
            BinOpcode::AShr => Some(BinOpcode::LShr),
            _ => None,
        }
    }

    /// Stable name used in packages and traces
    pub fn name(&self) -> &'static str {
        match self {
            BinOpcode::Add => "Add",
            BinOpcode::Sub => "Sub",
            BinOpcode::Mul => "Mul",
            BinOpcode::UDiv => "UDiv",
            BinOpcode::SDiv => "SDiv",
            BinOpcode::URem => "URem",
            BinOpcode::SRem => "SRem",
            BinOpcode::Shl => "Shl",
            BinOpcode::LShr => "LShr",
            BinOpcode::AShr => "AShr",
            BinOpcode::And => "And",
            BinOpcode::Or => "Or",
            BinOpcode::Xor => "Xor",
        }
    }

    pub fn from_name(name: &str) -> Option<BinOpcode> {
        BinOpcode::ALL.iter().copied().find(|op| op.name() == name)
    }
}

/// Integer unary opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnOpcode {
    Neg,
    Not,
}

/// The kind-specific payload of an instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstKind {
    /// Conditional branch with two successor blocks
    CondBr {
        cond: Operand,
        on_true: u32,
        on_false: u32,
    },
    /// Unconditional branch
    Br { dest: u32 },
    /// Ternary select between two values
    Select {
        cond: Operand,
        on_true: Operand,
        on_false: Operand,
    },
    /// Integer comparison
    ICmp {
        pred: Predicate,
        lhs: Operand,
        rhs: Operand,
    },
    /// Integer binary arithmetic or bitwise operation
    BinOp {
        op: BinOpcode,
        lhs: Operand,
        rhs: Operand,
    },
    /// Integer unary operation
    UnOp { op: UnOpcode, value: Operand },
    /// Call to a named function
    Call { callee: String, args: Vec<Operand> },
    /// Store a value through an address
    Store { value: Operand, addr: Operand },
    /// Stack address allocation
    Alloca { size: Operand },
    /// SSA phi node with per-predecessor incoming values
    Phi { incoming: Vec<(u32, Operand)> },
    /// Return from the function
    Ret { value: Option<Operand> },
}

/// One instruction-like unit inside a basic block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstId,
    pub kind: InstKind,
}

impl Instruction {
    pub fn new(id: InstId, kind: InstKind) -> Self {
        Self { id, kind }
    }

    pub fn cond_br(id: InstId, cond: Operand, on_true: u32, on_false: u32) -> Self {
        Self::new(
            id,
            InstKind::CondBr {
                cond,
                on_true,
                on_false,
            },
        )
    }

    pub fn br(id: InstId, dest: u32) -> Self {
        Self::new(id, InstKind::Br { dest })
    }

    pub fn select(id: InstId, cond: Operand, on_true: Operand, on_false: Operand) -> Self {
        Self::new(
            id,
            InstKind::Select {
                cond,
                on_true,
                on_false,
            },
        )
    }

    pub fn icmp(id: InstId, pred: Predicate, lhs: Operand, rhs: Operand) -> Self {
        Self::new(id, InstKind::ICmp { pred, lhs, rhs })
    }

    pub fn binop(id: InstId, op: BinOpcode, lhs: Operand, rhs: Operand) -> Self {
        Self::new(id, InstKind::BinOp { op, lhs, rhs })
    }

    pub fn call(id: InstId, callee: impl Into<String>, args: Vec<Operand>) -> Self {
        Self::new(
            id,
            InstKind::Call {
                callee: callee.into(),
                args,
            },
        )
    }

    pub fn store(id: InstId, value: Operand, addr: Operand) -> Self {
        Self::new(id, InstKind::Store { value, addr })
    }

    pub fn ret(id: InstId, value: Option<Operand>) -> Self {
        Self::new(id, InstKind::Ret { value })
    }

    /// Returns true if this instruction ends its basic block
    pub fn is_terminator(&self) -> bool {
        matches!(
            self.kind,
            InstKind::CondBr { .. } | InstKind::Br { .. } | InstKind::Ret { .. }
        )
    }

    /// The instruction's operands in their fixed per-kind order
    pub fn operands(&self) -> Vec<&Operand> {
        match &self.kind {
            InstKind::CondBr { cond, .. } => vec![cond],
            InstKind::Br { .. } => vec![],
            InstKind::Select {
                cond,
                on_true,
                on_false,
            } => vec![cond, on_true, on_false],
            InstKind::ICmp { lhs, rhs, .. } => vec![lhs, rhs],
            InstKind::BinOp { lhs, rhs, .. } => vec![lhs, rhs],
            InstKind::UnOp { value, .. } => vec![value],
            InstKind::Call { args, .. } => args.iter().collect(),
            InstKind::Store { value, addr } => vec![value, addr],
            InstKind::Alloca { size } => vec![size],
            InstKind::Phi { incoming } => incoming.iter().map(|(_, v)| v).collect(),
            InstKind::Ret { value } => value.iter().collect(),
        }
    }

    pub fn num_operands(&self) -> usize {
        self.operands().len()
    }

    /// Fetch an operand by index.
    ///
    /// Panics on an out-of-range index; that is a contract violation of the
    /// caller, not a recoverable condition.
    pub fn operand(&self, index: usize) -> &Operand {
        self.operands()
            .into_iter()
            .nth(index)
            .unwrap_or_else(|| panic!("operand index {} out of range for {:?}", index, self.kind))
    }

    /// Replace an operand by index. Same contract as [`Instruction::operand`].
    pub fn set_operand(&mut self, index: usize, operand: Operand) {
        let slot = match &mut self.kind {
            InstKind::CondBr { cond, .. } => [cond].into_iter().nth(index),
            InstKind::Br { .. } => None,
            InstKind::Select {
                cond,
                on_true,
                on_false,
            } => [cond, on_true, on_false].into_iter().nth(index),
            InstKind::ICmp { lhs, rhs, .. } => [lhs, rhs].into_iter().nth(index),
            InstKind::BinOp { lhs, rhs, .. } => [lhs, rhs].into_iter().nth(index),
            InstKind::UnOp { value, .. } => [value].into_iter().nth(index),
            InstKind::Call { args, .. } => args.get_mut(index),
            InstKind::Store { value, addr } => [value, addr].into_iter().nth(index),
            InstKind::Alloca { size } => [size].into_iter().nth(index),
            InstKind::Phi { incoming } => incoming.get_mut(index).map(|(_, v)| v),
            InstKind::Ret { value } => value.as_mut().into_iter().nth(index),
        };
        match slot {
            Some(slot) => *slot = operand,
            None => panic!("operand index {} out of range", index),
        }
    }

    /// Rewrite every operand that refers to `old` so it refers to `new`
    pub fn redirect_uses(&mut self, old: InstId, new: InstId) {
        for index in 0..self.num_operands() {
            if *self.operand(index) == Operand::Inst(old) {
                self.set_operand(index, Operand::Inst(new));
            }
        }
    }
}
