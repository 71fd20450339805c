//! Packed instruction format for the streaming VM.
//!
//! Each instruction is an opcode byte plus one `u32` operand. The operand is
//! unused, a constant-pool index, or a forward jump offset depending on the
//! opcode.

use std::fmt;

use crate::emit::{Chunk, InstructionSet};
use crate::member::MapOp;
use crate::ops::{BinaryOp, UnaryOp};

/// Opcode byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    /// Push `constants[arg]`.
    Push,
    /// Discard the top of stack.
    Pop,
    /// Duplicate the top of stack.
    Dup,
    /// Push the variable named by `constants[arg]`.
    GetGlobal,
    /// Pop into the variable named by `constants[arg]`.
    SetGlobal,
    /// `[a, b] -> [a + b]`
    Add,
    /// `[a, b] -> [a - b]`
    Sub,
    /// `[a, b] -> [a * b]`
    Mul,
    /// `[a, b] -> [a / b]`
    Div,
    /// `[a, b] -> [a % b]`
    Mod,
    /// `[a, b] -> [a == b]`
    Eq,
    /// `[a, b] -> [a != b]`
    Ne,
    /// `[a, b] -> [a < b]`
    Lt,
    /// `[a, b] -> [a <= b]`
    Le,
    /// `[a, b] -> [a > b]`
    Gt,
    /// `[a, b] -> [a >= b]`
    Ge,
    /// `[a] -> [-a]`
    Neg,
    /// `[a] -> [!a]`
    Not,
    /// Skip `arg` instructions.
    Jump,
    /// Pop; skip `arg` instructions if the value is falsy.
    JumpIfFalse,
    /// `[map] -> [map[constants[arg]]]`
    MapGetConst,
    /// `[map, key] -> [map[key]]`
    MapGet,
    /// `[map, key, value] -> [nil]`
    MapSet,
    /// `[map, key] -> [bool]`
    MapHas,
    /// `[map, key] -> [nil]`
    MapDel,
    /// Stop and return the top of stack.
    Return,
}

impl Op {
    /// Every opcode, in byte order.
    pub const ALL: [Self; 26] = [
        Self::Push,
        Self::Pop,
        Self::Dup,
        Self::GetGlobal,
        Self::SetGlobal,
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
        Self::Neg,
        Self::Not,
        Self::Jump,
        Self::JumpIfFalse,
        Self::MapGetConst,
        Self::MapGet,
        Self::MapSet,
        Self::MapHas,
        Self::MapDel,
        Self::Return,
    ];

    /// Decodes an opcode byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.get(usize::from(byte)).copied()
    }

    /// Returns the opcode byte.
    #[must_use]
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Returns the instruction mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Push => "PUSH",
            Self::Pop => "POP",
            Self::Dup => "DUP",
            Self::GetGlobal => "GETG",
            Self::SetGlobal => "SETG",
            Self::Neg => UnaryOp::Neg.mnemonic(),
            Self::Not => UnaryOp::Not.mnemonic(),
            Self::Jump => "JMP",
            Self::JumpIfFalse => "JMPF",
            Self::Return => "RET",
            other => match (other.binary_op(), other.map_op(0)) {
                (Some(op), _) => op.mnemonic(),
                (None, Some(op)) => op.mnemonic(),
                (None, None) => "???",
            },
        }
    }

    /// Returns the binary operator this opcode applies, if any.
    #[must_use]
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            Self::Add => BinaryOp::Add,
            Self::Sub => BinaryOp::Sub,
            Self::Mul => BinaryOp::Mul,
            Self::Div => BinaryOp::Div,
            Self::Mod => BinaryOp::Mod,
            Self::Eq => BinaryOp::Eq,
            Self::Ne => BinaryOp::Ne,
            Self::Lt => BinaryOp::Lt,
            Self::Le => BinaryOp::Le,
            Self::Gt => BinaryOp::Gt,
            Self::Ge => BinaryOp::Ge,
            _ => return None,
        })
    }

    /// Returns the map opcode this opcode encodes, given its operand.
    #[must_use]
    pub fn map_op(self, arg: u16) -> Option<MapOp> {
        match self {
            Self::MapGetConst => Some(MapOp::GetConst(arg)),
            Self::MapGet => Some(MapOp::Get),
            Self::MapSet => Some(MapOp::Set),
            Self::MapHas => Some(MapOp::Has),
            Self::MapDel => Some(MapOp::Del),
            _ => None,
        }
    }

    /// Returns true if the operand is meaningful for this opcode.
    #[must_use]
    pub fn has_operand(self) -> bool {
        matches!(
            self,
            Self::Push
                | Self::GetGlobal
                | Self::SetGlobal
                | Self::Jump
                | Self::JumpIfFalse
                | Self::MapGetConst
        )
    }
}

/// One packed instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    /// The opcode.
    pub op: Op,
    /// Operand; see [`Op`] for its meaning.
    pub arg: u32,
}

/// A compiled program for the streaming VM.
pub type StreamProgram = Chunk<Instruction>;

impl Instruction {
    /// Creates an instruction.
    #[must_use]
    pub const fn new(op: Op, arg: u32) -> Self {
        Self { op, arg }
    }

    /// Creates an instruction without an operand.
    #[must_use]
    pub const fn bare(op: Op) -> Self {
        Self { op, arg: 0 }
    }

    /// Creates a return instruction.
    #[must_use]
    pub const fn ret() -> Self {
        Self::bare(Op::Return)
    }

    /// Returns the operand as a pool index or jump offset.
    #[must_use]
    pub fn operand(self) -> Option<u16> {
        u16::try_from(self.arg).ok()
    }

    /// Packs the instruction into `op << 32 | arg`.
    #[must_use]
    pub fn pack(self) -> u64 {
        (u64::from(self.op.byte()) << 32) | u64::from(self.arg)
    }

    /// Unpacks an instruction produced by [`Instruction::pack`].
    #[must_use]
    pub fn unpack(bits: u64) -> Option<Self> {
        let op = Op::from_byte(u8::try_from(bits >> 32).ok()?)?;
        #[allow(clippy::cast_possible_truncation)]
        let arg = bits as u32;
        Some(Self { op, arg })
    }
}

impl InstructionSet for Instruction {
    fn push_const(index: u16) -> Self {
        Self::new(Op::Push, u32::from(index))
    }

    fn pop() -> Self {
        Self::bare(Op::Pop)
    }

    fn dup() -> Self {
        Self::bare(Op::Dup)
    }

    fn load_global(name: u16) -> Self {
        Self::new(Op::GetGlobal, u32::from(name))
    }

    fn store_global(name: u16) -> Self {
        Self::new(Op::SetGlobal, u32::from(name))
    }

    fn binary(op: BinaryOp) -> Self {
        Self::bare(match op {
            BinaryOp::Add => Op::Add,
            BinaryOp::Sub => Op::Sub,
            BinaryOp::Mul => Op::Mul,
            BinaryOp::Div => Op::Div,
            BinaryOp::Mod => Op::Mod,
            BinaryOp::Eq => Op::Eq,
            BinaryOp::Ne => Op::Ne,
            BinaryOp::Lt => Op::Lt,
            BinaryOp::Le => Op::Le,
            BinaryOp::Gt => Op::Gt,
            BinaryOp::Ge => Op::Ge,
        })
    }

    fn unary(op: UnaryOp) -> Self {
        Self::bare(match op {
            UnaryOp::Neg => Op::Neg,
            UnaryOp::Not => Op::Not,
        })
    }

    fn jump() -> Self {
        Self::bare(Op::Jump)
    }

    fn jump_if_not() -> Self {
        Self::bare(Op::JumpIfFalse)
    }

    fn map(op: MapOp) -> Self {
        match op {
            MapOp::GetConst(k) => Self::new(Op::MapGetConst, u32::from(k)),
            MapOp::Get => Self::bare(Op::MapGet),
            MapOp::Set => Self::bare(Op::MapSet),
            MapOp::Has => Self::bare(Op::MapHas),
            MapOp::Del => Self::bare(Op::MapDel),
        }
    }

    fn as_load_global(&self) -> Option<u16> {
        (self.op == Op::GetGlobal).then(|| self.operand()).flatten()
    }

    fn as_push_const(&self) -> Option<u16> {
        (self.op == Op::Push).then(|| self.operand()).flatten()
    }

    fn constant_operand(&self) -> Option<u16> {
        match self.op {
            Op::Push | Op::GetGlobal | Op::SetGlobal | Op::MapGetConst => self.operand(),
            _ => None,
        }
    }

    fn set_jump_offset(&mut self, offset: u16) -> bool {
        match self.op {
            Op::Jump | Op::JumpIfFalse => {
                self.arg = u32::from(offset);
                true
            }
            _ => false,
        }
    }

    fn jump_offset(&self) -> Option<u16> {
        match self.op {
            Op::Jump | Op::JumpIfFalse => self.operand(),
            _ => None,
        }
    }

    fn is_return(&self) -> bool {
        self.op == Op::Return
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.op.mnemonic();
        match self.op {
            Op::Jump | Op::JumpIfFalse => write!(f, "{name} +{}", self.arg),
            op if op.has_operand() => write!(f, "{name} {}", self.arg),
            _ => f.write_str(name),
        }
    }
}
