//! Bytecode instruction set for the stack VM.
//!
//! The VM is stack-based. Most operations consume operands from the stack
//! and push results back. Jump offsets are relative to the instruction after
//! the jump and always point forward.

#![allow(clippy::doc_markdown)]

use std::fmt;

use crate::emit::{Chunk, InstructionSet};
use crate::member::MapOp;
use crate::ops::{BinaryOp, UnaryOp};

/// A single bytecode instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    // === Stack Operations ===
    /// Push a constant from the constant pool.
    Const(u16),
    /// Pop and discard the top of stack.
    Pop,
    /// Duplicate the top of stack.
    Dup,

    // === Variables ===
    /// Push the global named by a constant: `[] -> [value]`
    LoadGlobal(u16),
    /// Pop into the global named by a constant: `[value] -> []`
    StoreGlobal(u16),

    // === Arithmetic ===
    /// Add: `[a, b] -> [a + b]`
    Add,
    /// Subtract: `[a, b] -> [a - b]`
    Sub,
    /// Multiply: `[a, b] -> [a * b]`
    Mul,
    /// Divide: `[a, b] -> [a / b]`
    Div,
    /// Modulo: `[a, b] -> [a % b]`
    Mod,
    /// Negate: `[a] -> [-a]`
    Neg,

    // === Comparison ===
    /// Equal: `[a, b] -> [a == b]`
    Eq,
    /// Not equal: `[a, b] -> [a != b]`
    Ne,
    /// Less than: `[a, b] -> [a < b]`
    Lt,
    /// Less than or equal: `[a, b] -> [a <= b]`
    Le,
    /// Greater than: `[a, b] -> [a > b]`
    Gt,
    /// Greater than or equal: `[a, b] -> [a >= b]`
    Ge,

    // === Logic ===
    /// Logical not: `[a] -> [!a]`
    Not,

    // === Control Flow ===
    /// Unconditional forward jump.
    Jump(u16),
    /// Pop, and jump forward if the value is falsy.
    JumpIfNot(u16),

    // === Maps ===
    /// Map lookup by constant key: `[map] -> [map[k]]`
    MapGetConst(u16),
    /// Map lookup: `[map, key] -> [map[key]]`
    MapGet,
    /// Map store: `[map, key, value] -> [nil]`
    MapSet,
    /// Map membership: `[map, key] -> [bool]`
    MapHas,
    /// Map removal: `[map, key] -> [nil]`
    MapDel,
}

/// A compiled program for the stack VM.
pub type CompiledProgram = Chunk<Opcode>;

impl Opcode {
    /// Returns the map opcode this instruction encodes, if any.
    #[must_use]
    pub fn map_op(self) -> Option<MapOp> {
        match self {
            Self::MapGetConst(k) => Some(MapOp::GetConst(k)),
            Self::MapGet => Some(MapOp::Get),
            Self::MapSet => Some(MapOp::Set),
            Self::MapHas => Some(MapOp::Has),
            Self::MapDel => Some(MapOp::Del),
            _ => None,
        }
    }

    /// Returns the binary operator this instruction applies, if any.
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
}

impl InstructionSet for Opcode {
    fn push_const(index: u16) -> Self {
        Self::Const(index)
    }

    fn pop() -> Self {
        Self::Pop
    }

    fn dup() -> Self {
        Self::Dup
    }

    fn load_global(name: u16) -> Self {
        Self::LoadGlobal(name)
    }

    fn store_global(name: u16) -> Self {
        Self::StoreGlobal(name)
    }

    fn binary(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Add => Self::Add,
            BinaryOp::Sub => Self::Sub,
            BinaryOp::Mul => Self::Mul,
            BinaryOp::Div => Self::Div,
            BinaryOp::Mod => Self::Mod,
            BinaryOp::Eq => Self::Eq,
            BinaryOp::Ne => Self::Ne,
            BinaryOp::Lt => Self::Lt,
            BinaryOp::Le => Self::Le,
            BinaryOp::Gt => Self::Gt,
            BinaryOp::Ge => Self::Ge,
        }
    }

    fn unary(op: UnaryOp) -> Self {
        match op {
            UnaryOp::Neg => Self::Neg,
            UnaryOp::Not => Self::Not,
        }
    }

    fn jump() -> Self {
        Self::Jump(0)
    }

    fn jump_if_not() -> Self {
        Self::JumpIfNot(0)
    }

    fn map(op: MapOp) -> Self {
        match op {
            MapOp::GetConst(k) => Self::MapGetConst(k),
            MapOp::Get => Self::MapGet,
            MapOp::Set => Self::MapSet,
            MapOp::Has => Self::MapHas,
            MapOp::Del => Self::MapDel,
        }
    }

    fn as_load_global(&self) -> Option<u16> {
        match self {
            Self::LoadGlobal(name) => Some(*name),
            _ => None,
        }
    }

    fn as_push_const(&self) -> Option<u16> {
        match self {
            Self::Const(index) => Some(*index),
            _ => None,
        }
    }

    fn constant_operand(&self) -> Option<u16> {
        match self {
            Self::Const(k) | Self::LoadGlobal(k) | Self::StoreGlobal(k) | Self::MapGetConst(k) => {
                Some(*k)
            }
            _ => None,
        }
    }

    fn set_jump_offset(&mut self, offset: u16) -> bool {
        match self {
            Self::Jump(o) | Self::JumpIfNot(o) => {
                *o = offset;
                true
            }
            _ => false,
        }
    }

    fn jump_offset(&self) -> Option<u16> {
        match self {
            Self::Jump(o) | Self::JumpIfNot(o) => Some(*o),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = self.binary_op() {
            return f.write_str(op.mnemonic());
        }
        if let Some(op) = self.map_op() {
            return write!(f, "{op}");
        }
        match self {
            Self::Const(k) => write!(f, "PUSH {k}"),
            Self::Pop => f.write_str("POP"),
            Self::Dup => f.write_str("DUP"),
            Self::LoadGlobal(k) => write!(f, "GETG {k}"),
            Self::StoreGlobal(k) => write!(f, "SETG {k}"),
            Self::Neg => f.write_str(UnaryOp::Neg.mnemonic()),
            Self::Not => f.write_str(UnaryOp::Not.mnemonic()),
            Self::Jump(o) => write!(f, "JMP +{o}"),
            Self::JumpIfNot(o) => write!(f, "JMPF +{o}"),
            _ => Ok(()),
        }
    }
}
