//! Instruction listings for compiled programs.
//!
//! Each line shows the instruction index, the instruction, and, where an
//! operand points somewhere, what it points at:
//!
//! ```text
//! 0000  GETG 0        ; m
//! 0001  MGETC 1       ; "K"
//! ```

use std::fmt::Write;

use mapexpr_foundation::Value;
use mapexpr_language::{Chunk, InstructionSet, Program};

/// Renders a chunk of either instruction set as a listing.
#[must_use]
pub fn disassemble<I: InstructionSet>(chunk: &Chunk<I>) -> String {
    let mut out = String::new();
    for (ip, instr) in chunk.code.iter().enumerate() {
        let text = instr.to_string();
        let note = annotation(chunk, ip, instr);
        let _ = match note {
            Some(note) => writeln!(out, "{ip:04}  {text:<12}  ; {note}"),
            None => writeln!(out, "{ip:04}  {text}"),
        };
    }
    if !chunk.constants.is_empty() {
        let _ = writeln!(out, "constants:");
        for (index, value) in chunk.constants.as_slice().iter().enumerate() {
            let _ = writeln!(out, "  [{index}] {value:?}");
        }
    }
    out
}

/// Renders either backend's program.
#[must_use]
pub fn disassemble_program(program: &Program) -> String {
    match program {
        Program::Stack(chunk) => disassemble(chunk),
        Program::Streaming(chunk) => disassemble(chunk),
    }
}

fn annotation<I: InstructionSet>(chunk: &Chunk<I>, ip: usize, instr: &I) -> Option<String> {
    if let Some(offset) = instr.jump_offset() {
        return Some(format!("-> {:04}", ip + 1 + usize::from(offset)));
    }
    let index = instr.constant_operand()?;
    let value = chunk.constants.get(usize::from(index));
    Some(match value {
        // Variable names print bare
        Some(Value::String(name))
            if instr.as_load_global().is_some() || is_store(instr, index) =>
        {
            name.to_string()
        }
        Some(value) => format!("{value:?}"),
        None => "<missing>".to_string(),
    })
}

fn is_store<I: InstructionSet>(instr: &I, index: u16) -> bool {
    *instr == I::store_global(index)
}
