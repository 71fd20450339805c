//! Map opcode handlers shared by both VMs.
//!
//! Every handler leaves exactly one value on the stack. The subject is checked
//! for being a map before the key is checked for being a string.

use mapexpr_foundation::{Error, MapRef, Result, Type, Value};

use crate::emit::ConstantPool;
use crate::member::MapOp;

use super::stack::OperandStack;

/// Converts a stored entry into the value pushed on the stack.
///
/// Entries load as themselves; nested maps and foreign payloads keep their
/// identity. A missing entry loads as nil.
#[must_use]
pub fn load_entry(entry: Option<Value>) -> Value {
    entry.unwrap_or(Value::Nil)
}

/// Resolves the key operand of [`MapOp::GetConst`].
///
/// # Errors
/// Returns an internal error if the slot is missing or not a string.
pub fn constant_key(pool: &ConstantPool, index: u16) -> Result<&str> {
    pool.get(usize::from(index))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::internal(format!("constant {index} is not a string key")))
}

/// Executes a map opcode against the stack.
///
/// # Errors
/// Returns `NotAMap`, `TypeMismatch`, or a stack error.
pub fn execute(op: MapOp, stack: &mut OperandStack, pool: &ConstantPool) -> Result<()> {
    match op {
        MapOp::GetConst(index) => get_const(stack, constant_key(pool, index)?),
        MapOp::Get => get(stack),
        MapOp::Set => set(stack),
        MapOp::Has => has(stack),
        MapOp::Del => del(stack),
    }
}

/// `[map] -> [map[key]]`, rewriting the top of stack in place.
///
/// # Errors
/// Returns `NotAMap` if the top of stack is not a map.
pub fn get_const(stack: &mut OperandStack, key: &str) -> Result<()> {
    let top = stack.peek_mut()?;
    let loaded = match &*top {
        Value::Map(map) => load_entry(map.get(key)),
        other => return Err(Error::not_a_map(MapOp::GetConst(0).mnemonic(), other.value_type())),
    };
    *top = loaded;
    Ok(())
}

/// `[map, key] -> [map[key]]`
///
/// # Errors
/// Returns `NotAMap` or `TypeMismatch`.
pub fn get(stack: &mut OperandStack) -> Result<()> {
    let key = stack.pop()?;
    let map = subject(stack.pop()?, MapOp::Get)?;
    let value = load_entry(map.get(string_key(&key)?));
    stack.push(value)
}

/// `[map, key, value] -> [nil]`
///
/// # Errors
/// Returns `NotAMap` or `TypeMismatch`.
pub fn set(stack: &mut OperandStack) -> Result<()> {
    let value = stack.pop()?;
    let key = stack.pop()?;
    let map = subject(stack.pop()?, MapOp::Set)?;
    map.insert(string_key(&key)?, value);
    stack.push(Value::Nil)
}

/// `[map, key] -> [bool]`
///
/// # Errors
/// Returns `NotAMap` or `TypeMismatch`.
pub fn has(stack: &mut OperandStack) -> Result<()> {
    let key = stack.pop()?;
    let map = subject(stack.pop()?, MapOp::Has)?;
    let present = map.contains_key(string_key(&key)?);
    stack.push(Value::Bool(present))
}

/// `[map, key] -> [nil]`
///
/// # Errors
/// Returns `NotAMap` or `TypeMismatch`.
pub fn del(stack: &mut OperandStack) -> Result<()> {
    let key = stack.pop()?;
    let map = subject(stack.pop()?, MapOp::Del)?;
    map.remove(string_key(&key)?);
    stack.push(Value::Nil)
}

fn subject(value: Value, op: MapOp) -> Result<MapRef> {
    match value {
        Value::Map(map) => Ok(map),
        other => Err(Error::not_a_map(op.mnemonic(), other.value_type())),
    }
}

fn string_key(key: &Value) -> Result<&str> {
    key.as_str()
        .ok_or_else(|| Error::type_mismatch(Type::String, key.value_type()))
}
