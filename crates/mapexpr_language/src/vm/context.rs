//! Variable environments for VM execution.
//!
//! Both VMs resolve named loads and stores through the [`VmContext`] trait.
//! [`Globals`] is the default in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use mapexpr_foundation::Value;

// =============================================================================
// VmContext Trait
// =============================================================================

/// Provides variable storage for VM execution.
pub trait VmContext {
    /// Looks up a variable. Unbound names return `None` and load as nil.
    fn get_global(&self, name: &str) -> Option<Value>;

    /// Binds or rebinds a variable.
    fn set_global(&mut self, name: &str, value: Value);
}

// =============================================================================
// Globals
// =============================================================================

/// A `HashMap`-backed variable environment.
#[derive(Clone, Debug, Default)]
pub struct Globals {
    vars: HashMap<Arc<str>, Value>,
}

impl Globals {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to bind a variable.
    #[must_use]
    pub fn with(mut self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Binds a variable, returning the previous value.
    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Option<Value> {
        self.vars.insert(name.into(), value.into())
    }

    /// Returns a variable's value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Returns the number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterates over bindings in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_ref(), v))
    }
}

impl VmContext for Globals {
    fn get_global(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }

    fn set_global(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.vars.get_mut(name) {
            *slot = value;
        } else {
            self.vars.insert(Arc::from(name), value);
        }
    }
}
