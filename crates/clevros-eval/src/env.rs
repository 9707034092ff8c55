//! Scoped variable bindings for lambda enumeration.

use std::collections::BTreeMap;

use crate::scene::ObjectId;

/// Variable bindings with push/pop scopes.
///
/// Each `lambda` pushes a scope and rebinds its variable once per candidate
/// object. Lookups search from the innermost scope outward.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<BTreeMap<u32, ObjectId>>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![BTreeMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(BTreeMap::new());
    }

    /// Pop the innermost scope. The outermost scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Bind `$index` in the innermost scope, replacing any earlier binding there.
    pub fn define(&mut self, index: u32, object: ObjectId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(index, object);
        }
    }

    pub fn get(&self, index: u32) -> Option<ObjectId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&index).copied())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
