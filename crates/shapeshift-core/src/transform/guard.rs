//! Circular reference guard
//!
//! Maps the identity of every container already entered during one
//! conversion to the container produced for it. The executor registers an
//! output shell before populating it, so a reference back to an ancestor
//! resolves to that shell instead of recursing, and a value reachable twice
//! is converted once.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::value::Value;
use std::collections::HashMap;

/// Visited map of one conversion call
#[derive(Default)]
pub struct ReferenceGuard {
    // The source handle is held alongside the output so its address cannot
    // be reused by another allocation while the conversion runs.
    visited: HashMap<usize, (Value, Value)>,
}

impl ReferenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output already produced for `source`, if any
    pub fn lookup(&self, source: &Value) -> Option<Value> {
        let identity = source.identity()?;
        self.visited.get(&identity).map(|(_, target)| target.clone())
    }

    /// Record `target` as the output for `source`; primitives are ignored
    pub fn remember(&mut self, source: &Value, target: &Value) {
        if let Some(identity) = source.identity() {
            self.visited.insert(identity, (source.clone(), target.clone()));
        }
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_identity() {
        let mut guard = ReferenceGuard::new();
        let source = Value::plain_object();
        let twin = Value::plain_object();
        let shell = Value::plain_object();

        guard.remember(&source, &shell);

        assert!(guard.lookup(&source).unwrap().ptr_eq(&shell));
        assert!(guard.lookup(&twin).is_none());
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn test_primitives_are_not_tracked() {
        let mut guard = ReferenceGuard::new();
        guard.remember(&Value::from("x"), &Value::from("y"));
        assert!(guard.is_empty());
        assert!(guard.lookup(&Value::from("x")).is_none());
    }
}
