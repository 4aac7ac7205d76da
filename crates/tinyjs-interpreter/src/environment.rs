//! Environment chain for variable bindings.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::Value;

/// Shared handle to an environment frame. Frames are reference counted so a
/// closure can keep its defining frame alive after the call that created it
/// has returned.
pub type EnvRef = Rc<RefCell<Environment>>;

/// A single lexical scope: variable bindings plus an optional parent frame.
///
/// The global frame has no parent. New frames are only ever created as
/// children of a function's *defining* frame, so the chain is acyclic by
/// construction.
#[derive(Default)]
pub struct Environment {
    values: IndexMap<SmolStr, Value>,
    parent: Option<EnvRef>,
}

impl Environment {
    /// Create a new empty global environment.
    pub fn new() -> Self {
        Environment {
            values: IndexMap::new(),
            parent: None,
        }
    }

    /// Create a new child environment with the given parent.
    pub fn with_parent(parent: EnvRef) -> Self {
        Environment {
            values: IndexMap::new(),
            parent: Some(parent),
        }
    }

    /// Insert or overwrite a binding in this frame only, never an ancestor.
    pub fn register(&mut self, name: SmolStr, value: Value) {
        self.values.insert(name, value);
    }

    /// Look a name up through the frame chain. An unbound name reads as
    /// [`Value::Undefined`]; the language has no "unbound variable" error.
    pub fn lookup(&self, name: &str) -> Value {
        if let Some(value) = self.values.get(name) {
            value.clone()
        } else if let Some(parent) = &self.parent {
            parent.borrow().lookup(name)
        } else {
            Value::Undefined
        }
    }

    /// Look a name up in this frame only. Used when a frame is addressed as
    /// an object (the `global` binding), where lookup must not walk chains.
    pub fn lookup_local(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or(Value::Undefined)
    }

    /// Get the parent environment if it exists.
    pub fn parent(&self) -> Option<EnvRef> {
        self.parent.clone()
    }
}

impl std::fmt::Debug for Environment {
    // bindings can be cyclic through the `global` self-reference, so the
    // debug form stays shallow: names only
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("names", &self.values.keys().collect::<Vec<_>>())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_register_and_lookup() {
        let mut env = Environment::new();
        env.register("x".into(), Value::Int(42));
        assert_eq!(env.lookup("x"), Value::Int(42));
    }

    #[test]
    fn test_unbound_name_reads_as_undefined() {
        let env = Environment::new();
        assert_eq!(env.lookup("x"), Value::Undefined);
    }

    #[test]
    fn test_lookup_walks_parent_chain() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().register("x".into(), Value::Int(10));

        let local = Environment::with_parent(global.clone());
        assert_eq!(local.lookup("x"), Value::Int(10));
    }

    #[test]
    fn test_shadowing() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().register("x".into(), Value::Int(10));

        let mut local = Environment::with_parent(global.clone());
        local.register("x".into(), Value::Int(20));

        // local shadows global, global unchanged
        assert_eq!(local.lookup("x"), Value::Int(20));
        assert_eq!(global.borrow().lookup("x"), Value::Int(10));
    }

    #[test]
    fn test_register_never_touches_ancestors() {
        let global = Rc::new(RefCell::new(Environment::new()));
        let mut local = Environment::with_parent(global.clone());
        local.register("y".into(), Value::Int(1));

        assert_eq!(global.borrow().lookup("y"), Value::Undefined);
    }

    #[test]
    fn test_lookup_local_ignores_parent() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().register("x".into(), Value::Int(10));

        let local = Environment::with_parent(global.clone());
        assert_eq!(local.lookup_local("x"), Value::Undefined);
    }

    #[test]
    fn test_register_overwrites() {
        let mut env = Environment::new();
        env.register("x".into(), Value::Int(1));
        env.register("x".into(), Value::Int(2));
        assert_eq!(env.lookup("x"), Value::Int(2));
    }
}
