use std::{cell::RefCell, collections::HashMap, rc::Rc};

use super::interpreter::Value;

/// A single scope in the lexical environment chain
/// The chain is built of Rc links because a closure may keep its defining
/// scope alive after the call frame that created it has returned; mutations
/// through one handle are visible through every other handle to the same
/// scope
pub struct Environment {
    enclosing: Option<Rc<Environment>>,
    values: RefCell<HashMap<String, Value>>,
}

impl Environment {
    pub fn new_global() -> Rc<Environment> {
        Rc::new(Environment {
            enclosing: None,
            values: RefCell::new(HashMap::new()),
        })
    }

    /// Open a child scope whose lookups fall through to this one
    pub fn open_scope(self: &Rc<Self>) -> Rc<Environment> {
        Rc::new(Environment {
            enclosing: Some(self.clone()),
            values: RefCell::new(HashMap::new()),
        })
    }

    /// Install or overwrite a binding in this scope only; redefinition is
    /// permitted and the last write wins
    pub fn define(&self, name: &str, value: Value) {
        self.values.borrow_mut().insert(name.to_string(), value);
    }

    /// Look a name up through this scope and then its ancestors
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.borrow().get(name) {
            return Some(value.clone());
        }
        self.enclosing.as_ref()?.get(name)
    }

    /// Overwrite the binding in the nearest scope that defines the name
    /// Returns false when no scope in the chain does
    pub fn assign(&self, name: &str, value: Value) -> bool {
        {
            let mut values = self.values.borrow_mut();
            if let Some(slot) = values.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        match &self.enclosing {
            Some(enclosing) => enclosing.assign(name, value),
            None => false,
        }
    }

    /// Read directly from the scope exactly `distance` parent links up
    /// There is no search: a miss here means the resolver supplied a bad
    /// distance
    pub fn get_at(&self, distance: usize, name: &str) -> Option<Value> {
        self.ancestor(distance)?.values.borrow().get(name).cloned()
    }

    /// Write directly into the scope exactly `distance` parent links up
    /// Returns false when the name is not bound there
    pub fn assign_at(&self, distance: usize, name: &str, value: Value) -> bool {
        match self.ancestor(distance) {
            Some(env) => {
                let mut values = env.values.borrow_mut();
                match values.get_mut(name) {
                    Some(slot) => {
                        *slot = value;
                        true
                    }
                    None => false,
                }
            }
            None => false,
        }
    }

    fn ancestor(&self, distance: usize) -> Option<&Environment> {
        let mut env = self;
        for _ in 0..distance {
            env = env.enclosing.as_deref()?;
        }
        Some(env)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn define_then_get() {
        let env = Environment::new_global();
        env.define("x", Value::Int(1));
        assert_eq!(Some(Value::Int(1)), env.get("x"));
        assert_eq!(None, env.get("y"));
    }

    #[test]
    fn redefinition_last_write_wins() {
        let env = Environment::new_global();
        env.define("x", Value::Int(1));
        env.define("x", Value::Int(2));
        assert_eq!(Some(Value::Int(2)), env.get("x"));
    }

    #[test]
    fn get_searches_outward() {
        let global = Environment::new_global();
        global.define("x", Value::Int(1));
        let inner = global.open_scope().open_scope();
        assert_eq!(Some(Value::Int(1)), inner.get("x"));
    }

    #[test]
    fn shadowing_does_not_touch_outer_binding() {
        let global = Environment::new_global();
        global.define("x", Value::Int(1));
        let inner = global.open_scope();
        inner.define("x", Value::Int(2));
        assert_eq!(Some(Value::Int(2)), inner.get("x"));
        assert_eq!(Some(Value::Int(1)), global.get("x"));
    }

    #[test]
    fn assign_mutates_nearest_defining_scope() {
        let global = Environment::new_global();
        global.define("x", Value::Int(1));
        let inner = global.open_scope();
        assert!(inner.assign("x", Value::Int(2)));
        assert_eq!(Some(Value::Int(2)), global.get("x"));
        assert!(!inner.assign("missing", Value::Int(3)));
    }

    #[test]
    fn get_at_walks_exactly() {
        let global = Environment::new_global();
        global.define("x", Value::Int(1));
        let middle = global.open_scope();
        middle.define("x", Value::Int(2));
        let inner = middle.open_scope();
        assert_eq!(Some(Value::Int(2)), inner.get_at(1, "x"));
        assert_eq!(Some(Value::Int(1)), inner.get_at(2, "x"));
        // No searching: distance 0 does not see the outer bindings
        assert_eq!(None, inner.get_at(0, "x"));
        // Walking off the top of the chain is a miss, not a panic
        assert_eq!(None, inner.get_at(3, "x"));
    }

    #[test]
    fn assign_at_requires_existing_binding() {
        let global = Environment::new_global();
        global.define("x", Value::Int(1));
        let inner = global.open_scope();
        assert!(inner.assign_at(1, "x", Value::Int(5)));
        assert_eq!(Some(Value::Int(5)), global.get("x"));
        assert!(!inner.assign_at(0, "x", Value::Int(6)));
    }

    #[test]
    fn closure_style_sharing_sees_mutation() {
        let global = Environment::new_global();
        let shared = global.open_scope();
        shared.define("n", Value::Int(0));
        // Two frames hanging off the same captured scope observe one counter
        let frame_a = shared.open_scope();
        let frame_b = shared.open_scope();
        assert!(frame_a.assign("n", Value::Int(1)));
        assert_eq!(Some(Value::Int(1)), frame_b.get("n"));
    }
}
