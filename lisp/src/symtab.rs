use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::error::Error;
use crate::value::Value;

struct Frame {
    bindings: Vec<(String, Value)>,
    parent: Option<Env>,
}

/// A chain of binding frames. Cloning an `Env` aliases the same frame, which
/// is what closures capture.
#[derive(Clone)]
pub struct Env(Rc<RefCell<Frame>>);

impl Debug for Env {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // frames can reach themselves through captured closures
        write!(f, "Env({} bindings, depth {})", self.0.borrow().bindings.len(), self.depth())
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl Env {
    pub fn new() -> Self {
        Env(Rc::new(RefCell::new(Frame {
            bindings: Vec::new(),
            parent: None,
        })))
    }

    /// A fresh, empty inner scope whose lookups fall back to `self`.
    pub fn fork(&self) -> Self {
        Env(Rc::new(RefCell::new(Frame {
            bindings: Vec::new(),
            parent: Some(self.clone()),
        })))
    }

    fn parent(&self) -> Option<Env> {
        self.0.borrow().parent.clone()
    }

    fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = self.parent();
        while let Some(env) = frame {
            depth += 1;
            frame = env.parent();
        }
        depth
    }

    /// Walk the frames from innermost outwards and hand each frame's
    /// bindings to `f` until it returns `Some`.
    fn find_map<T>(&self, mut f: impl FnMut(&mut Vec<(String, Value)>) -> Option<T>) -> Option<T> {
        let mut env = self.clone();
        loop {
            if let Some(found) = f(&mut env.0.borrow_mut().bindings) {
                return Some(found);
            }
            env = env.parent()?;
        }
    }

    /// Nearest binding of `name`; later bindings shadow earlier ones.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.find_map(|bindings| {
            bindings
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        })
    }

    /// Bind `name` in the current frame, refusing to rebind a name the same
    /// frame already holds.
    pub fn define(&self, name: &str, value: Value) -> Result<(), Error> {
        if self.contains_local(name) {
            return Err(Error::Redefinition(name.to_string()));
        }
        self.insert(name, value);
        Ok(())
    }

    /// Bind without the redefinition check.
    pub fn insert(&self, name: &str, value: Value) {
        self.0.borrow_mut().bindings.push((name.to_string(), value));
    }

    /// Overwrite the nearest existing binding of `name`.
    pub fn set(&self, name: &str, value: Value) -> Result<(), Error> {
        let mut value = Some(value);
        self.find_map(|bindings| {
            let slot = bindings.iter_mut().rev().find(|(n, _)| n == name)?;
            slot.1 = value.take()?;
            Some(())
        })
        .ok_or_else(|| Error::Unbound(name.to_string()))
    }

    /// Remove the nearest binding of `name`, returning its value.
    pub fn remove(&self, name: &str) -> Result<Value, Error> {
        self.find_map(|bindings| {
            let index = bindings.iter().rposition(|(n, _)| n == name)?;
            Some(bindings.remove(index).1)
        })
        .ok_or_else(|| Error::Unbound(name.to_string()))
    }

    /// Whether this frame itself binds `name`.
    pub fn contains_local(&self, name: &str) -> bool {
        self.0.borrow().bindings.iter().any(|(n, _)| n == name)
    }

    /// All bindings, outermost frame first, each frame in definition order.
    pub fn frames(&self) -> Vec<Vec<(String, Value)>> {
        let mut frames = Vec::new();
        let mut env = Some(self.clone());
        while let Some(current) = env {
            frames.push(current.0.borrow().bindings.clone());
            env = current.parent();
        }
        frames.reverse();
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Num(n)
    }

    #[test]
    fn test_shadowing_and_scopes() {
        let root = Env::new();
        root.define("a", num(1.0)).unwrap();
        assert_eq!(root.define("a", num(2.0)), Err(Error::Redefinition("a".into())));

        let inner = root.fork();
        inner.define("a", num(2.0)).unwrap();
        assert_eq!(inner.get("a"), Some(num(2.0)));
        assert_eq!(root.get("a"), Some(num(1.0)));
        assert!(inner.contains_local("a"));
        assert!(!inner.fork().contains_local("a"));
        drop(inner);
        assert_eq!(root.get("a"), Some(num(1.0)));
    }

    #[test]
    fn test_set_and_remove() {
        let root = Env::new();
        root.define("x", num(1.0)).unwrap();
        let inner = root.fork();
        inner.set("x", num(5.0)).unwrap();
        assert_eq!(root.get("x"), Some(num(5.0)));
        assert_eq!(inner.set("y", num(0.0)), Err(Error::Unbound("y".into())));

        inner.define("x", num(9.0)).unwrap();
        assert_eq!(inner.remove("x"), Ok(num(9.0)));
        assert_eq!(inner.get("x"), Some(num(5.0)));
        assert_eq!(inner.remove("x"), Ok(num(5.0)));
        assert_eq!(inner.get("x"), None);
        assert_eq!(inner.remove("x"), Err(Error::Unbound("x".into())));
    }

    #[test]
    fn test_alias_sees_later_bindings() {
        let root = Env::new();
        let captured = root.clone();
        root.define("late", num(3.0)).unwrap();
        assert_eq!(captured.get("late"), Some(num(3.0)));
    }

    #[test]
    fn test_frames_order() {
        let root = Env::new();
        root.define("a", num(1.0)).unwrap();
        let inner = root.fork();
        inner.define("b", num(2.0)).unwrap();
        let frames = inner.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0][0].0, "a");
        assert_eq!(frames[1][0].0, "b");
    }
}
