use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::Library;
use crate::error::Error;
use crate::interpret::Interpreter;
use crate::value::Value;

/// A function supplied by the embedding program.
pub trait HostFunction {
    fn call(&self, args: Vec<Value>) -> Result<Value, Error>;
}

impl<F> HostFunction for F
where
    F: Fn(Vec<Value>) -> Result<Value, Error>,
{
    fn call(&self, args: Vec<Value>) -> Result<Value, Error> {
        self(args)
    }
}

/// Host functions by name, exposed to programs through the `ext` library.
#[derive(Clone, Default)]
pub struct HostRegistry {
    functions: FxHashMap<String, Rc<dyn HostFunction>>,
}

impl HostRegistry {
    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(Vec<Value>) -> Result<Value, Error> + 'static,
    {
        self.register_function(name, Rc::new(f));
    }

    pub fn register_function(&mut self, name: &str, f: Rc<dyn HostFunction>) {
        self.functions.insert(name.to_string(), f);
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn HostFunction>> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

pub struct HostLibrary {
    registry: HostRegistry,
}

impl HostLibrary {
    pub fn new(registry: HostRegistry) -> Self {
        tracing::debug!(functions = ?registry.names(), "host library");
        HostLibrary { registry }
    }
}

impl Library for HostLibrary {
    fn name(&self) -> &'static str {
        "ext"
    }

    fn owns(&self, ident: &str) -> bool {
        self.registry.contains(ident)
    }

    fn apply(&self, _interp: &mut Interpreter, ident: &str, args: Vec<Value>) -> Result<Value, Error> {
        let f = self
            .registry
            .get(ident)
            .ok_or_else(|| Error::Unbound(ident.to_string()))?;
        f.call(args)
    }
}
