use crate::ast::Expr;
use crate::symtab::Env;

/// A user function: parameters and body paired with the environment that
/// was live when it was created.
///
/// `env` is the defining frame itself, not a snapshot, so bindings the
/// defining scope adds after creation are visible when the closure runs.
#[derive(Debug, Clone)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Vec<Expr>,
    pub env: Env,
    /// Display name used by `function-name` and self-reference.
    pub name: Option<String>,
}

impl Closure {
    pub fn new(params: Vec<String>, body: Vec<Expr>, env: Env) -> Self {
        Closure {
            params,
            body,
            env,
            name: None,
        }
    }

    /// Same closure (sharing the captured environment) under a display name.
    pub fn named(&self, name: &str) -> Self {
        Closure {
            name: Some(name.to_string()),
            ..self.clone()
        }
    }
}
