use std::rc::Rc;

use crate::ast::Expr;
use crate::closure::Closure;
use crate::error::Error;
use crate::stack::ensure_sufficient_stack;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    /// A quoted symbol.
    Sym(String),
    List(Vec<Value>),
    Closure(Rc<Closure>),
    /// First-class reference to a library identifier.
    Builtin(String),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Num(a), Num(b)) => a == b,
            (Str(a), Str(b)) | (Sym(a), Sym(b)) | (Builtin(a), Builtin(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Closure(a), Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Closure> for Value {
    fn from(closure: Closure) -> Self {
        Value::Closure(Rc::new(closure))
    }
}

impl Value {
    /// `false`, `null`, `0`, `""` and `()` are faulty; everything else is
    /// truthy.
    pub fn is_faulty(&self) -> bool {
        match self {
            Value::Null | Value::Bool(false) => true,
            Value::Num(n) => *n == 0.0,
            Value::Str(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Sym(_) => "symbol",
            Value::List(_) => "list",
            Value::Closure(_) | Value::Builtin(_) => "function",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Builtin(_))
    }

    /// The value a quoted IL node denotes. Total: every node has one.
    pub fn from_quoted(expr: &Expr) -> Value {
        match expr {
            Expr::Num(n) => Value::Num(*n),
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Sym(s) => match s.as_str() {
                "null" => Value::Null,
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::Sym(s.clone()),
            },
            compound => Value::List(
                compound
                    .datum_items()
                    .unwrap_or_default()
                    .iter()
                    .map(|item| ensure_sufficient_stack(|| Value::from_quoted(item)))
                    .collect(),
            ),
        }
    }

    /// Read a value back as code, for `eval` of quoted data.
    pub fn to_expr(&self) -> Result<Expr, Error> {
        Ok(match self {
            Value::Null => Expr::Sym("null".to_string()),
            Value::Bool(b) => Expr::Sym(b.to_string()),
            Value::Num(n) => Expr::Num(*n),
            Value::Str(s) => Expr::Str(s.clone()),
            Value::Sym(s) | Value::Builtin(s) => Expr::Sym(s.clone()),
            Value::List(items) => {
                let items = items
                    .iter()
                    .map(|item| ensure_sufficient_stack(|| item.to_expr()))
                    .collect::<Result<_, _>>()?;
                Expr::form(items)
            }
            Value::Closure(_) => {
                return Err(Error::type_error("eval", "a function cannot be read back as code"))
            }
        })
    }
}

/// Result of evaluating a node: an ordinary value or a loop-control signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Value(Value),
    Break,
    Continue,
}

impl From<Value> for Signal {
    fn from(value: Value) -> Self {
        Signal::Value(value)
    }
}
