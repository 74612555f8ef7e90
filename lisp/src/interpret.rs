//! Evaluation of IL trees

use std::rc::Rc;

use crate::ast::Expr;
use crate::closure::Closure;
use crate::error::Error;
use crate::library::Libraries;
use crate::print_handler::Printer;
use crate::stack::ensure_sufficient_stack;
use crate::symtab::Env;
use crate::value::{Signal, Value};

/// Closure calls allowed to nest before evaluation gives up.
pub const DEFAULT_MAX_DEPTH: usize = 256;

pub struct Interpreter {
    libraries: Libraries,
    printer: Printer,
    max_depth: usize,
    depth: usize,
}

impl Interpreter {
    pub fn new(libraries: Libraries, printer: Printer) -> Self {
        Interpreter {
            libraries,
            printer,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn printer(&self) -> &Printer {
        &self.printer
    }

    /// Evaluate top-level forms in order and return the last value.
    pub fn run(&mut self, program: &[Expr], env: &Env) -> Result<Value, Error> {
        let mut last = Value::Null;
        for expr in program {
            tracing::trace!(%expr, "top-level form");
            last = self.eval(expr, env)?;
        }
        Ok(last)
    }

    /// Evaluate in value position: a loop-control signal here is an error.
    pub fn eval(&mut self, expr: &Expr, env: &Env) -> Result<Value, Error> {
        match self.eval_signal(expr, env)? {
            Signal::Value(v) => Ok(v),
            Signal::Break => Err(Error::Control("break")),
            Signal::Continue => Err(Error::Control("continue")),
        }
    }

    pub fn eval_signal(&mut self, expr: &Expr, env: &Env) -> Result<Signal, Error> {
        ensure_sufficient_stack(|| self.eval_node(expr, env))
    }

    fn eval_node(&mut self, expr: &Expr, env: &Env) -> Result<Signal, Error> {
        match expr {
            Expr::Num(n) => Ok(Value::Num(*n).into()),
            Expr::Str(s) => Ok(Value::Str(s.clone()).into()),
            Expr::Nil => Ok(Value::List(Vec::new()).into()),
            Expr::Sym(name) => match name.as_str() {
                "break" => Ok(Signal::Break),
                "continue" => Ok(Signal::Continue),
                _ => self.lookup(name, env).map(Signal::Value),
            },
            Expr::List(items) => Ok(Value::List(self.eval_args(items, env)?).into()),
            Expr::Quote(datum) => Ok(Value::from_quoted(datum).into()),
            Expr::Quasi(template) => self.quasiquote(template, env).map(Signal::Value),
            Expr::Unquote(_) | Expr::Splice(_) => Err(Error::type_error(
                "unquote",
                "only valid inside quasiquote",
            )),
            Expr::Special(keyword, ops) => self.special(*keyword, ops, env),
            Expr::Call(callee, args) => self.call(callee, args, env).map(Signal::Value),
        }
    }

    /// Value-position symbol lookup: reserved literals, then the
    /// environment, then library identifiers as first-class builtins.
    pub fn lookup(&self, name: &str, env: &Env) -> Result<Value, Error> {
        match name {
            "null" => return Ok(Value::Null),
            "true" => return Ok(Value::Bool(true)),
            "false" => return Ok(Value::Bool(false)),
            _ => {}
        }
        if let Some(value) = env.get(name) {
            return Ok(value);
        }
        if let Some(library) = self.libraries.owner(name) {
            return Ok(library
                .constant(name)
                .unwrap_or_else(|| Value::Builtin(name.to_string())));
        }
        Err(Error::Unbound(name.to_string()))
    }

    pub fn eval_args(&mut self, args: &[Expr], env: &Env) -> Result<Vec<Value>, Error> {
        args.iter().map(|arg| self.eval(arg, env)).collect()
    }

    fn call(&mut self, callee: &Expr, args: &[Expr], env: &Env) -> Result<Value, Error> {
        if let Expr::Sym(name) = callee {
            if let Some(library) = self.libraries.owner(name) {
                return library.call(self, name, args, env);
            }
        }
        match self.eval(callee, env)? {
            Value::Closure(closure) => {
                let args = self.eval_args(args, env)?;
                self.call_closure(&closure, args)
            }
            // a builtin reached through a binding routes back into library dispatch
            Value::Builtin(name) => match self.libraries.owner(&name) {
                Some(library) => library.call(self, &name, args, env),
                None => Err(Error::Unbound(name)),
            },
            other => Err(Error::type_error(
                "call",
                format!("`{other}` is not a function"),
            )),
        }
    }

    /// Apply a function value to evaluated arguments.
    pub fn call_value(&mut self, f: &Value, args: Vec<Value>) -> Result<Value, Error> {
        match f {
            Value::Closure(closure) => self.call_closure(closure, args),
            Value::Builtin(name) => match self.libraries.owner(name) {
                Some(library) => library.apply(self, name, args),
                None => Err(Error::Unbound(name.clone())),
            },
            other => Err(Error::type_error(
                "call",
                format!("`{other}` is not a function"),
            )),
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(name = closure.name.as_deref().unwrap_or("lambda")))]
    pub fn call_closure(&mut self, closure: &Rc<Closure>, args: Vec<Value>) -> Result<Value, Error> {
        if self.depth >= self.max_depth {
            return Err(Error::Depth(self.max_depth));
        }
        let frame = closure.env.fork();
        let name = closure.name.clone().map_or(Value::Null, Value::Str);
        frame.insert("function-name", name);
        frame.insert("function-args", Value::List(args.clone()));
        if let Some(name) = &closure.name {
            frame.insert(name, Value::Closure(closure.clone()));
        }
        let mut args = args.into_iter();
        for param in &closure.params {
            // missing trailing arguments are null, not an error
            frame.insert(param, args.next().unwrap_or(Value::Null));
        }

        self.depth += 1;
        let result = self.eval_body(&closure.body, &frame);
        self.depth -= 1;
        result
    }

    /// Statements in value position; the last value is the result.
    pub fn eval_body(&mut self, body: &[Expr], env: &Env) -> Result<Value, Error> {
        let mut last = Value::Null;
        for expr in body {
            last = self.eval(expr, env)?;
        }
        Ok(last)
    }

    /// Statements whose result passes loop-control signals through.
    pub(crate) fn eval_sequence(&mut self, body: &[Expr], env: &Env) -> Result<Signal, Error> {
        let mut last = Signal::Value(Value::Null);
        for expr in body {
            last = self.eval_signal(expr, env)?;
            if !matches!(last, Signal::Value(_)) {
                break;
            }
        }
        Ok(last)
    }

    fn quasiquote(&mut self, template: &Expr, env: &Env) -> Result<Value, Error> {
        match template {
            Expr::Unquote(expr) => self.eval(expr, env),
            Expr::Splice(_) => Err(Error::type_error(
                "unquote-splicing",
                "only valid inside a list",
            )),
            _ => {
                let items = match template.datum_items() {
                    Some(items) => items,
                    None => return Ok(Value::from_quoted(template)),
                };
                let mut out = Vec::with_capacity(items.len());
                for item in &items {
                    match item {
                        Expr::Splice(expr) => match self.eval(expr, env)? {
                            Value::List(spliced) => out.extend(spliced),
                            other => return Err(Error::requires("unquote-splicing", "list", &other)),
                        },
                        _ => out.push(ensure_sufficient_stack(|| self.quasiquote(item, env))?),
                    }
                }
                Ok(Value::List(out))
            }
        }
    }
}
