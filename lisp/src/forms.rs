//! Special forms: each keyword validates its own operands and decides which
//! of them are evaluated, in which scope.

use crate::ast::{Expr, Keyword};
use crate::closure::Closure;
use crate::error::Error;
use crate::interpret::Interpreter;
use crate::symtab::Env;
use crate::value::{Signal, Value};

fn arity(keyword: Keyword, ops: &[Expr], min: usize, max: Option<usize>) -> Result<(), Error> {
    let n = ops.len();
    if n < min || max.map_or(false, |max| n > max) {
        return Err(Error::arity_range(keyword.to_string(), min, max, n));
    }
    Ok(())
}

fn symbol(keyword: Keyword, expr: &Expr) -> Result<&str, Error> {
    expr.as_sym()
        .ok_or_else(|| Error::type_error(keyword.to_string(), format!("expects a symbol, got `{expr}`")))
}

fn parameters(keyword: Keyword, expr: &Expr) -> Result<Vec<String>, Error> {
    let elements = expr.elements().ok_or_else(|| {
        Error::type_error(keyword.to_string(), format!("expects a parameter list, got `{expr}`"))
    })?;
    elements
        .iter()
        .map(|param| symbol(keyword, param).map(str::to_string))
        .collect()
}

fn is_else(expr: &Expr) -> bool {
    expr.as_sym() == Some("else")
}

fn clause_elements(keyword: Keyword, clause: &Expr) -> Result<Vec<Expr>, Error> {
    match clause.elements() {
        Some(elements) if !elements.is_empty() => Ok(elements),
        _ => Err(Error::type_error(
            keyword.to_string(),
            format!("clause must be a non-empty list, got `{clause}`"),
        )),
    }
}

/// Outcome of one loop iteration.
enum Step {
    Next,
    Stop,
}

impl Interpreter {
    pub(crate) fn special(&mut self, keyword: Keyword, ops: &[Expr], env: &Env) -> Result<Signal, Error> {
        use Keyword::*;
        match keyword {
            Let => self.eval_let(ops, env).map(Signal::Value),
            Set => {
                arity(keyword, ops, 2, Some(2))?;
                let name = symbol(keyword, &ops[0])?;
                let value = self.eval(&ops[1], env)?;
                env.set(name, value.clone())?;
                Ok(value.into())
            }
            Delete => {
                arity(keyword, ops, 1, Some(1))?;
                let name = symbol(keyword, &ops[0])?;
                env.remove(name).map(Signal::Value)
            }
            Inc | Dec => self.eval_step(keyword, ops, env).map(Signal::Value),
            Lambda => {
                arity(keyword, ops, 1, None)?;
                let params = parameters(keyword, &ops[0])?;
                Ok(Value::from(Closure::new(params, ops[1..].to_vec(), env.clone())).into())
            }
            Function => {
                arity(keyword, ops, 2, None)?;
                let name = symbol(keyword, &ops[0])?;
                let params = parameters(keyword, &ops[1])?;
                let closure = Closure::new(params, ops[2..].to_vec(), env.clone()).named(name);
                let value = Value::from(closure);
                env.define(name, value.clone())?;
                Ok(value.into())
            }
            If => {
                arity(keyword, ops, 2, Some(3))?;
                let test = self.eval(&ops[0], env)?;
                let branch = if !test.is_faulty() { ops.get(1) } else { ops.get(2) };
                match branch {
                    Some(branch) => self.eval_signal(branch, &env.fork()),
                    None => Ok(Value::Null.into()),
                }
            }
            When | Unless => {
                arity(keyword, ops, 1, None)?;
                let test = self.eval(&ops[0], env)?;
                if test.is_faulty() == (keyword == Unless) {
                    self.eval_sequence(&ops[1..], &env.fork())
                } else {
                    Ok(Value::Null.into())
                }
            }
            Cond => self.eval_cond(ops, env),
            Case => self.eval_case(ops, env),
            Block => self.eval_sequence(ops, &env.fork()),
            For => self.eval_for(ops, env).map(Signal::Value),
            While => self.eval_while(ops, env).map(Signal::Value),
            Do => self.eval_do(ops, env).map(Signal::Value),
            Repeat => self.eval_repeat(ops, env).map(Signal::Value),
            Enum => {
                arity(keyword, ops, 1, None)?;
                for (i, op) in ops.iter().enumerate() {
                    env.define(symbol(keyword, op)?, Value::Num(i as f64))?;
                }
                Ok(Value::Null.into())
            }
            Quote => {
                arity(keyword, ops, 1, Some(1))?;
                Ok(Value::from_quoted(&ops[0]).into())
            }
            Quasiquote => {
                arity(keyword, ops, 1, Some(1))?;
                self.eval_signal(&Expr::Quasi(Box::new(ops[0].clone())), env)
            }
            Unquote | UnquoteSplicing => Err(Error::type_error(
                keyword.to_string(),
                "only valid inside quasiquote",
            )),
            Try => self.eval_try(ops, env),
            Throw => {
                arity(keyword, ops, 1, Some(1))?;
                Err(Error::Thrown(self.eval(&ops[0], env)?))
            }
            Debug => self.eval_debug(ops, env).map(Signal::Value),
            Import => Err(Error::Import(
                "`import` is only resolved at the top level of a program with an import resolver configured"
                    .to_string(),
            )),
            Break => {
                arity(keyword, ops, 0, Some(0))?;
                Ok(Signal::Break)
            }
            Continue => {
                arity(keyword, ops, 0, Some(0))?;
                Ok(Signal::Continue)
            }
        }
    }

    fn eval_let(&mut self, ops: &[Expr], env: &Env) -> Result<Value, Error> {
        arity(Keyword::Let, ops, 2, Some(2))?;
        let name = symbol(Keyword::Let, &ops[0])?;
        if env.contains_local(name) {
            return Err(Error::Redefinition(name.to_string()));
        }
        let value = match self.eval(&ops[1], env)? {
            Value::Closure(closure) if closure.name.is_none() => Value::from(closure.named(name)),
            value => value,
        };
        env.define(name, value.clone())?;
        Ok(value)
    }

    /// `inc`/`dec`: read-modify-write of a numeric binding.
    fn eval_step(&mut self, keyword: Keyword, ops: &[Expr], env: &Env) -> Result<Value, Error> {
        arity(keyword, ops, 1, Some(2))?;
        let name = symbol(keyword, &ops[0])?;
        let current = match env.get(name) {
            Some(Value::Num(n)) => n,
            Some(other) => {
                return Err(Error::type_error(
                    keyword.to_string(),
                    format!("`{name}` holds {} `{other}`, not a number", other.type_name()),
                ))
            }
            None => return Err(Error::Unbound(name.to_string())),
        };
        let delta = match ops.get(1) {
            Some(expr) => match self.eval(expr, env)? {
                Value::Num(n) => n,
                other => return Err(Error::requires(keyword.to_string(), "number", &other)),
            },
            None => 1.0,
        };
        let next = if keyword == Keyword::Inc {
            current + delta
        } else {
            current - delta
        };
        env.set(name, Value::Num(next))?;
        Ok(Value::Num(next))
    }

    fn eval_cond(&mut self, ops: &[Expr], env: &Env) -> Result<Signal, Error> {
        for clause in ops {
            let elements = clause_elements(Keyword::Cond, clause)?;
            let test = if is_else(&elements[0]) {
                Value::Bool(true)
            } else {
                self.eval(&elements[0], env)?
            };
            if test.is_faulty() {
                continue;
            }
            if elements.len() == 1 {
                return Ok(test.into());
            }
            return self.eval_sequence(&elements[1..], &env.fork());
        }
        Ok(Value::Null.into())
    }

    fn eval_case(&mut self, ops: &[Expr], env: &Env) -> Result<Signal, Error> {
        arity(Keyword::Case, ops, 1, None)?;
        let key = self.eval(&ops[0], env)?;
        for clause in &ops[1..] {
            let elements = clause_elements(Keyword::Case, clause)?;
            let head = &elements[0];
            let matched = if is_else(head) {
                true
            } else {
                match head {
                    // a group of candidates
                    Expr::Nil | Expr::List(_) | Expr::Call(..) => {
                        let mut found = false;
                        for candidate in head.elements().unwrap_or_default() {
                            if self.eval(&candidate, env)? == key {
                                found = true;
                                break;
                            }
                        }
                        found
                    }
                    single => self.eval(single, env)? == key,
                }
            };
            if matched {
                return self.eval_sequence(&elements[1..], &env.fork());
            }
        }
        Ok(Value::Null.into())
    }

    /// Run one iteration's statements in `scope`, stopping early on a
    /// control signal.
    fn iterate(&mut self, body: &[Expr], scope: &Env) -> Result<Step, Error> {
        for stmt in body {
            match self.eval_signal(stmt, scope)? {
                Signal::Value(_) => {}
                Signal::Continue => return Ok(Step::Next),
                Signal::Break => return Ok(Step::Stop),
            }
        }
        Ok(Step::Next)
    }

    fn eval_for(&mut self, ops: &[Expr], env: &Env) -> Result<Value, Error> {
        arity(Keyword::For, ops, 2, None)?;
        let name = symbol(Keyword::For, &ops[0])?;
        let items = match self.eval(&ops[1], env)? {
            Value::List(items) => items,
            Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
            other => return Err(Error::requires("for", "list or string", &other)),
        };
        for item in items {
            let scope = env.fork();
            scope.insert(name, item);
            if let Step::Stop = self.iterate(&ops[2..], &scope)? {
                break;
            }
        }
        Ok(Value::Null)
    }

    fn eval_while(&mut self, ops: &[Expr], env: &Env) -> Result<Value, Error> {
        arity(Keyword::While, ops, 1, None)?;
        while !self.eval(&ops[0], env)?.is_faulty() {
            if let Step::Stop = self.iterate(&ops[1..], &env.fork())? {
                break;
            }
        }
        Ok(Value::Null)
    }

    /// `(do body… test)`: the body runs at least once and the test sees the
    /// iteration's bindings.
    fn eval_do(&mut self, ops: &[Expr], env: &Env) -> Result<Value, Error> {
        arity(Keyword::Do, ops, 1, None)?;
        let (test, body) = ops.split_last().ok_or_else(|| Error::arity_range("do", 1, None, 0))?;
        loop {
            let scope = env.fork();
            if let Step::Stop = self.iterate(body, &scope)? {
                break;
            }
            if self.eval(test, &scope)?.is_faulty() {
                break;
            }
        }
        Ok(Value::Null)
    }

    fn eval_repeat(&mut self, ops: &[Expr], env: &Env) -> Result<Value, Error> {
        arity(Keyword::Repeat, ops, 1, None)?;
        let count = match self.eval(&ops[0], env)? {
            Value::Num(n) if n >= 0.0 => n.trunc() as u64,
            Value::Num(n) => {
                return Err(Error::domain(
                    "repeat",
                    format!("count must not be negative, got {}", Value::Num(n)),
                ))
            }
            other => return Err(Error::requires("repeat", "number", &other)),
        };
        for _ in 0..count {
            if let Step::Stop = self.iterate(&ops[1..], &env.fork())? {
                break;
            }
        }
        Ok(Value::Null)
    }

    /// `(try handler body…)`: the handler is only looked at after a fault.
    fn eval_try(&mut self, ops: &[Expr], env: &Env) -> Result<Signal, Error> {
        arity(Keyword::Try, ops, 2, None)?;
        let (handler, body) = (&ops[0], &ops[1..]);
        let fault = match self.eval_sequence(body, &env.fork()) {
            Ok(signal) => return Ok(signal),
            Err(fault) => fault,
        };
        tracing::warn!(%fault, "fault caught by try");
        let text = Value::Str(fault.to_string());
        let value = match handler {
            Expr::Num(n) => Value::Num(*n),
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Sym(name) if matches!(name.as_str(), "null" | "true" | "false") => {
                self.lookup(name, env)?
            }
            Expr::Sym(_) | Expr::Special(Keyword::Lambda, _) => {
                let f = self.eval(handler, env)?;
                self.call_value(&f, vec![text])?
            }
            fallback => self.eval(fallback, env)?,
        };
        Ok(value.into())
    }

    fn eval_debug(&mut self, ops: &[Expr], env: &Env) -> Result<Value, Error> {
        arity(Keyword::Debug, ops, 0, Some(1))?;
        match ops.first() {
            Some(expr) => {
                let value = self.eval(expr, env)?;
                self.printer().println(&format!("{expr} => {value}"));
                Ok(value)
            }
            None => {
                let frames = env.frames();
                let printer = self.printer().clone();
                for (depth, frame) in frames.iter().enumerate() {
                    for (name, value) in frame {
                        let shown = match value {
                            Value::Str(s) => crate::print::quote_string(s),
                            other => other.to_string(),
                        };
                        printer.println(&format!("{}{name} = {shown}", "  ".repeat(depth)));
                    }
                }
                Ok(Value::Null)
            }
        }
    }
}
