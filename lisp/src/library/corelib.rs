use std::cmp::Ordering;

use super::{expect_arity, expect_arity_range, expect_callable, expect_list, expect_str, Library};
use crate::ast::Expr;
use crate::error::Error;
use crate::interpret::Interpreter;
use crate::parse::parse;
use crate::symtab::Env;
use crate::value::Value;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CoreOp {
    Print,
    Display,
    /// to-string
    ToString,
    /// type-of
    TypeOf,
    Not,
    And,
    Or,
    /// =
    Eq,
    /// !=
    Ne,
    /// <
    Lt,
    /// >
    Gt,
    /// <=
    Le,
    /// >=
    Ge,
    Equal,
    Eval,
    Parse,
    Apply,
    Call,
    Identity,
}

pub fn core_op_of_str(s: &str) -> Option<CoreOp> {
    match s {
        "print" => Some(CoreOp::Print),
        "display" => Some(CoreOp::Display),
        "to-string" => Some(CoreOp::ToString),
        "type-of" => Some(CoreOp::TypeOf),
        "not" => Some(CoreOp::Not),
        "and" => Some(CoreOp::And),
        "or" => Some(CoreOp::Or),
        "=" => Some(CoreOp::Eq),
        "!=" => Some(CoreOp::Ne),
        "<" => Some(CoreOp::Lt),
        ">" => Some(CoreOp::Gt),
        "<=" => Some(CoreOp::Le),
        ">=" => Some(CoreOp::Ge),
        "equal" => Some(CoreOp::Equal),
        "eval" => Some(CoreOp::Eval),
        "parse" => Some(CoreOp::Parse),
        "apply" => Some(CoreOp::Apply),
        "call" => Some(CoreOp::Call),
        "identity" => Some(CoreOp::Identity),
        _ => None,
    }
}

/// Output, logic, comparison and reflection.
pub struct Core;

fn joined(args: &[Value], sep: &str) -> String {
    args.iter().map(Value::to_string).collect::<Vec<_>>().join(sep)
}

/// Order two values of the same kind: numbers numerically, strings
/// lexicographically.
fn compare(ident: &str, a: &Value, b: &Value) -> Result<Option<Ordering>, Error> {
    match (a, b) {
        (Value::Num(a), Value::Num(b)) => Ok(a.partial_cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::Num(_), other) | (Value::Str(_), other) => Err(Error::requires(ident, a.type_name(), other)),
        (other, _) => Err(Error::requires(ident, "number or string", other)),
    }
}

fn chain(ident: &str, args: &[Value], accept: fn(Ordering) -> bool) -> Result<Value, Error> {
    expect_arity_range(ident, args, 1, None)?;
    for pair in args.windows(2) {
        let holds = compare(ident, &pair[0], &pair[1])?.map_or(false, accept);
        if !holds {
            return Ok(Value::Bool(false));
        }
    }
    // a lone operand still has to be comparable
    compare(ident, &args[0], &args[0])?;
    Ok(Value::Bool(true))
}

/// Read `value` as code: source text is parsed, quoted data is converted.
fn as_program(value: &Value) -> Result<Vec<Expr>, Error> {
    match value {
        Value::Str(source) => parse(source),
        data => Ok(vec![data.to_expr()?]),
    }
}

impl Library for Core {
    fn name(&self) -> &'static str {
        "core"
    }

    fn owns(&self, ident: &str) -> bool {
        core_op_of_str(ident).is_some()
    }

    /// `and`/`or` only evaluate operands until the answer is known; `eval`
    /// runs in the caller's environment.
    fn call(&self, interp: &mut Interpreter, ident: &str, args: &[Expr], env: &Env) -> Result<Value, Error> {
        match core_op_of_str(ident) {
            Some(op @ (CoreOp::And | CoreOp::Or)) => {
                let mut last = Value::Bool(op == CoreOp::And);
                for arg in args {
                    last = interp.eval(arg, env)?;
                    if last.is_faulty() == (op == CoreOp::And) {
                        break;
                    }
                }
                Ok(last)
            }
            Some(CoreOp::Eval) => {
                if args.len() != 1 {
                    return Err(Error::arity(ident, 1, args.len()));
                }
                let program = as_program(&interp.eval(&args[0], env)?)?;
                interp.run(&program, env)
            }
            _ => {
                let args = interp.eval_args(args, env)?;
                self.apply(interp, ident, args)
            }
        }
    }

    fn apply(&self, interp: &mut Interpreter, ident: &str, args: Vec<Value>) -> Result<Value, Error> {
        let op = core_op_of_str(ident).ok_or_else(|| Error::Unbound(ident.to_string()))?;
        match op {
            CoreOp::Print | CoreOp::Display => {
                let text = joined(&args, " ");
                if op == CoreOp::Print {
                    interp.printer().println(&text);
                } else {
                    interp.printer().print(&text);
                }
                Ok(args.into_iter().last().unwrap_or(Value::Null))
            }
            CoreOp::ToString => Ok(Value::Str(joined(&args, ""))),
            CoreOp::TypeOf => {
                expect_arity(ident, &args, 1)?;
                Ok(Value::Str(args[0].type_name().to_string()))
            }
            CoreOp::Not => {
                expect_arity(ident, &args, 1)?;
                Ok(Value::Bool(args[0].is_faulty()))
            }
            CoreOp::And | CoreOp::Or => {
                let mut last = Value::Bool(op == CoreOp::And);
                for value in args {
                    if value.is_faulty() == (op == CoreOp::And) {
                        return Ok(value);
                    }
                    last = value;
                }
                Ok(last)
            }
            CoreOp::Eq => {
                expect_arity_range(ident, &args, 1, None)?;
                Ok(Value::Bool(args.windows(2).all(|pair| pair[0] == pair[1])))
            }
            CoreOp::Ne => {
                expect_arity(ident, &args, 2)?;
                Ok(Value::Bool(args[0] != args[1]))
            }
            CoreOp::Equal => {
                expect_arity(ident, &args, 2)?;
                Ok(Value::Bool(args[0] == args[1]))
            }
            CoreOp::Lt => chain(ident, &args, Ordering::is_lt),
            CoreOp::Gt => chain(ident, &args, Ordering::is_gt),
            CoreOp::Le => chain(ident, &args, Ordering::is_le),
            CoreOp::Ge => chain(ident, &args, Ordering::is_ge),
            CoreOp::Eval => {
                expect_arity(ident, &args, 1)?;
                let program = as_program(&args[0])?;
                interp.run(&program, &Env::new())
            }
            CoreOp::Parse => {
                expect_arity(ident, &args, 1)?;
                let mut data: Vec<Value> = parse(expect_str(ident, &args[0])?)?
                    .iter()
                    .map(Value::from_quoted)
                    .collect();
                Ok(match data.len() {
                    0 => Value::Null,
                    1 => data.remove(0),
                    _ => Value::List(data),
                })
            }
            CoreOp::Apply => {
                expect_arity(ident, &args, 2)?;
                let f = expect_callable(ident, &args[0])?;
                let rest = expect_list(ident, &args[1])?.to_vec();
                interp.call_value(f, rest)
            }
            CoreOp::Call => {
                expect_arity_range(ident, &args, 1, None)?;
                let mut args = args.into_iter();
                let f = args.next().unwrap_or(Value::Null);
                expect_callable(ident, &f)?;
                interp.call_value(&f, args.collect())
            }
            CoreOp::Identity => {
                expect_arity(ident, &args, 1)?;
                Ok(args.into_iter().next().unwrap_or(Value::Null))
            }
        }
    }
}
