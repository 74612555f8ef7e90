use super::{expect_arity, expect_arity_range, expect_num, Library};
use crate::error::Error;
use crate::interpret::Interpreter;
use crate::value::Value;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MathOp {
    /// +
    Add,
    /// -
    Sub,
    /// *
    Mul,
    /// /
    Div,
    /// %
    Rem,
    Abs,
    Floor,
    Ceil,
    Round,
    Trunc,
    Sqrt,
    Pow,
    Exp,
    Log,
    Sin,
    Cos,
    Tan,
    Min,
    Max,
    Pi,
}

pub fn math_op_of_str(s: &str) -> Option<MathOp> {
    match s {
        "+" => Some(MathOp::Add),
        "-" => Some(MathOp::Sub),
        "*" => Some(MathOp::Mul),
        "/" => Some(MathOp::Div),
        "%" => Some(MathOp::Rem),
        "abs" => Some(MathOp::Abs),
        "floor" => Some(MathOp::Floor),
        "ceil" => Some(MathOp::Ceil),
        "round" => Some(MathOp::Round),
        "trunc" => Some(MathOp::Trunc),
        "sqrt" => Some(MathOp::Sqrt),
        "pow" => Some(MathOp::Pow),
        "exp" => Some(MathOp::Exp),
        "log" => Some(MathOp::Log),
        "sin" => Some(MathOp::Sin),
        "cos" => Some(MathOp::Cos),
        "tan" => Some(MathOp::Tan),
        "min" => Some(MathOp::Min),
        "max" => Some(MathOp::Max),
        "pi" => Some(MathOp::Pi),
        _ => None,
    }
}

/// Arithmetic over `f64`.
pub struct Math;

fn numbers(ident: &str, args: &[Value]) -> Result<Vec<f64>, Error> {
    args.iter().map(|arg| expect_num(ident, arg)).collect()
}

fn unary(ident: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, Error> {
    expect_arity(ident, args, 1)?;
    Ok(Value::Num(f(expect_num(ident, &args[0])?)))
}

impl Library for Math {
    fn name(&self) -> &'static str {
        "math"
    }

    fn owns(&self, ident: &str) -> bool {
        math_op_of_str(ident).is_some()
    }

    fn constant(&self, ident: &str) -> Option<Value> {
        match math_op_of_str(ident)? {
            MathOp::Pi => Some(Value::Num(std::f64::consts::PI)),
            _ => None,
        }
    }

    fn apply(&self, _interp: &mut Interpreter, ident: &str, args: Vec<Value>) -> Result<Value, Error> {
        let op = math_op_of_str(ident).ok_or_else(|| Error::Unbound(ident.to_string()))?;
        match op {
            MathOp::Add => Ok(Value::Num(numbers(ident, &args)?.into_iter().sum())),
            MathOp::Mul => Ok(Value::Num(numbers(ident, &args)?.into_iter().product())),
            MathOp::Sub => {
                expect_arity_range(ident, &args, 1, None)?;
                let ns = numbers(ident, &args)?;
                match ns.as_slice() {
                    [n] => Ok(Value::Num(-n)),
                    [first, rest @ ..] => Ok(Value::Num(rest.iter().fold(*first, |acc, n| acc - n))),
                    [] => Err(Error::arity_range(ident, 1, None, 0)),
                }
            }
            MathOp::Div => {
                expect_arity_range(ident, &args, 1, None)?;
                let ns = numbers(ident, &args)?;
                let (first, rest) = match ns.as_slice() {
                    [n] => (1.0, std::slice::from_ref(n)),
                    [first, rest @ ..] => (*first, rest),
                    [] => return Err(Error::arity_range(ident, 1, None, 0)),
                };
                let mut acc = first;
                for divisor in rest {
                    if *divisor == 0.0 {
                        return Err(Error::division_by_zero(ident));
                    }
                    acc /= divisor;
                }
                Ok(Value::Num(acc))
            }
            MathOp::Rem => {
                expect_arity(ident, &args, 2)?;
                let (a, b) = (expect_num(ident, &args[0])?, expect_num(ident, &args[1])?);
                if b == 0.0 {
                    return Err(Error::division_by_zero(ident));
                }
                Ok(Value::Num(a % b))
            }
            MathOp::Abs => unary(ident, &args, f64::abs),
            MathOp::Floor => unary(ident, &args, f64::floor),
            MathOp::Ceil => unary(ident, &args, f64::ceil),
            MathOp::Round => unary(ident, &args, f64::round),
            MathOp::Trunc => unary(ident, &args, f64::trunc),
            MathOp::Exp => unary(ident, &args, f64::exp),
            MathOp::Sin => unary(ident, &args, f64::sin),
            MathOp::Cos => unary(ident, &args, f64::cos),
            MathOp::Tan => unary(ident, &args, f64::tan),
            MathOp::Sqrt => {
                expect_arity(ident, &args, 1)?;
                let n = expect_num(ident, &args[0])?;
                if n < 0.0 {
                    return Err(Error::domain(ident, format!("negative operand {}", args[0])));
                }
                Ok(Value::Num(n.sqrt()))
            }
            MathOp::Log => {
                expect_arity(ident, &args, 1)?;
                let n = expect_num(ident, &args[0])?;
                if n <= 0.0 {
                    return Err(Error::domain(ident, format!("operand must be positive, got {}", args[0])));
                }
                Ok(Value::Num(n.ln()))
            }
            MathOp::Pow => {
                expect_arity(ident, &args, 2)?;
                let (base, exp) = (expect_num(ident, &args[0])?, expect_num(ident, &args[1])?);
                Ok(Value::Num(base.powf(exp)))
            }
            MathOp::Min | MathOp::Max => {
                expect_arity_range(ident, &args, 1, None)?;
                let ns = numbers(ident, &args)?;
                let pick: fn(f64, f64) -> f64 = if op == MathOp::Min { f64::min } else { f64::max };
                Ok(Value::Num(ns[1..].iter().fold(ns[0], |acc, n| pick(acc, *n))))
            }
            MathOp::Pi => {
                expect_arity(ident, &args, 0)?;
                Ok(Value::Num(std::f64::consts::PI))
            }
        }
    }
}
