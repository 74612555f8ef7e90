use super::{expect_arity, expect_arity_range, expect_int, expect_num, expect_str, Library};
use crate::error::Error;
use crate::interpret::Interpreter;
use crate::value::Value;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumberOp {
    /// number?
    NumberP,
    /// integer?
    IntegerP,
    /// even?
    EvenP,
    /// odd?
    OddP,
    /// zero?
    ZeroP,
    /// positive?
    PositiveP,
    /// negative?
    NegativeP,
    /// parse-number
    Parse,
    /// to-fixed
    ToFixed,
}

pub fn number_op_of_str(s: &str) -> Option<NumberOp> {
    match s {
        "number?" => Some(NumberOp::NumberP),
        "integer?" => Some(NumberOp::IntegerP),
        "even?" => Some(NumberOp::EvenP),
        "odd?" => Some(NumberOp::OddP),
        "zero?" => Some(NumberOp::ZeroP),
        "positive?" => Some(NumberOp::PositiveP),
        "negative?" => Some(NumberOp::NegativeP),
        "parse-number" => Some(NumberOp::Parse),
        "to-fixed" => Some(NumberOp::ToFixed),
        _ => None,
    }
}

/// Number predicates and conversions.
pub struct Number;

fn is_integer(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0
}

impl Library for Number {
    fn name(&self) -> &'static str {
        "number"
    }

    fn owns(&self, ident: &str) -> bool {
        number_op_of_str(ident).is_some()
    }

    fn apply(&self, _interp: &mut Interpreter, ident: &str, args: Vec<Value>) -> Result<Value, Error> {
        let op = number_op_of_str(ident).ok_or_else(|| Error::Unbound(ident.to_string()))?;
        match op {
            NumberOp::NumberP => {
                expect_arity(ident, &args, 1)?;
                Ok(Value::Bool(matches!(args[0], Value::Num(_))))
            }
            NumberOp::IntegerP => {
                expect_arity(ident, &args, 1)?;
                Ok(Value::Bool(matches!(args[0], Value::Num(n) if is_integer(n))))
            }
            NumberOp::EvenP | NumberOp::OddP => {
                expect_arity(ident, &args, 1)?;
                let n = expect_int(ident, &args[0])?;
                Ok(Value::Bool((n % 2 == 0) == (op == NumberOp::EvenP)))
            }
            NumberOp::ZeroP | NumberOp::PositiveP | NumberOp::NegativeP => {
                expect_arity(ident, &args, 1)?;
                let n = expect_num(ident, &args[0])?;
                let answer = match op {
                    NumberOp::ZeroP => n == 0.0,
                    NumberOp::PositiveP => n > 0.0,
                    _ => n < 0.0,
                };
                Ok(Value::Bool(answer))
            }
            NumberOp::Parse => {
                expect_arity(ident, &args, 1)?;
                let text = expect_str(ident, &args[0])?;
                // unparsable text is null rather than a fault
                Ok(text.trim().parse::<f64>().map_or(Value::Null, Value::Num))
            }
            NumberOp::ToFixed => {
                expect_arity_range(ident, &args, 1, Some(2))?;
                let n = expect_num(ident, &args[0])?;
                let digits = match args.get(1) {
                    Some(digits) => expect_int(ident, digits)?,
                    None => 0,
                };
                if !(0..=100).contains(&digits) {
                    return Err(Error::domain(
                        ident,
                        format!("digits must be between 0 and 100, got {digits}"),
                    ));
                }
                Ok(Value::Str(format!("{:.*}", digits as usize, n)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{HostRegistry, Libraries};
    use crate::print_handler::Printer;

    fn apply(ident: &str, args: Vec<Value>) -> Result<Value, Error> {
        let libraries = Libraries::activate(&["number"], &HostRegistry::default()).unwrap();
        let mut interp = Interpreter::new(libraries, Printer::Silent);
        Number.apply(&mut interp, ident, args)
    }

    #[test]
    fn test_predicates() {
        let cases = [
            ("number?", Value::Num(1.5), true),
            ("number?", Value::Str("1".into()), false),
            ("integer?", Value::Num(3.0), true),
            ("integer?", Value::Num(3.5), false),
            ("integer?", Value::Num(f64::INFINITY), false),
            ("even?", Value::Num(4.0), true),
            ("even?", Value::Num(-3.0), false),
            ("odd?", Value::Num(-3.0), true),
            ("zero?", Value::Num(-0.0), true),
            ("positive?", Value::Num(0.0), false),
            ("negative?", Value::Num(-0.1), true),
        ];
        for (ident, arg, expected) in cases {
            assert_eq!(apply(ident, vec![arg.clone()]), Ok(Value::Bool(expected)), "{ident} {arg}");
        }
    }

    #[test]
    fn test_parse_number() {
        let cases = [
            ("42", Value::Num(42.0)),
            (" -1.5 ", Value::Num(-1.5)),
            ("1e3", Value::Num(1000.0)),
            ("abc", Value::Null),
            ("", Value::Null),
        ];
        for (text, expected) in cases {
            assert_eq!(apply("parse-number", vec![Value::Str(text.into())]), Ok(expected), "{text}");
        }
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(
            apply("to-fixed", vec![Value::Num(3.14159), Value::Num(2.0)]),
            Ok(Value::Str("3.14".into()))
        );
        assert_eq!(apply("to-fixed", vec![Value::Num(2.7)]), Ok(Value::Str("3".into())));
        assert_eq!(
            apply("to-fixed", vec![Value::Num(1.0), Value::Num(-1.0)])
                .unwrap_err()
                .to_string(),
            "to-fixed: digits must be between 0 and 100, got -1"
        );
    }

    #[test]
    fn test_even_requires_integer() {
        assert_eq!(
            apply("even?", vec![Value::Num(1.5)]).unwrap_err().to_string(),
            "even?: requires integer, got number `1.5`"
        );
    }
}
