//! Text rendering of values and IL nodes.
//!
//! Backs `print`, `to-string`, `debug` and error messages, so spacing is
//! exact: elements are separated by one space and nothing follows an open
//! bracket or a quote marker.

use std::fmt::{Display, Formatter};

use crate::ast::Expr;
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        // also covers -0
        "0".to_string()
    } else {
        format!("{n}")
    }
}

/// A string as it is written in source: delimited, with doubled quotes.
pub fn quote_string(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn quote_marker(tag: &str) -> Option<&'static str> {
    match tag {
        "quote" => Some("'"),
        "quasiquote" => Some("`"),
        "unquote" => Some(","),
        "unquote-splicing" => Some(",@"),
        _ => None,
    }
}

/// Render a value. Strings are verbatim at the top level.
pub fn stringify(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, false);
    out
}

fn write_value(out: &mut String, value: &Value, nested: bool) {
    ensure_sufficient_stack(|| write_value_inner(out, value, nested))
}

fn write_value_inner(out: &mut String, value: &Value, nested: bool) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Num(n) => out.push_str(&format_number(*n)),
        Value::Str(s) if nested => out.push_str(&quote_string(s)),
        Value::Str(s) => out.push_str(s),
        Value::Sym(s) | Value::Builtin(s) => out.push_str(s),
        Value::List(items) => match items.as_slice() {
            [Value::Sym(tag), datum] if quote_marker(tag).is_some() => {
                out.push_str(quote_marker(tag).unwrap_or_default());
                write_value(out, datum, true);
            }
            _ => {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    write_value(out, item, true);
                }
                out.push(')');
            }
        },
        Value::Closure(closure) => {
            out.push_str("(lambda (");
            out.push_str(&closure.params.join(" "));
            out.push(')');
            for expr in &closure.body {
                out.push(' ');
                write_expr(out, expr);
            }
            out.push(')');
        }
    }
}

/// Render an IL node back to source notation.
pub fn render(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn write_seq<'a>(out: &mut String, open: char, items: impl Iterator<Item = &'a Expr>, close: char) {
    out.push(open);
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_expr(out, item);
    }
    out.push(close);
}

fn write_expr(out: &mut String, expr: &Expr) {
    ensure_sufficient_stack(|| write_expr_inner(out, expr))
}

fn write_expr_inner(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Num(n) => out.push_str(&format_number(*n)),
        Expr::Sym(s) => out.push_str(s),
        Expr::Str(s) => out.push_str(&quote_string(s)),
        Expr::Nil => out.push_str("()"),
        Expr::List(items) => write_seq(out, '[', items.iter(), ']'),
        Expr::Quote(x) => {
            out.push('\'');
            write_expr(out, x);
        }
        Expr::Quasi(x) => {
            out.push('`');
            write_expr(out, x);
        }
        Expr::Unquote(x) => {
            out.push(',');
            write_expr(out, x);
        }
        Expr::Splice(x) => {
            out.push_str(",@");
            write_expr(out, x);
        }
        Expr::Special(keyword, ops) => {
            let head = Expr::Sym(keyword.to_string());
            write_seq(out, '(', std::iter::once(&head).chain(ops.iter()), ')');
        }
        Expr::Call(head, args) => {
            write_seq(out, '(', std::iter::once(head.as_ref()).chain(args.iter()), ')')
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&stringify(self))
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::Closure;
    use crate::parse::parse;
    use crate::symtab::Env;

    #[test]
    fn test_numbers() {
        let cases = [
            (6.0, "6"),
            (-2.5, "-2.5"),
            (-0.0, "0"),
            (0.1 + 0.2, "0.30000000000000004"),
            (f64::INFINITY, "Infinity"),
            (f64::NEG_INFINITY, "-Infinity"),
            (f64::NAN, "NaN"),
            (-123456300.7, "-123456300.7"),
        ];
        for (n, expected) in cases {
            assert_eq!(format_number(n), expected);
        }
    }

    #[test]
    fn test_stringify_values() {
        let cases = [
            (Value::Null, "null"),
            (Value::Bool(true), "true"),
            (Value::Str("plain \"text\"".into()), "plain \"text\""),
            (
                Value::List(vec![
                    Value::Num(1.0),
                    Value::Str("a\"b".into()),
                    Value::List(vec![]),
                    Value::Sym("x".into()),
                ]),
                "(1 \"a\"\"b\" () x)",
            ),
            (
                Value::List(vec![
                    Value::Sym("quote".into()),
                    Value::List(vec![Value::Sym("a".into()), Value::Num(1.0)]),
                ]),
                "'(a 1)",
            ),
            (
                Value::List(vec![
                    Value::Sym("quote".into()),
                    Value::Sym("a".into()),
                    Value::Sym("b".into()),
                ]),
                "(quote a b)",
            ),
        ];
        for (value, expected) in cases {
            assert_eq!(stringify(&value), expected);
        }
    }

    #[test]
    fn test_closure_rendering() {
        let body = parse("(+ x y) (print x)").unwrap();
        let closure = Closure::new(vec!["x".into(), "y".into()], body, Env::new());
        assert_eq!(
            stringify(&Value::from(closure)),
            "(lambda (x y) (+ x y) (print x))"
        );
        let empty = Closure::new(vec![], vec![], Env::new());
        assert_eq!(stringify(&Value::from(empty)), "(lambda ())");
    }

    #[test]
    fn test_render_exprs() {
        let sources = [
            "(let x [1 2 \"s\"])",
            "'(a 'b)",
            "`(a ,b ,@c)",
            "{if (> e 2) {break}}",
            "(f)",
            "()",
        ];
        let expected = [
            "(let x [1 2 \"s\"])",
            "'(a 'b)",
            "`(a ,b ,@c)",
            "(if (> e 2) (break))",
            "(f)",
            "()",
        ];
        for (src, expected) in sources.into_iter().zip(expected) {
            assert_eq!(render(&parse(src).unwrap()[0]), expected);
        }
    }
}
