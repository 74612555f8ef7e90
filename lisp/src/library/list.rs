use super::{
    expect_arity, expect_arity_range, expect_callable, expect_int, expect_list, expect_num, Library,
};
use crate::error::Error;
use crate::interpret::Interpreter;
use crate::value::Value;

/// Elements `range` may produce in one call.
pub const MAX_RANGE_LEN: usize = 1 << 24;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ListOp {
    /// list?
    ListP,
    /// empty?
    EmptyP,
    Length,
    First,
    Rest,
    Last,
    Nth,
    Cons,
    Append,
    Reverse,
    Range,
    Slice,
    /// index-of
    IndexOf,
    Contains,
    Map,
    Filter,
    Reduce,
    /// for-each
    ForEach,
    Sort,
    Flatten,
}

pub fn list_op_of_str(s: &str) -> Option<ListOp> {
    match s {
        "list?" => Some(ListOp::ListP),
        "empty?" => Some(ListOp::EmptyP),
        "length" => Some(ListOp::Length),
        "first" => Some(ListOp::First),
        "rest" => Some(ListOp::Rest),
        "last" => Some(ListOp::Last),
        "nth" => Some(ListOp::Nth),
        "cons" => Some(ListOp::Cons),
        "append" => Some(ListOp::Append),
        "reverse" => Some(ListOp::Reverse),
        "range" => Some(ListOp::Range),
        "slice" => Some(ListOp::Slice),
        "index-of" => Some(ListOp::IndexOf),
        "contains" => Some(ListOp::Contains),
        "map" => Some(ListOp::Map),
        "filter" => Some(ListOp::Filter),
        "reduce" => Some(ListOp::Reduce),
        "for-each" => Some(ListOp::ForEach),
        "sort" => Some(ListOp::Sort),
        "flatten" => Some(ListOp::Flatten),
        _ => None,
    }
}

/// Lists as immutable values; every operation returns a new list.
pub struct List;

/// Position in a list of `len` elements, or a domain error naming both.
fn index(ident: &str, value: &Value, len: usize) -> Result<usize, Error> {
    let i = expect_int(ident, value)?;
    if i < 0 || i as usize >= len {
        return Err(Error::domain(
            ident,
            format!("index {i} out of range for length {len}"),
        ));
    }
    Ok(i as usize)
}

fn bound(ident: &str, value: &Value, len: usize) -> Result<usize, Error> {
    let i = expect_int(ident, value)?;
    if i < 0 || i as usize > len {
        return Err(Error::domain(
            ident,
            format!("bound {i} out of range for length {len}"),
        ));
    }
    Ok(i as usize)
}

fn natural_less(a: &Value, b: &Value) -> Result<bool, Error> {
    match (a, b) {
        (Value::Num(a), Value::Num(b)) => Ok(a < b),
        (Value::Str(a), Value::Str(b)) => Ok(a < b),
        _ => Err(Error::type_error(
            "sort",
            format!("cannot order {} `{a}` against {} `{b}`", a.type_name(), b.type_name()),
        )),
    }
}

/// Stable merge sort with a comparison that may fail.
fn merge_sort<F>(items: Vec<Value>, less: &mut F) -> Result<Vec<Value>, Error>
where
    F: FnMut(&Value, &Value) -> Result<bool, Error>,
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort(left, less)?;
    let right = merge_sort(right, less)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => less(r, l)?,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    Ok(merged)
}

fn flatten_into(out: &mut Vec<Value>, items: &[Value]) {
    for item in items {
        match item {
            Value::List(inner) => flatten_into(out, inner),
            other => out.push(other.clone()),
        }
    }
}

impl Library for List {
    fn name(&self) -> &'static str {
        "list"
    }

    fn owns(&self, ident: &str) -> bool {
        list_op_of_str(ident).is_some()
    }

    fn apply(&self, interp: &mut Interpreter, ident: &str, args: Vec<Value>) -> Result<Value, Error> {
        let op = list_op_of_str(ident).ok_or_else(|| Error::Unbound(ident.to_string()))?;
        match op {
            ListOp::ListP => {
                expect_arity(ident, &args, 1)?;
                Ok(Value::Bool(matches!(args[0], Value::List(_))))
            }
            ListOp::EmptyP | ListOp::Length => {
                expect_arity(ident, &args, 1)?;
                let len = match &args[0] {
                    Value::List(items) => items.len(),
                    Value::Str(s) => s.chars().count(),
                    other => return Err(Error::requires(ident, "list or string", other)),
                };
                Ok(if op == ListOp::Length {
                    Value::Num(len as f64)
                } else {
                    Value::Bool(len == 0)
                })
            }
            ListOp::First | ListOp::Last => {
                expect_arity(ident, &args, 1)?;
                let items = expect_list(ident, &args[0])?;
                let item = if op == ListOp::First { items.first() } else { items.last() };
                item.cloned()
                    .ok_or_else(|| Error::domain(ident, "empty list"))
            }
            ListOp::Rest => {
                expect_arity(ident, &args, 1)?;
                let items = expect_list(ident, &args[0])?;
                Ok(Value::List(items.iter().skip(1).cloned().collect()))
            }
            ListOp::Nth => {
                expect_arity(ident, &args, 2)?;
                let items = expect_list(ident, &args[0])?;
                let i = index(ident, &args[1], items.len())?;
                Ok(items[i].clone())
            }
            ListOp::Cons => {
                expect_arity(ident, &args, 2)?;
                let tail = expect_list(ident, &args[1])?;
                let mut items = Vec::with_capacity(tail.len() + 1);
                items.push(args[0].clone());
                items.extend_from_slice(tail);
                Ok(Value::List(items))
            }
            ListOp::Append => {
                let mut items = Vec::new();
                for arg in &args {
                    items.extend_from_slice(expect_list(ident, arg)?);
                }
                Ok(Value::List(items))
            }
            ListOp::Reverse => {
                expect_arity(ident, &args, 1)?;
                let items = expect_list(ident, &args[0])?;
                Ok(Value::List(items.iter().rev().cloned().collect()))
            }
            ListOp::Range => {
                expect_arity_range(ident, &args, 1, Some(3))?;
                let ns = args
                    .iter()
                    .map(|arg| expect_num(ident, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let (start, end, step) = match ns.as_slice() {
                    [end] => (0.0, *end, 1.0),
                    [start, end] => (*start, *end, 1.0),
                    [start, end, step] => (*start, *end, *step),
                    _ => return Err(Error::arity_range(ident, 1, Some(3), ns.len())),
                };
                if step == 0.0 || !step.is_finite() {
                    return Err(Error::domain(ident, "step must be a non-zero number"));
                }
                if !start.is_finite() || !end.is_finite() {
                    return Err(Error::domain(ident, "bounds must be finite numbers"));
                }
                let count = ((end - start) / step).ceil().max(0.0);
                if count > MAX_RANGE_LEN as f64 {
                    return Err(Error::domain(
                        ident,
                        format!("{count} elements exceeds the limit of {MAX_RANGE_LEN}"),
                    ));
                }
                let items = (0..count as usize)
                    .map(|i| start + i as f64 * step)
                    .take_while(|n| if step > 0.0 { *n < end } else { *n > end })
                    .map(Value::Num)
                    .collect();
                Ok(Value::List(items))
            }
            ListOp::Slice => {
                expect_arity_range(ident, &args, 2, Some(3))?;
                let items = expect_list(ident, &args[0])?;
                let start = bound(ident, &args[1], items.len())?;
                let end = match args.get(2) {
                    Some(end) => bound(ident, end, items.len())?,
                    None => items.len(),
                };
                if start > end {
                    return Err(Error::domain(ident, format!("start {start} is past end {end}")));
                }
                Ok(Value::List(items[start..end].to_vec()))
            }
            ListOp::IndexOf | ListOp::Contains => {
                expect_arity(ident, &args, 2)?;
                let items = expect_list(ident, &args[0])?;
                let position = items.iter().position(|item| *item == args[1]);
                Ok(if op == ListOp::Contains {
                    Value::Bool(position.is_some())
                } else {
                    Value::Num(position.map_or(-1.0, |i| i as f64))
                })
            }
            ListOp::Map | ListOp::Filter | ListOp::ForEach => {
                expect_arity(ident, &args, 2)?;
                let f = expect_callable(ident, &args[0])?;
                let items = expect_list(ident, &args[1])?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let result = interp.call_value(f, vec![item.clone()])?;
                    match op {
                        ListOp::Map => out.push(result),
                        ListOp::Filter if !result.is_faulty() => out.push(item.clone()),
                        _ => {}
                    }
                }
                Ok(if op == ListOp::ForEach {
                    Value::Null
                } else {
                    Value::List(out)
                })
            }
            ListOp::Reduce => {
                expect_arity(ident, &args, 3)?;
                let f = expect_callable(ident, &args[0])?;
                let items = expect_list(ident, &args[2])?;
                let mut acc = args[1].clone();
                for item in items {
                    acc = interp.call_value(f, vec![acc, item.clone()])?;
                }
                Ok(acc)
            }
            ListOp::Sort => {
                expect_arity_range(ident, &args, 1, Some(2))?;
                let items = expect_list(ident, &args[0])?.to_vec();
                let sorted = match args.get(1) {
                    Some(cmp) => {
                        let cmp = expect_callable(ident, cmp)?;
                        merge_sort(items, &mut |a: &Value, b: &Value| {
                            Ok(!interp.call_value(cmp, vec![a.clone(), b.clone()])?.is_faulty())
                        })?
                    }
                    None => merge_sort(items, &mut natural_less)?,
                };
                Ok(Value::List(sorted))
            }
            ListOp::Flatten => {
                expect_arity(ident, &args, 1)?;
                let mut out = Vec::new();
                flatten_into(&mut out, expect_list(ident, &args[0])?);
                Ok(Value::List(out))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::interpret::Interpreter;
    use crate::library::{HostRegistry, Libraries, DEFAULT_LIBRARIES};
    use crate::parse::parse;
    use crate::print_handler::Printer;
    use crate::symtab::Env;

    fn run(src: &str) -> Result<String, String> {
        let libraries = Libraries::activate(DEFAULT_LIBRARIES, &HostRegistry::default()).unwrap();
        Interpreter::new(libraries, Printer::Silent)
            .run(&parse(src).unwrap(), &Env::new())
            .map(|v| v.to_string())
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_accessors() {
        let cases = [
            ("(list? [1])", "true"),
            ("(list? \"a\")", "false"),
            ("(empty? ())", "true"),
            ("(empty? \"\")", "true"),
            ("(length [1 2 3])", "3"),
            ("(length \"héllo\")", "5"),
            ("(first '(a b))", "a"),
            ("(last [1 2 3])", "3"),
            ("(rest [1 2 3])", "(2 3)"),
            ("(rest [])", "()"),
            ("(nth [10 20 30] 1)", "20"),
        ];
        for (src, expected) in cases {
            assert_eq!(run(src), Ok(expected.to_string()), "{src}");
        }
    }

    #[test]
    fn test_domain_errors() {
        let cases = [
            ("(first [])", "first: empty list"),
            ("(last ())", "last: empty list"),
            ("(nth [1 2] 2)", "nth: index 2 out of range for length 2"),
            ("(nth [1 2] -1)", "nth: index -1 out of range for length 2"),
            ("(nth [1 2] 0.5)", "nth: requires integer, got number `0.5`"),
            ("(slice [1 2 3] 2 1)", "slice: start 2 is past end 1"),
            ("(slice [1 2 3] 0 4)", "slice: bound 4 out of range for length 3"),
            ("(range 0 5 0)", "range: step must be a non-zero number"),
            (
                "(range 0 1000000000000)",
                "range: 1000000000000 elements exceeds the limit of 16777216",
            ),
            ("(range 0 (pow 10 400))", "range: bounds must be finite numbers"),
            ("(first 5)", "first: requires list, got number `5`"),
        ];
        for (src, expected) in cases {
            assert_eq!(run(src), Err(expected.to_string()), "{src}");
        }
    }

    #[test]
    fn test_construction() {
        let cases = [
            ("(cons 0 [1 2])", "(0 1 2)"),
            ("(append [1] [] [2 3])", "(1 2 3)"),
            ("(append)", "()"),
            ("(reverse [1 2 3])", "(3 2 1)"),
            ("(range 4)", "(0 1 2 3)"),
            ("(range 2 5)", "(2 3 4)"),
            ("(range 5 0 -2)", "(5 3 1)"),
            ("(range 0 1 0.25)", "(0 0.25 0.5 0.75)"),
            ("(range 0 0.3 0.1)", "(0 0.1 0.2)"),
            ("(range 3 1)", "()"),
            // a step below the float spacing at the start still terminates
            ("(< (length (range 100000000000000000000 100000000000000100000)) 100000)", "true"),
            ("(slice [1 2 3 4] 1 3)", "(2 3)"),
            ("(slice [1 2 3 4] 2)", "(3 4)"),
            ("(index-of [\"a\" \"b\"] \"b\")", "1"),
            ("(index-of [1 2] 3)", "-1"),
            ("(contains [[1] [2]] [2])", "true"),
            ("(flatten [1 [2 [3 []]] 4])", "(1 2 3 4)"),
        ];
        for (src, expected) in cases {
            assert_eq!(run(src), Ok(expected.to_string()), "{src}");
        }
    }

    #[test]
    fn test_higher_order() {
        let cases = [
            ("(map (lambda (x) (* x x)) [1 2 3])", "(1 4 9)"),
            ("(map abs [-1 2 -3])", "(1 2 3)"),
            ("(filter odd? (range 6))", "(1 3 5)"),
            ("(reduce + 0 [1 2 3 4])", "10"),
            ("(reduce (lambda (acc x) (cons x acc)) () [1 2 3])", "(3 2 1)"),
            ("(let n 0) (for-each (lambda (x) (set n (+ n x))) [1 2 3]) n", "6"),
            ("(for-each print [])", "null"),
        ];
        for (src, expected) in cases {
            assert_eq!(run(src), Ok(expected.to_string()), "{src}");
        }
        assert_eq!(
            run("(map 1 [1])"),
            Err("map: requires function, got number `1`".to_string())
        );
    }

    #[test]
    fn test_sort() {
        let cases = [
            ("(sort [3 1 2])", "(1 2 3)"),
            ("(sort [\"pear\" \"apple\" \"fig\"])", "(\"apple\" \"fig\" \"pear\")"),
            ("(sort [3 1 2] >)", "(3 2 1)"),
            ("(sort [])", "()"),
            (
                "(sort [[2 \"b\"] [1 \"x\"] [2 \"a\"]] (lambda (a b) (< (first a) (first b))))",
                "((1 \"x\") (2 \"b\") (2 \"a\"))",
            ),
        ];
        for (src, expected) in cases {
            assert_eq!(run(src), Ok(expected.to_string()), "{src}");
        }
        assert_eq!(
            run("(sort [1 \"a\"])"),
            Err("sort: cannot order string `a` against number `1`".to_string())
        );
    }
}
