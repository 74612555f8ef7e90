use super::{expect_arity, expect_arity_range, expect_int, expect_list, expect_str, Library};
use crate::error::Error;
use crate::interpret::Interpreter;
use crate::value::Value;

/// Bytes a generated string may hold.
pub const MAX_STRING_LEN: usize = 1 << 28;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StringOp {
    /// string?
    StringP,
    /// string-length
    Length,
    /// string-append
    Append,
    Substring,
    /// string-upcase
    Upcase,
    /// string-downcase
    Downcase,
    /// string-trim
    Trim,
    /// string-split
    Split,
    /// string-join
    Join,
    /// string-replace
    Replace,
    /// string-index-of
    IndexOf,
    /// string-starts-with?
    StartsWith,
    /// string-ends-with?
    EndsWith,
    /// string-repeat
    Repeat,
    /// char-at
    CharAt,
}

pub fn string_op_of_str(s: &str) -> Option<StringOp> {
    match s {
        "string?" => Some(StringOp::StringP),
        "string-length" => Some(StringOp::Length),
        "string-append" => Some(StringOp::Append),
        "substring" => Some(StringOp::Substring),
        "string-upcase" => Some(StringOp::Upcase),
        "string-downcase" => Some(StringOp::Downcase),
        "string-trim" => Some(StringOp::Trim),
        "string-split" => Some(StringOp::Split),
        "string-join" => Some(StringOp::Join),
        "string-replace" => Some(StringOp::Replace),
        "string-index-of" => Some(StringOp::IndexOf),
        "string-starts-with?" => Some(StringOp::StartsWith),
        "string-ends-with?" => Some(StringOp::EndsWith),
        "string-repeat" => Some(StringOp::Repeat),
        "char-at" => Some(StringOp::CharAt),
        _ => None,
    }
}

/// String operations. Positions and lengths count characters, not bytes.
pub struct Strings;

fn char_bound(ident: &str, value: &Value, len: usize) -> Result<usize, Error> {
    let i = expect_int(ident, value)?;
    if i < 0 || i as usize > len {
        return Err(Error::domain(
            ident,
            format!("position {i} out of range for length {len}"),
        ));
    }
    Ok(i as usize)
}

impl Library for Strings {
    fn name(&self) -> &'static str {
        "string"
    }

    fn owns(&self, ident: &str) -> bool {
        string_op_of_str(ident).is_some()
    }

    fn apply(&self, _interp: &mut Interpreter, ident: &str, args: Vec<Value>) -> Result<Value, Error> {
        let op = string_op_of_str(ident).ok_or_else(|| Error::Unbound(ident.to_string()))?;
        match op {
            StringOp::StringP => {
                expect_arity(ident, &args, 1)?;
                Ok(Value::Bool(matches!(args[0], Value::Str(_))))
            }
            StringOp::Length => {
                expect_arity(ident, &args, 1)?;
                Ok(Value::Num(expect_str(ident, &args[0])?.chars().count() as f64))
            }
            StringOp::Append => {
                let mut out = String::new();
                for arg in &args {
                    out.push_str(expect_str(ident, arg)?);
                }
                Ok(Value::Str(out))
            }
            StringOp::Substring => {
                expect_arity_range(ident, &args, 2, Some(3))?;
                let s = expect_str(ident, &args[0])?;
                let len = s.chars().count();
                let start = char_bound(ident, &args[1], len)?;
                let end = match args.get(2) {
                    Some(end) => char_bound(ident, end, len)?,
                    None => len,
                };
                if start > end {
                    return Err(Error::domain(ident, format!("start {start} is past end {end}")));
                }
                Ok(Value::Str(s.chars().skip(start).take(end - start).collect()))
            }
            StringOp::Upcase | StringOp::Downcase | StringOp::Trim => {
                expect_arity(ident, &args, 1)?;
                let s = expect_str(ident, &args[0])?;
                Ok(Value::Str(match op {
                    StringOp::Upcase => s.to_uppercase(),
                    StringOp::Downcase => s.to_lowercase(),
                    _ => s.trim().to_string(),
                }))
            }
            StringOp::Split => {
                expect_arity_range(ident, &args, 1, Some(2))?;
                let s = expect_str(ident, &args[0])?;
                let parts: Vec<Value> = match args.get(1) {
                    Some(sep) => match expect_str(ident, sep)? {
                        // an empty separator splits into characters
                        "" => s.chars().map(|c| Value::Str(c.to_string())).collect(),
                        sep => s.split(sep).map(Value::from).collect(),
                    },
                    None => s.split_whitespace().map(Value::from).collect(),
                };
                Ok(Value::List(parts))
            }
            StringOp::Join => {
                expect_arity_range(ident, &args, 1, Some(2))?;
                let items = expect_list(ident, &args[0])?;
                let sep = match args.get(1) {
                    Some(sep) => expect_str(ident, sep)?,
                    None => "",
                };
                let parts: Vec<String> = items.iter().map(Value::to_string).collect();
                Ok(Value::Str(parts.join(sep)))
            }
            StringOp::Replace => {
                expect_arity(ident, &args, 3)?;
                let s = expect_str(ident, &args[0])?;
                let from = expect_str(ident, &args[1])?;
                let to = expect_str(ident, &args[2])?;
                if from.is_empty() {
                    return Err(Error::domain(ident, "pattern must not be empty"));
                }
                Ok(Value::Str(s.replace(from, to)))
            }
            StringOp::IndexOf => {
                expect_arity(ident, &args, 2)?;
                let s = expect_str(ident, &args[0])?;
                let needle = expect_str(ident, &args[1])?;
                let position = s
                    .find(needle)
                    .map_or(-1.0, |byte| s[..byte].chars().count() as f64);
                Ok(Value::Num(position))
            }
            StringOp::StartsWith | StringOp::EndsWith => {
                expect_arity(ident, &args, 2)?;
                let s = expect_str(ident, &args[0])?;
                let affix = expect_str(ident, &args[1])?;
                Ok(Value::Bool(if op == StringOp::StartsWith {
                    s.starts_with(affix)
                } else {
                    s.ends_with(affix)
                }))
            }
            StringOp::Repeat => {
                expect_arity(ident, &args, 2)?;
                let s = expect_str(ident, &args[0])?;
                let n = expect_int(ident, &args[1])?;
                if n < 0 {
                    return Err(Error::domain(ident, format!("count must not be negative, got {n}")));
                }
                match s.len().checked_mul(n as usize) {
                    Some(len) if len <= MAX_STRING_LEN => Ok(Value::Str(s.repeat(n as usize))),
                    _ => Err(Error::domain(ident, "result too large")),
                }
            }
            StringOp::CharAt => {
                expect_arity(ident, &args, 2)?;
                let s = expect_str(ident, &args[0])?;
                let i = expect_int(ident, &args[1])?;
                let len = s.chars().count();
                usize::try_from(i)
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| Value::Str(c.to_string()))
                    .ok_or_else(|| {
                        Error::domain(ident, format!("index {i} out of range for length {len}"))
                    })
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
    fn test_strings() {
        let cases = [
            ("(string? \"a\")", "true"),
            ("(string? 'a)", "false"),
            ("(string-length \"naïve\")", "5"),
            ("(string-append \"ab\" \"\" \"c\")", "abc"),
            ("(substring \"héllo\" 1 3)", "él"),
            ("(substring \"hello\" 2)", "llo"),
            ("(string-upcase \"MiXed\")", "MIXED"),
            ("(string-downcase \"MiXed\")", "mixed"),
            ("(string-trim \"  pad \")", "pad"),
            ("(string-split \"a,b,,c\" \",\")", "(\"a\" \"b\" \"\" \"c\")"),
            ("(string-split \" one  two \")", "(\"one\" \"two\")"),
            ("(string-split \"abc\" \"\")", "(\"a\" \"b\" \"c\")"),
            ("(string-join [\"a\" 1 'b] \"-\")", "a-1-b"),
            ("(string-join [\"x\" \"y\"])", "xy"),
            ("(string-replace \"a-b-c\" \"-\" \"+\")", "a+b+c"),
            ("(string-index-of \"héllo\" \"l\")", "2"),
            ("(string-index-of \"abc\" \"z\")", "-1"),
            ("(string-starts-with? \"prefix\" \"pre\")", "true"),
            ("(string-ends-with? \"prefix\" \"pre\")", "false"),
            ("(string-repeat \"ab\" 3)", "ababab"),
            ("(char-at \"héllo\" 1)", "é"),
        ];
        for (src, expected) in cases {
            assert_eq!(run(src), Ok(expected.to_string()), "{src}");
        }
    }

    #[test]
    fn test_string_errors() {
        let cases = [
            ("(string-length 5)", "string-length: requires string, got number `5`"),
            ("(substring \"abc\" 2 1)", "substring: start 2 is past end 1"),
            ("(substring \"abc\" 0 9)", "substring: position 9 out of range for length 3"),
            ("(char-at \"abc\" 3)", "char-at: index 3 out of range for length 3"),
            ("(char-at \"abc\" -1)", "char-at: index -1 out of range for length 3"),
            ("(string-repeat \"a\" -2)", "string-repeat: count must not be negative, got -2"),
            ("(string-repeat \"ab\" 9000000000000000000)", "string-repeat: result too large"),
            ("(string-repeat \"ab\" 200000000)", "string-repeat: result too large"),
            ("(string-replace \"a\" \"\" \"b\")", "string-replace: pattern must not be empty"),
        ];
        for (src, expected) in cases {
            assert_eq!(run(src), Err(expected.to_string()), "{src}");
        }
    }
}
