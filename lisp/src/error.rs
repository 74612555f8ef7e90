//! The single fault channel shared by the parser, the evaluator and the
//! libraries.

use thiserror::Error;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed source text or bracket nesting.
    #[error("parse error: {0}")]
    Parse(String),
    /// A symbol with neither an environment binding nor a library owner.
    #[error("unbound identifier `{0}`")]
    Unbound(String),
    #[error("{form}: {message}")]
    Arity { form: String, message: String },
    #[error("{form}: {message}")]
    Type { form: String, message: String },
    /// Division by zero, index out of range and friends.
    #[error("{form}: {message}")]
    Domain { form: String, message: String },
    #[error("`{0}` is already defined in this scope")]
    Redefinition(String),
    /// Payload of a user `throw`.
    #[error("{0}")]
    Thrown(Value),
    /// `break`/`continue` reached a position that is not a loop body.
    #[error("`{0}` used outside of a loop")]
    Control(&'static str),
    #[error("import failed: {0}")]
    Import(String),
    #[error("configuration error: {0}")]
    Config(String),
    /// Failure reported by an embedder-supplied host function.
    #[error("{0}")]
    Host(String),
    #[error("maximum call depth of {0} exceeded")]
    Depth(usize),
}

impl Error {
    /// Arity error for a form that takes exactly `expected` operands.
    pub fn arity(form: impl Into<String>, expected: usize, got: usize) -> Self {
        let plural = if expected == 1 { "" } else { "s" };
        Error::Arity {
            form: form.into(),
            message: format!("expects {expected} operand{plural}, got {got}"),
        }
    }

    /// Arity error for a form with a lower bound and an optional upper bound.
    pub fn arity_range(form: impl Into<String>, min: usize, max: Option<usize>, got: usize) -> Self {
        let message = match max {
            Some(max) if max == min => return Error::arity(form, min, got),
            Some(max) => format!("expects {min} to {max} operands, got {got}"),
            None => format!("expects at least {min} operand{}, got {got}", if min == 1 { "" } else { "s" }),
        };
        Error::Arity {
            form: form.into(),
            message,
        }
    }

    pub fn type_error(form: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Type {
            form: form.into(),
            message: message.into(),
        }
    }

    /// Type error of the shape "requires number, got `x`".
    pub fn requires(form: impl Into<String>, kind: &str, got: &Value) -> Self {
        Error::type_error(form, format!("requires {kind}, got {} `{}`", got.type_name(), got))
    }

    pub fn domain(form: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Domain {
            form: form.into(),
            message: message.into(),
        }
    }

    pub fn division_by_zero(form: impl Into<String>) -> Self {
        Error::domain(form, "division by zero")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let cases = [
            (Error::arity("let", 2, 3), "let: expects 2 operands, got 3"),
            (Error::arity("throw", 1, 0), "throw: expects 1 operand, got 0"),
            (
                Error::arity_range("if", 2, Some(3), 4),
                "if: expects 2 to 3 operands, got 4",
            ),
            (
                Error::arity_range("try", 2, None, 1),
                "try: expects at least 2 operands, got 1",
            ),
            (
                Error::requires("+", "number", &Value::Str("a".into())),
                "+: requires number, got string `a`",
            ),
            (Error::division_by_zero("/"), "/: division by zero"),
            (
                Error::Redefinition("a".into()),
                "`a` is already defined in this scope",
            ),
            (Error::Thrown(Value::Str("boom".into())), "boom"),
            (Error::Control("break"), "`break` used outside of a loop"),
        ];
        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }
}
