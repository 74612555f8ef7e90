//! Built-in libraries and the dispatch contract they share.
//!
//! A library owns a set of identifiers. When an application's leading symbol
//! is owned by an active library, the first owner in activation order gets
//! the call; environment bindings never shadow a library callee.

use std::rc::Rc;

use crate::ast::Expr;
use crate::error::Error;
use crate::interpret::Interpreter;
use crate::symtab::Env;
use crate::value::Value;

mod corelib;
mod date;
mod ext;
mod list;
mod math;
mod number;
mod string;

pub use self::ext::{HostFunction, HostLibrary, HostRegistry};

/// Libraries activated when the caller does not choose.
pub const DEFAULT_LIBRARIES: &[&str] = &["core", "date", "list", "math", "number", "string"];

pub trait Library {
    fn name(&self) -> &'static str;

    fn owns(&self, ident: &str) -> bool;

    /// Apply `ident` to already evaluated arguments.
    fn apply(&self, interp: &mut Interpreter, ident: &str, args: Vec<Value>) -> Result<Value, Error>;

    /// What `ident` denotes in value position when it names a constant
    /// instead of a function.
    fn constant(&self, _ident: &str) -> Option<Value> {
        None
    }

    /// Dispatch an application node. Operands are evaluated left to right
    /// in `env` unless the library needs them unevaluated.
    fn call(&self, interp: &mut Interpreter, ident: &str, args: &[Expr], env: &Env) -> Result<Value, Error> {
        let args = interp.eval_args(args, env)?;
        self.apply(interp, ident, args)
    }
}

/// The active libraries, in activation order.
#[derive(Clone, Default)]
pub struct Libraries {
    modules: Vec<Rc<dyn Library>>,
}

impl Libraries {
    /// Build the named modules in order. `ext` exposes `host`; it is appended
    /// automatically when host functions exist and it was not listed.
    pub fn activate<S: AsRef<str>>(names: &[S], host: &HostRegistry) -> Result<Self, Error> {
        let mut modules: Vec<Rc<dyn Library>> = Vec::with_capacity(names.len() + 1);
        for name in names {
            let module: Rc<dyn Library> = match name.as_ref() {
                "core" => Rc::new(self::corelib::Core),
                "date" => Rc::new(self::date::Date),
                "list" => Rc::new(self::list::List),
                "math" => Rc::new(self::math::Math),
                "number" => Rc::new(self::number::Number),
                "string" => Rc::new(self::string::Strings),
                "ext" => Rc::new(HostLibrary::new(host.clone())),
                unknown => return Err(Error::Config(format!("unknown library `{unknown}`"))),
            };
            if modules.iter().any(|m| m.name() == module.name()) {
                continue;
            }
            modules.push(module);
        }
        if !host.is_empty() && !modules.iter().any(|m| m.name() == "ext") {
            modules.push(Rc::new(HostLibrary::new(host.clone())));
        }
        let libraries = Libraries { modules };
        tracing::debug!(libraries = ?libraries.names(), "activated libraries");
        Ok(libraries)
    }

    /// First active library owning `ident`.
    pub fn owner(&self, ident: &str) -> Option<Rc<dyn Library>> {
        self.modules.iter().find(|m| m.owns(ident)).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }
}

// Argument helpers shared by the modules. Every error names the identifier.

pub(crate) fn expect_arity(ident: &str, args: &[Value], n: usize) -> Result<(), Error> {
    if args.len() != n {
        return Err(Error::arity(ident, n, args.len()));
    }
    Ok(())
}

pub(crate) fn expect_arity_range(
    ident: &str,
    args: &[Value],
    min: usize,
    max: Option<usize>,
) -> Result<(), Error> {
    let n = args.len();
    if n < min || max.map_or(false, |max| n > max) {
        return Err(Error::arity_range(ident, min, max, n));
    }
    Ok(())
}

pub(crate) fn expect_num(ident: &str, value: &Value) -> Result<f64, Error> {
    match value {
        Value::Num(n) => Ok(*n),
        other => Err(Error::requires(ident, "number", other)),
    }
}

/// A number with no fractional part, as an index or count.
pub(crate) fn expect_int(ident: &str, value: &Value) -> Result<i64, Error> {
    let n = expect_num(ident, value)?;
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(Error::requires(ident, "integer", value));
    }
    Ok(n as i64)
}

pub(crate) fn expect_str<'v>(ident: &str, value: &'v Value) -> Result<&'v str, Error> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(Error::requires(ident, "string", other)),
    }
}

pub(crate) fn expect_list<'v>(ident: &str, value: &'v Value) -> Result<&'v [Value], Error> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(Error::requires(ident, "list", other)),
    }
}

pub(crate) fn expect_callable<'v>(ident: &str, value: &'v Value) -> Result<&'v Value, Error> {
    if value.is_callable() {
        Ok(value)
    } else {
        Err(Error::requires(ident, "function", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_order() {
        let libs = Libraries::activate(&["math", "core"], &HostRegistry::default()).unwrap();
        assert_eq!(libs.names(), vec!["math", "core"]);
        assert!(libs.owner("+").is_some());
        assert!(libs.owner("string-length").is_none());
        assert_eq!(libs.owner("print").unwrap().name(), "core");
    }

    #[test]
    fn test_default_set() {
        let libs = Libraries::activate(DEFAULT_LIBRARIES, &HostRegistry::default()).unwrap();
        assert_eq!(
            libs.names(),
            vec!["core", "date", "list", "math", "number", "string"]
        );
    }

    #[test]
    fn test_unknown_library() {
        let err = Libraries::activate(&["core", "net"], &HostRegistry::default())
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "configuration error: unknown library `net`");
    }

    #[test]
    fn test_ext_appended_for_host_functions() {
        let mut host = HostRegistry::default();
        host.register("answer", |_args: Vec<Value>| Ok(Value::Num(42.0)));
        let libs = Libraries::activate(&["core"], &host).unwrap();
        assert_eq!(libs.names(), vec!["core", "ext"]);
        assert!(libs.owner("answer").is_some());
    }

    #[test]
    fn test_helpers() {
        assert_eq!(expect_num("abs", &Value::Num(2.0)), Ok(2.0));
        assert_eq!(
            expect_int("nth", &Value::Num(1.5)).unwrap_err().to_string(),
            "nth: requires integer, got number `1.5`"
        );
        assert_eq!(
            expect_list("first", &Value::Num(1.0)).unwrap_err().to_string(),
            "first: requires list, got number `1`"
        );
        assert!(expect_arity_range("if", &[Value::Null], 2, Some(3)).is_err());
        assert!(expect_arity("not", &[Value::Null], 1).is_ok());
    }
}
