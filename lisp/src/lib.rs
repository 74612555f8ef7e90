//! An embeddable interpreter for a small Lisp with `()`, `[]` and `{}`
//! brackets.
//!
//! Source text is tokenized, nested into IL trees, has its top-level imports
//! spliced in, and is evaluated against a fresh root environment. The result
//! comes back as a [`Value`], or as text through [`evaluate`].

mod forms;
mod lex;
mod stack;
pub mod ast;
pub mod closure;
pub mod error;
pub mod import;
pub mod interpret;
pub mod library;
pub mod parse;
pub mod print;
pub mod print_handler;
pub mod symtab;
pub mod value;

use std::sync::Once;

pub use crate::ast::{Expr, Keyword};
pub use crate::error::Error;
pub use crate::import::{FileFetch, Fetch, ImportCache, ImportResolver};
pub use crate::interpret::{Interpreter, DEFAULT_MAX_DEPTH};
pub use crate::library::{HostFunction, HostRegistry, DEFAULT_LIBRARIES};
pub use crate::print_handler::Printer;
pub use crate::value::Value;

use crate::import::{has_imports, splice_imports};
use crate::library::Libraries;
use crate::symtab::Env;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`. Does nothing when
/// `RUST_LOG` is unset; safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Everything an evaluation needs from its embedder.
pub struct Options {
    printer: Printer,
    libs: Vec<String>,
    host: HostRegistry,
    resolver: Option<Box<dyn ImportResolver>>,
    max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            printer: Printer::default(),
            libs: DEFAULT_LIBRARIES.iter().map(|name| name.to_string()).collect(),
            host: HostRegistry::default(),
            resolver: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_printer(mut self, printer: Printer) -> Self {
        self.printer = printer;
        self
    }

    /// Libraries to activate, in lookup order.
    pub fn with_libs<S: AsRef<str>>(mut self, libs: &[S]) -> Self {
        self.libs = libs.iter().map(|name| name.as_ref().to_string()).collect();
        self
    }

    pub fn with_host_function<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, Error> + 'static,
    {
        self.host.register(name, f);
        self
    }

    pub fn with_resolver(mut self, resolver: impl ImportResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Parse, resolve imports and evaluate `source`, returning the value of the
/// last top-level form.
pub fn run(source: &str, options: &mut Options) -> Result<Value, Error> {
    let mut program = parse::parse(source)?;
    if has_imports(&program) {
        // without a resolver the import node itself reports the problem
        if let Some(resolver) = options.resolver.as_deref_mut() {
            program = splice_imports(program, resolver)?;
        }
    }
    let libraries = Libraries::activate(options.libs.as_slice(), &options.host)?;
    let mut interp =
        Interpreter::new(libraries, options.printer.clone()).with_max_depth(options.max_depth);
    interp.run(&program, &Env::new())
}

/// Like [`run`], with the result rendered as text and faults as
/// `Error: <message>`.
pub fn evaluate(source: &str, options: &mut Options) -> String {
    match run(source, options) {
        Ok(value) => value.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "evaluation failed");
            format!("Error: {e}")
        }
    }
}

/// Evaluate and hand the result text to `callback`.
pub fn evaluate_with_callback<F>(source: &str, options: &mut Options, callback: F)
where
    F: FnOnce(String),
{
    callback(evaluate(source, options));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate() {
        let cases = [
            ("(+ 1 2 3)", "6"),
            ("", "null"),
            ("\"text\"", "text"),
            ("{let a 2} {let a 3}", "Error: `a` is already defined in this scope"),
            ("(+ 1", "Error: parse error: unexpected end of input, `(` is never closed"),
        ];
        for (src, expected) in cases {
            assert_eq!(evaluate(src, &mut Options::new().with_printer(Printer::Silent)), expected);
        }
    }

    #[test]
    fn test_callback() {
        let mut result = None;
        evaluate_with_callback("(* 6 7)", &mut Options::new(), |text| result = Some(text));
        assert_eq!(result.as_deref(), Some("42"));
    }

    #[test]
    fn test_unknown_library() {
        let mut options = Options::new().with_libs(&["core", "graphics"]);
        assert_eq!(
            evaluate("1", &mut options),
            "Error: configuration error: unknown library `graphics`"
        );
    }

    #[test]
    fn test_import_without_resolver() {
        assert!(evaluate("(import \"lib\")", &mut Options::new())
            .starts_with("Error: import failed:"));
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}
