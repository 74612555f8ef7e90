//! Destination for user-visible output (`print`, `display`, `debug`).

use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Output sink, dispatched by variant.
#[derive(Clone, Default)]
pub enum Printer {
    /// Writes to stdout (default).
    #[default]
    Stdout,
    /// Captures into a shared buffer, for tests and embedding.
    Buffer(Rc<RefCell<String>>),
    /// Discards everything.
    Silent,
    /// Hands each piece of text to a caller-supplied function.
    Sink(Rc<dyn Fn(&str)>),
}

impl Debug for Printer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Printer::Stdout => "Stdout",
            Printer::Buffer(_) => "Buffer",
            Printer::Silent => "Silent",
            Printer::Sink(_) => "Sink",
        };
        write!(f, "Printer::{name}")
    }
}

impl Printer {
    pub fn buffer() -> Self {
        Printer::Buffer(Rc::new(RefCell::new(String::new())))
    }

    pub fn sink(f: impl Fn(&str) + 'static) -> Self {
        Printer::Sink(Rc::new(f))
    }

    /// Print a line (with newline). A sink receives the text alone.
    pub fn println(&self, msg: &str) {
        match self {
            Printer::Stdout => println!("{msg}"),
            Printer::Buffer(buf) => {
                let mut buf = buf.borrow_mut();
                buf.push_str(msg);
                buf.push('\n');
            }
            Printer::Silent => {}
            Printer::Sink(f) => f(msg),
        }
    }

    /// Print without newline.
    pub fn print(&self, msg: &str) {
        match self {
            Printer::Stdout => print!("{msg}"),
            Printer::Buffer(buf) => buf.borrow_mut().push_str(msg),
            Printer::Silent => {}
            Printer::Sink(f) => f(msg),
        }
    }

    /// Captured output; empty unless this is a buffer.
    pub fn output(&self) -> String {
        match self {
            Printer::Buffer(buf) => buf.borrow().clone(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_shared_between_clones() {
        let printer = Printer::buffer();
        let clone = printer.clone();
        clone.println("one");
        clone.print("two");
        assert_eq!(printer.output(), "one\ntwo");
    }

    #[test]
    fn test_sink() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            Printer::sink(move |msg| seen.borrow_mut().push(msg.to_string()))
        };
        sink.println("a");
        sink.print("b");
        assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(sink.output(), "");
    }
}
