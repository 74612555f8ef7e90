use derive_more::Display;
use serde_derive::{Deserialize, Serialize};

/// Reserved leading keywords whose operands follow bespoke evaluation rules.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Keyword {
    /// let
    #[display(fmt = "let")]
    Let,
    /// set
    #[display(fmt = "set")]
    Set,
    /// delete
    #[display(fmt = "delete")]
    Delete,
    /// inc
    #[display(fmt = "inc")]
    Inc,
    /// dec
    #[display(fmt = "dec")]
    Dec,
    /// lambda
    #[display(fmt = "lambda")]
    Lambda,
    /// function
    #[display(fmt = "function")]
    Function,
    /// if
    #[display(fmt = "if")]
    If,
    /// unless
    #[display(fmt = "unless")]
    Unless,
    /// when
    #[display(fmt = "when")]
    When,
    /// cond
    #[display(fmt = "cond")]
    Cond,
    /// case
    #[display(fmt = "case")]
    Case,
    /// block
    #[display(fmt = "block")]
    Block,
    /// for
    #[display(fmt = "for")]
    For,
    /// while
    #[display(fmt = "while")]
    While,
    /// do
    #[display(fmt = "do")]
    Do,
    /// repeat
    #[display(fmt = "repeat")]
    Repeat,
    /// enum
    #[display(fmt = "enum")]
    Enum,
    /// quote
    #[display(fmt = "quote")]
    Quote,
    /// quasiquote
    #[display(fmt = "quasiquote")]
    Quasiquote,
    /// unquote
    #[display(fmt = "unquote")]
    Unquote,
    /// unquote-splicing
    #[display(fmt = "unquote-splicing")]
    UnquoteSplicing,
    /// try
    #[display(fmt = "try")]
    Try,
    /// throw
    #[display(fmt = "throw")]
    Throw,
    /// debug
    #[display(fmt = "debug")]
    Debug,
    /// import
    #[display(fmt = "import")]
    Import,
    /// break
    #[display(fmt = "break")]
    Break,
    /// continue
    #[display(fmt = "continue")]
    Continue,
}

pub fn keyword_of_str(s: &str) -> Option<Keyword> {
    use Keyword::*;
    match s {
        "let" => Some(Let),
        "set" => Some(Set),
        "delete" => Some(Delete),
        "inc" => Some(Inc),
        "dec" => Some(Dec),
        "lambda" => Some(Lambda),
        "function" => Some(Function),
        "if" => Some(If),
        "unless" => Some(Unless),
        "when" => Some(When),
        "cond" => Some(Cond),
        "case" => Some(Case),
        "block" => Some(Block),
        "for" => Some(For),
        "while" => Some(While),
        "do" => Some(Do),
        "repeat" => Some(Repeat),
        "enum" => Some(Enum),
        "quote" => Some(Quote),
        "quasiquote" => Some(Quasiquote),
        "unquote" => Some(Unquote),
        "unquote-splicing" => Some(UnquoteSplicing),
        "try" => Some(Try),
        "throw" => Some(Throw),
        "debug" => Some(Debug),
        "import" => Some(Import),
        "break" => Some(Break),
        "continue" => Some(Continue),
        _ => None,
    }
}

/// A node of the IL tree produced by the nester.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Num(f64),
    /// A bare name, resolved at evaluation time.
    Sym(String),
    /// A literal string.
    Str(String),
    /// The empty form `()`.
    Nil,
    /// `[a b]` or `(list a b)`
    List(Vec<Expr>),
    /// `'x`
    Quote(Box<Expr>),
    /// `` `x ``
    Quasi(Box<Expr>),
    /// `,x`
    Unquote(Box<Expr>),
    /// `,@x`
    Splice(Box<Expr>),
    Special(Keyword, Vec<Expr>),
    /// (f args ...)
    Call(Box<Expr>, Vec<Expr>),
}

impl Expr {
    /// Classify the contents of a closed form. The shape decided here is the
    /// only thing the evaluator looks at.
    pub fn form(mut items: Vec<Expr>) -> Expr {
        if items.is_empty() {
            return Expr::Nil;
        }
        let head = items.remove(0);
        let name = match &head {
            Expr::Sym(name) => name.clone(),
            _ => return Expr::Call(Box::new(head), items),
        };
        match (name.as_str(), items.len()) {
            ("list", _) => Expr::List(items),
            ("quote", 1) => Expr::Quote(Box::new(items.remove(0))),
            ("quasiquote", 1) => Expr::Quasi(Box::new(items.remove(0))),
            ("unquote", 1) => Expr::Unquote(Box::new(items.remove(0))),
            ("unquote-splicing", 1) => Expr::Splice(Box::new(items.remove(0))),
            _ => match keyword_of_str(&name) {
                Some(keyword) => Expr::Special(keyword, items),
                None => Expr::Call(Box::new(head), items),
            },
        }
    }

    pub fn as_sym(&self) -> Option<&str> {
        if let Expr::Sym(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// The elements of a compound node as data, including the tag that the
    /// nester folded into the node kind. `None` for atoms.
    pub fn datum_items(&self) -> Option<Vec<Expr>> {
        let tagged = |tag: &str, rest: &[Expr]| {
            let mut items = Vec::with_capacity(rest.len() + 1);
            items.push(Expr::Sym(tag.to_string()));
            items.extend(rest.iter().cloned());
            items
        };
        match self {
            Expr::Num(_) | Expr::Sym(_) | Expr::Str(_) => None,
            Expr::Nil => Some(Vec::new()),
            Expr::List(items) => Some(tagged("list", items)),
            Expr::Quote(x) => Some(tagged("quote", std::slice::from_ref(x.as_ref()))),
            Expr::Quasi(x) => Some(tagged("quasiquote", std::slice::from_ref(x.as_ref()))),
            Expr::Unquote(x) => Some(tagged("unquote", std::slice::from_ref(x.as_ref()))),
            Expr::Splice(x) => Some(tagged("unquote-splicing", std::slice::from_ref(x.as_ref()))),
            Expr::Special(keyword, ops) => Some(tagged(&keyword.to_string(), ops)),
            Expr::Call(head, args) => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(head.as_ref().clone());
                items.extend(args.iter().cloned());
                Some(items)
            }
        }
    }

    /// The elements as written between the brackets: like
    /// [`Expr::datum_items`] but without the `list` tag injected by `[`.
    pub fn elements(&self) -> Option<Vec<Expr>> {
        match self {
            Expr::List(items) => Some(items.clone()),
            _ => self.datum_items(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sym(s: &str) -> Expr {
        Expr::Sym(s.to_string())
    }

    #[test]
    fn test_form_classification() {
        let test_cases = [
            (vec![], Expr::Nil),
            (
                vec![sym("list"), Expr::Num(1.0)],
                Expr::List(vec![Expr::Num(1.0)]),
            ),
            (vec![sym("quote"), sym("a")], Expr::Quote(Box::new(sym("a")))),
            (
                vec![sym("quote"), sym("a"), sym("b")],
                Expr::Special(Keyword::Quote, vec![sym("a"), sym("b")]),
            ),
            (
                vec![sym("let"), sym("x"), Expr::Num(1.0)],
                Expr::Special(Keyword::Let, vec![sym("x"), Expr::Num(1.0)]),
            ),
            (vec![sym("break")], Expr::Special(Keyword::Break, vec![])),
            (
                vec![sym("+"), Expr::Num(1.0), Expr::Num(2.0)],
                Expr::Call(Box::new(sym("+")), vec![Expr::Num(1.0), Expr::Num(2.0)]),
            ),
            (
                vec![Expr::Num(1.0), Expr::Num(2.0)],
                Expr::Call(Box::new(Expr::Num(1.0)), vec![Expr::Num(2.0)]),
            ),
        ];
        for (items, expected) in test_cases {
            assert_eq!(Expr::form(items), expected);
        }
    }

    #[test]
    fn test_keyword_names_round_trip() {
        for name in ["let", "unquote-splicing", "while", "import", "continue"] {
            let keyword = keyword_of_str(name).unwrap();
            assert_eq!(keyword.to_string(), name);
        }
        assert_eq!(keyword_of_str("print"), None);
    }

    #[test]
    fn test_items() {
        let special = Expr::Special(Keyword::If, vec![sym("c"), Expr::Num(1.0)]);
        assert_eq!(
            special.datum_items(),
            Some(vec![sym("if"), sym("c"), Expr::Num(1.0)])
        );
        let list = Expr::List(vec![sym("x"), sym("y")]);
        assert_eq!(
            list.datum_items(),
            Some(vec![sym("list"), sym("x"), sym("y")])
        );
        assert_eq!(list.elements(), Some(vec![sym("x"), sym("y")]));
        assert_eq!(Expr::Num(3.0).elements(), None);
    }
}
