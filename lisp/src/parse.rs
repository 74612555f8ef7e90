use std::iter::Peekable;
use std::vec::IntoIter;

use crate::ast::Expr;
use crate::error::Error;
use crate::lex::{tokenize, Delim, Token};
use crate::stack::ensure_sufficient_stack;

/// Brackets allowed to nest inside one another.
pub const MAX_NESTING: usize = 1024;

/// Consumes a token sequence one top-level form at a time.
pub struct ExprIterator {
    tokens: Peekable<IntoIter<Token>>,
    depth: usize,
}

impl ExprIterator {
    pub fn new(tokens: Vec<Token>) -> ExprIterator {
        ExprIterator {
            tokens: tokens.into_iter().peekable(),
            depth: 0,
        }
    }

    fn parse_form(&mut self, open: Delim) -> Result<Expr, Error> {
        if self.depth >= MAX_NESTING {
            return Err(Error::Parse(format!(
                "brackets nested more than {MAX_NESTING} deep"
            )));
        }
        self.depth += 1;
        let form = ensure_sufficient_stack(|| self.parse_items(open));
        self.depth -= 1;
        form
    }

    fn parse_items(&mut self, open: Delim) -> Result<Expr, Error> {
        let mut items = Vec::new();
        loop {
            match self.tokens.peek() {
                Some(Token::Close(close)) => {
                    let close = *close;
                    self.tokens.next();
                    if close != open {
                        return Err(Error::Parse(format!(
                            "expected `{}`, found `{}`",
                            open.close(),
                            close.close()
                        )));
                    }
                    break;
                }
                Some(_) => {
                    if let Some(item) = self.next() {
                        items.push(item?);
                    }
                }
                None => {
                    return Err(Error::Parse(format!(
                        "unexpected end of input, `{}` is never closed",
                        open
                    )))
                }
            }
        }
        Ok(Expr::form(items))
    }
}

impl Iterator for ExprIterator {
    type Item = Result<Expr, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.tokens.next()?;
        Some(match token {
            Token::Num(n) => Ok(Expr::Num(n)),
            Token::Sym(s) => Ok(Expr::Sym(s)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::Open(open) => self.parse_form(open),
            Token::Close(close) => Err(Error::Parse(format!("unexpected `{}`", close.close()))),
        })
    }
}

/// Nest a token sequence into the IL tree, one node per top-level form.
pub fn nest(tokens: Vec<Token>) -> Result<Vec<Expr>, Error> {
    ExprIterator::new(tokens).collect()
}

pub fn parse(input: &str) -> Result<Vec<Expr>, Error> {
    nest(tokenize(input)?)
}
