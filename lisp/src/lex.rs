use derive_more::Display;
use logos::{Lexer, Logos};

use crate::error::Error;

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
pub enum RawToken {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[token("'")]
    Quote,
    #[token("`")]
    Quasi,
    #[token(",")]
    Unquote,
    #[token(",@")]
    Splice,

    #[regex(r#""([^"]|"")*""#)]
    Str,
    #[regex(r"[+\-]?[0-9]+(-[0-9]+)*(\.[0-9]+)?", priority = 3)]
    Number,
    #[regex(r#"[^ \t\r\n\f()\[\]{}'`,";#][^ \t\r\n\f()\[\]{}'`,";]*"#, priority = 1)]
    Symbol,

    #[regex(r";[^\n]*", logos::skip)]
    LineComment,
    #[regex(r"#\|([^|]|\|+[^|#])*\|+#", logos::skip)]
    BlockComment,

    #[error]
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Error,
}

/// The three interchangeable bracket families.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum Delim {
    #[display(fmt = "(")]
    Paren,
    #[display(fmt = "[")]
    Bracket,
    #[display(fmt = "{{")]
    Brace,
}

impl Delim {
    pub fn close(self) -> char {
        match self {
            Delim::Paren => ')',
            Delim::Bracket => ']',
            Delim::Brace => '}',
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Open(Delim),
    Close(Delim),
    Num(f64),
    Sym(String),
    Str(String),
}

/// Turn source text into a flat token sequence.
///
/// Comments are dropped, string literals are cooked, a `[` is followed by an
/// injected `list` tag and quote abbreviations are expanded into explicit
/// `(quote …)`-style forms.
pub fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    let mut lexer: Lexer<_> = RawToken::lexer(input);
    let mut raw_tokens = Vec::new();
    while let Some(token) = lexer.next() {
        let src = lexer.slice();
        if token == RawToken::Error {
            return Err(unexpected(src, lexer.span().start));
        }
        raw_tokens.push((token, src));
    }
    let mut expander = Expander {
        raw_tokens,
        pos: 0,
        out: Vec::new(),
    };
    while expander.pos < expander.raw_tokens.len() {
        expander.emit_one()?;
    }
    Ok(expander.out)
}

fn unexpected(src: &str, offset: usize) -> Error {
    if src.starts_with('"') {
        Error::Parse(format!("unterminated string literal at offset {offset}"))
    } else if src.starts_with('#') {
        Error::Parse(format!("unterminated block comment at offset {offset}"))
    } else {
        Error::Parse(format!("unexpected input `{src}` at offset {offset}"))
    }
}

/// Strip the delimiters, collapse doubled quotes and normalize the common
/// backslash escapes.
fn cook_string(src: &str) -> String {
    let inner = &src[1..src.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                // the lexer only admits doubled quotes inside a literal
                chars.next();
                out.push('"');
            }
            '\\' => match chars.peek() {
                Some('n') => {
                    chars.next();
                    out.push('\n');
                }
                Some('t') => {
                    chars.next();
                    out.push('\t');
                }
                Some('r') => {
                    chars.next();
                    out.push('\r');
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                _ => out.push('\\'),
            },
            c => out.push(c),
        }
    }
    out
}

/// `-123-456-300.7` reads as `-123456300.7`: dashes between digit runs are
/// grouping separators.
fn parse_number(src: &str) -> Result<f64, Error> {
    let (sign, digits) = match src.as_bytes().first() {
        Some(b'-') => ("-", &src[1..]),
        Some(b'+') => ("", &src[1..]),
        _ => ("", src),
    };
    let cleaned = format!("{sign}{}", digits.replace('-', ""));
    cleaned
        .parse::<f64>()
        .map_err(|_| Error::Parse(format!("invalid number `{src}`")))
}

struct Expander<'a> {
    raw_tokens: Vec<(RawToken, &'a str)>,
    pos: usize,
    out: Vec<Token>,
}

impl<'a> Expander<'a> {
    fn peek(&self) -> Option<RawToken> {
        self.raw_tokens.get(self.pos).map(|(token, _)| *token)
    }

    /// Emit the token at the cursor. A quote marker consumes the whole datum
    /// that follows it.
    fn emit_one(&mut self) -> Result<(), Error> {
        let (token, src) = self.raw_tokens[self.pos];
        self.pos += 1;
        let tag = match token {
            RawToken::Quote => "quote",
            RawToken::Quasi => "quasiquote",
            RawToken::Unquote => "unquote",
            RawToken::Splice => "unquote-splicing",
            _ => {
                self.emit_plain(token, src)?;
                return Ok(());
            }
        };
        self.out.push(Token::Open(Delim::Paren));
        self.out.push(Token::Sym(tag.to_string()));
        self.emit_datum(src)?;
        self.out.push(Token::Close(Delim::Paren));
        Ok(())
    }

    fn emit_plain(&mut self, token: RawToken, src: &str) -> Result<(), Error> {
        let token = match token {
            RawToken::LParen => Token::Open(Delim::Paren),
            RawToken::RParen => Token::Close(Delim::Paren),
            RawToken::LBracket => {
                self.out.push(Token::Open(Delim::Bracket));
                Token::Sym("list".to_string())
            }
            RawToken::RBracket => Token::Close(Delim::Bracket),
            RawToken::LBrace => Token::Open(Delim::Brace),
            RawToken::RBrace => Token::Close(Delim::Brace),
            RawToken::Str => Token::Str(cook_string(src)),
            RawToken::Number => Token::Num(parse_number(src)?),
            RawToken::Symbol => Token::Sym(src.to_string()),
            _ => return Err(Error::Parse(format!("unexpected `{src}`"))),
        };
        self.out.push(token);
        Ok(())
    }

    /// Emit exactly one datum: an atom, a quoted datum or a whole bracketed
    /// form.
    fn emit_datum(&mut self, marker: &str) -> Result<(), Error> {
        match self.peek() {
            None | Some(RawToken::RParen | RawToken::RBracket | RawToken::RBrace) => Err(
                Error::Parse(format!("`{marker}` must be followed by an expression")),
            ),
            Some(RawToken::LParen | RawToken::LBracket | RawToken::LBrace) => {
                self.emit_one()?;
                loop {
                    match self.peek() {
                        // unclosed form, reported by the nester
                        None => return Ok(()),
                        Some(RawToken::RParen | RawToken::RBracket | RawToken::RBrace) => {
                            return self.emit_one();
                        }
                        Some(_) => {
                            let (_, src) = self.raw_tokens[self.pos];
                            self.emit_datum(src)?;
                        }
                    }
                }
            }
            Some(_) => self.emit_one(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos::{Lexer, Logos};
    use pretty_assertions::assert_eq;

    fn open() -> Token {
        Token::Open(Delim::Paren)
    }

    fn close() -> Token {
        Token::Close(Delim::Paren)
    }

    fn sym(s: &str) -> Token {
        Token::Sym(s.to_string())
    }

    #[test]
    fn test_lexer() {
        let mut lexer: Lexer<_> = RawToken::lexer("(+ 1 -2) [x] {y}");
        let expected = [
            (RawToken::LParen, "("),
            (RawToken::Symbol, "+"),
            (RawToken::Number, "1"),
            (RawToken::Number, "-2"),
            (RawToken::RParen, ")"),
            (RawToken::LBracket, "["),
            (RawToken::Symbol, "x"),
            (RawToken::RBracket, "]"),
            (RawToken::LBrace, "{"),
            (RawToken::Symbol, "y"),
            (RawToken::RBrace, "}"),
        ];
        for (token, slice) in expected {
            assert_eq!(lexer.next(), Some(token));
            assert_eq!(lexer.slice(), slice);
        }
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_numbers() {
        let cases = [
            ("42", 42.0),
            ("-7", -7.0),
            ("+3.5", 3.5),
            ("0.25", 0.25),
            ("1-000", 1000.0),
            ("-123-456-300.7", -123456300.7),
        ];
        for (src, expected) in cases {
            assert_eq!(tokenize(src).unwrap(), vec![Token::Num(expected)], "{src}");
        }
    }

    #[test]
    fn test_symbols() {
        let cases = ["-", "+", "string-length", "empty?", "a1", "1a", "->", "<="];
        for src in cases {
            assert_eq!(tokenize(src).unwrap(), vec![sym(src)], "{src}");
        }
    }

    #[test]
    fn test_strings() {
        let cases = [
            (r#""hello""#, "hello"),
            (r#""""#, ""),
            (r#""say ""hi""""#, r#"say "hi""#),
            (r#""a\nb""#, "a\nb"),
            (r#""tab\there""#, "tab\there"),
            (r#""back\\slash""#, "back\\slash"),
            (r#""semi ; colon""#, "semi ; colon"),
        ];
        for (src, expected) in cases {
            assert_eq!(
                tokenize(src).unwrap(),
                vec![Token::Str(expected.to_string())],
                "{src}"
            );
        }
    }

    #[test]
    fn test_comments() {
        let src = "; leading comment\n(a #| block\n comment |# b) ; trailing\n#| a | b |#";
        assert_eq!(tokenize(src).unwrap(), vec![open(), sym("a"), sym("b"), close()]);
    }

    #[test]
    fn test_bracket_injects_list() {
        assert_eq!(
            tokenize("[1 2]").unwrap(),
            vec![
                Token::Open(Delim::Bracket),
                sym("list"),
                Token::Num(1.0),
                Token::Num(2.0),
                Token::Close(Delim::Bracket),
            ]
        );
    }

    #[test]
    fn test_quote_expansion() {
        assert_eq!(
            tokenize("'a").unwrap(),
            vec![open(), sym("quote"), sym("a"), close()]
        );
        assert_eq!(
            tokenize("''a").unwrap(),
            vec![open(), sym("quote"), open(), sym("quote"), sym("a"), close(), close()]
        );
        assert_eq!(
            tokenize("'(1 'b)").unwrap(),
            vec![
                open(),
                sym("quote"),
                open(),
                Token::Num(1.0),
                open(),
                sym("quote"),
                sym("b"),
                close(),
                close(),
                close(),
            ]
        );
        assert_eq!(
            tokenize("`(a ,b ,@c)").unwrap(),
            vec![
                open(),
                sym("quasiquote"),
                open(),
                sym("a"),
                open(),
                sym("unquote"),
                sym("b"),
                close(),
                open(),
                sym("unquote-splicing"),
                sym("c"),
                close(),
                close(),
                close(),
            ]
        );
    }

    #[test]
    fn test_errors() {
        let cases = [
            ("\"open", "parse error: unterminated string literal at offset 0"),
            ("(a #| never closed", "parse error: unterminated block comment at offset 3"),
            ("(a ')", "parse error: `'` must be followed by an expression"),
            ("'", "parse error: `'` must be followed by an expression"),
        ];
        for (src, expected) in cases {
            assert_eq!(tokenize(src).unwrap_err().to_string(), expected, "{src}");
        }
    }
}
