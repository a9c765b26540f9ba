//! Tokenizes the text of one expression chunk.
//!
//! Spans are absolute within the full template source; the lexer is handed
//! the chunk's span and never reads outside it.

use crate::error::{Error, Result};
use crate::types::span::Span;

pub struct Lexer<'s> {
    pub source: &'s str,
    cursor: usize,
    end: usize,
}

/// The type of token yielded by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// An identifier, keyword, or attribute name
    Ident,
    /// A string literal, span covering the quotes
    Str,
    /// An anonymous subtemplate, span covering the text between the braces
    Subtemplate,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBrack,
    /// `]`
    RBrack,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semi,
    /// `.`
    Dot,
    /// `=`
    Eq,
    /// `!`
    Bang,
    /// `...`
    Ellipsis,
}

impl Token {
    pub fn human(&self) -> &'static str {
        match self {
            Self::Ident => "an identifier",
            Self::Str => "a string",
            Self::Subtemplate => "a subtemplate",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBrack => "`[`",
            Self::RBrack => "`]`",
            Self::Comma => "a comma",
            Self::Colon => "a colon",
            Self::Semi => "a semicolon",
            Self::Dot => "a period",
            Self::Eq => "`=`",
            Self::Bang => "`!`",
            Self::Ellipsis => "`...`",
        }
    }
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str, span: Span) -> Self {
        Self {
            source,
            cursor: span.m,
            end: span.n,
        }
    }

    pub fn next(&mut self) -> Result<Option<(Token, Span)>> {
        let mut iter = self.source[self.cursor..self.end]
            .char_indices()
            .map(|(d, c)| (self.cursor + d, c));

        let (i, c) = loop {
            match iter.next() {
                Some((_, c)) if is_whitespace(c) => continue,
                Some((i, c)) => break (i, c),
                None => {
                    self.cursor = self.end;
                    return Ok(None);
                }
            }
        };

        let (token, j) = match c {
            '(' => (Token::LParen, i + 1),
            ')' => (Token::RParen, i + 1),
            '[' => (Token::LBrack, i + 1),
            ']' => (Token::RBrack, i + 1),
            ',' => (Token::Comma, i + 1),
            ':' => (Token::Colon, i + 1),
            ';' => (Token::Semi, i + 1),
            '=' => (Token::Eq, i + 1),
            '!' => (Token::Bang, i + 1),
            '.' => {
                if self.source[i..self.end].starts_with("...") {
                    (Token::Ellipsis, i + 3)
                } else {
                    (Token::Dot, i + 1)
                }
            }
            '"' => (Token::Str, self.lex_string(i)?),
            '{' => {
                let close = self.lex_subtemplate(i)?;
                self.cursor = close + 1;
                return Ok(Some((Token::Subtemplate, Span::new(i + 1, close))));
            }
            c if is_ident_start(c) => (Token::Ident, self.lex_while(i, is_ident)),
            c => {
                return Err(Error::syntax(
                    "unexpected character",
                    self.source,
                    i..i + c.len_utf8(),
                ))
            }
        };
        self.cursor = j;
        Ok(Some((token, Span::new(i, j))))
    }

    // Returns the offset one past the closing quote.
    fn lex_string(&self, from: usize) -> Result<usize> {
        let mut escaped = false;
        for (d, c) in self.source[from + 1..self.end].char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => return Ok(from + 1 + d + 1),
                _ => {}
            }
        }
        Err(Error::syntax(
            "unterminated string",
            self.source,
            from..from + 1,
        ))
    }

    // Returns the offset of the `}` matching the `{` at `from`. Braces nest
    // and string literals inside the block are opaque.
    fn lex_subtemplate(&self, from: usize) -> Result<usize> {
        let mut depth = 0usize;
        let mut in_str = false;
        let mut escaped = false;
        for (d, c) in self.source[from + 1..self.end].char_indices() {
            if in_str {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_str = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_str = true,
                '{' => depth += 1,
                '}' if depth == 0 => return Ok(from + 1 + d),
                '}' => depth -= 1,
                _ => {}
            }
        }
        Err(Error::syntax(
            "unclosed subtemplate",
            self.source,
            from..from + 1,
        ))
    }

    fn lex_while<P>(&self, from: usize, pred: P) -> usize
    where
        P: Fn(char) -> bool,
    {
        self.source[from..self.end]
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map(|(d, _)| from + d)
            .unwrap_or(self.end)
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | ' ')
}

fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

fn is_ident(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}
