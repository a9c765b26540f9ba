//! Parses one expression chunk, reporting what it finds as semantic events.
//!
//! This is the crate's bundled implementation of the event protocol in
//! [`crate::types::event`]: a hand-written recursive descent parser that
//! emits each event the moment the corresponding source construct is
//! recognized, so code generation stays fully synchronous with parsing.

use std::borrow::Cow;
use std::collections::VecDeque;

use crate::compile::lex::{Lexer, Token};
use crate::error::{Error, Result};
use crate::types::event::{EventSink, ExprEvent};
use crate::types::op::Op;
use crate::types::span::Span;

/// Parse the expression chunk at `span` and deliver its events to `sink`.
pub fn expr<'s, S>(source: &'s str, span: Span, sink: &mut S) -> Result<()>
where
    S: EventSink<'s>,
{
    Parser::new(source, span).parse_stexpr(sink)
}

struct Parser<'s> {
    tokens: Lexer<'s>,
    source: &'s str,
    end: usize,
    peeked: VecDeque<(Token, Span)>,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str, span: Span) -> Self {
        Self {
            tokens: Lexer::new(source, span),
            source,
            end: span.n,
            peeked: VecDeque::new(),
        }
    }

    fn parse_stexpr<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: EventSink<'s>,
    {
        if let Some((Token::Ident, sp)) = self.peek()? {
            match &self.source[sp] {
                "if" => {
                    self.next()?;
                    sink.event(ExprEvent::IfStart)?;
                    self.parse_condition(sink, false)?;
                    return self.expect_eof();
                }
                "elseif" => {
                    self.next()?;
                    sink.event(ExprEvent::ElseIf)?;
                    self.parse_condition(sink, true)?;
                    return self.expect_eof();
                }
                "else" => {
                    self.next()?;
                    sink.event(ExprEvent::Else)?;
                    return self.expect_eof();
                }
                "endif" => {
                    self.next()?;
                    sink.event(ExprEvent::EndIf)?;
                    return self.expect_eof();
                }
                _ => {}
            }
        }
        self.parse_expr(sink)?;
        if self.eat(Token::Semi)? {
            sink.event(ExprEvent::OptionsStart)?;
            self.parse_options(sink)?;
        }
        self.expect_eof()
    }

    fn parse_condition<S>(&mut self, sink: &mut S, elseif: bool) -> Result<()>
    where
        S: EventSink<'s>,
    {
        self.expect(Token::LParen)?;
        let negated = self.eat(Token::Bang)?;
        self.parse_expr(sink)?;
        self.expect(Token::RParen)?;
        sink.event(if elseif {
            ExprEvent::ElseIfCond { negated }
        } else {
            ExprEvent::IfCond { negated }
        })
    }

    fn parse_expr<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: EventSink<'s>,
    {
        self.parse_member(sink)?;
        while self.eat(Token::Colon)? {
            self.parse_template_ref(sink)?;
            let mut n = 1usize;
            while self.eat(Token::Comma)? {
                self.parse_template_ref(sink)?;
                n += 1;
            }
            sink.event(if n == 1 {
                ExprEvent::Map
            } else {
                ExprEvent::MapAlternating(n)
            })?;
        }
        Ok(())
    }

    // An expression in a position where a comma separates the surrounding
    // construct, so only a single map application is allowed.
    fn parse_expr_no_comma<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: EventSink<'s>,
    {
        self.parse_member(sink)?;
        if self.eat(Token::Colon)? {
            self.parse_template_ref(sink)?;
            sink.event(ExprEvent::Map)?;
        }
        Ok(())
    }

    fn parse_member<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: EventSink<'s>,
    {
        self.parse_include(sink)?;
        while self.eat(Token::Dot)? {
            if self.eat(Token::LParen)? {
                self.parse_expr(sink)?;
                self.expect(Token::RParen)?;
                sink.event(ExprEvent::Prop(None))?;
            } else {
                let (name, _) = self.expect_ident()?;
                sink.event(ExprEvent::Prop(Some(name)))?;
            }
        }
        Ok(())
    }

    fn parse_include<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: EventSink<'s>,
    {
        match self.peek()? {
            Some((Token::Ident, sp)) => {
                if matches!(self.nth(1)?, Some((Token::LParen, _))) {
                    self.next()?;
                    let name = &self.source[sp];
                    // Whether `name(...)` applies a function or instantiates
                    // a template is decided by the function table.
                    if Op::for_function(name).is_some() {
                        self.expect(Token::LParen)?;
                        self.parse_expr(sink)?;
                        self.expect(Token::RParen)?;
                        sink.event(ExprEvent::Call(name))
                    } else {
                        sink.event(ExprEvent::Instantiate(Some(name)))?;
                        self.expect(Token::LParen)?;
                        self.parse_args(sink)?;
                        self.expect(Token::RParen)?;
                        Ok(())
                    }
                } else {
                    self.next()?;
                    sink.event(ExprEvent::Attr(&self.source[sp]))
                }
            }
            Some((Token::LParen, _)) => {
                self.next()?;
                self.parse_expr(sink)?;
                self.expect(Token::RParen)?;
                sink.event(ExprEvent::ToStr)?;
                if self.eat(Token::LParen)? {
                    sink.event(ExprEvent::Instantiate(None))?;
                    self.parse_args(sink)?;
                    self.expect(Token::RParen)?;
                }
                Ok(())
            }
            Some((Token::Str, sp)) => {
                self.next()?;
                let value = unescape(self.source, Span::new(sp.m + 1, sp.n - 1))?;
                sink.event(ExprEvent::Str(value))
            }
            Some((Token::Subtemplate, sp)) => {
                self.next()?;
                sink.event(ExprEvent::Subtemplate {
                    raw: &self.source[sp],
                    start: sp.m,
                })
            }
            Some((Token::LBrack, _)) => self.parse_list(sink),
            Some((tk, sp)) => Err(Error::syntax(
                format!("expected an expression, found {}", tk.human()),
                self.source,
                sp,
            )),
            None => Err(self.eof_error("an expression")),
        }
    }

    fn parse_list<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: EventSink<'s>,
    {
        self.expect(Token::LBrack)?;
        sink.event(ExprEvent::ListStart)?;
        if self.eat(Token::RBrack)? {
            return Ok(());
        }
        loop {
            self.parse_expr_no_comma(sink)?;
            sink.event(ExprEvent::ListAppend)?;
            if !self.eat(Token::Comma)? {
                break;
            }
        }
        self.expect(Token::RBrack)?;
        Ok(())
    }

    fn parse_template_ref<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: EventSink<'s>,
    {
        match self.peek()? {
            Some((Token::Ident, sp)) => {
                self.next()?;
                sink.event(ExprEvent::Instantiate(Some(&self.source[sp])))?;
                self.expect(Token::LParen)?;
                self.parse_args(sink)?;
                self.expect(Token::RParen)?;
                Ok(())
            }
            Some((Token::Subtemplate, sp)) => {
                self.next()?;
                sink.event(ExprEvent::Subtemplate {
                    raw: &self.source[sp],
                    start: sp.m,
                })
            }
            Some((Token::LParen, _)) => {
                self.next()?;
                self.parse_expr(sink)?;
                self.expect(Token::RParen)?;
                sink.event(ExprEvent::ToStr)?;
                sink.event(ExprEvent::Instantiate(None))?;
                if self.eat(Token::LParen)? {
                    self.parse_args(sink)?;
                    self.expect(Token::RParen)?;
                }
                Ok(())
            }
            Some((tk, sp)) => Err(Error::syntax(
                format!("expected a template, found {}", tk.human()),
                self.source,
                sp,
            )),
            None => Err(self.eof_error("a template")),
        }
    }

    fn parse_args<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: EventSink<'s>,
    {
        if let Some((Token::RParen, _)) = self.peek()? {
            return Ok(());
        }
        loop {
            self.parse_arg(sink)?;
            if !self.eat(Token::Comma)? {
                break;
            }
        }
        Ok(())
    }

    fn parse_arg<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: EventSink<'s>,
    {
        match (self.peek()?, self.nth(1)?) {
            (Some((Token::Ellipsis, _)), _) => {
                self.next()?;
                sink.event(ExprEvent::PassThrough)
            }
            (Some((Token::Ident, sp)), Some((Token::Eq, _))) => {
                self.next()?;
                self.next()?;
                self.parse_expr_no_comma(sink)?;
                sink.event(ExprEvent::SetArg(Some(&self.source[sp])))
            }
            _ => {
                self.parse_expr_no_comma(sink)?;
                sink.event(ExprEvent::SetArg(None))
            }
        }
    }

    fn parse_options<S>(&mut self, sink: &mut S) -> Result<()>
    where
        S: EventSink<'s>,
    {
        loop {
            let (name, _) = self.expect_ident()?;
            if self.eat(Token::Eq)? {
                self.parse_expr_no_comma(sink)?;
            } else {
                sink.event(ExprEvent::DefaultOption(name))?;
            }
            sink.event(ExprEvent::SetOption(name))?;
            if !self.eat(Token::Comma)? {
                break;
            }
        }
        Ok(())
    }

    fn expect_ident(&mut self) -> Result<(&'s str, Span)> {
        let span = self.expect(Token::Ident)?;
        Ok((&self.source[span], span))
    }

    fn expect(&mut self, token: Token) -> Result<Span> {
        match self.next()? {
            Some((tk, sp)) if tk == token => Ok(sp),
            Some((tk, sp)) => Err(Error::syntax(
                format!("expected {}, found {}", token.human(), tk.human()),
                self.source,
                sp,
            )),
            None => Err(self.eof_error(token.human())),
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        match self.next()? {
            None => Ok(()),
            Some((tk, sp)) => Err(Error::syntax(
                format!("expected end of expression, found {}", tk.human()),
                self.source,
                sp,
            )),
        }
    }

    fn eof_error(&self, expected: &str) -> Error {
        Error::syntax(
            format!("expected {expected}, found end of expression"),
            self.source,
            self.end..self.end,
        )
    }

    fn eat(&mut self, token: Token) -> Result<bool> {
        if matches!(self.peek()?, Some((tk, _)) if tk == token) {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn peek(&mut self) -> Result<Option<(Token, Span)>> {
        self.nth(0)
    }

    fn nth(&mut self, n: usize) -> Result<Option<(Token, Span)>> {
        while self.peeked.len() <= n {
            match self.tokens.next()? {
                Some(t) => self.peeked.push_back(t),
                None => return Ok(None),
            }
        }
        Ok(Some(self.peeked[n]))
    }

    fn next(&mut self) -> Result<Option<(Token, Span)>> {
        match self.peeked.pop_front() {
            Some(t) => Ok(Some(t)),
            None => self.tokens.next(),
        }
    }
}

fn unescape<'s>(source: &'s str, span: Span) -> Result<Cow<'s, str>> {
    let raw = &source[span];
    if !raw.contains('\\') {
        return Ok(Cow::Borrowed(raw));
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            _ => return Err(Error::syntax("unknown escape character", source, span)),
        }
    }
    Ok(Cow::Owned(out))
}
