//! The semantic events an expression parser delivers to the compiler.
//!
//! The expression grammar is a separate concern from code generation: a
//! parser walks one expression chunk and reports what it finds, in source
//! order, as a sequence of [`ExprEvent`] values pushed into an
//! [`EventSink`]. The compiler core implements the sink and emits
//! instructions as the events arrive; there is no intermediate expression
//! tree. Any parser honoring the ordering rules below can drive compilation.
//!
//! Ordering rules the compiler relies on:
//! - events for one chunk arrive in source token order and are never
//!   buffered across chunks;
//! - operand-producing events (`Attr`, `Str`, nested expressions) arrive
//!   before the event that consumes them (`SetArg`, `SetOption`, `Map`,
//!   `ListAppend`, a condition clause);
//! - `Instantiate` arrives before the argument events for that instance;
//! - control events (`IfStart`, `ElseIf`, `Else`, `EndIf`) only ever open a
//!   chunk.

use std::borrow::Cow;

use crate::error::Result;

/// One semantic event from parsing an expression chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprEvent<'s> {
    /// An `if` chunk begins.
    IfStart,
    /// The `if` condition value is complete; `negated` is the leading `!`.
    IfCond { negated: bool },
    /// An `elseif` chunk begins.
    ElseIf,
    /// The `elseif` condition value is complete.
    ElseIfCond { negated: bool },
    /// An `else` chunk.
    Else,
    /// An `endif` chunk.
    EndIf,
    /// A reference to an attribute by name.
    Attr(&'s str),
    /// A property lookup on the value already produced; `None` means the
    /// property name is itself computed and already produced.
    Prop(Option<&'s str>),
    /// A string literal, with escapes resolved.
    Str(Cow<'s, str>),
    /// A template instantiation; `None` means the name is computed and
    /// already produced.
    Instantiate(Option<&'s str>),
    /// Apply the template just produced across the preceding value.
    Map,
    /// Apply the `n` templates just produced in rotation.
    MapAlternating(usize),
    /// A list literal begins.
    ListStart,
    /// The list element just produced is complete.
    ListAppend,
    /// A rendering-options block begins.
    OptionsStart,
    /// Store the value just produced as the named option.
    SetOption(&'s str),
    /// The named option was given without a value; its default applies.
    DefaultOption(&'s str),
    /// Store the value just produced as an argument; `None` is the sole
    /// positional argument form.
    SetArg(Option<&'s str>),
    /// Forward the enclosing template's remaining attributes (`...`).
    PassThrough,
    /// Apply the named built-in function to the value just produced.
    Call(&'s str),
    /// Coerce the value just produced to text.
    ToStr,
    /// An anonymous subtemplate literal. `raw` is the un-stripped text
    /// between the braces and `start` its byte offset in the enclosing
    /// template source.
    Subtemplate { raw: &'s str, start: usize },
}

/// Receives the event stream for one expression chunk.
pub trait EventSink<'s> {
    fn event(&mut self, event: ExprEvent<'s>) -> Result<()>;
}

impl<'s> EventSink<'s> for Vec<ExprEvent<'s>> {
    fn event(&mut self, event: ExprEvent<'s>) -> Result<()> {
        self.push(event);
        Ok(())
    }
}
