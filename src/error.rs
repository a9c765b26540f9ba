//! Defines the crate [`Error`] and non-fatal [`Warning`] diagnostics.

use std::cmp::max;
use std::fmt;

use unicode_width::UnicodeWidthStr;

use crate::types::span::Span;

/// A convenient type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A fatal compilation error.
///
/// The default `Display` is a single line with the byte range; the alternate
/// form (`{:#}`) and `Debug` render the offending template excerpt with an
/// underline.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    msg: String,
    source: String,
    span: Span,
}

/// The class of failure, for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Delimiters did not pair up while splitting the template into chunks.
    UnbalancedDelims,
    /// An expression chunk did not conform to the expression grammar, or
    /// conditional chunks did not nest.
    Syntax,
}

impl Error {
    pub(crate) fn unbalanced(msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self::new(ErrorKind::UnbalancedDelims, msg, source, span)
    }

    pub(crate) fn syntax(msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self::new(ErrorKind::Syntax, msg, source, span)
    }

    fn new(
        kind: ErrorKind,
        msg: impl Into<String>,
        source: &str,
        span: impl Into<Span>,
    ) -> Self {
        Self {
            kind,
            msg: msg.into(),
            source: source.to_string(),
            span: span.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The byte range of the offending text.
    pub fn span(&self) -> Span {
        self.span
    }
}

impl std::error::Error for Error {}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_pretty(&self.msg, &self.source, self.span, f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            fmt_pretty(&self.msg, &self.source, self.span, f)
        } else {
            write!(f, "{} between bytes {} and {}", self.msg, self.span.m, self.span.n)
        }
    }
}

fn fmt_pretty(msg: &str, source: &str, span: Span, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if source.is_empty() {
        return write!(f, "{msg}");
    }
    let lines: Vec<_> = source.split_terminator('\n').collect();
    let (line, col) = to_line_col(&lines, span.m);
    let width = max(1, source[span].width());
    let code = lines.get(line).copied().unwrap_or_else(|| *lines.last().unwrap());

    let num = (line + 1).to_string();
    let pad = num.width();
    let pipe = "|";
    let underline = "^".repeat(width);

    write!(
        f,
        "\n \
        {0:pad$} {pipe}\n \
        {num:>} {pipe} {code}\n \
        {0:pad$} {pipe} {underline:>width$} {msg}\n",
        "",
        pad = pad,
        pipe = pipe,
        num = num,
        code = code,
        underline = underline,
        width = col + width,
        msg = msg
    )
}

fn to_line_col(lines: &[&str], offset: usize) -> (usize, usize) {
    let mut n = 0;
    for (i, line) in lines.iter().enumerate() {
        let len = line.len() + 1;
        if n + len > offset {
            return (i, lines[i][..offset - n].width());
        }
        n += len;
    }
    (
        lines.len().saturating_sub(1),
        lines.last().map(|l| l.width()).unwrap_or(0),
    )
}

/// A non-fatal diagnostic attached to the compiled artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Warning {
    pub kind: WarningKind,
    /// Span of the expression chunk the diagnostic arose in.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum WarningKind {
    /// An option name outside the recognized set; its store was skipped.
    UnknownOption(String),
    /// A default-value option form on an option that has no default.
    NoOptionDefault(String),
    /// A function name outside the built-in set; a `noop` was emitted.
    UnknownFunction(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::UnknownOption(name) => write!(f, "no such option: {name}"),
            WarningKind::NoOptionDefault(name) => {
                write!(f, "no default value for option: {name}")
            }
            WarningKind::UnknownFunction(name) => write!(f, "no such function: {name}"),
        }
    }
}
