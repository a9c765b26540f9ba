//! Defines a [`Span`] which is used to represent a byte region in the
//! template source text.

use std::cmp::{max, min};
use std::ops::{Index, Range};

/// A half-open byte range `[m, n)` into template source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub m: usize,
    pub n: usize,
}

impl Span {
    pub fn new(m: usize, n: usize) -> Self {
        Self { m, n }
    }

    /// The smallest span enclosing both `self` and `other`.
    pub fn combine(self, other: Self) -> Self {
        let m = min(self.m, other.m);
        let n = max(self.n, other.n);
        Self { m, n }
    }

    pub fn len(&self) -> usize {
        self.n - self.m
    }

    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: Self) -> bool {
        self.m <= other.m && other.n <= self.n
    }
}

impl Index<Span> for str {
    type Output = str;

    fn index(&self, span: Span) -> &Self::Output {
        let Span { m, n } = span;
        &self[m..n]
    }
}

impl From<Range<usize>> for Span {
    fn from(r: Range<usize>) -> Self {
        Self {
            m: r.start,
            n: r.end,
        }
    }
}
