//! Splits template text into literal and expression chunks.

use crate::error::{Error, Result};
use crate::types::delims::Delims;
use crate::types::span::Span;

/// A contiguous piece of template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'s> {
    pub kind: ChunkKind,
    /// For an expression chunk this covers the content between the
    /// delimiters, delimiters excluded.
    pub span: Span,
    pub text: &'s str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Literal,
    Expr,
}

/// Split `source` into an ordered sequence of chunks.
///
/// The stop character only closes an expression at brace depth zero and
/// outside a string literal, so an anonymous subtemplate like
/// `items:{it|<it>}` stays one expression chunk. A stop character in
/// literal text is ordinary text. Running out of input inside an
/// expression is an unbalanced-delimiter error; no code generation happens
/// after that.
pub fn chunkify<'s>(source: &'s str, delims: Delims) -> Result<Vec<Chunk<'s>>> {
    let mut chunks = Vec::new();
    let mut cursor = 0;

    while let Some(rel) = source[cursor..].find(delims.start()) {
        let at = cursor + rel;
        if at > cursor {
            chunks.push(literal(source, cursor, at));
        }
        let expr_start = at + delims.start().len_utf8();
        let stop = scan_expr(source, expr_start, delims)
            .ok_or_else(|| Error::unbalanced("unclosed expression", source, at..expr_start))?;
        let span = Span::new(expr_start, stop);
        chunks.push(Chunk {
            kind: ChunkKind::Expr,
            span,
            text: &source[span],
        });
        cursor = stop + delims.stop().len_utf8();
    }

    if cursor < source.len() {
        chunks.push(literal(source, cursor, source.len()));
    }
    Ok(chunks)
}

fn literal(source: &str, m: usize, n: usize) -> Chunk<'_> {
    let span = Span::new(m, n);
    Chunk {
        kind: ChunkKind::Literal,
        span,
        text: &source[span],
    }
}

// Finds the offset of the stop delimiter matching an expression opened just
// before `from`, skipping over brace blocks and string literals.
fn scan_expr(source: &str, from: usize, delims: Delims) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escaped = false;
    for (i, c) in source[from..].char_indices() {
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
            '}' => depth = depth.saturating_sub(1),
            c if c == delims.stop() && depth == 0 => return Some(from + i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunkify_empty() {
        assert!(chunks("").is_empty());
    }

    #[test]
    fn chunkify_literal_only() {
        assert_eq!(chunks("lorem ipsum"), [(ChunkKind::Literal, "lorem ipsum")]);
    }

    #[test]
    fn chunkify_stray_stop_char_is_text() {
        assert_eq!(chunks("a > b"), [(ChunkKind::Literal, "a > b")]);
    }

    #[test]
    fn chunkify_expr_between_literals() {
        assert_eq!(
            chunks("Hello <name>!"),
            [
                (ChunkKind::Literal, "Hello "),
                (ChunkKind::Expr, "name"),
                (ChunkKind::Literal, "!"),
            ]
        );
    }

    #[test]
    fn chunkify_adjacent_exprs() {
        assert_eq!(
            chunks("<a><b>"),
            [(ChunkKind::Expr, "a"), (ChunkKind::Expr, "b")]
        );
    }

    #[test]
    fn chunkify_expr_at_ends() {
        assert_eq!(
            chunks("<a>mid<b>"),
            [
                (ChunkKind::Expr, "a"),
                (ChunkKind::Literal, "mid"),
                (ChunkKind::Expr, "b"),
            ]
        );
    }

    #[test]
    fn chunkify_empty_expr() {
        assert_eq!(
            chunks("a<>b"),
            [
                (ChunkKind::Literal, "a"),
                (ChunkKind::Expr, ""),
                (ChunkKind::Literal, "b"),
            ]
        );
    }

    #[test]
    fn chunkify_subtemplate_nesting() {
        assert_eq!(
            chunks("<items:{it|<it>}>!"),
            [
                (ChunkKind::Expr, "items:{it|<it>}"),
                (ChunkKind::Literal, "!"),
            ]
        );
    }

    #[test]
    fn chunkify_string_hides_stop_char() {
        assert_eq!(
            chunks(r#"<a; separator=">">"#),
            [(ChunkKind::Expr, r#"a; separator=">""#)]
        );
    }

    #[test]
    fn chunkify_string_escape() {
        assert_eq!(
            chunks(r#"<t("a\">b")>"#),
            [(ChunkKind::Expr, r#"t("a\">b")"#)]
        );
    }

    #[test]
    fn chunkify_custom_delims() {
        let got = chunkify("Hello $name$!", Delims::new('$', '$')).unwrap();
        let got: Vec<_> = got.iter().map(|c| (c.kind, c.text)).collect();
        assert_eq!(
            got,
            [
                (ChunkKind::Literal, "Hello "),
                (ChunkKind::Expr, "name"),
                (ChunkKind::Literal, "!"),
            ]
        );
    }

    #[test]
    fn chunkify_spans_are_gap_free() {
        let source = "a<b>c<d.e>";
        let got = chunkify(source, Delims::default()).unwrap();
        for chunk in &got {
            assert_eq!(&source[chunk.span], chunk.text);
        }
        assert_eq!(got[0].span, Span::new(0, 1));
        assert_eq!(got[1].span, Span::new(2, 3));
        assert_eq!(got[2].span, Span::new(4, 5));
        assert_eq!(got[3].span, Span::new(6, 9));
    }

    #[test]
    fn chunkify_unclosed_expr() {
        let err = chunkify("Hello <name", Delims::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnbalancedDelims);
        assert_eq!(
            format!("{err:#}"),
            "
   |
 1 | Hello <name
   |       ^ unclosed expression
"
        );
    }

    #[test]
    fn chunkify_unclosed_brace_block() {
        let err = chunkify("<items:{it|x>", Delims::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnbalancedDelims);
    }

    fn chunks(source: &str) -> Vec<(ChunkKind, &str)> {
        chunkify(source, Delims::default())
            .unwrap()
            .iter()
            .map(|c| (c.kind, c.text))
            .collect()
    }
}
