//! Source location tracking for the lexer.
//!
//! Every token and AST node carries a [`Span`]: a half-open `[start, end)`
//! byte-offset range into the original source text. Spans are resolved to
//! line/column pairs only at diagnostic-rendering time.

use std::fmt;

/// A half-open `[start, end)` byte range into source text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first byte covered by the span.
    pub start: u32,
    /// Byte offset one past the last byte covered by the span.
    pub end: u32,
}

impl Span {
    /// Create a new span from start and end byte offsets.
    #[inline]
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Create a zero-length span at a byte offset.
    #[inline]
    pub fn point(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Merge two spans into the smallest span covering both.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Resolve this span's start offset to a 1-indexed (line, column) pair.
    ///
    /// Column counts bytes, not characters, matching how offsets are tracked.
    pub fn line_col(&self, source: &str) -> (u32, u32) {
        let upto = &source[..(self.start as usize).min(source.len())];
        let line = upto.bytes().filter(|b| *b == b'\n').count() as u32 + 1;
        let col = match upto.rfind('\n') {
            Some(nl) => (upto.len() - nl) as u32,
            None => upto.len() as u32 + 1,
        };
        (line, col)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(5, 15);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());

        let empty = Span::point(5);
        assert!(empty.is_empty());
    }

    #[test]
    fn span_display() {
        let span = Span::new(3, 8);
        assert_eq!(format!("{}", span), "3..8");
    }

    #[test]
    fn span_merge() {
        let a = Span::new(4, 7);
        let b = Span::new(10, 13);
        assert_eq!(a.merge(b), Span::new(4, 13));
        assert_eq!(b.merge(a), Span::new(4, 13));
    }

    #[test]
    fn span_merge_overlapping() {
        let a = Span::new(4, 9);
        let b = Span::new(7, 11);
        assert_eq!(a.merge(b), Span::new(4, 11));
    }

    #[test]
    fn span_merge_with_point() {
        let span = Span::new(4, 14);
        let point = Span::point(7);
        assert_eq!(span.merge(point), Span::new(4, 14));
    }

    #[test]
    fn line_col_first_line() {
        let source = "abc def";
        assert_eq!(Span::new(4, 7).line_col(source), (1, 5));
    }

    #[test]
    fn line_col_later_line() {
        let source = "ab\ncd\nefg";
        assert_eq!(Span::new(6, 9).line_col(source), (3, 1));
        assert_eq!(Span::new(8, 9).line_col(source), (3, 3));
    }

    #[test]
    fn line_col_at_start() {
        assert_eq!(Span::point(0).line_col("anything"), (1, 1));
    }
}
