//! Byte-offset spans into a single source text.

use serde::Serialize;

/// A half-open byte range `[start, end)` in the source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, PartialOrd, Ord)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Span {
        Span { start, end }
    }

    /// A zero-width span at `pos`.
    #[inline]
    pub const fn at(pos: u32) -> Span {
        Span {
            start: pos,
            end: pos,
        }
    }

    #[inline]
    pub fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether `offset` falls inside this span (end inclusive, so a cursor
    /// placed right after the last character still hits the node).
    #[inline]
    pub fn contains(self, offset: u32) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Slice the covered text out of `source`, empty when out of bounds.
    pub fn text(self, source: &str) -> &str {
        source
            .get(self.start as usize..self.end as usize)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_merge_and_contains() {
        let a = Span::new(2, 5);
        let b = Span::new(7, 9);
        let merged = a.to(b);
        assert_eq!(merged, Span::new(2, 9));
        assert!(merged.contains(9));
        assert!(!merged.contains(10));
        assert_eq!(merged.len(), 7);
    }

    #[test]
    fn span_text_out_of_bounds_is_empty() {
        assert_eq!(Span::new(0, 3).text("abcdef"), "abc");
        assert_eq!(Span::new(4, 40).text("abcdef"), "");
    }
}
