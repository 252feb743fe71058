use serde::{Deserialize, Serialize};

/// A half-open range `[start, end)` of UTF-16 code units into a document.
///
/// UTF-16 units are what browser selections and `String` indices report, so
/// spans recorded by a web client can be used here without conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Builds a span from two unordered points, as produced by a backwards drag.
    pub fn between(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Returns the length in code units. Uses saturating subtraction for safety.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span is empty (start >= end).
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// True if both spans share at least one code unit. Adjacent spans do not intersect.
    #[must_use]
    pub fn intersects(self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True if `offset` lies inside `[start, end)`.
    #[must_use]
    pub fn contains(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// True if the spans are adjacent (`end == other.start` or the reverse).
    #[must_use]
    pub fn touches(self, other: Span) -> bool {
        self.end == other.start || other.end == self.start
    }

    /// True if the span is non-empty and ends within `len`.
    #[must_use]
    pub fn fits(self, len: usize) -> bool {
        self.start < self.end && self.end <= len
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Span::new(0, 5), Span::new(4, 9), true)]
    #[case(Span::new(0, 5), Span::new(5, 10), false)]
    #[case(Span::new(2, 6), Span::new(4, 9), true)]
    #[case(Span::new(4, 9), Span::new(5, 6), true)]
    #[case(Span::new(0, 1), Span::new(8, 9), false)]
    fn intersects_is_symmetric(#[case] a: Span, #[case] b: Span, #[case] expected: bool) {
        assert_eq!(a.intersects(b), expected);
        assert_eq!(b.intersects(a), expected);
    }

    #[test]
    fn between_orders_points() {
        assert_eq!(Span::between(9, 4), Span::new(4, 9));
        assert_eq!(Span::between(4, 9), Span::new(4, 9));
    }

    #[test]
    fn adjacent_spans_touch() {
        assert!(Span::new(0, 5).touches(Span::new(5, 10)));
        assert!(!Span::new(0, 5).touches(Span::new(6, 10)));
    }

    #[test]
    fn fits_rejects_empty_and_overlong() {
        assert!(Span::new(0, 3).fits(3));
        assert!(!Span::new(3, 3).fits(3));
        assert!(!Span::new(1, 4).fits(3));
        assert!(!Span::new(4, 2).fits(10));
    }

    #[test]
    fn len_saturates_on_inverted_span() {
        assert_eq!(Span::new(5, 2).len(), 0);
        assert!(Span::new(5, 2).is_empty());
    }
}
