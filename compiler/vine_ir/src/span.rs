//! Source location spans.

use std::fmt;

/// Byte range into a source file.
///
/// Layout: 8 bytes, `start` inclusive and `end` exclusive. Line and column
/// are recovered on demand from the source text when a diagnostic is built.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Placeholder for values that have no source location.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Create from a byte range, saturating offsets past `u32::MAX`.
    #[inline]
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        let start = u32::try_from(range.start).unwrap_or(u32::MAX);
        let end = u32::try_from(range.end).unwrap_or(u32::MAX);
        Span { start, end }
    }

    /// Zero-width span at `offset`.
    #[inline]
    pub const fn point(offset: u32) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Merge two spans into one covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    #[inline]
    pub fn to_range(self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

const _: () = assert!(size_of::<Span>() == 8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_merge() {
        let a = Span::new(4, 9);
        let b = Span::new(2, 6);
        assert_eq!(a.merge(b), Span::new(2, 9));
        assert_eq!(a.merge(b).len(), 7);
    }

    #[test]
    fn span_point_is_empty() {
        assert!(Span::point(12).is_empty());
        assert_eq!(Span::point(12).to_range(), 12..12);
    }

    #[test]
    fn span_from_range_saturates() {
        let huge = usize::MAX;
        let span = Span::from_range(3..huge);
        assert_eq!(span.start, 3);
        assert_eq!(span.end, u32::MAX);
    }
}
