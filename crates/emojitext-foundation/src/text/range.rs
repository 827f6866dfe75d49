//! Byte range describing where a span is attached.

/// A half-open byte range `[start, end)` over UTF-8 text.
///
/// Unlike a selection range, a span range is always ordered: `start <= end`
/// is an invariant, enforced by [`new`](Self::new). Offsets are UTF-8 byte
/// offsets, matching Rust's `String`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpanRange {
    start: usize,
    end: usize,
}

impl SpanRange {
    /// Creates a range, swapping the bounds if they arrive reversed.
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Start offset (inclusive).
    pub const fn start(&self) -> usize {
        self.start
    }

    /// End offset (exclusive).
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Length of the range in bytes.
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// True if the range covers no text.
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `index` lies inside the range (`start <= index < end`).
    pub const fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// True if the two ranges share at least one byte.
    ///
    /// Empty ranges intersect nothing, including themselves.
    pub const fn intersects(&self, other: &SpanRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Clamps both bounds to `[0, max]`.
    pub fn clamp(&self, max: usize) -> Self {
        Self {
            start: self.start.min(max),
            end: self.end.min(max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_reversed_bounds() {
        let range = SpanRange::new(7, 2);
        assert_eq!(range.start(), 2);
        assert_eq!(range.end(), 7);
        assert_eq!(range.len(), 5);
    }

    #[test]
    fn contains_is_half_open() {
        let range = SpanRange::new(2, 5);
        assert!(!range.contains(1));
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
    }

    #[test]
    fn empty_range_contains_nothing() {
        let range = SpanRange::new(3, 3);
        assert!(range.is_empty());
        assert!(!range.contains(3));
    }

    #[test]
    fn intersects_requires_shared_bytes() {
        let a = SpanRange::new(0, 4);
        let b = SpanRange::new(3, 8);
        let c = SpanRange::new(4, 8);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c)); // touching at a boundary is not overlap
    }

    #[test]
    fn empty_range_intersects_nothing() {
        let empty = SpanRange::new(2, 2);
        let covering = SpanRange::new(0, 5);
        assert!(!empty.intersects(&covering));
        assert!(!covering.intersects(&empty));
    }

    #[test]
    fn clamp_limits_both_bounds() {
        let range = SpanRange::new(3, 12);
        let clamped = range.clamp(5);
        assert_eq!(clamped, SpanRange::new(3, 5));
        assert_eq!(range.clamp(2), SpanRange::new(2, 2));
    }
}
