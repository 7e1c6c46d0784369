//! Module with the span type.
//! A span is a byte range in the scanned input. The host records one for
//! every emitted token, from the token start to the marked end; the two
//! offsets can coincide for tokens that own no bytes of their own.

use serde::{Deserialize, Serialize};

/// A byte range in the scanned input.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// First byte offset of the range.
    pub start: usize,
    /// One past the last byte offset of the range.
    pub end: usize,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Create an empty span anchored at the given offset.
    #[inline]
    pub fn empty(offset: usize) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// Get the number of bytes the span covers.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span covers no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the span as an index range.
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
