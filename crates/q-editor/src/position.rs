//! Cursor and edit positions.
//!
//! Coordinates are 0-indexed. `col` counts chars (Unicode scalar values)
//! within the line's stored text, which already has tabs expanded, so a
//! column is also a cell offset for ASCII text.

use std::fmt;

/// A (line, column) position in a document.
///
/// Ordered line first, then column.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// Line 0, column 0.
    pub const ZERO: Self = Self { line: 0, col: 0 };

    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed for the status line.
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}
