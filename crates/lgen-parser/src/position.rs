//! Source positions for diagnostics and template ranges.
//!
//! All positions are 1-based, matching what authors see in their editors.
//! The source editor converts to 0-based indices internally when it slices
//! content into lines.

use std::fmt;

/// A 1-based line/column position in a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Create a position at the given 1-based line and column.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// The first column of a line.
    pub fn line_start(line: usize) -> Self {
        Self { line, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An inclusive range of 1-based lines within a document.
///
/// A template's range always reflects the current content of its owning
/// document; any content edit triggers a full re-parse that recomputes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    /// First line of the range (the template header line).
    pub start: usize,
    /// Last line of the range, inclusive.
    pub end: usize,
}

impl LineRange {
    /// Create a range covering `start..=end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of lines covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    /// Always false: a range covers at least its start line.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_range_len() {
        assert_eq!(LineRange::new(3, 3).len(), 1);
        assert_eq!(LineRange::new(1, 4).len(), 4);
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(2, 5).to_string(), "2:5");
    }
}
