//! Span information for source locations
//!
//! Tags every AST node with the source range it came from, for error
//! reporting. There's no lexer in this crate to fill in real byte/line/
//! column positions, so in practice every span the `Builder` produces is
//! `Span::empty()` — but `RuntimeFault` and `SemanticError` still carry one
//! on each variant, ready for whatever eventually parses real source text.

use serde::{Deserialize, Serialize};

/// Represents a span in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset start (0-indexed)
    pub start: usize,
    /// Byte offset end (exclusive)
    pub end: usize,
    /// Line number (1-indexed)
    pub start_line: usize,
    /// Line number (1-indexed)
    pub end_line: usize,
    /// Column (1-indexed, in bytes)
    pub start_column: usize,
    /// Column (1-indexed, in bytes)
    pub end_column: usize,
}

impl Span {
    /// Create an empty span at position 0
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_span_is_zeroed() {
        let span = Span::empty();
        assert_eq!(span.start, 0);
        assert_eq!(span.end, 0);
    }
}
