//! Source positions carried by every syntax node and compile fault.

use std::fmt;

/// A position in a source file, as reported by the external parser.
///
/// Nodes synthesized by the compiler itself (companion functions, desugared
/// loops, pattern tests) carry [`Span::NONE`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed, 0 for synthesized code).
    pub line: u32,
    /// Column number (1-indexed, 0 when unknown).
    pub col: u32,
}

impl Span {
    /// The position of synthesized code.
    pub const NONE: Span = Span { line: 0, col: 0 };

    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// A position that only knows its line.
    #[inline]
    pub fn line(line: u32) -> Self {
        Self { line, col: 0 }
    }

    /// Whether this span points at synthesized code.
    #[inline]
    pub fn is_none(&self) -> bool {
        self.line == 0
    }

    /// Returns `self` unless it is synthesized, in which case `fallback`.
    ///
    /// Used when a fault inside generated code should be reported at the
    /// user's call site instead.
    #[inline]
    pub fn or(self, fallback: Span) -> Span {
        if self.is_none() { fallback } else { self }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.col) {
            (0, _) => write!(f, "<generated>"),
            (line, 0) => write!(f, "{line}"),
            (line, col) => write!(f, "{line}:{col}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_display() {
        assert_eq!(Span::new(3, 15).to_string(), "3:15");
        assert_eq!(Span::line(7).to_string(), "7");
        assert_eq!(Span::NONE.to_string(), "<generated>");
    }

    #[test]
    fn span_or_prefers_real_positions() {
        let call_site = Span::new(4, 2);
        assert_eq!(Span::NONE.or(call_site), call_site);
        assert_eq!(Span::new(1, 1).or(call_site), Span::new(1, 1));
    }
}
