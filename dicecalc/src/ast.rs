//! AST infrastructure types
//!
//! Source locations shared by the document parser, the expression parser
//! and the diagnostics they produce.

use serde::Serialize;

/// Span representing a location in source code.
///
/// `start`/`end` are byte offsets into the whole document, `line`/`col` are
/// 1-based and point at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn from_pest_span(span: pest::Span, origin: SourceOrigin) -> Self {
        let (_, col) = span.start_pos().line_col();
        Self {
            start: origin.offset + span.start(),
            end: origin.offset + span.end(),
            line: origin.line,
            col: origin.col + col - 1,
        }
    }

    /// Span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Self {
        Self {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            col: self.col,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Where a piece of text sits inside the enclosing document.
///
/// The expression parser works on a slice of one line; the origin translates
/// its local offsets back into document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceOrigin {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl SourceOrigin {
    pub fn new(offset: usize, line: usize, col: usize) -> Self {
        Self { offset, line, col }
    }

    /// Origin for text that is parsed on its own (line 1, column 1).
    pub fn detached() -> Self {
        Self::new(0, 1, 1)
    }

    /// Origin of a byte offset that lies `local` bytes into the same line.
    pub fn advance(self, local: usize) -> Self {
        Self {
            offset: self.offset + local,
            line: self.line,
            col: self.col + local,
        }
    }

    pub fn span(self, start: usize, end: usize) -> Span {
        Span {
            start: self.offset + start,
            end: self.offset + end,
            line: self.line,
            col: self.col + start,
        }
    }
}
