//! Text position and range types.
//!
//! Lines are **1-indexed** and columns are **0-indexed** char offsets — the
//! first character of a document is `1:0`. Columns count Unicode scalar
//! values (chars), not bytes or grapheme clusters, which matches how the
//! rope indexes text.
//!
//! Only `'\n'` terminates a line in position arithmetic. A lone `'\r'` is an
//! ordinary character (the first half of `"\r\n"` simply sits on the column
//! before the `'\n'`), matching the rope's line model.

use std::fmt;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A position in a text buffer: 1-indexed line, 0-indexed char column.
///
/// `col` is the char offset from the start of the line, **not** a byte
/// offset. For the line `"café\n"`, column 3 is `'é'`, column 4 is the
/// `'\n'`, and column 4 is also where an insertion lands to extend the line.
///
/// # Ordering
///
/// Positions are ordered lexicographically: line first, then column, so
/// `1:100 < 2:0`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// The start of any document — line 1, column 0.
    pub const START: Self = Self { line: 1, col: 0 };

    /// Create a new position. `line` must be ≥ 1.
    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        debug_assert!(line >= 1, "lines are 1-indexed");
        Self { line, col }
    }

    /// True when this is the start of the document.
    #[inline]
    #[must_use]
    pub const fn is_start(self) -> bool {
        self.line == 1 && self.col == 0
    }

    /// The position just past `text` when it begins at `self`.
    ///
    /// Walks the text counting `'\n'` line breaks. Used to turn an insertion
    /// (start + inserted text) into the range it occupies afterwards, and a
    /// recorded deletion (start + removed text) back into its original span.
    #[must_use]
    pub fn advance_through(self, text: &str) -> Self {
        let mut line = self.line;
        let mut col = self.col;
        for ch in text.chars() {
            if ch == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        Self { line, col }
    }
}

// Natural ordering: line first, then column.
impl Ord for Position {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for Position {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// A half-open range in a text buffer: `[start, end)`.
///
/// `start` is inclusive, `end` is exclusive. An empty range has
/// `start == end`. Ranges are always kept normalized so that
/// `start <= end` — use [`Range::new`], or [`Range::ordered`] on
/// untrusted endpoints.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a range. Panics in debug if `start > end`.
    #[inline]
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        debug_assert!(
            start.line < end.line || (start.line == end.line && start.col <= end.col),
            "Range::new requires start <= end"
        );
        Self { start, end }
    }

    /// Create a range from two arbitrary positions, swapping if needed so
    /// that `start <= end`.
    #[inline]
    #[must_use]
    pub fn ordered(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// A zero-width range (a caret) at the given position.
    #[inline]
    #[must_use]
    pub const fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// True when the range spans zero characters (`start == end`).
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start.line == self.end.line && self.start.col == self.end.col
    }

    /// True when the given position falls within `[start, end)`.
    #[inline]
    #[must_use]
    pub fn contains(self, pos: Position) -> bool {
        pos >= self.start && pos < self.end
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Range({}:{} .. {}:{})",
            self.start.line, self.start.col, self.end.line, self.end.col
        )
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
