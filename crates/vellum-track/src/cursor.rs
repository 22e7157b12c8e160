//! Cursor tracking — net-movement detection, outside the change pipeline.
//!
//! The cursor can move for two reasons: an explicit jump, or a content
//! mutation at or before it. Either way, subscribers only care about a
//! *net, distinct* change — polling the tracker twice in a row, or moving
//! the cursor back to where it already was, must not produce an event.
//! [`CursorTracker`] holds the last reported position and compares.
//!
//! [`shift`] is the companion arithmetic: how a single edit moves a
//! right-gravity mark (the cursor) expressed as a char index.

use vellum_text::Position;

// ---------------------------------------------------------------------------
// CursorTracker
// ---------------------------------------------------------------------------

/// Emits a cursor position only when it differs from the last one emitted.
///
/// The position handed to [`check`](Self::check) must already be resolved
/// (never the end marker) — the caller normalizes first, which is what
/// makes the dedupe exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorTracker {
    last: Position,
}

impl CursorTracker {
    /// A tracker that has last seen the start of the document.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: Position::START,
        }
    }

    /// The last position reported.
    #[inline]
    #[must_use]
    pub const fn last(&self) -> Position {
        self.last
    }

    /// Compare `current` to the last reported position. Returns
    /// `Some(current)` — and remembers it — only if it differs; `None`
    /// makes repeated checks idempotent.
    pub const fn check(&mut self, current: Position) -> Option<Position> {
        if current.line == self.last.line && current.col == self.last.col {
            None
        } else {
            self.last = current;
            Some(current)
        }
    }
}

impl Default for CursorTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Mark shifting
// ---------------------------------------------------------------------------

/// Where a right-gravity mark at char index `mark` lands after `old_len`
/// chars at `edit_start` become `new_len` chars.
///
/// - an edit strictly after the mark leaves it alone;
/// - a mark inside the replaced span (or exactly at its start) collapses
///   to the span start and is pushed past the inserted text — right
///   gravity, so typing at the cursor advances it;
/// - a mark after the span moves by the length delta.
#[must_use]
pub const fn shift(mark: usize, edit_start: usize, old_len: usize, new_len: usize) -> usize {
    if mark < edit_start {
        mark
    } else if mark <= edit_start + old_len {
        edit_start + new_len
    } else {
        mark - old_len + new_len
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
