//! The edit funnel.
//!
//! Every mutation a view can request — a keystroke, find/replace, a
//! programmatic reload — is expressed as one [`EditOp`] and routed through
//! a single interception point. That is what makes tracking airtight:
//! there is no second, uninstrumented path to the buffer. Cursor movement
//! travels through the same funnel because inserting before the cursor
//! moves it just as surely as an explicit jump does.

use vellum_text::Position;

/// A request to a tracked document.
///
/// The three content mutations produce change records; `MoveCursor` only
/// feeds cursor tracking and has no diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Insert `text` at `at`. An `at` equal to the buffer's end marker
    /// resolves to the position just before the virtual trailing newline.
    Insert { at: Position, text: String },

    /// Delete one or more spans in a single operation.
    ///
    /// Indices pair up as `(start, end)` ranges; a trailing unpaired index
    /// deletes the single character at that index. See
    /// [`diff::delete_spans`](crate::diff::delete_spans) for the full
    /// normalization rules.
    Delete { indices: Vec<Position> },

    /// Replace `[start, end)` with `text`.
    Replace {
        start: Position,
        end: Position,
        text: String,
    },

    /// Move the cursor to a position. Not a content mutation.
    MoveCursor(Position),
}

impl EditOp {
    /// Short operation name, used in logs and error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
            Self::Replace { .. } => "replace",
            Self::MoveCursor(_) => "move_cursor",
        }
    }

    /// True for the three operations that change buffer content.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::MoveCursor(_))
    }
}
