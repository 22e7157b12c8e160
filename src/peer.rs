//! Peer views — several views, one buffer, one tracker.
//!
//! A `Peer` is a secondary view of a tracked buffer. Interception is in
//! place on it transparently: edits made through a peer run through the
//! same funnel — and therefore the same batch accumulator, cursor, and
//! notifier — as edits made through the primary document. Subscribe on
//! the primary; peers have no emission target of their own.

use vellum_text::Position;
use vellum_track::{EditOp, TrackError};

use crate::document::{apply_op, EditView, SharedBuffer};

/// A secondary view of a tracked buffer.
///
/// Carries the three mutation entry points and cursor movement; batching,
/// history, subscriptions, and persistence stay on the primary
/// [`Document`](crate::Document).
pub struct Peer {
    shared: SharedBuffer,
}

impl Peer {
    pub(crate) fn new(shared: SharedBuffer) -> Self {
        Self { shared }
    }

    /// Insert `text` at `at`. See [`Document::insert`](crate::Document::insert).
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `at` is not a valid position.
    pub fn insert(&mut self, at: Position, text: &str) -> Result<(), TrackError> {
        apply_op(
            &self.shared,
            EditOp::Insert {
                at,
                text: text.to_owned(),
            },
        )
    }

    /// Delete one or more spans. See [`Document::delete`](crate::Document::delete).
    ///
    /// # Errors
    ///
    /// `OutOfRange` if any index is not a valid position.
    pub fn delete(&mut self, indices: &[Position]) -> Result<(), TrackError> {
        apply_op(
            &self.shared,
            EditOp::Delete {
                indices: indices.to_vec(),
            },
        )
    }

    /// Replace `[start, end)` with `text`. See
    /// [`Document::replace`](crate::Document::replace).
    ///
    /// # Errors
    ///
    /// `OutOfRange` for an invalid endpoint, `InvalidRange` when `start`
    /// is after `end`.
    pub fn replace(
        &mut self,
        start: Position,
        end: Position,
        text: &str,
    ) -> Result<(), TrackError> {
        apply_op(
            &self.shared,
            EditOp::Replace {
                start,
                end,
                text: text.to_owned(),
            },
        )
    }

    /// Move the shared cursor.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `pos` is not a valid position.
    pub fn set_cursor(&mut self, pos: Position) -> Result<(), TrackError> {
        apply_op(&self.shared, EditOp::MoveCursor(pos))
    }

    /// The shared cursor position.
    #[must_use]
    pub fn cursor(&self) -> Position {
        let shared = self.shared.inner.borrow();
        shared
            .tracking
            .as_ref()
            .map_or(Position::START, |t| t.cursor)
    }

    /// Current content — identical to the primary's, always.
    #[must_use]
    pub fn contents(&self) -> String {
        self.shared.contents()
    }

    /// A handle to the underlying shared buffer.
    #[must_use]
    pub fn share(&self) -> SharedBuffer {
        self.shared.clone()
    }
}

impl EditView for Peer {
    fn insert(&mut self, at: Position, text: &str) -> Result<(), TrackError> {
        Self::insert(self, at, text)
    }

    fn delete(&mut self, indices: &[Position]) -> Result<(), TrackError> {
        Self::delete(self, indices)
    }

    fn replace(
        &mut self,
        start: Position,
        end: Position,
        text: &str,
    ) -> Result<(), TrackError> {
        Self::replace(self, start, end, text)
    }

    fn set_cursor(&mut self, pos: Position) -> Result<(), TrackError> {
        Self::set_cursor(self, pos)
    }
}
