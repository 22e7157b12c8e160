//! Batch scope — many mutations, one notification, one undo step.
//!
//! While a batch is active every computed change is appended here instead
//! of being emitted. Finishing the batch yields at most one `ChangeSet`
//! holding the accumulated records in original order, plus the cursor
//! position captured when the batch began — the caller restores it, so
//! from the outside a batch has no net cursor effect regardless of how
//! the edits inside moved it.

use vellum_text::Position;

use crate::change::{Change, ChangeSet};

/// Accumulator for one active batch.
#[derive(Debug)]
pub struct BatchScope {
    changes: Vec<Change>,
    cursor_at_begin: Position,
}

impl BatchScope {
    /// Open a scope, capturing the cursor position to restore at the end.
    #[must_use]
    pub const fn new(cursor_at_begin: Position) -> Self {
        Self {
            changes: Vec::new(),
            cursor_at_begin,
        }
    }

    /// Append records in the order their mutations were applied.
    pub fn extend(&mut self, changes: impl IntoIterator<Item = Change>) {
        self.changes.extend(changes);
    }

    /// Records accumulated so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// True when nothing has been accumulated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The cursor position captured at `new`.
    #[inline]
    #[must_use]
    pub const fn cursor_at_begin(&self) -> Position {
        self.cursor_at_begin
    }

    /// Close the scope: the single `ChangeSet` to emit (`None` if nothing
    /// accumulated — an empty batch emits nothing) and the cursor position
    /// to restore.
    #[must_use]
    pub fn finish(self) -> (Option<ChangeSet>, Position) {
        (ChangeSet::from_edits(self.changes), self.cursor_at_begin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_emits_nothing() {
        let scope = BatchScope::new(Position::new(2, 1));
        let (set, cursor) = scope.finish();
        assert!(set.is_none());
        assert_eq!(cursor, Position::new(2, 1));
    }

    #[test]
    fn finish_preserves_order() {
        let mut scope = BatchScope::new(Position::START);
        scope.extend([Change::insert(Position::new(1, 0), "a")]);
        scope.extend([
            Change::insert(Position::new(1, 1), "b"),
            Change::remove(Position::new(1, 0), Position::new(1, 1), 1),
        ]);
        assert_eq!(scope.len(), 3);

        let (set, _) = scope.finish();
        let set = set.unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.changes()[0].new_text, "a");
        assert_eq!(set.changes()[1].new_text, "b");
        assert!(set.changes()[2].is_remove());
    }
}
