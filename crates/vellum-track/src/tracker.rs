//! The change tracker — batch state, cursor state, and the
//! emit-or-accumulate decision for one buffer.
//!
//! Exactly one `ChangeTracker` exists per tracked buffer, owned by the
//! primary view and shared by its peers. It does not deliver anything
//! itself — the facade's notifier does that — it decides *what* a
//! mutation's records become: an immediate one-operation `ChangeSet`, or
//! entries in the active [`BatchScope`].

use vellum_text::Position;

use crate::batch::BatchScope;
use crate::change::{Change, ChangeSet};
use crate::cursor::CursorTracker;
use crate::error::TrackError;

/// Per-buffer tracking state: the optional active batch and the cursor
/// dedupe state.
#[derive(Debug)]
pub struct ChangeTracker {
    batch: Option<BatchScope>,
    cursor: CursorTracker,
}

impl ChangeTracker {
    /// A tracker with no active batch and the cursor at document start.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            batch: None,
            cursor: CursorTracker::new(),
        }
    }

    /// True while a batch is active.
    #[inline]
    #[must_use]
    pub const fn in_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Open a batch, capturing `cursor` for restore at finish.
    ///
    /// # Errors
    ///
    /// `NestedBatch` if a batch is already active — batches do not nest.
    pub fn begin_batch(&mut self, cursor: Position) -> Result<(), TrackError> {
        if self.batch.is_some() {
            return Err(TrackError::NestedBatch);
        }
        log::debug!("batch begun, cursor at {cursor}");
        self.batch = Some(BatchScope::new(cursor));
        Ok(())
    }

    /// Close the active batch: the `ChangeSet` to emit (if anything
    /// accumulated) and the cursor position to restore. Returns `None`
    /// when no batch was active.
    pub fn finish_batch(&mut self) -> Option<(Option<ChangeSet>, Position)> {
        let scope = self.batch.take()?;
        log::debug!("batch finished with {} change(s)", scope.len());
        Some(scope.finish())
    }

    /// Route one mutation's records: drop no-ops, then either append to
    /// the active batch (returning `None`) or wrap into a one-operation
    /// `ChangeSet` for immediate emission. `None` with no batch active
    /// means the mutation changed nothing.
    pub fn absorb(&mut self, changes: Vec<Change>) -> Option<ChangeSet> {
        let changes: Vec<Change> = changes.into_iter().filter(|c| !c.is_noop()).collect();
        if changes.is_empty() {
            return None;
        }
        match &mut self.batch {
            Some(scope) => {
                scope.extend(changes);
                None
            }
            None => ChangeSet::from_edits(changes),
        }
    }

    /// Run the net-cursor-movement check. `resolved` must not be the end
    /// marker. Returns the position to announce, if it is news.
    pub const fn cursor_moved(&mut self, resolved: Position) -> Option<Position> {
        self.cursor.check(resolved)
    }

    /// The last cursor position announced (or document start).
    #[inline]
    #[must_use]
    pub const fn last_cursor(&self) -> Position {
        self.cursor.last()
    }
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}
