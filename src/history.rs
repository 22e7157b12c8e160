//! Undo/redo history — transaction-based edit tracking.
//!
//! Records every mutation as a reversible [`Edit`] grouped into
//! [`Transaction`]s. A transaction is the atomic unit of undo/redo: each
//! plain mutation is one transaction, and a batch — however many
//! mutations it grouped — is one transaction, which is what makes a
//! whole batch undo with a single step.
//!
//! Unlike a history that mutates the buffer itself, this one hands the
//! popped transaction back to the document: undo/redo must flow through
//! the same record-synthesis and notification pipeline as any other
//! content change, so subscribers see history replay as ordinary
//! `ChangeSet`s (tagged with their origin).
//!
//! Empty transactions (no edits between begin and commit) are silently
//! discarded — they don't clutter the undo stack.

use vellum_text::Position;

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

/// A single reversible buffer edit.
///
/// Each edit records the position and the text involved, which is enough
/// to reconstruct both the forward and the reverse operation. A
/// replacement is recorded as a delete followed by an insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Edit {
    /// `text` was inserted at `pos`. Undo = delete it. Redo = insert it.
    Insert { pos: Position, text: String },

    /// `text` was deleted starting at `pos` — captured from the buffer
    /// before the deletion. Undo = insert it back. Redo = delete it again.
    Delete { pos: Position, text: String },
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A group of edits that undo/redo as one atomic unit.
///
/// Also tracks the cursor so that undo restores it to where it was before
/// the transaction and redo to where it was after.
#[derive(Debug, Clone)]
pub(crate) struct Transaction {
    pub edits: Vec<Edit>,
    pub cursor_before: Position,
    pub cursor_after: Position,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Undo/redo history for one buffer.
///
/// Two stacks: transactions that can be undone and transactions that can
/// be redone. New edits clear the redo stack — branching history is not
/// supported.
#[derive(Debug, Default)]
pub(crate) struct History {
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
    pending: Option<Transaction>,
}

impl History {
    /// Create an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            pending: None,
        }
    }

    /// Start a new transaction. `cursor` is the cursor position before any
    /// edits in this transaction.
    ///
    /// If a previous transaction was still pending (begin without commit),
    /// it is auto-committed first.
    pub fn begin(&mut self, cursor: Position) {
        if self.pending.is_some() {
            self.commit(cursor);
        }
        self.pending = Some(Transaction {
            edits: Vec::new(),
            cursor_before: cursor,
            cursor_after: cursor,
        });
    }

    /// Record that `text` was inserted at `pos`. Does nothing if no
    /// transaction is pending.
    pub fn record_insert(&mut self, pos: Position, text: &str) {
        if let Some(txn) = &mut self.pending {
            txn.edits.push(Edit::Insert {
                pos,
                text: text.to_owned(),
            });
        }
    }

    /// Record that `text` was deleted starting at `pos` — capture it from
    /// the buffer before deleting. Does nothing if no transaction is
    /// pending.
    pub fn record_delete(&mut self, pos: Position, text: &str) {
        if let Some(txn) = &mut self.pending {
            txn.edits.push(Edit::Delete {
                pos,
                text: text.to_owned(),
            });
        }
    }

    /// Finalize the current transaction. `cursor` is the cursor position
    /// after all edits in this transaction.
    ///
    /// Empty transactions are discarded. New transactions clear the redo
    /// stack.
    pub fn commit(&mut self, cursor: Position) {
        if let Some(mut txn) = self.pending.take() {
            if txn.edits.is_empty() {
                return;
            }
            txn.cursor_after = cursor;
            self.redo_stack.clear();
            self.undo_stack.push(txn);
        }
    }

    /// Pop the most recent transaction for undoing. The transaction moves
    /// to the redo stack; the returned copy is the caller's to apply in
    /// reverse.
    ///
    /// A pending transaction is auto-committed first so it can be undone.
    pub fn undo(&mut self) -> Option<Transaction> {
        if let Some(txn) = self.pending.take() {
            if !txn.edits.is_empty() {
                self.redo_stack.clear();
                self.undo_stack.push(txn);
            }
        }

        let txn = self.undo_stack.pop()?;
        self.redo_stack.push(txn.clone());
        Some(txn)
    }

    /// Pop the most recent undone transaction for re-applying. The
    /// transaction moves back to the undo stack.
    pub fn redo(&mut self) -> Option<Transaction> {
        let txn = self.redo_stack.pop()?;
        self.undo_stack.push(txn.clone());
        Some(txn)
    }

    /// True if there is anything to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
            || self.pending.as_ref().is_some_and(|t| !t.edits.is_empty())
    }

    /// True if there is anything to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
