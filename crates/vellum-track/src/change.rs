//! Change records — the minimal description of one content mutation.
//!
//! A [`Change`] says that `old_len` characters between `start` and `end`
//! in the pre-mutation buffer were replaced with `new_text`:
//!
//! - insertion: `start == end`, `old_len == 0`
//! - deletion: `start < end`, `new_text` empty
//! - replacement: `start < end`, `new_text` non-empty
//!
//! `old_len` is not redundant with the positions. For a single-line span
//! it happens to equal the column difference, but once a span crosses a
//! line break the column arithmetic says nothing about how many characters
//! were removed — so the length is always measured, never derived.
//!
//! A [`ChangeSet`] is one or more changes delivered as a single
//! notification, in chronological order: applying the records one after
//! another onto a copy of the pre-mutation content reproduces the
//! post-mutation content exactly ([`ChangeSet::apply_to`]).

use std::fmt;

use vellum_text::{Buffer, Position};

use crate::error::TrackError;

// ---------------------------------------------------------------------------
// Change
// ---------------------------------------------------------------------------

/// One content mutation: `old_len` chars in `[start, end)` became
/// `new_text`.
#[derive(Clone, PartialEq, Eq)]
pub struct Change {
    /// Start of the replaced span (inclusive).
    pub start: Position,
    /// End of the replaced span (exclusive). Equal to `start` for a pure
    /// insertion.
    pub end: Position,
    /// Char count of the replaced span in the buffer it applied to.
    pub old_len: usize,
    /// The text that replaced the span. Empty for a pure deletion.
    pub new_text: String,
}

impl Change {
    /// An insertion of `text` at `at`.
    #[must_use]
    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            old_len: 0,
            new_text: text.into(),
        }
    }

    /// A deletion of `old_len` chars spanning `[start, end)`.
    #[must_use]
    pub const fn remove(start: Position, end: Position, old_len: usize) -> Self {
        Self {
            start,
            end,
            old_len,
            new_text: String::new(),
        }
    }

    /// A replacement of `old_len` chars spanning `[start, end)` with
    /// `text`.
    #[must_use]
    pub fn replace(
        start: Position,
        end: Position,
        old_len: usize,
        text: impl Into<String>,
    ) -> Self {
        Self {
            start,
            end,
            old_len,
            new_text: text.into(),
        }
    }

    /// True for a pure insertion.
    #[inline]
    #[must_use]
    pub fn is_insert(&self) -> bool {
        self.old_len == 0 && !self.new_text.is_empty()
    }

    /// True for a pure deletion.
    #[inline]
    #[must_use]
    pub fn is_remove(&self) -> bool {
        self.old_len > 0 && self.new_text.is_empty()
    }

    /// True for a replacement (removes and inserts).
    #[inline]
    #[must_use]
    pub fn is_replace(&self) -> bool {
        self.old_len > 0 && !self.new_text.is_empty()
    }

    /// True when the change does nothing at all. Such records are filtered
    /// out before emission.
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.start == self.end && self.old_len == 0 && self.new_text.is_empty()
    }

    /// Char count of `new_text`.
    #[inline]
    #[must_use]
    pub fn new_len(&self) -> usize {
        self.new_text.chars().count()
    }

    /// The position just past `new_text` once the change is applied — the
    /// end of the touched region in the post-mutation buffer. Consumers
    /// recomputing per-range state (highlight tokens, line layout) repaint
    /// `[start, end_after)`.
    #[must_use]
    pub fn end_after(&self) -> Position {
        self.start.advance_through(&self.new_text)
    }
}

impl fmt::Debug for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Change({} .. {}, -{} +{:?})",
            self.start, self.end, self.old_len, self.new_text
        )
    }
}

// ---------------------------------------------------------------------------
// ChangeSet
// ---------------------------------------------------------------------------

/// Why a `ChangeSet` was emitted. Language-server sync and similar
/// consumers treat fresh edits and history replay differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A direct mutation through an entry point (including batches,
    /// find/replace, and reload).
    Edit,
    /// Inverse records produced by undoing a transaction.
    Undo,
    /// Records produced by re-applying an undone transaction.
    Redo,
}

/// One or more changes delivered as a single notification.
///
/// Chronological: the first record applied first. `ChangeSet` values are
/// transient — built per operation (or per batch), emitted once, and owned
/// by no one afterwards; consumers take their own copy or projection.
#[derive(Clone, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
    origin: ChangeOrigin,
}

impl ChangeSet {
    /// A change set of fresh edits. Returns `None` when `changes` is empty
    /// — an empty set is never emitted.
    #[must_use]
    pub fn from_edits(changes: Vec<Change>) -> Option<Self> {
        Self::with_origin(changes, ChangeOrigin::Edit)
    }

    /// A change set with an explicit origin. Returns `None` when `changes`
    /// is empty.
    #[must_use]
    pub fn with_origin(changes: Vec<Change>, origin: ChangeOrigin) -> Option<Self> {
        if changes.is_empty() {
            None
        } else {
            Some(Self { changes, origin })
        }
    }

    /// The records, in application order.
    #[inline]
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Iterate the records in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    /// Number of records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Always false — empty sets cannot be constructed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Why this set was emitted.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> ChangeOrigin {
        self.origin
    }

    /// Replay the records onto `buf`, in order.
    ///
    /// Applying every set a document emitted, in emission order, onto a
    /// buffer holding the document's initial content reproduces the
    /// document's final content. This is what a language-server client
    /// does on the other side of the wire, and what the round-trip tests
    /// verify.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if a record does not fit `buf` — the buffer does not
    /// hold the content the records were computed against.
    pub fn apply_to(&self, buf: &mut Buffer) -> Result<(), TrackError> {
        for change in &self.changes {
            let idx = buf
                .pos_to_char_idx(buf.resolve_end(change.start))
                .ok_or(TrackError::OutOfRange(change.start))?;
            if change.old_len > 0 {
                if idx + change.old_len > buf.len_chars() {
                    return Err(TrackError::OutOfRange(change.end));
                }
                buf.remove(idx..idx + change.old_len);
            }
            buf.insert(idx, &change.new_text);
        }
        Ok(())
    }
}

impl fmt::Debug for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSet")
            .field("origin", &self.origin)
            .field("changes", &self.changes)
            .finish()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // -- Change predicates --------------------------------------------------

    #[test]
    fn change_kinds() {
        let ins = Change::insert(Position::new(1, 0), "hi");
        assert!(ins.is_insert() && !ins.is_remove() && !ins.is_replace());

        let del = Change::remove(Position::new(1, 0), Position::new(1, 2), 2);
        assert!(del.is_remove() && !del.is_insert() && !del.is_replace());

        let rep = Change::replace(Position::new(1, 0), Position::new(1, 2), 2, "xy");
        assert!(rep.is_replace() && !rep.is_insert() && !rep.is_remove());
    }

    #[test]
    fn noop_detection() {
        let p = Position::new(1, 3);
        assert!(Change::insert(p, "").is_noop());
        assert!(!Change::insert(p, "x").is_noop());
        assert!(!Change::remove(p, Position::new(1, 4), 1).is_noop());
    }

    #[test]
    fn new_len_counts_chars_not_bytes() {
        let c = Change::insert(Position::START, "café");
        assert_eq!(c.new_len(), 4);
        assert_eq!(c.new_text.len(), 5);
    }

    #[test]
    fn end_after_tracks_newlines() {
        let c = Change::insert(Position::new(2, 3), "ab\nc");
        assert_eq!(c.end_after(), Position::new(3, 1));
    }

    // -- ChangeSet ----------------------------------------------------------

    #[test]
    fn empty_set_is_unconstructible() {
        assert!(ChangeSet::from_edits(Vec::new()).is_none());
    }

    #[test]
    fn origin_defaults_to_edit() {
        let set = ChangeSet::from_edits(vec![Change::insert(Position::START, "x")]).unwrap();
        assert_eq!(set.origin(), ChangeOrigin::Edit);
    }

    // -- Replay -------------------------------------------------------------

    #[test]
    fn apply_to_replays_in_order() {
        let set = ChangeSet::from_edits(vec![
            Change::insert(Position::START, "hello "),
            Change::insert(Position::new(1, 6), "there"),
            Change::remove(Position::new(1, 6), Position::new(1, 11), 5),
            Change::insert(Position::new(1, 6), "world"),
        ])
        .unwrap();

        let mut buf = Buffer::new();
        set.apply_to(&mut buf).unwrap();
        assert_eq!(buf.contents(), "hello world");
    }

    #[test]
    fn apply_to_handles_replacement() {
        let set = ChangeSet::from_edits(vec![Change::replace(
            Position::new(1, 0),
            Position::new(1, 5),
            5,
            "toot",
        )])
        .unwrap();

        let mut buf = Buffer::from_text("hello world");
        set.apply_to(&mut buf).unwrap();
        assert_eq!(buf.contents(), "toot world");
    }

    #[test]
    fn apply_to_rejects_stale_records() {
        let set = ChangeSet::from_edits(vec![Change::remove(
            Position::new(1, 4),
            Position::new(1, 9),
            5,
        )])
        .unwrap();

        let mut buf = Buffer::from_text("hi");
        assert_eq!(
            set.apply_to(&mut buf),
            Err(TrackError::OutOfRange(Position::new(1, 4)))
        );
    }
}
