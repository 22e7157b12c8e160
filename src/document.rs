//! The tracked document — one buffer, one tracker, any number of views.
//!
//! [`SharedBuffer`] is a cheaply-clonable handle to one buffer plus its
//! at-most-one tracking state. [`SharedBuffer::attach`] installs the
//! tracker and returns the primary [`Document`];
//! [`SharedBuffer::create_peer`] hands out secondary
//! [`Peer`](crate::peer::Peer) views afterwards. The tracker, batch
//! accumulator, cursor, history, and notifier exist once per buffer, never
//! once per view — ownership is explicit rather than looked up through a
//! side table keyed on view identity.
//!
//! # The edit funnel
//!
//! Every mutation from every view becomes an
//! [`EditOp`](vellum_track::EditOp) and passes through one code path:
//! compute the records against the pre-mutation buffer, apply to storage,
//! record history, shift the cursor, then emit (or accumulate, inside a
//! batch). Calling anything lower-level than the funnel bypasses tracking
//! and is a caller error, not a supported path.

use std::cell::RefCell;
use std::io;
use std::path::Path;
use std::rc::Rc;

use vellum_text::{Buffer, Position};
use vellum_track::{
    cursor, diff, Change, ChangeOrigin, ChangeSet, ChangeTracker, EditOp, TrackError,
};

use crate::history::{Edit, History};
use crate::notify::{Notification, Notifier};
use crate::peer::Peer;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Behavior chosen at tracker attachment. Options must be settled before
/// tracking begins; they are not reconfigurable on a live document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Record undo history. When false, `undo`/`redo` have nothing to do.
    pub undo: bool,

    /// Queue notifications until the host loop calls
    /// [`Document::deliver_pending`] instead of delivering at the end of
    /// each entry point. Delivery scheduling only — diffing and storage
    /// mutation always happen inside the entry point.
    pub deferred_delivery: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            undo: true,
            deferred_delivery: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Per-buffer tracking state, created by `attach`.
pub(crate) struct Tracking {
    pub tracker: ChangeTracker,
    pub cursor: Position,
    pub history: History,
    pub notifier: Notifier,
    pub options: DocumentOptions,
}

/// One buffer plus its optional tracking state.
pub(crate) struct Shared {
    pub buffer: Buffer,
    pub tracking: Option<Tracking>,
}

/// A cheaply-clonable handle to one shared buffer.
///
/// Views created from the same handle see the same content. Tracking is
/// attached exactly once, producing the primary [`Document`]; peers are
/// created only after that.
#[derive(Clone)]
pub struct SharedBuffer {
    pub(crate) inner: Rc<RefCell<Shared>>,
}

impl SharedBuffer {
    /// Wrap a buffer for sharing. No tracking yet.
    #[must_use]
    pub fn new(buffer: Buffer) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Shared {
                buffer,
                tracking: None,
            })),
        }
    }

    /// Shorthand for wrapping a fresh buffer holding `text`.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::new(Buffer::from_text(text))
    }

    /// Install change tracking and return the primary view. Must run
    /// exactly once per buffer, before any peer view is created.
    ///
    /// # Errors
    ///
    /// `AlreadyTracked` if this buffer already has a tracker.
    pub fn attach(&self, options: DocumentOptions) -> Result<Document, TrackError> {
        let mut shared = self.inner.borrow_mut();
        if shared.tracking.is_some() {
            return Err(TrackError::AlreadyTracked);
        }
        log::debug!("tracker attached ({options:?})");
        shared.tracking = Some(Tracking {
            tracker: ChangeTracker::new(),
            cursor: Position::START,
            history: History::new(),
            notifier: Notifier::new(options.deferred_delivery),
            options,
        });
        drop(shared);
        Ok(Document {
            shared: self.clone(),
        })
    }

    /// Create a secondary view. Edits made through it are captured and
    /// routed to the same tracker and emission target as the primary.
    ///
    /// # Errors
    ///
    /// `PeerBeforeTracker` if no tracker has been attached yet.
    pub fn create_peer(&self) -> Result<Peer, TrackError> {
        if self.inner.borrow().tracking.is_none() {
            return Err(TrackError::PeerBeforeTracker);
        }
        log::debug!("peer view created");
        Ok(Peer::new(self.clone()))
    }

    /// True once a tracker is attached.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.inner.borrow().tracking.is_some()
    }

    /// Current content as a `String`.
    #[must_use]
    pub fn contents(&self) -> String {
        self.inner.borrow().buffer.contents()
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The primary view of a tracked buffer.
///
/// Owns nothing exclusively except its role: the three mutation entry
/// points live here and on every peer; batching, history, subscriptions,
/// and persistence live here only.
pub struct Document {
    shared: SharedBuffer,
}

impl Document {
    /// A tracked document over fresh content — wrap, attach, done.
    #[must_use]
    pub fn from_text(text: &str, options: DocumentOptions) -> Self {
        SharedBuffer::from_text(text)
            .attach(options)
            .expect("a fresh buffer has no tracker")
    }

    /// A tracked document over a file's content, line endings detected.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid
    /// UTF-8.
    pub fn from_file(path: &Path, options: DocumentOptions) -> io::Result<Self> {
        let buffer = Buffer::from_file(path)?;
        Ok(SharedBuffer::new(buffer)
            .attach(options)
            .expect("a fresh buffer has no tracker"))
    }

    // -- Mutation entry points ----------------------------------------------

    /// Insert `text` at `at`. `at` may be the buffer's end marker.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `at` is not a valid position.
    pub fn insert(&mut self, at: Position, text: &str) -> Result<(), TrackError> {
        self.apply(EditOp::Insert {
            at,
            text: text.to_owned(),
        })
    }

    /// Delete one or more spans in a single operation. Indices pair up as
    /// `(start, end)` ranges; a trailing unpaired index deletes one
    /// character. Overlapping and adjacent spans merge; backwards spans
    /// delete nothing.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if any index is not a valid position.
    pub fn delete(&mut self, indices: &[Position]) -> Result<(), TrackError> {
        self.apply(EditOp::Delete {
            indices: indices.to_vec(),
        })
    }

    /// Delete the single span `[start, end)`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if either endpoint is not a valid position.
    pub fn delete_range(&mut self, start: Position, end: Position) -> Result<(), TrackError> {
        self.delete(&[start, end])
    }

    /// Replace `[start, end)` with `text`.
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
        self.apply(EditOp::Replace {
            start,
            end,
            text: text.to_owned(),
        })
    }

    /// Move the cursor. Not a content mutation; feeds cursor tracking.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `pos` is not a valid position.
    pub fn set_cursor(&mut self, pos: Position) -> Result<(), TrackError> {
        self.apply(EditOp::MoveCursor(pos))
    }

    /// Route any [`EditOp`] through the funnel. The method behind the
    /// typed entry points, public for scripted and replayed requests.
    ///
    /// # Errors
    ///
    /// The per-operation errors of the typed entry points.
    pub fn apply(&mut self, op: EditOp) -> Result<(), TrackError> {
        apply_op(&self.shared, op)
    }

    // -- Batching -----------------------------------------------------------

    /// Group subsequent mutations into one notification and one undo
    /// step, and remember the cursor for restore at finish.
    ///
    /// # Errors
    ///
    /// `NestedBatch` if a batch is already active.
    pub fn begin_batch(&mut self) -> Result<(), TrackError> {
        let mut shared = self.shared.inner.borrow_mut();
        let tracking = tracking_mut(&mut shared.tracking);
        let cursor = tracking.cursor;
        tracking.tracker.begin_batch(cursor)?;
        if tracking.options.undo {
            tracking.history.begin(cursor);
        }
        Ok(())
    }

    /// Close the active batch: emit the accumulated records as one
    /// `ChangeSet` (nothing if the batch was empty), mark the undo
    /// boundary, and restore the cursor captured at begin. A call with no
    /// active batch is a no-op.
    pub fn finish_batch(&mut self) {
        {
            let mut guard = self.shared.inner.borrow_mut();
            let shared = &mut *guard;
            let tracking = tracking_mut(&mut shared.tracking);

            let Some((set, cursor_at_begin)) = tracking.tracker.finish_batch() else {
                log::warn!("finish_batch with no active batch");
                return;
            };
            if tracking.options.undo {
                tracking.history.commit(cursor_at_begin);
            }

            let restored = shared.buffer.clamp(cursor_at_begin);
            tracking.cursor = restored;
            if let Some(set) = set {
                tracking.notifier.queue(Notification::ContentChanged(set));
            }
            if let Some(p) = tracking.tracker.cursor_moved(restored) {
                tracking.notifier.queue(Notification::CursorMoved(p));
            }
        }
        deliver(&self.shared);
    }

    /// Run `f` inside a batch, finishing it on the way out whether `f`
    /// succeeded or not.
    ///
    /// # Errors
    ///
    /// `NestedBatch` if a batch is already active, plus whatever `f`
    /// returns.
    pub fn with_batch<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, TrackError>,
    ) -> Result<R, TrackError> {
        self.begin_batch()?;
        let result = f(self);
        self.finish_batch();
        result
    }

    /// True while a batch is active.
    #[must_use]
    pub fn in_batch(&self) -> bool {
        let shared = self.shared.inner.borrow();
        shared
            .tracking
            .as_ref()
            .is_some_and(|t| t.tracker.in_batch())
    }

    // -- Undo / redo --------------------------------------------------------

    /// Undo the most recent transaction. The inverse edits are applied to
    /// storage and emitted as one `ChangeSet` with origin `Undo`; the
    /// cursor returns to where the transaction began. Returns false when
    /// there is nothing to undo (or history is disabled).
    pub fn undo(&mut self) -> bool {
        replay_history(&self.shared, HistoryDirection::Undo)
    }

    /// Re-apply the most recently undone transaction, emitting origin
    /// `Redo`. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        replay_history(&self.shared, HistoryDirection::Redo)
    }

    /// True if there is anything to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        let shared = self.shared.inner.borrow();
        shared
            .tracking
            .as_ref()
            .is_some_and(|t| t.options.undo && t.history.can_undo())
    }

    /// True if there is anything to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        let shared = self.shared.inner.borrow();
        shared
            .tracking
            .as_ref()
            .is_some_and(|t| t.options.undo && t.history.can_redo())
    }

    // -- Subscriptions ------------------------------------------------------

    /// Subscribe to content changes. Handlers run after storage has
    /// already changed and must not assume delivery is synchronous with
    /// rendering.
    pub fn on_content_changed(&self, handler: impl FnMut(&ChangeSet) + 'static) {
        let mut shared = self.shared.inner.borrow_mut();
        tracking_mut(&mut shared.tracking).notifier.on_content(handler);
    }

    /// Subscribe to net cursor movement.
    pub fn on_cursor_moved(&self, handler: impl FnMut(Position) + 'static) {
        let mut shared = self.shared.inner.borrow_mut();
        tracking_mut(&mut shared.tracking).notifier.on_cursor(handler);
    }

    /// Drain the pending notification queue, invoking handlers in FIFO
    /// order. The host loop calls this each iteration under
    /// `deferred_delivery`; without deferral there is normally nothing
    /// pending.
    pub fn deliver_pending(&self) {
        drain(&self.shared);
    }

    // -- Cursor and coordinates ---------------------------------------------

    /// The current cursor position (always resolved, never the end
    /// marker).
    #[must_use]
    pub fn cursor(&self) -> Position {
        let shared = self.shared.inner.borrow();
        shared
            .tracking
            .as_ref()
            .map_or(Position::START, |t| t.cursor)
    }

    /// The position just past the virtual trailing newline.
    #[must_use]
    pub fn end_marker(&self) -> Position {
        self.shared.inner.borrow().buffer.end_marker()
    }

    /// The position just past the last real character.
    #[must_use]
    pub fn content_end(&self) -> Position {
        self.shared.inner.borrow().buffer.content_end()
    }

    /// Convert an absolute char index to a position.
    #[must_use]
    pub fn position_of(&self, char_idx: usize) -> Option<Position> {
        self.shared.inner.borrow().buffer.char_idx_to_pos(char_idx)
    }

    /// Convert a position to an absolute char index.
    #[must_use]
    pub fn char_idx(&self, pos: Position) -> Option<usize> {
        self.shared.inner.borrow().buffer.pos_to_char_idx(pos)
    }

    // -- Content and persistence --------------------------------------------

    /// Current content as a `String`.
    #[must_use]
    pub fn contents(&self) -> String {
        self.shared.inner.borrow().buffer.contents()
    }

    /// Total character count.
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.shared.inner.borrow().buffer.len_chars()
    }

    /// Total line count.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.shared.inner.borrow().buffer.line_count()
    }

    /// True when the buffer holds no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.inner.borrow().buffer.is_empty()
    }

    /// True when content has changed since the last save.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.shared.inner.borrow().buffer.is_modified()
    }

    /// Clear the modified flag without writing.
    pub fn mark_saved(&mut self) {
        self.shared.inner.borrow_mut().buffer.mark_saved();
    }

    /// Write the buffer back to its file path and clear the modified
    /// flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer has no path or the write fails.
    pub fn save(&mut self) -> io::Result<()> {
        self.shared.inner.borrow_mut().buffer.save()
    }

    // -- Sharing ------------------------------------------------------------

    /// A handle to the underlying shared buffer.
    #[must_use]
    pub fn share(&self) -> SharedBuffer {
        self.shared.clone()
    }

    /// Create a peer view. Infallible here — a `Document` proves the
    /// tracker is attached.
    #[must_use]
    pub fn create_peer(&self) -> Peer {
        self.shared
            .create_peer()
            .expect("a document implies an attached tracker")
    }
}

// ---------------------------------------------------------------------------
// EditView
// ---------------------------------------------------------------------------

/// The mutation surface every view of a tracked buffer exposes.
///
/// Both the primary [`Document`] and each [`Peer`] implement this, so call
/// sites that only need to edit — key handling, tools, scripted drivers —
/// can hold either view kind behind one seam. Everything still funnels
/// through the same tracker.
pub trait EditView {
    /// Insert `text` at `at`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `at` is not a valid position.
    fn insert(&mut self, at: Position, text: &str) -> Result<(), TrackError>;

    /// Delete one or more spans in a single operation.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if any index is not a valid position.
    fn delete(&mut self, indices: &[Position]) -> Result<(), TrackError>;

    /// Replace `[start, end)` with `text`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` for an invalid endpoint, `InvalidRange` when `start`
    /// is after `end`.
    fn replace(&mut self, start: Position, end: Position, text: &str)
    -> Result<(), TrackError>;

    /// Move the cursor.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `pos` is not a valid position.
    fn set_cursor(&mut self, pos: Position) -> Result<(), TrackError>;
}

impl EditView for Document {
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

// ---------------------------------------------------------------------------
// The funnel
// ---------------------------------------------------------------------------

/// How one mutation hits storage, in pre-mutation char indices.
enum Plan {
    Insert { idx: usize },
    Delete { spans: Vec<(usize, usize)> },
    Replace { idx: usize, old_len: usize },
}

fn tracking_mut(tracking: &mut Option<Tracking>) -> &mut Tracking {
    tracking
        .as_mut()
        .expect("views exist only after a tracker is attached")
}

/// Route one operation through diffing, storage, history, cursor
/// tracking, and emission. Shared by the primary document and every peer.
pub(crate) fn apply_op(shared_handle: &SharedBuffer, op: EditOp) -> Result<(), TrackError> {
    {
        let mut guard = shared_handle.inner.borrow_mut();
        let shared = &mut *guard;
        let tracking = tracking_mut(&mut shared.tracking);
        let buffer = &mut shared.buffer;

        if let EditOp::MoveCursor(pos) = op {
            let resolved = buffer.resolve_end(pos);
            let idx = buffer
                .pos_to_char_idx(resolved)
                .ok_or(TrackError::OutOfRange(resolved))?;
            let canonical = buffer
                .char_idx_to_pos(idx)
                .expect("index converted from a valid position");
            tracking.cursor = canonical;
            if let Some(p) = tracking.tracker.cursor_moved(canonical) {
                tracking.notifier.queue(Notification::CursorMoved(p));
            }
        } else {
            apply_mutation(buffer, tracking, &op)?;
        }
    }
    deliver(shared_handle);
    Ok(())
}

/// The mutation path: records first, storage second, everything else
/// after — an error leaves the buffer untouched.
fn apply_mutation(
    buffer: &mut Buffer,
    tracking: &mut Tracking,
    op: &EditOp,
) -> Result<(), TrackError> {
    // 1. Records and the application plan, both against the pre-mutation
    //    buffer. No-ops return before anything is touched.
    let (records, plan) = match op {
        EditOp::Insert { at, text } => match diff::insert_record(buffer, *at, text)? {
            None => return Ok(()),
            Some(record) => {
                let idx = buffer
                    .pos_to_char_idx(record.start)
                    .expect("record positions are valid");
                (vec![record], Plan::Insert { idx })
            }
        },
        EditOp::Delete { indices } => {
            let spans = diff::delete_spans(buffer, indices)?;
            if spans.is_empty() {
                return Ok(());
            }
            let records = diff::delete_records(buffer, &spans);
            (records, Plan::Delete { spans })
        }
        EditOp::Replace { start, end, text } => {
            match diff::replace_record(buffer, *start, *end, text)? {
                None => return Ok(()),
                Some(record) => {
                    let idx = buffer
                        .pos_to_char_idx(record.start)
                        .expect("record positions are valid");
                    let old_len = record.old_len;
                    (vec![record], Plan::Replace { idx, old_len })
                }
            }
        }
        EditOp::MoveCursor(_) => {
            return Err(TrackError::UnsupportedOperation(op.kind()));
        }
    };

    let new_text: &str = match op {
        EditOp::Insert { text, .. } | EditOp::Replace { text, .. } => text,
        _ => "",
    };
    let new_len = new_text.chars().count();
    let cursor_before = tracking.cursor;
    let cursor_idx = buffer
        .pos_to_char_idx(cursor_before)
        .expect("the cursor stays canonical");

    // 2. Capture removed text while it still exists — history needs the
    //    characters, not just the count.
    let mut removed: Vec<String> = Vec::new();
    if tracking.options.undo {
        match &plan {
            Plan::Insert { .. } => {}
            Plan::Delete { spans } => {
                for &(s, e) in spans {
                    removed.push(buffer.slice_idx(s..e).to_string());
                }
            }
            Plan::Replace { idx, old_len } => {
                if *old_len > 0 {
                    removed.push(buffer.slice_idx(*idx..*idx + *old_len).to_string());
                }
            }
        }
    }

    // 3. Storage. Merged delete spans apply highest start first, so a
    //    span's indices never shift under a deletion below it.
    match &plan {
        Plan::Insert { idx } => buffer.insert(*idx, new_text),
        Plan::Delete { spans } => {
            for &(s, e) in spans.iter().rev() {
                buffer.remove(s..e);
            }
        }
        Plan::Replace { idx, old_len } => {
            buffer.remove(*idx..*idx + *old_len);
            buffer.insert(*idx, new_text);
        }
    }

    // 4. Cursor: a right-gravity mark, shifted per edited span.
    let mut shifted = cursor_idx;
    match &plan {
        Plan::Insert { idx } => shifted = cursor::shift(shifted, *idx, 0, new_len),
        Plan::Delete { spans } => {
            for &(s, e) in spans.iter().rev() {
                shifted = cursor::shift(shifted, s, e - s, 0);
            }
        }
        Plan::Replace { idx, old_len } => {
            shifted = cursor::shift(shifted, *idx, *old_len, new_len);
        }
    }
    tracking.cursor = buffer
        .char_idx_to_pos(shifted)
        .expect("a shifted mark stays in bounds");

    // 5. History: one transaction per solo mutation; batches share the
    //    transaction opened at begin_batch.
    if tracking.options.undo {
        let solo = !tracking.tracker.in_batch();
        if solo {
            tracking.history.begin(cursor_before);
        }
        match &plan {
            Plan::Insert { .. } => {
                tracking
                    .history
                    .record_insert(records[0].start, &records[0].new_text);
            }
            Plan::Delete { .. } => {
                for (record, text) in records.iter().zip(&removed) {
                    tracking.history.record_delete(record.start, text);
                }
            }
            Plan::Replace { .. } => {
                let record = &records[0];
                if record.old_len > 0 {
                    tracking.history.record_delete(record.start, &removed[0]);
                }
                if !record.new_text.is_empty() {
                    tracking
                        .history
                        .record_insert(record.start, &record.new_text);
                }
            }
        }
        if solo {
            tracking.history.commit(tracking.cursor);
        }
    }

    // 6. Emit — or accumulate, when a batch is active.
    if let Some(set) = tracking.tracker.absorb(records) {
        log::trace!("emitting {} change record(s)", set.len());
        tracking.notifier.queue(Notification::ContentChanged(set));
    }
    if let Some(p) = tracking.tracker.cursor_moved(tracking.cursor) {
        tracking.notifier.queue(Notification::CursorMoved(p));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// History replay
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum HistoryDirection {
    Undo,
    Redo,
}

fn replay_history(shared_handle: &SharedBuffer, direction: HistoryDirection) -> bool {
    let replayed = {
        let mut guard = shared_handle.inner.borrow_mut();
        let shared = &mut *guard;
        let tracking = tracking_mut(&mut shared.tracking);
        let buffer = &mut shared.buffer;

        if !tracking.options.undo {
            return false;
        }
        let txn = match direction {
            HistoryDirection::Undo => tracking.history.undo(),
            HistoryDirection::Redo => tracking.history.redo(),
        };
        let Some(txn) = txn else {
            return false;
        };

        // Undo applies the inverse edits newest-first; redo re-applies
        // the originals oldest-first.
        let mut changes = Vec::with_capacity(txn.edits.len());
        match direction {
            HistoryDirection::Undo => {
                for edit in txn.edits.iter().rev() {
                    changes.push(invert_edit(buffer, edit));
                }
            }
            HistoryDirection::Redo => {
                for edit in &txn.edits {
                    changes.push(forward_edit(buffer, edit));
                }
            }
        }

        let target = match direction {
            HistoryDirection::Undo => txn.cursor_before,
            HistoryDirection::Redo => txn.cursor_after,
        };
        let restored = buffer.clamp(target);
        tracking.cursor = restored;

        let origin = match direction {
            HistoryDirection::Undo => ChangeOrigin::Undo,
            HistoryDirection::Redo => ChangeOrigin::Redo,
        };
        if let Some(set) = ChangeSet::with_origin(changes, origin) {
            tracking.notifier.queue(Notification::ContentChanged(set));
        }
        if let Some(p) = tracking.tracker.cursor_moved(restored) {
            tracking.notifier.queue(Notification::CursorMoved(p));
        }
        true
    };
    if replayed {
        deliver(shared_handle);
    }
    replayed
}

/// Apply the inverse of one recorded edit and return its record.
fn invert_edit(buffer: &mut Buffer, edit: &Edit) -> Change {
    match edit {
        Edit::Insert { pos, text } => {
            let idx = buffer
                .pos_to_char_idx(*pos)
                .expect("history positions stay valid at replay");
            let len = text.chars().count();
            let end = pos.advance_through(text);
            buffer.remove(idx..idx + len);
            Change::remove(*pos, end, len)
        }
        Edit::Delete { pos, text } => {
            let idx = buffer
                .pos_to_char_idx(*pos)
                .expect("history positions stay valid at replay");
            buffer.insert(idx, text);
            Change::insert(*pos, text.clone())
        }
    }
}

/// Re-apply one recorded edit and return its record.
fn forward_edit(buffer: &mut Buffer, edit: &Edit) -> Change {
    match edit {
        Edit::Insert { pos, text } => {
            let idx = buffer
                .pos_to_char_idx(*pos)
                .expect("history positions stay valid at replay");
            buffer.insert(idx, text);
            Change::insert(*pos, text.clone())
        }
        Edit::Delete { pos, text } => {
            let idx = buffer
                .pos_to_char_idx(*pos)
                .expect("history positions stay valid at replay");
            let len = text.chars().count();
            let end = pos.advance_through(text);
            buffer.remove(idx..idx + len);
            Change::remove(*pos, end, len)
        }
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// Deliver now unless the document defers to the host loop.
pub(crate) fn deliver(shared_handle: &SharedBuffer) {
    let deferred = {
        let shared = shared_handle.inner.borrow();
        shared
            .tracking
            .as_ref()
            .is_some_and(|t| t.notifier.deferred())
    };
    if !deferred {
        drain(shared_handle);
    }
}

/// Drain the queue in FIFO order. Handlers are called with no borrow of
/// the document held, so they may read it — or even mutate it, in which
/// case the nested notifications deliver before the outer drain resumes.
pub(crate) fn drain(shared_handle: &SharedBuffer) {
    loop {
        let next = {
            let mut shared = shared_handle.inner.borrow_mut();
            tracking_mut(&mut shared.tracking).notifier.pop()
        };
        let Some(notification) = next else { break };

        match notification {
            Notification::ContentChanged(set) => {
                let handlers = {
                    let shared = shared_handle.inner.borrow();
                    shared
                        .tracking
                        .as_ref()
                        .expect("delivery only runs on tracked buffers")
                        .notifier
                        .content_handlers()
                };
                for handler in handlers {
                    (handler.borrow_mut())(&set);
                }
            }
            Notification::CursorMoved(pos) => {
                let handlers = {
                    let shared = shared_handle.inner.borrow();
                    shared
                        .tracking
                        .as_ref()
                        .expect("delivery only runs on tracked buffers")
                        .notifier
                        .cursor_handlers()
                };
                for handler in handlers {
                    (handler.borrow_mut())(pos);
                }
            }
        }
    }
}
