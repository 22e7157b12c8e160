//! Diff computation — the minimal record for a mutation, computed against
//! the buffer *before* the mutation is committed.
//!
//! Insertion and replacement are single records. Deletion is where the
//! engine earns its keep: one delete call may carry any number of index
//! arguments, and they are normalized the way an editor's text machinery
//! actually behaves:
//!
//! 1. every index equal to the buffer's end marker resolves to the
//!    position before the virtual trailing newline;
//! 2. an odd trailing index pairs with "that index + 1 char" (single
//!    character deletion);
//! 3. spans where start ≥ end delete nothing and are dropped;
//! 4. the remaining spans are sorted by start and overlapping or adjacent
//!    spans are merged, so no text outside the requested spans is lost to
//!    index shifting;
//! 5. one record is produced per merged span, with `old_len` measured
//!    against pre-mutation content;
//! 6. storage applies the merged spans highest-start-first, so a span's
//!    indices never shift under a deletion below it.
//!
//! The returned records are in ascending-start order and sequentially
//! replayable: each record after the first is expressed against the buffer
//! produced by the records before it. Spans are disjoint, so rebasing
//! moves a span without changing what it contains.

use ropey::Rope;
use vellum_text::{Buffer, Position};

use crate::change::Change;
use crate::error::TrackError;
use crate::op::EditOp;

// ---------------------------------------------------------------------------
// Insert / Replace
// ---------------------------------------------------------------------------

/// The record for inserting `text` at `at`.
///
/// Returns `Ok(None)` when `text` is empty — nothing changes, nothing is
/// emitted.
///
/// # Errors
///
/// `OutOfRange` if `at` (after end-marker resolution) is not a valid
/// position.
pub fn insert_record(
    buf: &Buffer,
    at: Position,
    text: &str,
) -> Result<Option<Change>, TrackError> {
    let at = buf.resolve_end(at);
    let idx = buf
        .pos_to_char_idx(at)
        .ok_or(TrackError::OutOfRange(at))?;
    if text.is_empty() {
        return Ok(None);
    }
    let at = buf
        .char_idx_to_pos(idx)
        .expect("index converted from a valid position");
    Ok(Some(Change::insert(at, text)))
}

/// The record for replacing `[start, end)` with `text`.
///
/// Both endpoints resolve the end marker. Returns `Ok(None)` when the
/// span is empty and `text` is empty — a no-op.
///
/// # Errors
///
/// `OutOfRange` for an invalid endpoint, `InvalidRange` when `start` is
/// after `end`.
pub fn replace_record(
    buf: &Buffer,
    start: Position,
    end: Position,
    text: &str,
) -> Result<Option<Change>, TrackError> {
    let start = buf.resolve_end(start);
    let end = buf.resolve_end(end);
    let s = buf
        .pos_to_char_idx(start)
        .ok_or(TrackError::OutOfRange(start))?;
    let e = buf
        .pos_to_char_idx(end)
        .ok_or(TrackError::OutOfRange(end))?;
    if s > e {
        return Err(TrackError::InvalidRange { start, end });
    }
    let old_len = e - s;
    if old_len == 0 && text.is_empty() {
        return Ok(None);
    }
    let start = buf
        .char_idx_to_pos(s)
        .expect("index converted from a valid position");
    let end = buf
        .char_idx_to_pos(e)
        .expect("index converted from a valid position");
    Ok(Some(Change {
        start,
        end,
        old_len,
        new_text: text.to_owned(),
    }))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Normalize a delete call's index arguments into merged char-index spans,
/// ascending and pairwise disjoint (steps 1–4 of the module rules).
///
/// An empty argument list yields no spans: there is nothing to delete.
///
/// # Errors
///
/// `OutOfRange` if any index (after end-marker resolution) is not a valid
/// position.
pub fn delete_spans(
    buf: &Buffer,
    indices: &[Position],
) -> Result<Vec<(usize, usize)>, TrackError> {
    let mut idxs = Vec::with_capacity(indices.len() + 1);
    for &pos in indices {
        let pos = buf.resolve_end(pos);
        let idx = buf
            .pos_to_char_idx(pos)
            .ok_or(TrackError::OutOfRange(pos))?;
        idxs.push(idx);
    }

    // An odd trailing index deletes the single character at that index.
    // At content end there is no character, so the span collapses and is
    // dropped below.
    if idxs.len() % 2 == 1 {
        let last = *idxs.last().expect("odd length implies non-empty");
        idxs.push((last + 1).min(buf.len_chars()));
    }

    let mut spans: Vec<(usize, usize)> = idxs
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .filter(|&(s, e)| s < e)
        .collect();
    spans.sort_unstable_by_key(|&(s, _)| s);

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for (s, e) in spans {
        match merged.last_mut() {
            // Adjacent spans merge too: deleting [a,b) and [b,c) is one
            // contiguous removal.
            Some(last) if s <= last.1 => last.1 = last.1.max(e),
            _ => merged.push((s, e)),
        }
    }

    if merged.len() < idxs.len() / 2 {
        log::trace!(
            "normalized {} delete span(s) into {}",
            idxs.len() / 2,
            merged.len()
        );
    }
    Ok(merged)
}

/// The records for deleting the given merged spans (as produced by
/// [`delete_spans`]), in ascending order, each rebased onto the buffer
/// state left by the records before it.
///
/// Rebasing simulates the spans on a cheap rope clone — position
/// arithmetic across removed line breaks is exactly what the real
/// application does, so the records are computed by doing it.
#[must_use]
pub fn delete_records(buf: &Buffer, spans: &[(usize, usize)]) -> Vec<Change> {
    let mut scratch = buf.rope().clone();
    let mut removed = 0usize;
    let mut records = Vec::with_capacity(spans.len());

    for &(s, e) in spans {
        let (s, e) = (s - removed, e - removed);
        let start = pos_at(&scratch, s);
        let end = pos_at(&scratch, e);
        records.push(Change::remove(start, end, e - s));
        scratch.remove(s..e);
        removed += e - s;
    }

    records
}

/// Normalize and record a delete call in one step: the records for
/// `EditOp::Delete { indices }`.
///
/// # Errors
///
/// `OutOfRange` if any index is not a valid position.
pub fn delete_changes(
    buf: &Buffer,
    indices: &[Position],
) -> Result<Vec<Change>, TrackError> {
    let spans = delete_spans(buf, indices)?;
    Ok(delete_records(buf, &spans))
}

// ---------------------------------------------------------------------------
// The funnel
// ---------------------------------------------------------------------------

/// The records for any [`EditOp`].
///
/// # Errors
///
/// The per-operation errors above, plus `UnsupportedOperation` for ops
/// that are not content mutations (`MoveCursor`) — those carry no diff,
/// and asking for one is a caller bug.
pub fn changes_for(buf: &Buffer, op: &EditOp) -> Result<Vec<Change>, TrackError> {
    match op {
        EditOp::Insert { at, text } => {
            Ok(insert_record(buf, *at, text)?.into_iter().collect())
        }
        EditOp::Delete { indices } => delete_changes(buf, indices),
        EditOp::Replace { start, end, text } => {
            Ok(replace_record(buf, *start, *end, text)?.into_iter().collect())
        }
        EditOp::MoveCursor(_) => Err(TrackError::UnsupportedOperation(op.kind())),
    }
}

fn pos_at(rope: &Rope, idx: usize) -> Position {
    let line = rope.char_to_line(idx);
    Position::new(line + 1, idx - rope.line_to_char(line))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pos(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    /// Apply merged spans the way storage does: highest start first.
    fn apply_spans(buf: &mut Buffer, spans: &[(usize, usize)]) {
        for &(s, e) in spans.iter().rev() {
            buf.remove(s..e);
        }
    }

    // -- Insert -------------------------------------------------------------

    #[test]
    fn insert_plain() {
        let buf = Buffer::from_text("hello");
        let c = insert_record(&buf, pos(1, 5), " world").unwrap().unwrap();
        assert_eq!(c, Change::insert(pos(1, 5), " world"));
    }

    #[test]
    fn insert_at_end_marker_resolves() {
        // "foo" — the end marker is 2:0, one virtual line below.
        let buf = Buffer::from_text("foo");
        let c = insert_record(&buf, pos(2, 0), "bar").unwrap().unwrap();
        assert_eq!(c, Change::insert(pos(1, 3), "bar"));
    }

    #[test]
    fn insert_empty_text_is_silent() {
        let buf = Buffer::from_text("foo");
        assert_eq!(insert_record(&buf, pos(1, 1), "").unwrap(), None);
    }

    #[test]
    fn insert_out_of_range() {
        let buf = Buffer::from_text("foo");
        assert_eq!(
            insert_record(&buf, pos(1, 4), "x"),
            Err(TrackError::OutOfRange(pos(1, 4)))
        );
        assert_eq!(
            insert_record(&buf, pos(3, 0), "x"),
            Err(TrackError::OutOfRange(pos(3, 0)))
        );
    }

    // -- Replace ------------------------------------------------------------

    #[test]
    fn replace_measures_old_len() {
        let buf = Buffer::from_text("hello world");
        let c = replace_record(&buf, pos(1, 0), pos(1, 5), "toot")
            .unwrap()
            .unwrap();
        assert_eq!(c, Change::replace(pos(1, 0), pos(1, 5), 5, "toot"));
    }

    #[test]
    fn replace_multiline_old_len_is_not_column_arithmetic() {
        // Columns alone say "5 - 0"; the span actually covers 11 chars.
        let buf = Buffer::from_text("hello\nworld");
        let c = replace_record(&buf, pos(1, 0), pos(2, 5), "x")
            .unwrap()
            .unwrap();
        assert_eq!(c.old_len, 11);
    }

    #[test]
    fn replace_at_very_end() {
        let buf = Buffer::from_text("foo");
        let end = buf.end_marker();
        let c = replace_record(&buf, end, end, "bar").unwrap().unwrap();
        assert_eq!(c, Change::insert(pos(1, 3), "bar"));
    }

    #[test]
    fn replace_backwards_range_is_invalid() {
        let buf = Buffer::from_text("hello");
        assert_eq!(
            replace_record(&buf, pos(1, 4), pos(1, 1), "x"),
            Err(TrackError::InvalidRange {
                start: pos(1, 4),
                end: pos(1, 1),
            })
        );
    }

    #[test]
    fn replace_empty_span_empty_text_is_silent() {
        let buf = Buffer::from_text("hello");
        assert_eq!(replace_record(&buf, pos(1, 2), pos(1, 2), "").unwrap(), None);
    }

    // -- Delete: normalization ----------------------------------------------

    #[test]
    fn delete_single_span() {
        let buf = Buffer::from_text("foobarbaz");
        let changes = delete_changes(&buf, &[pos(1, 6), pos(1, 8)]).unwrap();
        assert_eq!(changes, vec![Change::remove(pos(1, 6), pos(1, 8), 2)]);

        let spans = delete_spans(&buf, &[pos(1, 6), pos(1, 8)]).unwrap();
        let mut b = Buffer::from_text("foobarbaz");
        apply_spans(&mut b, &spans);
        assert_eq!(b.contents(), "foobarz");
    }

    #[test]
    fn delete_unpaired_index_takes_one_char() {
        let buf = Buffer::from_text("foobrz");
        let changes = delete_changes(&buf, &[pos(1, 4)]).unwrap();
        assert_eq!(changes, vec![Change::remove(pos(1, 4), pos(1, 5), 1)]);
    }

    #[test]
    fn delete_unpaired_equals_explicit_pair() {
        let buf = Buffer::from_text("abcdef");
        let odd = delete_changes(&buf, &[pos(1, 0), pos(1, 1), pos(1, 3)]).unwrap();
        let even =
            delete_changes(&buf, &[pos(1, 0), pos(1, 1), pos(1, 3), pos(1, 4)]).unwrap();
        assert_eq!(odd, even);
    }

    #[test]
    fn delete_unpaired_at_content_end_deletes_nothing() {
        let buf = Buffer::from_text("foo");
        assert_eq!(delete_changes(&buf, &[pos(1, 3)]).unwrap(), vec![]);
    }

    #[test]
    fn delete_backwards_span_is_dropped() {
        let buf = Buffer::from_text("hello");
        assert_eq!(
            delete_changes(&buf, &[pos(1, 4), pos(1, 1)]).unwrap(),
            vec![]
        );
    }

    #[test]
    fn delete_no_indices_is_a_noop() {
        let buf = Buffer::from_text("hello");
        assert_eq!(delete_changes(&buf, &[]).unwrap(), vec![]);
    }

    #[test]
    fn delete_index_at_end_marker_resolves() {
        // Deleting [2:3, end) on "foo\nbar": end resolves to 2:3, the span
        // collapses, nothing is deleted.
        let buf = Buffer::from_text("foo\nbar");
        assert_eq!(
            delete_changes(&buf, &[pos(2, 3), pos(3, 0)]).unwrap(),
            vec![]
        );
    }

    #[test]
    fn delete_out_of_range_index() {
        let buf = Buffer::from_text("foo");
        assert_eq!(
            delete_changes(&buf, &[pos(1, 9), pos(1, 9)]),
            Err(TrackError::OutOfRange(pos(1, 9)))
        );
    }

    // -- Delete: overlap merging --------------------------------------------

    #[test]
    fn delete_overlapping_spans_merge() {
        // Both argument orders merge to the same single span.
        for indices in [
            [pos(1, 4), pos(1, 6), pos(1, 4), pos(1, 5)],
            [pos(1, 4), pos(1, 5), pos(1, 4), pos(1, 6)],
        ] {
            let buf = Buffer::from_text("hello world");
            let spans = delete_spans(&buf, &indices).unwrap();
            assert_eq!(spans, vec![(4, 6)]);

            let changes = delete_records(&buf, &spans);
            assert_eq!(changes, vec![Change::remove(pos(1, 4), pos(1, 6), 2)]);

            let mut b = Buffer::from_text("hello world");
            apply_spans(&mut b, &spans);
            assert_eq!(b.contents(), "hellworld");
        }
    }

    #[test]
    fn delete_adjacent_spans_merge() {
        let buf = Buffer::from_text("abcdef");
        let spans =
            delete_spans(&buf, &[pos(1, 0), pos(1, 2), pos(1, 2), pos(1, 4)]).unwrap();
        assert_eq!(spans, vec![(0, 4)]);
    }

    #[test]
    fn delete_merge_chains_through_several_spans() {
        let buf = Buffer::from_text("abcdefghij");
        let indices = [
            pos(1, 6), pos(1, 8),
            pos(1, 0), pos(1, 3),
            pos(1, 2), pos(1, 5),
            pos(1, 4), pos(1, 7),
        ];
        let spans = delete_spans(&buf, &indices).unwrap();
        assert_eq!(spans, vec![(0, 8)]);
    }

    #[test]
    fn delete_same_start_keeps_longest() {
        let buf = Buffer::from_text("abcdef");
        let spans =
            delete_spans(&buf, &[pos(1, 1), pos(1, 2), pos(1, 1), pos(1, 5)]).unwrap();
        assert_eq!(spans, vec![(1, 5)]);
    }

    // -- Delete: multi-span records -------------------------------------------

    #[test]
    fn delete_many_args_rebases_later_records() {
        // delete 1:3-1:5, 1:4-1:6, 1:0 → spans merge to (0,1) and (3,6).
        let buf = Buffer::from_text("foobar");
        let indices = [pos(1, 3), pos(1, 5), pos(1, 4), pos(1, 6), pos(1, 0)];
        let spans = delete_spans(&buf, &indices).unwrap();
        assert_eq!(spans, vec![(0, 1), (3, 6)]);

        // The second record is expressed against the buffer the first one
        // leaves behind ("oobar"), so the records replay sequentially.
        let changes = delete_records(&buf, &spans);
        assert_eq!(
            changes,
            vec![
                Change::remove(pos(1, 0), pos(1, 1), 1),
                Change::remove(pos(1, 2), pos(1, 5), 3),
            ]
        );

        let mut b = Buffer::from_text("foobar");
        apply_spans(&mut b, &spans);
        assert_eq!(b.contents(), "oo");
    }

    #[test]
    fn delete_rebasing_crosses_line_breaks() {
        // a0 b1 \n2 c3 d4 \n5 e6 f7
        let buf = Buffer::from_text("ab\ncd\nef");
        let indices = [pos(1, 0), pos(1, 1), pos(2, 1), pos(3, 1)];
        let spans = delete_spans(&buf, &indices).unwrap();
        assert_eq!(spans, vec![(0, 1), (4, 7)]);

        let changes = delete_records(&buf, &spans);
        assert_eq!(
            changes,
            vec![
                Change::remove(pos(1, 0), pos(1, 1), 1),
                Change::remove(pos(2, 1), pos(3, 1), 3),
            ]
        );

        // Highest-first storage application and sequential record replay
        // land on the same content.
        let mut direct = Buffer::from_text("ab\ncd\nef");
        apply_spans(&mut direct, &spans);
        assert_eq!(direct.contents(), "b\ncf");

        let mut replayed = Buffer::from_text("ab\ncd\nef");
        for c in &changes {
            let idx = replayed.pos_to_char_idx(c.start).unwrap();
            replayed.remove(idx..idx + c.old_len);
        }
        assert_eq!(replayed.contents(), "b\ncf");
    }

    // -- Delete: merge equivalence --------------------------------------------

    #[test]
    fn one_call_equals_merged_spans_applied_highest_first() {
        let indices = [
            pos(1, 0), pos(1, 3),
            pos(1, 2), pos(1, 5),
            pos(1, 7), pos(1, 9),
        ];

        let buf = Buffer::from_text("hello world");
        let spans = delete_spans(&buf, &indices).unwrap();
        assert_eq!(spans, vec![(0, 5), (7, 9)]);

        let mut one_call = Buffer::from_text("hello world");
        apply_spans(&mut one_call, &spans);

        let mut stepwise = Buffer::from_text("hello world");
        for &(s, e) in spans.iter().rev() {
            let only = delete_spans(
                &stepwise,
                &[
                    stepwise.char_idx_to_pos(s).unwrap(),
                    stepwise.char_idx_to_pos(e).unwrap(),
                ],
            )
            .unwrap();
            apply_spans(&mut stepwise, &only);
        }

        assert_eq!(one_call.contents(), stepwise.contents());
    }

    // -- The funnel -----------------------------------------------------------

    #[test]
    fn changes_for_rejects_non_mutations() {
        let buf = Buffer::from_text("hello");
        assert_eq!(
            changes_for(&buf, &EditOp::MoveCursor(pos(1, 2))),
            Err(TrackError::UnsupportedOperation("move_cursor"))
        );
    }

    #[test]
    fn changes_for_dispatches_mutations() {
        let buf = Buffer::from_text("hello");
        let changes = changes_for(
            &buf,
            &EditOp::Replace {
                start: pos(1, 0),
                end: pos(1, 5),
                text: "bye".into(),
            },
        )
        .unwrap();
        assert_eq!(changes, vec![Change::replace(pos(1, 0), pos(1, 5), 5, "bye")]);
    }
}
