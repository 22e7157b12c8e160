//! Find/replace — a call-site driver over the tracked entry points.
//!
//! Searches are literal string matches, char-indexed like everything
//! else. `replace_all` is the interesting part: it snapshots the matches
//! first, then rewrites them highest-start-first inside one batch — the
//! same discipline multi-span deletion uses, so earlier coordinates never
//! shift, subscribers get one `ChangeSet`, and a single undo restores the
//! pre-replace content.

use vellum_text::{Buffer, Position};
use vellum_track::TrackError;

use crate::document::Document;

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// A search match: start position and length in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Start position of the match.
    pub start: Position,
    /// Length of the match in characters.
    pub len: usize,
}

/// All non-overlapping matches of `pattern` in `buffer`, in document
/// order. An empty pattern matches nothing.
fn find_in(buffer: &Buffer, pattern: &str) -> Vec<Match> {
    if pattern.is_empty() {
        return Vec::new();
    }
    let text = buffer.contents();
    let len = pattern.chars().count();

    let mut matches = Vec::new();
    let mut char_idx = 0;
    let mut consumed = 0;
    for (byte_idx, _) in text.match_indices(pattern) {
        char_idx += text[consumed..byte_idx].chars().count();
        consumed = byte_idx;
        matches.push(Match {
            start: buffer
                .char_idx_to_pos(char_idx)
                .expect("match indices are in bounds"),
            len,
        });
    }
    matches
}

// ---------------------------------------------------------------------------
// Document driver
// ---------------------------------------------------------------------------

impl Document {
    /// All non-overlapping matches of `pattern`, in document order.
    #[must_use]
    pub fn find_all(&self, pattern: &str) -> Vec<Match> {
        let shared = self.share();
        let guard = shared.inner.borrow();
        find_in(&guard.buffer, pattern)
    }

    /// The first match strictly after `from`, wrapping to the top when
    /// nothing follows. `None` when the pattern does not occur at all.
    #[must_use]
    pub fn find_next(&self, pattern: &str, from: Position) -> Option<Match> {
        let matches = self.find_all(pattern);
        matches
            .iter()
            .find(|m| m.start > from)
            .or_else(|| matches.first())
            .copied()
    }

    /// Replace every match of `pattern` with `replacement`, as one batch:
    /// one emitted `ChangeSet`, one undo step, cursor restored. Returns
    /// the number of replacements.
    ///
    /// The matches are snapshotted up front and rewritten
    /// highest-start-first; the buffer is not re-queried mid-loop.
    ///
    /// # Errors
    ///
    /// `NestedBatch` if called while a batch is already active.
    pub fn replace_all(
        &mut self,
        pattern: &str,
        replacement: &str,
    ) -> Result<usize, TrackError> {
        let spans: Vec<(Position, Position)> = {
            let shared = self.share();
            let guard = shared.inner.borrow();
            find_in(&guard.buffer, pattern)
                .iter()
                .map(|m| {
                    let start_idx = guard
                        .buffer
                        .pos_to_char_idx(m.start)
                        .expect("match start is in bounds");
                    let end = guard
                        .buffer
                        .char_idx_to_pos(start_idx + m.len)
                        .expect("match end is in bounds");
                    (m.start, end)
                })
                .collect()
        };
        if spans.is_empty() {
            return Ok(0);
        }

        log::debug!("replacing {} match(es)", spans.len());
        self.with_batch(|doc| {
            for &(start, end) in spans.iter().rev() {
                doc.replace(start, end, replacement)?;
            }
            Ok(spans.len())
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
