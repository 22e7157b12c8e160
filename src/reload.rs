//! Reload-from-disk — turn externally changed content into tracked edits.
//!
//! Rather than swapping the whole buffer (which would tell subscribers
//! "everything changed" and wreck the undo history), `reload` computes a
//! line-based minimal diff between the current content and the new
//! content and routes it through the ordinary entry points, bottom-up,
//! inside one batch. Subscribers see one small `ChangeSet`; a single undo
//! brings the pre-reload content back.

use similar::{DiffOp, TextDiff};
use vellum_track::TrackError;

use crate::document::Document;

/// Char offset of each line token in `text`, plus the total as a final
/// entry. Tokens split inclusively on `'\n'`, matching the line diff.
fn line_offsets(text: &str) -> Vec<usize> {
    let mut offsets = vec![0];
    let mut acc = 0;
    for token in text.split_inclusive('\n') {
        acc += token.chars().count();
        offsets.push(acc);
    }
    offsets
}

impl Document {
    /// Make the buffer hold `new_text` via minimal tracked edits, then
    /// clear the modified flag (the content now mirrors what is on disk).
    /// Returns the number of edit operations applied — zero when the
    /// content already matches.
    ///
    /// # Errors
    ///
    /// `NestedBatch` if called while a batch is already active.
    pub fn reload(&mut self, new_text: &str) -> Result<usize, TrackError> {
        let old = self.contents();
        if old == new_text {
            self.mark_saved();
            return Ok(0);
        }

        let old_offsets = line_offsets(&old);
        let new_tokens: Vec<&str> = new_text.split_inclusive('\n').collect();
        let diff = TextDiff::from_lines(old.as_str(), new_text);
        let ops: Vec<DiffOp> = diff.ops().to_vec();

        // Pre-state positions stay valid because application is
        // bottom-up: an op only ever edits below the ops applied before
        // it.
        let mut edits = 0;
        self.with_batch(|doc| {
            for op in ops.iter().rev() {
                match *op {
                    DiffOp::Equal { .. } => {}
                    DiffOp::Delete {
                        old_index, old_len, ..
                    } => {
                        let start = doc
                            .position_of(old_offsets[old_index])
                            .expect("diff offsets are in bounds");
                        let end = doc
                            .position_of(old_offsets[old_index + old_len])
                            .expect("diff offsets are in bounds");
                        doc.delete(&[start, end])?;
                        edits += 1;
                    }
                    DiffOp::Insert {
                        old_index,
                        new_index,
                        new_len,
                    } => {
                        let at = doc
                            .position_of(old_offsets[old_index])
                            .expect("diff offsets are in bounds");
                        let text: String =
                            new_tokens[new_index..new_index + new_len].concat();
                        doc.insert(at, &text)?;
                        edits += 1;
                    }
                    DiffOp::Replace {
                        old_index,
                        old_len,
                        new_index,
                        new_len,
                    } => {
                        let start = doc
                            .position_of(old_offsets[old_index])
                            .expect("diff offsets are in bounds");
                        let end = doc
                            .position_of(old_offsets[old_index + old_len])
                            .expect("diff offsets are in bounds");
                        let text: String =
                            new_tokens[new_index..new_index + new_len].concat();
                        doc.replace(start, end, &text)?;
                        edits += 1;
                    }
                }
            }
            Ok(())
        })?;

        log::debug!("reloaded with {edits} edit(s)");
        self.mark_saved();
        Ok(edits)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
