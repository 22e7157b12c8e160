//! Text buffer — the mutable character-sequence document being edited.
//!
//! A `Buffer` wraps a [`ropey::Rope`] with coordinate conversion between
//! `Position` (line, col) and rope char indices, file I/O, and metadata
//! (path, modified flag, line endings).
//!
//! # The virtual trailing newline
//!
//! Editors traditionally behave as if every document ends with one final
//! line break that is not real content. The buffer models that convention
//! explicitly: [`end_marker`](Buffer::end_marker) is the position just past
//! the virtual newline, and [`resolve_end`](Buffer::resolve_end) maps it
//! back to [`content_end`](Buffer::content_end) — the position just past
//! the last real character. Callers that accept "absolute end" as an index
//! must resolve it before converting to a char index; the virtual newline
//! itself is never stored in the rope.
//!
//! # Editing
//!
//! The editing primitives ([`insert`](Buffer::insert),
//! [`remove`](Buffer::remove)) work on validated char indices. Position
//! validation and error reporting happen one layer up, in the tracked edit
//! pipeline, so by the time an edit reaches the rope its bounds are known
//! good.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ropey::{Rope, RopeSlice};

use crate::position::{Position, Range};

// ---------------------------------------------------------------------------
// Line ending detection
// ---------------------------------------------------------------------------

/// Line ending style of a file.
///
/// Detected on load by scanning for the first occurrence. Defaults to `Lf`
/// for new buffers. The content itself is stored byte-for-byte; this is
/// metadata for hosts that want to preserve or display the style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// `\n` — Unix, macOS, Linux.
    Lf,
    /// `\r\n` — Windows, DOS.
    CrLf,
    /// `\r` — Classic Mac. Rare but still seen in the wild.
    Cr,
}

impl LineEnding {
    /// The string representation of this line ending.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Detect the dominant line ending in a string by finding the first
    /// occurrence. Returns `Lf` if no line endings are found.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        let bytes = text.as_bytes();
        for (i, byte) in bytes.iter().enumerate() {
            if *byte == b'\n' {
                if i > 0 && bytes[i - 1] == b'\r' {
                    return Self::CrLf;
                }
                return Self::Lf;
            }
            if *byte == b'\r' {
                if bytes.get(i + 1) == Some(&b'\n') {
                    return Self::CrLf;
                }
                return Self::Cr;
            }
        }
        Self::Lf
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => f.write_str("LF"),
            Self::CrLf => f.write_str("CRLF"),
            Self::Cr => f.write_str("CR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// A text buffer backed by a rope.
///
/// Each open file (or scratch buffer) gets one `Buffer`. The buffer tracks:
///
/// - the text content (via `ropey::Rope`)
/// - the file path (if backed by a file)
/// - whether the content has changed since last save
/// - the detected line ending style
///
/// # Coordinate system
///
/// Positions are `(line, col)` with 1-indexed lines and 0-indexed char
/// columns. Use [`pos_to_char_idx`](Self::pos_to_char_idx) and
/// [`char_idx_to_pos`](Self::char_idx_to_pos) to convert to rope-native
/// char indices.
pub struct Buffer {
    rope: Rope,
    path: Option<PathBuf>,
    modified: bool,
    line_ending: LineEnding,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// Create an empty buffer with no file path.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            path: None,
            modified: false,
            line_ending: LineEnding::Lf,
        }
    }

    /// Create a buffer from a string.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            line_ending: LineEnding::detect(text),
            rope: Rope::from_str(text),
            path: None,
            modified: false,
        }
    }

    /// Load a buffer from a file, detecting its line endings. The buffer
    /// starts in an unmodified state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid
    /// UTF-8.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let line_ending = LineEnding::detect(&text);
        Ok(Self {
            rope: Rope::from_str(&text),
            path: Some(path.to_path_buf()),
            modified: false,
            line_ending,
        })
    }

    /// Write the buffer's content back to its file path and clear the
    /// modified flag. Content is written exactly as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer has no path or the write fails.
    pub fn save(&mut self) -> io::Result<()> {
        let Some(path) = self.path.clone() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "buffer has no file path",
            ));
        };
        fs::write(&path, self.rope.to_string())?;
        self.modified = false;
        Ok(())
    }

    // -- Metadata -----------------------------------------------------------

    /// The file path, if this buffer is backed by a file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True when the content has changed since the last save (or load).
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clear the modified flag without writing anything. For hosts that
    /// persist content through their own channel.
    #[inline]
    pub const fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// The detected line ending style.
    #[inline]
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    // -- Text access --------------------------------------------------------

    /// The underlying rope. Prefer the typed accessors, but this is
    /// available when a caller needs direct rope operations (the diff
    /// engine clones it to simulate edits cheaply).
    #[inline]
    #[must_use]
    pub const fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Total number of lines. An empty buffer has 1 line; a buffer ending
    /// with `\n` has a trailing empty line. This is how editors display
    /// files, and it makes the virtual-newline arithmetic below uniform.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total character count (Unicode scalar values, not bytes).
    #[inline]
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// True when the buffer contains no text.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Get a line by 1-indexed line number, including its trailing line
    /// ending (if any). Returns `None` if `line` is out of bounds.
    #[inline]
    #[must_use]
    pub fn line(&self, line: usize) -> Option<RopeSlice<'_>> {
        if (1..=self.line_count()).contains(&line) {
            Some(self.rope.line(line - 1))
        } else {
            None
        }
    }

    /// Number of chars in a line **including** the trailing line ending.
    /// Returns `None` if the line doesn't exist.
    #[inline]
    #[must_use]
    pub fn line_len(&self, line: usize) -> Option<usize> {
        self.line(line).map(|l| l.len_chars())
    }

    /// A slice of the buffer by char-index range. The range must be within
    /// bounds — this is the companion to [`insert`](Self::insert) and
    /// [`remove`](Self::remove) for pre-validated indices.
    #[inline]
    #[must_use]
    pub fn slice_idx(&self, range: std::ops::Range<usize>) -> RopeSlice<'_> {
        self.rope.slice(range)
    }

    /// A slice of the buffer by position range. Returns `None` if either
    /// endpoint is out of bounds.
    #[must_use]
    pub fn slice(&self, range: Range) -> Option<RopeSlice<'_>> {
        let start = self.pos_to_char_idx(range.start)?;
        let end = self.pos_to_char_idx(range.end)?;
        Some(self.rope.slice(start..end))
    }

    /// Collect all text into a `String`. Allocates — prefer `rope()` or
    /// the slice accessors for zero-copy access when possible.
    #[must_use]
    pub fn contents(&self) -> String {
        self.rope.to_string()
    }

    // -- Coordinate conversion ----------------------------------------------

    /// Convert a `Position` to an absolute char index in the rope.
    ///
    /// Returns `None` if the line is out of bounds or the column exceeds
    /// the line's char count (including its line ending). A column exactly
    /// equal to the line's char count is valid — it is the position just
    /// past the last character, used by exclusive range endpoints.
    ///
    /// The [`end_marker`](Self::end_marker) position is *not* valid here;
    /// resolve it first with [`resolve_end`](Self::resolve_end).
    #[must_use]
    pub fn pos_to_char_idx(&self, pos: Position) -> Option<usize> {
        if pos.line < 1 || pos.line > self.line_count() {
            return None;
        }
        let line_start = self.rope.line_to_char(pos.line - 1);
        let line_len = self.rope.line(pos.line - 1).len_chars();
        if pos.col > line_len {
            return None;
        }
        Some(line_start + pos.col)
    }

    /// Convert an absolute char index to a `Position`.
    ///
    /// Returns `None` if `char_idx > len_chars()`. An index equal to
    /// `len_chars()` returns [`content_end`](Self::content_end). The
    /// result is always canonical: the column never reaches past the
    /// line's last char index except on the final line.
    #[must_use]
    pub fn char_idx_to_pos(&self, char_idx: usize) -> Option<Position> {
        if char_idx > self.rope.len_chars() {
            return None;
        }
        let line = self.rope.char_to_line(char_idx);
        let line_start = self.rope.line_to_char(line);
        Some(Position::new(line + 1, char_idx - line_start))
    }

    /// The char index of the first character of a 1-indexed line. Returns
    /// `None` if the line is out of bounds.
    #[inline]
    #[must_use]
    pub fn line_to_char_idx(&self, line: usize) -> Option<usize> {
        if (1..=self.line_count()).contains(&line) {
            Some(self.rope.line_to_char(line - 1))
        } else {
            None
        }
    }

    // -- The virtual trailing newline ---------------------------------------

    /// The position just past the virtual trailing newline: one line below
    /// the last real line, column 0. This is what "absolute end" resolves
    /// to in editor index arithmetic; it never addresses real content.
    #[inline]
    #[must_use]
    pub fn end_marker(&self) -> Position {
        Position::new(self.line_count() + 1, 0)
    }

    /// The position just past the last real character.
    #[must_use]
    pub fn content_end(&self) -> Position {
        let idx = self.rope.len_chars();
        let line = self.rope.char_to_line(idx);
        Position::new(line + 1, idx - self.rope.line_to_char(line))
    }

    /// Resolve a position that may denote absolute end: the
    /// [`end_marker`](Self::end_marker) maps to
    /// [`content_end`](Self::content_end), anything else passes through
    /// unchanged. Every edit entry point applies this before validating.
    #[inline]
    #[must_use]
    pub fn resolve_end(&self, pos: Position) -> Position {
        if pos == self.end_marker() {
            self.content_end()
        } else {
            pos
        }
    }

    /// Clamp a position to the nearest canonical position in the buffer:
    /// the line is clamped to the last line, the column to the line's last
    /// addressable char (past-the-end only on the final line).
    ///
    /// Used when restoring a remembered cursor position over content that
    /// has since changed.
    #[must_use]
    pub fn clamp(&self, pos: Position) -> Position {
        let last = self.line_count();
        let line = pos.line.clamp(1, last);
        let line_len = self.rope.line(line - 1).len_chars();
        let max_col = if line == last {
            line_len
        } else {
            // Non-final lines end with a line break; the break itself is
            // the last addressable column.
            line_len - 1
        };
        Position::new(line, pos.col.min(max_col))
    }

    // -- Editing ------------------------------------------------------------

    /// Insert text at a char index and set the modified flag.
    ///
    /// # Panics
    ///
    /// Panics if `char_idx > len_chars()`. Callers validate positions
    /// before converting to indices, so a panic here is an internal bug.
    pub fn insert(&mut self, char_idx: usize, text: &str) {
        debug_assert!(char_idx <= self.rope.len_chars());
        if text.is_empty() {
            return;
        }
        self.rope.insert(char_idx, text);
        self.modified = true;
    }

    /// Remove a char-index range and set the modified flag. An empty range
    /// is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds. Callers validate positions
    /// before converting to indices, so a panic here is an internal bug.
    pub fn remove(&mut self, range: std::ops::Range<usize>) {
        debug_assert!(range.start <= range.end && range.end <= self.rope.len_chars());
        if range.is_empty() {
            return;
        }
        self.rope.remove(range);
        self.modified = true;
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len_chars", &self.rope.len_chars())
            .field("lines", &self.rope.len_lines())
            .field("path", &self.path)
            .field("modified", &self.modified)
            .field("line_ending", &self.line_ending)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // -- Line endings -------------------------------------------------------

    #[test]
    fn detect_line_endings() {
        assert_eq!(LineEnding::detect("no breaks"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\nb"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\r\nb"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("a\rb"), LineEnding::Cr);
    }

    // -- Counting -----------------------------------------------------------

    #[test]
    fn empty_buffer_has_one_line() {
        let buf = Buffer::new();
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.len_chars(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn trailing_newline_adds_a_line() {
        assert_eq!(Buffer::from_text("foo").line_count(), 1);
        assert_eq!(Buffer::from_text("foo\n").line_count(), 2);
        assert_eq!(Buffer::from_text("foo\nbar").line_count(), 2);
    }

    // -- Coordinate conversion ----------------------------------------------

    #[test]
    fn pos_to_char_idx_basic() {
        let buf = Buffer::from_text("foo\nbar");
        assert_eq!(buf.pos_to_char_idx(Position::new(1, 0)), Some(0));
        assert_eq!(buf.pos_to_char_idx(Position::new(1, 3)), Some(3)); // the '\n'
        assert_eq!(buf.pos_to_char_idx(Position::new(2, 0)), Some(4));
        assert_eq!(buf.pos_to_char_idx(Position::new(2, 3)), Some(7)); // past 'r'
    }

    #[test]
    fn pos_to_char_idx_out_of_bounds() {
        let buf = Buffer::from_text("foo\nbar");
        assert_eq!(buf.pos_to_char_idx(Position::new(3, 0)), None);
        assert_eq!(buf.pos_to_char_idx(Position::new(2, 4)), None);
        assert_eq!(buf.pos_to_char_idx(Position::new(99, 0)), None);
    }

    #[test]
    fn char_idx_to_pos_is_canonical() {
        let buf = Buffer::from_text("foo\nbar");
        assert_eq!(buf.char_idx_to_pos(0), Some(Position::new(1, 0)));
        assert_eq!(buf.char_idx_to_pos(3), Some(Position::new(1, 3)));
        assert_eq!(buf.char_idx_to_pos(4), Some(Position::new(2, 0)));
        assert_eq!(buf.char_idx_to_pos(7), Some(Position::new(2, 3)));
        assert_eq!(buf.char_idx_to_pos(8), None);
    }

    #[test]
    fn round_trip_char_positions() {
        let buf = Buffer::from_text("ab\ncdef\n\ng");
        for idx in 0..=buf.len_chars() {
            let pos = buf.char_idx_to_pos(idx).unwrap();
            assert_eq!(buf.pos_to_char_idx(pos), Some(idx), "idx {idx} via {pos}");
        }
    }

    // -- Virtual trailing newline -------------------------------------------

    #[test]
    fn end_marker_and_content_end() {
        let buf = Buffer::from_text("foo");
        assert_eq!(buf.end_marker(), Position::new(2, 0));
        assert_eq!(buf.content_end(), Position::new(1, 3));

        let buf = Buffer::from_text("foo\n");
        assert_eq!(buf.end_marker(), Position::new(3, 0));
        assert_eq!(buf.content_end(), Position::new(2, 0));

        let buf = Buffer::new();
        assert_eq!(buf.end_marker(), Position::new(2, 0));
        assert_eq!(buf.content_end(), Position::START);
    }

    #[test]
    fn resolve_end_maps_only_the_marker() {
        let buf = Buffer::from_text("foo");
        assert_eq!(buf.resolve_end(buf.end_marker()), Position::new(1, 3));
        assert_eq!(
            buf.resolve_end(Position::new(1, 1)),
            Position::new(1, 1)
        );
    }

    // -- clamp --------------------------------------------------------------

    #[test]
    fn clamp_past_last_line() {
        let buf = Buffer::from_text("foo\nbar");
        assert_eq!(buf.clamp(Position::new(9, 9)), Position::new(2, 3));
    }

    #[test]
    fn clamp_past_line_end() {
        let buf = Buffer::from_text("foo\nbar");
        // Line 1 ends with '\n' at col 3 — the break is the last stop.
        assert_eq!(buf.clamp(Position::new(1, 9)), Position::new(1, 3));
        // The final line allows past-the-end.
        assert_eq!(buf.clamp(Position::new(2, 3)), Position::new(2, 3));
    }

    #[test]
    fn clamp_in_bounds_is_identity() {
        let buf = Buffer::from_text("foo\nbar");
        let p = Position::new(2, 1);
        assert_eq!(buf.clamp(p), p);
    }

    // -- Editing ------------------------------------------------------------

    #[test]
    fn insert_and_remove_track_modified() {
        let mut buf = Buffer::from_text("hello");
        assert!(!buf.is_modified());

        buf.insert(5, " world");
        assert_eq!(buf.contents(), "hello world");
        assert!(buf.is_modified());

        buf.mark_saved();
        buf.remove(0..6);
        assert_eq!(buf.contents(), "world");
        assert!(buf.is_modified());
    }

    #[test]
    fn empty_edits_leave_modified_clear() {
        let mut buf = Buffer::from_text("hello");
        buf.insert(0, "");
        buf.remove(2..2);
        assert!(!buf.is_modified());
    }

    #[test]
    fn slice_accessors_agree() {
        let buf = Buffer::from_text("foo\nbar");
        let r = Range::new(Position::new(1, 1), Position::new(2, 1));
        assert_eq!(buf.slice(r).unwrap().to_string(), "oo\nb");
        assert_eq!(buf.slice_idx(1..5).to_string(), "oo\nb");
    }
}
