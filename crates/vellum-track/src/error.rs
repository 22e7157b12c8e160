//! The error taxonomy for change tracking.
//!
//! Every variant is a caller bug, not a transient failure: none are
//! retried, none are recovered internally, all propagate immediately.
//! A single diff computation has no partial-failure mode — either the
//! change records are fully computed and the mutation proceeds, or
//! neither happens.

use thiserror::Error;
use vellum_text::Position;

/// Caller-misuse errors from the tracked edit pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    /// A range argument has `start` after `end` (after resolving any
    /// absolute-end positions).
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: Position, end: Position },

    /// A position argument is outside the buffer.
    #[error("position {0} is outside the buffer")]
    OutOfRange(Position),

    /// `begin_batch` was called while a batch is already active. Batches
    /// do not nest.
    #[error("a change batch is already active")]
    NestedBatch,

    /// A tracker is already attached to this buffer. A buffer has at most
    /// one tracker, attached exactly once.
    #[error("buffer already has a change tracker attached")]
    AlreadyTracked,

    /// A peer view was requested before any tracker was attached. Attach
    /// the tracker to the primary view first.
    #[error("peer views require a change tracker; attach one first")]
    PeerBeforeTracker,

    /// The operation is not one of the three content mutations and has no
    /// diff. Routing it through diff computation is a caller error.
    #[error("operation `{0}` is not a content mutation")]
    UnsupportedOperation(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_misuse() {
        let e = TrackError::InvalidRange {
            start: Position::new(2, 4),
            end: Position::new(1, 0),
        };
        assert_eq!(e.to_string(), "invalid range: start 2:4 is after end 1:0");

        let e = TrackError::OutOfRange(Position::new(9, 9));
        assert_eq!(e.to_string(), "position 9:9 is outside the buffer");

        let e = TrackError::UnsupportedOperation("move_cursor");
        assert_eq!(
            e.to_string(),
            "operation `move_cursor` is not a content mutation"
        );
    }
}
