//! # vellum — change-tracked document engine
//!
//! The core of the Vellum text editor: every buffer mutation — keystroke,
//! find/replace, programmatic reload — is intercepted, diffed against the
//! pre-mutation content, applied, and delivered to subscribers as ordered,
//! replayable [`ChangeSet`]s. Reactive subsystems (syntax highlighting,
//! gutters, language-server sync, dirty tracking) consume the records
//! instead of re-reading the world.
//!
//! - **[`document`]** — [`SharedBuffer`], the primary [`Document`] view,
//!   options, batching, undo/redo, and the edit funnel
//! - **[`peer`]** — secondary [`Peer`] views sharing one buffer and one
//!   tracker
//! - **[`notify`]** — subscriber registry and FIFO delivery
//! - **[`history`]** — transaction-based undo grouping
//! - **[`search`]** — literal find/replace driver, batched
//! - **[`reload`]** — minimal-diff reload from external content
//!
//! Text storage and the value types live in `vellum-text`; the diff
//! engine, batch scope, and cursor tracking live in `vellum-track`. Both
//! are re-exported here.
//!
//! # Example
//!
//! ```
//! use vellum::{Document, DocumentOptions, Position};
//!
//! let mut doc = Document::from_text("hello world", DocumentOptions::default());
//! doc.on_content_changed(|set| {
//!     for change in set.iter() {
//!         // feed an incremental consumer
//!         let _ = (change.start, change.old_len, &change.new_text);
//!     }
//! });
//!
//! doc.replace(Position::new(1, 0), Position::new(1, 5), "toot").unwrap();
//! assert_eq!(doc.contents(), "toot world");
//! ```

mod document;
mod history;
mod notify;
mod peer;
mod reload;
mod search;

pub use document::{Document, DocumentOptions, EditView, SharedBuffer};
pub use notify::Notification;
pub use peer::Peer;
pub use search::Match;

pub use vellum_text::{Buffer, LineEnding, Position, Range};
pub use vellum_track::{
    diff, Change, ChangeOrigin, ChangeSet, ChangeTracker, EditOp, TrackError,
};
