//! # vellum-text — Text model for Vellum
//!
//! The storage layer under the change-tracking engine:
//!
//! - **[`position`]** — `Position` (1-based line, 0-based char column) and
//!   `Range` value types
//! - **[`buffer`]** — `Buffer` wrapping a rope with coordinate conversion,
//!   the virtual-trailing-newline convention, file I/O, and metadata
//!
//! Everything here is plain data and storage; diffing, batching, and event
//! emission live in `vellum-track` and the `vellum` facade crate.

pub mod buffer;
pub mod position;

pub use buffer::{Buffer, LineEnding};
pub use position::{Position, Range};
