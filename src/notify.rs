//! Notification delivery — the downstream boundary.
//!
//! Subscribers register per-kind callbacks on the primary document. Every
//! emission is queued in FIFO order; the queue is drained either at the
//! end of the entry point that caused it (the default) or when the host's
//! cooperative loop calls `deliver_pending` (with
//! `DocumentOptions::deferred_delivery`). Diff computation and storage
//! mutation are never deferred — only this last hop is.
//!
//! Known consumers at this boundary: a syntax highlighter (recomputes
//! tokens for the touched range), a line-number/gutter renderer, a
//! language-server client (translates records into incremental sync
//! deltas), and unsaved-state tracking. Handlers are invoked with no
//! internal borrows held, so they may read the document freely; expensive
//! work should still be deferred by the consumer itself.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use vellum_text::Position;
use vellum_track::ChangeSet;

/// One delivered notification.
#[derive(Debug, Clone)]
pub enum Notification {
    /// Content changed; the set holds the records in application order.
    ContentChanged(ChangeSet),
    /// The cursor ended up at a new, distinct position.
    CursorMoved(Position),
}

pub(crate) type ContentHandler = Rc<RefCell<dyn FnMut(&ChangeSet)>>;
pub(crate) type CursorHandler = Rc<RefCell<dyn FnMut(Position)>>;

/// Subscriber registry plus the pending FIFO queue.
pub(crate) struct Notifier {
    content: Vec<ContentHandler>,
    cursor: Vec<CursorHandler>,
    pending: VecDeque<Notification>,
    deferred: bool,
}

impl Notifier {
    pub fn new(deferred: bool) -> Self {
        Self {
            content: Vec::new(),
            cursor: Vec::new(),
            pending: VecDeque::new(),
            deferred,
        }
    }

    pub const fn deferred(&self) -> bool {
        self.deferred
    }

    pub fn on_content(&mut self, handler: impl FnMut(&ChangeSet) + 'static) {
        self.content.push(Rc::new(RefCell::new(handler)));
    }

    pub fn on_cursor(&mut self, handler: impl FnMut(Position) + 'static) {
        self.cursor.push(Rc::new(RefCell::new(handler)));
    }

    pub fn queue(&mut self, notification: Notification) {
        log::trace!("queued {notification:?}");
        self.pending.push_back(notification);
    }

    pub fn pop(&mut self) -> Option<Notification> {
        self.pending.pop_front()
    }

    /// Snapshot of the content handlers. Cloning the `Rc`s lets the caller
    /// drop its borrow of the document before invoking anything.
    pub fn content_handlers(&self) -> Vec<ContentHandler> {
        self.content.clone()
    }

    /// Snapshot of the cursor handlers.
    pub fn cursor_handlers(&self) -> Vec<CursorHandler> {
        self.cursor.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_track::Change;

    #[test]
    fn queue_is_fifo() {
        let mut n = Notifier::new(true);
        let set =
            ChangeSet::from_edits(vec![Change::insert(Position::START, "x")]).unwrap();
        n.queue(Notification::ContentChanged(set));
        n.queue(Notification::CursorMoved(Position::new(1, 1)));

        assert!(matches!(n.pop(), Some(Notification::ContentChanged(_))));
        assert!(matches!(n.pop(), Some(Notification::CursorMoved(_))));
        assert!(n.pop().is_none());
    }

    #[test]
    fn handlers_snapshot_independently() {
        let mut n = Notifier::new(false);
        n.on_content(|_| {});
        n.on_content(|_| {});
        n.on_cursor(|_| {});
        assert_eq!(n.content_handlers().len(), 2);
        assert_eq!(n.cursor_handlers().len(), 1);
    }
}
