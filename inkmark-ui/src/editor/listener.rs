// Bridges canvas mutation events into the history.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use inkmark_history::History;
use tracing::{debug, trace, warn};

use crate::editor::canvas::{
    Canvas, MutationHandler, MutationKind, SnapshotSource, SubscriptionId,
};

/// Live subscription that records a snapshot on every structural canvas change.
///
/// Dropping the listener unsubscribes it. Rebinding to another canvas is done by
/// dropping this one and attaching a new one. A dropped listener never records
/// again, even if the canvas was busy and the unsubscribe had to be skipped.
pub struct MutationListener<C: Canvas> {
    canvas: Weak<RefCell<C>>,
    id: SubscriptionId,
    active: Rc<Cell<bool>>,
}

impl<C: Canvas> MutationListener<C> {
    pub fn attach(canvas: &Rc<RefCell<C>>, history: &Rc<RefCell<History>>) -> Self {
        let history = Rc::downgrade(history);
        let active = Rc::new(Cell::new(true));
        let handler_active = Rc::clone(&active);
        let handler: MutationHandler =
            Box::new(move |kind: MutationKind, source: &dyn SnapshotSource| {
                if handler_active.get() {
                    record(&history, kind, source);
                } else {
                    trace!("Detached listener ignoring {:?}", kind);
                }
            });

        let id = canvas.borrow_mut().subscribe(&MutationKind::ALL, handler);
        debug!("Mutation listener attached as {:?}", id);

        Self {
            canvas: Rc::downgrade(canvas),
            id,
            active,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_bound_to(&self, canvas: &Rc<RefCell<C>>) -> bool {
        self.canvas
            .upgrade()
            .is_some_and(|bound| Rc::ptr_eq(&bound, canvas))
    }
}

fn record(history: &Weak<RefCell<History>>, kind: MutationKind, source: &dyn SnapshotSource) {
    let Some(history) = history.upgrade() else {
        trace!("History dropped, ignoring {:?}", kind);
        return;
    };

    let snapshot = match source.snapshot() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!("Skipping history point for {:?}: {}", kind, err);
            return;
        }
    };

    match history.try_borrow_mut() {
        Ok(mut history) => {
            let outcome = history.record(snapshot);
            trace!("Recorded {:?}: {:?}", kind, outcome);
        }
        Err(_) => warn!("History busy, dropped snapshot for {:?}", kind),
    };
}

impl<C: Canvas> Drop for MutationListener<C> {
    fn drop(&mut self) {
        self.active.set(false);

        let Some(canvas) = self.canvas.upgrade() else {
            trace!("Canvas already gone, nothing to unsubscribe");
            return;
        };

        match canvas.try_borrow_mut() {
            Ok(mut canvas) => {
                canvas.unsubscribe(self.id);
                debug!("Mutation listener {:?} detached", self.id);
            }
            Err(_) => warn!("Canvas busy, could not detach listener {:?}", self.id),
        };
    }
}
