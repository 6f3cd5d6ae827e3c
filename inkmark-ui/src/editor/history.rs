// Undo/redo controller for the editor.
// Owns one history per editing session and keeps it wired to the bound canvas.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use inkmark_history::{History, HistoryConfig, HistoryError, Restore, Snapshot};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::editor::canvas::{Canvas, CanvasError};
use crate::editor::listener::MutationListener;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// What the toolbar needs to draw itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryState {
    pub len: usize,
    /// `-1` when nothing is current.
    pub position: isize,
    pub can_undo: bool,
    pub can_redo: bool,
}

pub struct UndoRedoController<C: Canvas> {
    history: Rc<RefCell<History>>,
    canvas: Option<Rc<RefCell<C>>>,
    listener: Option<MutationListener<C>>,
}

impl<C: Canvas> UndoRedoController<C> {
    pub fn new(config: HistoryConfig) -> Result<Self, EditorError> {
        let history = History::with_config(config)?;
        Ok(Self {
            history: Rc::new(RefCell::new(history)),
            canvas: None,
            listener: None,
        })
    }

    /// Create a controller already bound to `canvas`.
    pub fn bound(canvas: Rc<RefCell<C>>, config: HistoryConfig) -> Result<Self, EditorError> {
        let mut controller = Self::new(config)?;
        controller.bind(canvas);
        Ok(controller)
    }

    /// Bind to a canvas, replacing any previous one.
    ///
    /// The previous subscription is released and the history starts empty:
    /// snapshots of one canvas are meaningless on another.
    pub fn bind(&mut self, canvas: Rc<RefCell<C>>) {
        if self
            .listener
            .as_ref()
            .is_some_and(|listener| listener.is_bound_to(&canvas))
        {
            debug!("Canvas already bound");
            return;
        }

        self.unbind();
        self.listener = Some(MutationListener::attach(&canvas, &self.history));
        self.canvas = Some(canvas);
        info!("Undo/redo controller bound to canvas");
    }

    /// Release the canvas subscription and forget the history.
    pub fn unbind(&mut self) {
        if self.canvas.is_none() {
            return;
        }
        self.listener = None;
        self.canvas = None;
        self.history.borrow_mut().clear();
        info!("Undo/redo controller unbound");
    }

    pub fn is_bound(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn canvas(&self) -> Option<&Rc<RefCell<C>>> {
        self.canvas.as_ref()
    }

    pub fn history(&self) -> Ref<'_, History> {
        self.history.borrow()
    }

    pub fn can_undo(&self) -> bool {
        self.is_bound() && self.history.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.is_bound() && self.history.borrow().can_redo()
    }

    pub fn state(&self) -> HistoryState {
        let history = self.history.borrow();
        HistoryState {
            len: history.len(),
            position: history.position(),
            can_undo: self.is_bound() && history.can_undo(),
            can_redo: self.is_bound() && history.can_redo(),
        }
    }

    /// Record the canvas as it is now, outside of any mutation event.
    ///
    /// Useful right after loading an image so the first edit can be undone.
    pub fn checkpoint(&mut self) -> Result<bool, EditorError> {
        let Some(canvas) = &self.canvas else {
            return Ok(false);
        };
        let Ok(canvas) = canvas.try_borrow() else {
            warn!("Canvas busy, skipping checkpoint");
            return Ok(false);
        };
        let snapshot = canvas.snapshot()?;

        // A checkpoint is its own entry: never merged with edits on either side.
        let mut history = self.history.borrow_mut();
        history.seal();
        history.record(snapshot);
        history.seal();
        debug!("Checkpoint recorded");
        Ok(true)
    }

    /// Step back one snapshot. `Ok(false)` when there is nothing to undo or no canvas.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        self.step(|history| history.undo())
    }

    /// Step forward one snapshot. `Ok(false)` when there is nothing to redo or no canvas.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        self.step(|history| history.redo())
    }

    fn step(
        &mut self,
        mv: impl FnOnce(&mut History) -> Option<Restore<Snapshot>>,
    ) -> Result<bool, EditorError> {
        let Some(canvas) = &self.canvas else {
            debug!("No canvas bound, ignoring history step");
            return Ok(false);
        };

        let Ok(mut canvas) = canvas.try_borrow_mut() else {
            warn!("Canvas busy, ignoring history step");
            return Ok(false);
        };

        let previous = self.history.borrow().cursor();
        // Release the history borrow before touching the canvas.
        let restore = mv(&mut self.history.borrow_mut());
        let Some(restore) = restore else {
            return Ok(false);
        };

        let result = match restore {
            Restore::Snapshot(snapshot) => canvas.restore(&snapshot),
            Restore::Empty => {
                canvas.clear();
                Ok(())
            }
        };

        if let Err(err) = result {
            warn!("Restore failed, rolling history back: {}", err);
            self.history.borrow_mut().seek(previous)?;
            return Err(err.into());
        }
        Ok(true)
    }

    /// Forget all snapshots. The canvas is left as it is.
    pub fn clear(&mut self) {
        self.history.borrow_mut().clear();
    }
}
