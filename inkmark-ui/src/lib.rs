//! inkmark-ui: annotation canvas, tool state and undo/redo wiring for report images.
//!
//! The canvas owns its objects and announces structural changes. One
//! `UndoRedoController` per editing view listens to those changes, records a
//! snapshot for each, and restores the canvas on undo and redo.

pub mod editor;
pub mod replay;

pub use editor::{
    AnnotationCanvas, AnnotationObject, AnnotationTools, Canvas, CanvasDocument, CanvasError,
    EditorError, HistoryState, HistoryToolbar, MutationHandler, MutationKind, MutationListener,
    Shape, SnapshotSource, Stroke, SubscriptionId, Tool, ToolKind, ToolbarAction,
    UndoRedoController, DOCUMENT_VERSION,
};
