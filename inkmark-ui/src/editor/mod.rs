// Editor module for inkmark.

pub mod annotation;
pub mod canvas;
pub mod history;
pub mod listener;
pub mod toolbar;
pub mod tools;

pub use annotation::{AnnotationObject, Shape};
pub use canvas::{
    AnnotationCanvas, Canvas, CanvasDocument, CanvasError, MutationHandler, MutationKind,
    SnapshotSource, SubscriptionId, DOCUMENT_VERSION,
};
pub use history::{EditorError, HistoryState, UndoRedoController};
pub use listener::MutationListener;
pub use toolbar::{HistoryToolbar, ToolbarAction};
pub use tools::{AnnotationTools, Stroke, Tool, ToolKind};
