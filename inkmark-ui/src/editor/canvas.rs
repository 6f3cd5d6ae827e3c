// Annotation canvas for inkmark.
// Holds the objects drawn over a report image and tells subscribers when they change.

use std::fmt;

use egui::Pos2;
use inkmark_history::Snapshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::editor::annotation::AnnotationObject;

/// Version written into every snapshot document.
pub const DOCUMENT_VERSION: u32 = 1;

/// Structural changes that produce a history point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    ObjectAdded,
    ObjectModified,
    ObjectRemoved,
}

impl MutationKind {
    pub const ALL: [MutationKind; 3] = [
        MutationKind::ObjectAdded,
        MutationKind::ObjectModified,
        MutationKind::ObjectRemoved,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Anything that can serialize its full current state.
pub trait SnapshotSource {
    fn snapshot(&self) -> Result<Snapshot, CanvasError>;
}

/// Called after a mutation, with read access to the canvas that changed.
pub type MutationHandler = Box<dyn FnMut(MutationKind, &dyn SnapshotSource)>;

/// What the history machinery needs from a canvas.
///
/// `restore` and `clear` redraw without emitting mutation events.
pub trait Canvas: SnapshotSource {
    fn subscribe(&mut self, kinds: &[MutationKind], handler: MutationHandler) -> SubscriptionId;

    /// Returns false if the id was not subscribed.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), CanvasError>;

    fn clear(&mut self);
}

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("failed to encode canvas snapshot")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode canvas snapshot")]
    Decode(#[source] serde_json::Error),

    #[error("unsupported snapshot version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("unknown annotation object: {id}")]
    UnknownObject { id: Uuid },
}

/// Serialized form of the canvas. This is what a `Snapshot` carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasDocument {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub background: Option<String>,
    pub objects: Vec<AnnotationObject>,
}

struct Subscriber {
    id: SubscriptionId,
    kinds: Vec<MutationKind>,
    handler: MutationHandler,
}

pub struct AnnotationCanvas {
    pub width: u32,
    pub height: u32,
    /// Path or storage key of the image being annotated.
    pub background: Option<String>,
    objects: Vec<AnnotationObject>,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
}

impl AnnotationCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        info!("Creating new annotation canvas of size {}x{}", width, height);

        Self {
            width,
            height,
            background: None,
            objects: Vec::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn objects(&self) -> &[AnnotationObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&AnnotationObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Topmost object under `pos`.
    pub fn object_at(&self, pos: Pos2, tolerance: f32) -> Option<&AnnotationObject> {
        self.objects.iter().rev().find(|o| o.hit(pos, tolerance))
    }

    pub fn add_object(&mut self, object: AnnotationObject) -> Uuid {
        let id = object.id;
        trace!("Adding object {} ({:?})", id, object.shape);
        self.objects.push(object);
        self.emit(MutationKind::ObjectAdded);
        id
    }

    /// Edit an object in place and notify subscribers.
    pub fn modify_object(
        &mut self,
        id: Uuid,
        edit: impl FnOnce(&mut AnnotationObject),
    ) -> Result<(), CanvasError> {
        let Some(object) = self.objects.iter_mut().find(|o| o.id == id) else {
            warn!("Attempted to modify unknown object {}", id);
            return Err(CanvasError::UnknownObject { id });
        };

        edit(object);
        // The edit must not change identity.
        object.id = id;
        trace!("Modified object {}", id);
        self.emit(MutationKind::ObjectModified);
        Ok(())
    }

    pub fn remove_object(&mut self, id: Uuid) -> Result<AnnotationObject, CanvasError> {
        let Some(index) = self.objects.iter().position(|o| o.id == id) else {
            warn!("Attempted to remove unknown object {}", id);
            return Err(CanvasError::UnknownObject { id });
        };

        let removed = self.objects.remove(index);
        trace!("Removed object {}", id);
        self.emit(MutationKind::ObjectRemoved);
        Ok(removed)
    }

    pub fn to_document(&self) -> CanvasDocument {
        CanvasDocument {
            version: DOCUMENT_VERSION,
            width: self.width,
            height: self.height,
            background: self.background.clone(),
            objects: self.objects.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn emit(&mut self, kind: MutationKind) {
        // Handlers get shared access to the canvas, so take them out while they run.
        let mut subscribers = std::mem::take(&mut self.subscribers);
        let mut notified = 0;
        for subscriber in subscribers.iter_mut() {
            if subscriber.kinds.contains(&kind) {
                (subscriber.handler)(kind, &*self);
                notified += 1;
            }
        }
        self.subscribers = subscribers;
        debug!("Emitted {:?} to {} subscriber(s)", kind, notified);
    }
}

impl SnapshotSource for AnnotationCanvas {
    fn snapshot(&self) -> Result<Snapshot, CanvasError> {
        let json = serde_json::to_string(&self.to_document()).map_err(CanvasError::Encode)?;
        trace!("Serialized canvas with {} object(s)", self.objects.len());
        Ok(Snapshot::from(json))
    }
}

impl Canvas for AnnotationCanvas {
    fn subscribe(&mut self, kinds: &[MutationKind], handler: MutationHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscriber {
            id,
            kinds: kinds.to_vec(),
            handler,
        });
        debug!("Subscribed {:?} to {:?}", id, kinds);
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        let removed = self.subscribers.len() != before;
        debug!("Unsubscribed {:?} (found: {})", id, removed);
        removed
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<(), CanvasError> {
        let document: CanvasDocument =
            serde_json::from_str(snapshot.as_str()).map_err(CanvasError::Decode)?;
        if document.version != DOCUMENT_VERSION {
            return Err(CanvasError::UnsupportedVersion {
                found: document.version,
                expected: DOCUMENT_VERSION,
            });
        }

        self.width = document.width;
        self.height = document.height;
        self.background = document.background;
        self.objects = document.objects;
        debug!("Restored canvas with {} object(s)", self.objects.len());
        Ok(())
    }

    // Annotations only; the background image stays.
    fn clear(&mut self) {
        info!("Clearing canvas");
        self.objects.clear();
    }
}

impl fmt::Debug for AnnotationCanvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("background", &self.background)
            .field("objects", &self.objects)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

// Create a default canvas
impl Default for AnnotationCanvas {
    fn default() -> Self {
        AnnotationCanvas::new(1280, 720)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::annotation::Shape;
    use egui::{pos2, Color32, Rect};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rect_object(x: f32) -> AnnotationObject {
        AnnotationObject::new(
            Shape::Rectangle {
                rect: Rect::from_min_max(pos2(x, 0.0), pos2(x + 10.0, 10.0)),
            },
            Color32::RED,
            2.0,
        )
    }

    fn recorder(
        canvas: &mut AnnotationCanvas,
        kinds: &[MutationKind],
    ) -> Rc<RefCell<Vec<MutationKind>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        canvas.subscribe(kinds, Box::new(move |kind, _| sink.borrow_mut().push(kind)));
        seen
    }

    #[test]
    fn test_mutations_emit_matching_kind() {
        let mut canvas = AnnotationCanvas::new(100, 100);
        let seen = recorder(&mut canvas, &MutationKind::ALL);

        let id = canvas.add_object(rect_object(0.0));
        canvas
            .modify_object(id, |o| o.stroke = Color32::BLUE)
            .unwrap();
        canvas.remove_object(id).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                MutationKind::ObjectAdded,
                MutationKind::ObjectModified,
                MutationKind::ObjectRemoved
            ]
        );
    }

    #[test]
    fn test_subscription_filters_kinds() {
        let mut canvas = AnnotationCanvas::new(100, 100);
        let seen = recorder(&mut canvas, &[MutationKind::ObjectRemoved]);

        let id = canvas.add_object(rect_object(0.0));
        canvas.remove_object(id).unwrap();

        assert_eq!(*seen.borrow(), vec![MutationKind::ObjectRemoved]);
    }

    #[test]
    fn test_handler_sees_post_mutation_state() {
        let mut canvas = AnnotationCanvas::new(100, 100);
        let snapshots = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&snapshots);
        canvas.subscribe(
            &MutationKind::ALL,
            Box::new(move |_, source| sink.borrow_mut().push(source.snapshot().unwrap())),
        );

        canvas.add_object(rect_object(0.0));

        let mut other = AnnotationCanvas::new(1, 1);
        other.restore(&snapshots.borrow()[0]).unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(other.width, 100);
    }

    #[test]
    fn test_unsubscribe_stops_events() {
        let mut canvas = AnnotationCanvas::new(100, 100);
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        let id = canvas.subscribe(
            &MutationKind::ALL,
            Box::new(move |_, _| *sink.borrow_mut() += 1),
        );

        canvas.add_object(rect_object(0.0));
        assert!(canvas.unsubscribe(id));
        assert!(!canvas.unsubscribe(id));
        canvas.add_object(rect_object(20.0));

        assert_eq!(*seen.borrow(), 1);
        assert_eq!(canvas.subscriber_count(), 0);
    }

    #[test]
    fn test_restore_and_clear_are_silent() {
        let mut canvas = AnnotationCanvas::new(100, 100);
        canvas.add_object(rect_object(0.0));
        let snapshot = canvas.snapshot().unwrap();
        let seen = recorder(&mut canvas, &MutationKind::ALL);

        canvas.clear();
        assert!(canvas.is_empty());
        canvas.restore(&snapshot).unwrap();
        assert_eq!(canvas.len(), 1);

        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_restore_rejects_bad_snapshots() {
        let mut canvas = AnnotationCanvas::new(100, 100);
        canvas.add_object(rect_object(0.0));

        let garbage = Snapshot::from("not json");
        assert!(matches!(canvas.restore(&garbage), Err(CanvasError::Decode(_))));

        let future = Snapshot::from(
            r#"{"version":99,"width":1,"height":1,"background":null,"objects":[]}"#,
        );
        assert!(matches!(
            canvas.restore(&future),
            Err(CanvasError::UnsupportedVersion { found: 99, expected: 1 })
        ));

        // Failed restores leave the canvas alone.
        assert_eq!(canvas.len(), 1);
    }

    #[test]
    fn test_modify_unknown_object() {
        let mut canvas = AnnotationCanvas::default();
        let id = Uuid::new_v4();
        assert!(matches!(
            canvas.modify_object(id, |_| {}),
            Err(CanvasError::UnknownObject { .. })
        ));
        assert!(canvas.remove_object(id).is_err());
    }

    #[test]
    fn test_object_at_prefers_topmost() {
        let mut canvas = AnnotationCanvas::new(100, 100);
        let below = canvas.add_object(rect_object(0.0));
        let above = canvas.add_object(rect_object(5.0));

        assert_eq!(canvas.object_at(pos2(7.0, 5.0), 0.0).map(|o| o.id), Some(above));
        assert_eq!(canvas.object_at(pos2(2.0, 5.0), 0.0).map(|o| o.id), Some(below));
        assert!(canvas.object_at(pos2(50.0, 50.0), 0.0).is_none());
    }
}
