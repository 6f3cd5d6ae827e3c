// Annotation tools for the canvas editor.
// Tool choice and color are editor state only; history sees the canvas edits they cause.

use egui::{Color32, Pos2, Rect};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::editor::annotation::{AnnotationObject, Shape};
use crate::AnnotationCanvas;

/// Pointer positions from press to release.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Pos2>,
}

impl Stroke {
    pub fn new(start: Pos2) -> Self {
        Self {
            points: vec![start],
        }
    }

    /// `None` for an empty list; a stroke always has a press point.
    pub fn from_points(points: Vec<Pos2>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Self { points })
    }

    pub fn push(&mut self, pos: Pos2) {
        self.points.push(pos);
    }

    pub fn start(&self) -> Pos2 {
        self.points[0]
    }

    pub fn end(&self) -> Pos2 {
        self.points[self.points.len() - 1]
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    fn is_click(&self) -> bool {
        self.start() == self.end()
    }
}

pub trait Tool {
    /// Apply a finished stroke. Returns true if the canvas changed.
    fn apply(&self, canvas: &mut AnnotationCanvas, stroke: &Stroke) -> bool;

    fn name(&self) -> &str;

    fn cursor_size(&self) -> f32 {
        1.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Select,
    #[default]
    Pen,
    Rectangle,
    Ellipse,
    Arrow,
    Text,
    Eraser,
}

#[derive(Debug, Clone)]
pub struct Pen {
    pub width: f32,
    pub color: Color32,
}

impl Tool for Pen {
    fn apply(&self, canvas: &mut AnnotationCanvas, stroke: &Stroke) -> bool {
        trace!("Applying Pen with {} point(s)", stroke.points().len());
        let shape = Shape::Path {
            points: stroke.points().to_vec(),
        };
        canvas.add_object(AnnotationObject::new(shape, self.color, self.width));
        true
    }

    fn name(&self) -> &str {
        "Pen"
    }

    fn cursor_size(&self) -> f32 {
        self.width
    }
}

/// Drag-to-size tools: rectangle, ellipse and arrow.
#[derive(Debug, Clone)]
pub struct ShapeTool {
    pub kind: ToolKind,
    pub width: f32,
    pub color: Color32,
}

impl ShapeTool {
    fn shape(&self, from: Pos2, to: Pos2) -> Option<Shape> {
        let rect = Rect::from_two_pos(from, to);
        match self.kind {
            ToolKind::Rectangle => Some(Shape::Rectangle { rect }),
            ToolKind::Ellipse => Some(Shape::Ellipse { rect }),
            ToolKind::Arrow => Some(Shape::Arrow { from, to }),
            _ => None,
        }
    }
}

impl Tool for ShapeTool {
    fn apply(&self, canvas: &mut AnnotationCanvas, stroke: &Stroke) -> bool {
        if stroke.is_click() {
            debug!("{} ignored zero-size drag at {:?}", self.name(), stroke.start());
            return false;
        }

        let Some(shape) = self.shape(stroke.start(), stroke.end()) else {
            return false;
        };
        trace!("Applying {} from {:?} to {:?}", self.name(), stroke.start(), stroke.end());
        canvas.add_object(AnnotationObject::new(shape, self.color, self.width));
        true
    }

    fn name(&self) -> &str {
        match self.kind {
            ToolKind::Rectangle => "Rectangle",
            ToolKind::Ellipse => "Ellipse",
            ToolKind::Arrow => "Arrow",
            _ => "Shape",
        }
    }

    fn cursor_size(&self) -> f32 {
        self.width
    }
}

#[derive(Debug, Clone)]
pub struct TextTool {
    pub content: String,
    pub size: f32,
    pub color: Color32,
}

impl Tool for TextTool {
    fn apply(&self, canvas: &mut AnnotationCanvas, stroke: &Stroke) -> bool {
        if self.content.trim().is_empty() {
            debug!("Text tool has no content, skipping");
            return false;
        }

        let shape = Shape::Text {
            at: stroke.start(),
            content: self.content.clone(),
            size: self.size,
        };
        canvas.add_object(AnnotationObject::new(shape, self.color, 1.0));
        true
    }

    fn name(&self) -> &str {
        "Text"
    }
}

/// Removes every object the stroke passes over, topmost first.
#[derive(Debug, Clone)]
pub struct Eraser {
    pub tolerance: f32,
}

impl Tool for Eraser {
    fn apply(&self, canvas: &mut AnnotationCanvas, stroke: &Stroke) -> bool {
        let mut removed = 0;
        for pos in stroke.points() {
            while let Some(id) = canvas.object_at(*pos, self.tolerance).map(|o| o.id) {
                if canvas.remove_object(id).is_err() {
                    break;
                }
                removed += 1;
            }
        }
        debug!("Eraser removed {} object(s)", removed);
        removed > 0
    }

    fn name(&self) -> &str {
        "Eraser"
    }

    fn cursor_size(&self) -> f32 {
        self.tolerance * 2.0
    }
}

/// Drags the object under the press point by the stroke's displacement.
#[derive(Debug, Clone)]
pub struct Select {
    pub tolerance: f32,
}

impl Tool for Select {
    fn apply(&self, canvas: &mut AnnotationCanvas, stroke: &Stroke) -> bool {
        let delta = stroke.end() - stroke.start();
        if delta == egui::Vec2::ZERO {
            return false;
        }

        let Some(id) = canvas
            .object_at(stroke.start(), self.tolerance)
            .map(|o| o.id)
        else {
            trace!("Nothing to select at {:?}", stroke.start());
            return false;
        };

        canvas
            .modify_object(id, |o| o.shape.translate(delta))
            .is_ok()
    }

    fn name(&self) -> &str {
        "Select"
    }
}

/// Active tool and drawing style for one editing view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationTools {
    pub active: ToolKind,
    pub color: Color32,
    pub stroke_width: f32,
    pub text_size: f32,
    /// Content placed by the text tool.
    pub text: String,
}

impl Default for AnnotationTools {
    fn default() -> Self {
        Self {
            active: ToolKind::Pen,
            color: Color32::RED,
            stroke_width: 3.0,
            text_size: 16.0,
            text: String::new(),
        }
    }
}

impl AnnotationTools {
    pub fn set_tool(&mut self, kind: ToolKind) {
        debug!("Switching tool {:?} -> {:?}", self.active, kind);
        self.active = kind;
    }

    pub fn set_color(&mut self, color: Color32) {
        self.color = color;
    }

    pub fn tool(&self) -> Box<dyn Tool> {
        // Never pick tighter than 4px.
        let tolerance = self.stroke_width.max(4.0);
        match self.active {
            ToolKind::Select => Box::new(Select { tolerance }),
            ToolKind::Pen => Box::new(Pen {
                width: self.stroke_width,
                color: self.color,
            }),
            ToolKind::Rectangle | ToolKind::Ellipse | ToolKind::Arrow => Box::new(ShapeTool {
                kind: self.active,
                width: self.stroke_width,
                color: self.color,
            }),
            ToolKind::Text => Box::new(TextTool {
                content: self.text.clone(),
                size: self.text_size,
                color: self.color,
            }),
            ToolKind::Eraser => Box::new(Eraser { tolerance }),
        }
    }

    /// Apply the active tool to a finished stroke.
    pub fn apply(&self, canvas: &mut AnnotationCanvas, stroke: &Stroke) -> bool {
        self.tool().apply(canvas, stroke)
    }
}
