// Annotation objects drawn on top of a report image.

use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geometry of a single annotation, in image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Path { points: Vec<Pos2> },
    Rectangle { rect: Rect },
    Ellipse { rect: Rect },
    Arrow { from: Pos2, to: Pos2 },
    Text { at: Pos2, content: String, size: f32 },
}

impl Shape {
    /// Axis-aligned bounds of the shape.
    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Path { points } => Rect::from_points(points),
            Shape::Rectangle { rect } | Shape::Ellipse { rect } => *rect,
            Shape::Arrow { from, to } => Rect::from_two_pos(*from, *to),
            Shape::Text { at, content, size } => {
                // Rough glyph box; good enough for picking.
                let width = content.chars().count() as f32 * size * 0.6;
                Rect::from_min_size(*at, Vec2::new(width, *size))
            }
        }
    }

    pub fn hit(&self, pos: Pos2, tolerance: f32) -> bool {
        match self {
            Shape::Path { points } => match points.as_slice() {
                [] => false,
                [only] => only.distance(pos) <= tolerance,
                _ => points
                    .windows(2)
                    .any(|w| distance_to_segment(pos, w[0], w[1]) <= tolerance),
            },
            Shape::Rectangle { rect } => rect.expand(tolerance).contains(pos),
            Shape::Ellipse { rect } => {
                let r = rect.expand(tolerance);
                let (rx, ry) = (r.width() / 2.0, r.height() / 2.0);
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let d = pos - r.center();
                (d.x / rx).powi(2) + (d.y / ry).powi(2) <= 1.0
            }
            Shape::Arrow { from, to } => distance_to_segment(pos, *from, *to) <= tolerance,
            Shape::Text { .. } => self.bounds().expand(tolerance).contains(pos),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Shape::Path { points } => {
                for p in points.iter_mut() {
                    *p += delta;
                }
            }
            Shape::Rectangle { rect } | Shape::Ellipse { rect } => *rect = rect.translate(delta),
            Shape::Arrow { from, to } => {
                *from += delta;
                *to += delta;
            }
            Shape::Text { at, .. } => *at += delta,
        }
    }
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationObject {
    pub id: Uuid,
    pub shape: Shape,
    pub stroke: Color32,
    pub stroke_width: f32,
}

impl AnnotationObject {
    pub fn new(shape: Shape, stroke: Color32, stroke_width: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            shape,
            stroke,
            stroke_width,
        }
    }

    /// Hit test including half the stroke width.
    pub fn hit(&self, pos: Pos2, tolerance: f32) -> bool {
        self.shape.hit(pos, tolerance + self.stroke_width / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_path_hit_along_segment() {
        let shape = Shape::Path {
            points: vec![pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 10.0)],
        };
        assert!(shape.hit(pos2(5.0, 1.0), 2.0));
        assert!(shape.hit(pos2(11.0, 5.0), 2.0));
        assert!(!shape.hit(pos2(5.0, 5.0), 2.0));
    }

    #[test]
    fn test_ellipse_hit_excludes_corners() {
        let shape = Shape::Ellipse {
            rect: Rect::from_min_max(pos2(0.0, 0.0), pos2(20.0, 10.0)),
        };
        assert!(shape.hit(pos2(10.0, 5.0), 0.0));
        assert!(!shape.hit(pos2(1.0, 1.0), 0.0));
    }

    #[test]
    fn test_arrow_hit_clamps_to_endpoints() {
        let shape = Shape::Arrow {
            from: pos2(0.0, 0.0),
            to: pos2(10.0, 0.0),
        };
        assert!(shape.hit(pos2(10.5, 0.0), 1.0));
        assert!(!shape.hit(pos2(13.0, 0.0), 1.0));
    }

    #[test]
    fn test_translate_rectangle() {
        let mut shape = Shape::Rectangle {
            rect: Rect::from_min_max(pos2(0.0, 0.0), pos2(4.0, 4.0)),
        };
        shape.translate(Vec2::new(2.0, 3.0));
        assert_eq!(shape.bounds(), Rect::from_min_max(pos2(2.0, 3.0), pos2(6.0, 7.0)));
    }

    #[test]
    fn test_object_hit_uses_stroke_width() {
        let object = AnnotationObject::new(
            Shape::Arrow {
                from: pos2(0.0, 0.0),
                to: pos2(10.0, 0.0),
            },
            Color32::RED,
            4.0,
        );
        assert!(object.hit(pos2(5.0, 2.0), 0.0));
        assert!(!object.hit(pos2(5.0, 3.0), 0.0));
    }
}
