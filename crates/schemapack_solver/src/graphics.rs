//! Renderable snapshots of solver state.
//!
//! A [`Graphic`] is plain data: external tooling decides how to draw it.

use schemapack_common::{Bounds, Point};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle, usually a placed chip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicRect {
    /// Rectangle extent.
    pub bounds: Bounds,
    /// Optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A marker, usually a pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicPoint {
    /// Marker position.
    pub at: Point,
    /// Optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A polyline, usually a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicLine {
    /// Vertices in drawing order.
    pub points: Vec<Point>,
}

/// Free-standing text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicText {
    /// Anchor position.
    pub at: Point,
    /// The text.
    pub text: String,
}

/// A complete drawing of one solver's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graphic {
    /// Caption for the whole drawing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Rectangles.
    #[serde(default)]
    pub rects: Vec<GraphicRect>,
    /// Markers.
    #[serde(default)]
    pub points: Vec<GraphicPoint>,
    /// Polylines.
    #[serde(default)]
    pub lines: Vec<GraphicLine>,
    /// Text labels.
    #[serde(default)]
    pub texts: Vec<GraphicText>,
}

impl Graphic {
    /// An empty drawing with a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Adds a labelled rectangle.
    pub fn rect(&mut self, bounds: Bounds, label: impl Into<String>) {
        self.rects.push(GraphicRect {
            bounds,
            label: Some(label.into()),
        });
    }

    /// Adds a labelled marker.
    pub fn point(&mut self, at: Point, label: impl Into<String>) {
        self.points.push(GraphicPoint {
            at,
            label: Some(label.into()),
        });
    }

    /// Adds a straight segment.
    pub fn line(&mut self, from: Point, to: Point) {
        self.lines.push(GraphicLine {
            points: vec![from, to],
        });
    }

    /// Adds a text label.
    pub fn text(&mut self, at: Point, text: impl Into<String>) {
        self.texts.push(GraphicText {
            at,
            text: text.into(),
        });
    }

    /// Returns `true` if nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty() && self.points.is_empty() && self.lines.is_empty() && self.texts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemapack_common::Size;

    #[test]
    fn titled_graphic_is_empty() {
        let g = Graphic::titled("partitions");
        assert_eq!(g.title.as_deref(), Some("partitions"));
        assert!(g.is_empty());
    }

    #[test]
    fn serializes_without_absent_labels() {
        let mut g = Graphic::default();
        g.rect(Bounds::from_center(Point::ORIGIN, Size::new(2.0, 1.0)), "U1");
        g.line(Point::ORIGIN, Point::new(1.0, 0.0));
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["rects"][0]["label"], "U1");
        assert!(json.get("title").is_none());
        assert!(!g.is_empty());
    }
}
