//! Minimal 2D geometry for schematic layout.
//!
//! Coordinates are plain `f64` schematic units with y pointing up. Rotations
//! are restricted to right angles, which is all a schematic symbol supports,
//! so rotated bounding boxes stay axis-aligned.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when comparing distances produced by float arithmetic.
pub const EPSILON: f64 = 1e-9;

/// A point (or offset) in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    /// Creates a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Rotates this offset counter-clockwise about the origin.
    pub fn rotated(self, rotation: Rotation) -> Point {
        match rotation {
            Rotation::R0 => self,
            Rotation::R90 => Point::new(-self.y, self.x),
            Rotation::R180 => Point::new(-self.x, -self.y),
            Rotation::R270 => Point::new(self.y, -self.x),
        }
    }

    /// Returns this point shifted by `offset`.
    pub fn offset_by(self, offset: Point) -> Point {
        Point::new(self.x + offset.x, self.y + offset.y)
    }
}

/// Width and height of a box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Extent along x.
    pub width: f64,
    /// Extent along y.
    pub height: f64,
}

impl Size {
    /// Creates a size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The size of the box after rotating it by `rotation`.
    pub fn rotated(self, rotation: Rotation) -> Size {
        if rotation.is_quarter_turn() {
            Size::new(self.height, self.width)
        } else {
            self
        }
    }

    /// Returns `true` if both extents are finite and non-negative.
    pub fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }

    /// Area of the box.
    pub fn area(self) -> f64 {
        self.width * self.height
    }
}

/// The edge of a chip's bounding box a pin sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Left edge.
    #[serde(rename = "x-")]
    XMinus,
    /// Right edge.
    #[serde(rename = "x+")]
    XPlus,
    /// Bottom edge.
    #[serde(rename = "y-")]
    YMinus,
    /// Top edge.
    #[serde(rename = "y+")]
    YPlus,
}

impl Side {
    /// All four sides in a fixed order.
    pub const ALL: [Side; 4] = [Side::XMinus, Side::XPlus, Side::YMinus, Side::YPlus];

    /// Returns `true` for the left and right edges, whose pins run along y.
    pub fn is_vertical_edge(self) -> bool {
        matches!(self, Side::XMinus | Side::XPlus)
    }

    /// The coordinate of `p` that runs along this edge.
    pub fn along(self, p: Point) -> f64 {
        if self.is_vertical_edge() {
            p.y
        } else {
            p.x
        }
    }

    /// The side facing this one across the chip.
    pub fn opposite(self) -> Side {
        match self {
            Side::XMinus => Side::XPlus,
            Side::XPlus => Side::XMinus,
            Side::YMinus => Side::YPlus,
            Side::YPlus => Side::YMinus,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::XMinus => write!(f, "x-"),
            Side::XPlus => write!(f, "x+"),
            Side::YMinus => write!(f, "y-"),
            Side::YPlus => write!(f, "y+"),
        }
    }
}

/// A counter-clockwise right-angle rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    /// No rotation.
    #[default]
    R0,
    /// 90 degrees.
    R90,
    /// 180 degrees.
    R180,
    /// 270 degrees.
    R270,
}

impl Rotation {
    /// Every right-angle rotation, used when a chip allows free rotation.
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    /// The rotation in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// Converts degrees to a rotation, accepting any multiple of 90.
    pub fn from_degrees(degrees: i64) -> Option<Rotation> {
        if degrees % 90 != 0 {
            return None;
        }
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::R0),
            90 => Some(Rotation::R90),
            180 => Some(Rotation::R180),
            _ => Some(Rotation::R270),
        }
    }

    /// Returns `true` for 90 and 270 degrees, which swap width and height.
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Rotation::R90 | Rotation::R270)
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        Rotation::from_degrees(i64::from(degrees))
            .ok_or_else(|| format!("rotation must be a multiple of 90 degrees, got {degrees}"))
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> u16 {
        rotation.degrees()
    }
}

/// An axis-aligned box given by its extreme coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub min_x: f64,
    /// Bottom edge.
    pub min_y: f64,
    /// Right edge.
    pub max_x: f64,
    /// Top edge.
    pub max_y: f64,
}

impl Bounds {
    /// The box of `size` centered on `center`.
    pub fn from_center(center: Point, size: Size) -> Self {
        Self {
            min_x: center.x - size.width / 2.0,
            min_y: center.y - size.height / 2.0,
            max_x: center.x + size.width / 2.0,
            max_y: center.y + size.height / 2.0,
        }
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Size of the box.
    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Center of the box.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// The smallest box containing both boxes.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// The box shifted by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Bounds {
        Bounds {
            min_x: self.min_x + dx,
            min_y: self.min_y + dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    /// How far the two boxes intrude into each other's `gap` clearance,
    /// per axis. Both components are positive exactly when the boxes
    /// violate the clearance.
    pub fn penetration(&self, other: &Bounds, gap: f64) -> (f64, f64) {
        let x = self.max_x.min(other.max_x) - self.min_x.max(other.min_x) + gap;
        let y = self.max_y.min(other.max_y) - self.min_y.max(other.min_y) + gap;
        (x, y)
    }

    /// Returns `true` if the boxes are closer than `gap` on both axes.
    ///
    /// Boxes that sit exactly `gap` apart do not overlap.
    pub fn overlaps(&self, other: &Bounds, gap: f64) -> bool {
        let (x, y) = self.penetration(other, gap);
        x > EPSILON && y > EPSILON
    }
}
