//! The finished layout.

use indexmap::IndexMap;
use schemapack_common::{Bounds, ChipId, GroupId, PinId, Point, Rotation};
use schemapack_model::{PinOwner, Problem};
use serde::{Deserialize, Serialize};

/// Where a chip or group ends up: its center and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Rotation, serialized in degrees.
    #[serde(rename = "rotation_degrees", default)]
    pub rotation: Rotation,
}

impl Placement {
    /// Creates a placement.
    pub fn new(center: Point, rotation: Rotation) -> Self {
        Self {
            x: center.x,
            y: center.y,
            rotation,
        }
    }

    /// The placed center.
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The same placement moved by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Placement {
        Placement {
            x: self.x + dx,
            y: self.y + dy,
            rotation: self.rotation,
        }
    }
}

/// One placement per chip and per group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputLayout {
    /// Chip placements, in problem order.
    pub chip_placements: IndexMap<ChipId, Placement>,
    /// Group placements, in problem order.
    pub group_placements: IndexMap<GroupId, Placement>,
}

impl OutputLayout {
    /// The rotated bounding box of a placed chip.
    pub fn chip_bounds(&self, problem: &Problem, chip: &ChipId) -> Option<Bounds> {
        let placement = self.chip_placements.get(chip)?;
        let size = problem.chip(chip)?.size.rotated(placement.rotation);
        Some(Bounds::from_center(placement.center(), size))
    }

    /// The box enclosing every placed chip, or `None` if nothing is placed.
    pub fn bounds(&self, problem: &Problem) -> Option<Bounds> {
        self.chip_placements
            .keys()
            .filter_map(|id| self.chip_bounds(problem, id))
            .reduce(|a, b| a.union(&b))
    }

    /// The absolute position of a chip or group pin.
    pub fn pin_position(&self, problem: &Problem, pin: &PinId) -> Option<Point> {
        match problem.pin_owner(pin)? {
            PinOwner::Chip(chip) => {
                let placement = self.chip_placements.get(chip)?;
                let offset = problem.chip_pin(pin)?.offset.rotated(placement.rotation);
                Some(placement.center().offset_by(offset))
            }
            PinOwner::Group(group) => {
                let placement = self.group_placements.get(group)?;
                let offset = problem.group_pins().get(pin)?.offset.rotated(placement.rotation);
                Some(placement.center().offset_by(offset))
            }
        }
    }

    /// Every pair of chips whose rotated boxes overlap, in problem order.
    pub fn overlapping_chips(&self, problem: &Problem) -> Vec<(ChipId, ChipId)> {
        let boxes: Vec<(&ChipId, Bounds)> = self
            .chip_placements
            .keys()
            .filter_map(|id| self.chip_bounds(problem, id).map(|b| (id, b)))
            .collect();
        let mut pairs = Vec::new();
        for (i, (a, box_a)) in boxes.iter().enumerate() {
            for (b, box_b) in &boxes[i + 1..] {
                if box_a.overlaps(box_b, 0.0) {
                    pairs.push(((*a).clone(), (*b).clone()));
                }
            }
        }
        pairs
    }

    /// Returns `true` if every chip of `problem` has a placement and no
    /// placement names an unknown chip.
    pub fn places_exactly(&self, problem: &Problem) -> bool {
        self.chip_placements.len() == problem.chip_count()
            && problem
                .chips()
                .keys()
                .all(|id| self.chip_placements.contains_key(id))
    }
}
