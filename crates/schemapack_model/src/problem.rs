//! The immutable layout problem and its entities.

use crate::connections::{StrongConnections, WeakConnections};
use indexmap::IndexMap;
use schemapack_common::{Bounds, ChipId, GroupId, NetId, PinId, Point, Rotation, Side, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A placeable component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chip {
    /// Chip identifier.
    pub id: ChipId,
    /// The chip's pins, in declaration order.
    pub pin_ids: Vec<PinId>,
    /// Unrotated bounding box size.
    pub size: Size,
    /// Rotations the packer may use. `None` means free rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_rotations: Option<Vec<Rotation>>,
}

impl Chip {
    /// The rotations the packer may try, in preference order.
    pub fn rotations(&self) -> Vec<Rotation> {
        match &self.allowed_rotations {
            Some(list) if !list.is_empty() => list.clone(),
            _ => Rotation::ALL.to_vec(),
        }
    }
}

/// A pin on the edge of a chip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipPin {
    /// Pin identifier.
    pub id: PinId,
    /// Offset from the owning chip's center, unrotated.
    pub offset: Point,
    /// Edge of the chip the pin sits on.
    pub side: Side,
}

/// A container of pins that is not packed itself (net labels, power
/// symbols). Groups only matter through the nets their pins join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier.
    pub id: GroupId,
    /// The group's pins.
    pub pin_ids: Vec<PinId>,
    /// Bounding shapes relative to the group's center.
    #[serde(default)]
    pub shapes: Vec<Bounds>,
}

/// A pin of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPin {
    /// Pin identifier.
    pub id: PinId,
    /// Offset from the group's center.
    pub offset: Point,
}

/// A logical signal that pins join through weak connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Net {
    /// Net identifier.
    pub id: NetId,
}

/// The entity a pin belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PinOwner {
    /// The pin is listed by a chip.
    Chip(ChipId),
    /// The pin is listed by a group.
    Group(GroupId),
}

/// The raw contents of a [`Problem`], with public fields.
///
/// This is the form problems are serialized in and the form partitioning
/// assembles before turning it into a new [`Problem`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemParts {
    /// Chips keyed by id, in declaration order.
    pub chips: IndexMap<ChipId, Chip>,
    /// Chip pins keyed by id.
    pub chip_pins: IndexMap<PinId, ChipPin>,
    /// Groups keyed by id.
    #[serde(default)]
    pub groups: IndexMap<GroupId, Group>,
    /// Group pins keyed by id.
    #[serde(default)]
    pub group_pins: IndexMap<PinId, GroupPin>,
    /// Nets keyed by id.
    #[serde(default)]
    pub nets: IndexMap<NetId, Net>,
    /// Direct pin-to-pin wires.
    #[serde(default)]
    pub strong: StrongConnections,
    /// Pin-to-net memberships.
    #[serde(default)]
    pub weak: WeakConnections,
    /// Minimum gap between chips of one partition.
    pub chip_gap: f64,
    /// Minimum gap between partitions.
    pub partition_gap: f64,
}

/// A complete, immutable layout problem.
///
/// The pin-owner index is computed once at construction so every later
/// "which chip owns this pin" question is a hash lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProblemParts", into = "ProblemParts")]
pub struct Problem {
    parts: ProblemParts,
    pin_owners: HashMap<PinId, PinOwner>,
}

impl From<ProblemParts> for Problem {
    fn from(parts: ProblemParts) -> Self {
        Problem::from_parts(parts)
    }
}

impl From<Problem> for ProblemParts {
    fn from(problem: Problem) -> Self {
        problem.parts
    }
}

impl Problem {
    /// Builds a problem from its parts, indexing pin owners.
    ///
    /// When a pin is listed by more than one owner the first chip listing it
    /// wins; validation reports the conflict.
    pub fn from_parts(parts: ProblemParts) -> Self {
        let mut pin_owners = HashMap::new();
        for chip in parts.chips.values() {
            for pin in &chip.pin_ids {
                pin_owners
                    .entry(pin.clone())
                    .or_insert_with(|| PinOwner::Chip(chip.id.clone()));
            }
        }
        for group in parts.groups.values() {
            for pin in &group.pin_ids {
                pin_owners
                    .entry(pin.clone())
                    .or_insert_with(|| PinOwner::Group(group.id.clone()));
            }
        }
        Self { parts, pin_owners }
    }

    /// The raw contents of this problem.
    pub fn parts(&self) -> &ProblemParts {
        &self.parts
    }

    /// Consumes the problem, returning its raw contents.
    pub fn into_parts(self) -> ProblemParts {
        self.parts
    }

    /// Chips in declaration order.
    pub fn chips(&self) -> &IndexMap<ChipId, Chip> {
        &self.parts.chips
    }

    /// Looks up a chip.
    pub fn chip(&self, id: &ChipId) -> Option<&Chip> {
        self.parts.chips.get(id)
    }

    /// Chip pins by id.
    pub fn chip_pins(&self) -> &IndexMap<PinId, ChipPin> {
        &self.parts.chip_pins
    }

    /// Looks up a chip pin.
    pub fn chip_pin(&self, id: &PinId) -> Option<&ChipPin> {
        self.parts.chip_pins.get(id)
    }

    /// Groups in declaration order.
    pub fn groups(&self) -> &IndexMap<GroupId, Group> {
        &self.parts.groups
    }

    /// Group pins by id.
    pub fn group_pins(&self) -> &IndexMap<PinId, GroupPin> {
        &self.parts.group_pins
    }

    /// Nets in declaration order.
    pub fn nets(&self) -> &IndexMap<NetId, Net> {
        &self.parts.nets
    }

    /// The strong connection relation.
    pub fn strong(&self) -> &StrongConnections {
        &self.parts.strong
    }

    /// The weak connection relation.
    pub fn weak(&self) -> &WeakConnections {
        &self.parts.weak
    }

    /// Minimum gap between chips in the same partition.
    pub fn chip_gap(&self) -> f64 {
        self.parts.chip_gap
    }

    /// Minimum gap between partitions.
    pub fn partition_gap(&self) -> f64 {
        self.parts.partition_gap
    }

    /// Returns a copy with the given spacing constants replaced.
    pub fn with_spacing(&self, chip_gap: Option<f64>, partition_gap: Option<f64>) -> Problem {
        let mut parts = self.parts.clone();
        if let Some(gap) = chip_gap {
            parts.chip_gap = gap;
        }
        if let Some(gap) = partition_gap {
            parts.partition_gap = gap;
        }
        Problem::from_parts(parts)
    }

    /// The chip or group that lists `pin`.
    pub fn pin_owner(&self, pin: &PinId) -> Option<&PinOwner> {
        self.pin_owners.get(pin)
    }

    /// The chip that lists `pin`, if it is a chip pin.
    pub fn chip_of_pin(&self, pin: &PinId) -> Option<&ChipId> {
        match self.pin_owners.get(pin) {
            Some(PinOwner::Chip(chip)) => Some(chip),
            _ => None,
        }
    }

    /// The side of a chip pin. Group pins have no side.
    pub fn pin_side(&self, pin: &PinId) -> Option<Side> {
        self.parts.chip_pins.get(pin).map(|p| p.side)
    }

    /// Returns `true` if the id names a chip pin or a group pin.
    pub fn has_pin(&self, pin: &PinId) -> bool {
        self.parts.chip_pins.contains_key(pin) || self.parts.group_pins.contains_key(pin)
    }

    /// Returns `true` if any strong connection entry is true.
    pub fn has_strong_connections(&self) -> bool {
        self.parts.strong.any_connected()
    }

    /// For every pin with a strong connection, the pins it is wired to,
    /// in the order the connections were declared.
    pub fn strongly_connected_pins(&self) -> IndexMap<PinId, Vec<PinId>> {
        let mut map: IndexMap<PinId, Vec<PinId>> = IndexMap::new();
        for (a, b) in self.parts.strong.pairs() {
            let partners = map.entry(a.clone()).or_default();
            if !partners.contains(b) {
                partners.push(b.clone());
            }
        }
        map
    }

    /// Pins that belong to `net`.
    pub fn net_members<'a>(&'a self, net: &'a NetId) -> Vec<&'a PinId> {
        self.parts.weak.members_of(net).collect()
    }

    /// Number of chips.
    pub fn chip_count(&self) -> usize {
        self.parts.chips.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ProblemBuilder;

    fn two_chip_problem() -> Problem {
        ProblemBuilder::new()
            .chip("A", Size::new(1.0, 1.0))
            .chip_pin("A", "A.p1", Point::new(0.5, 0.0), Side::XPlus)
            .chip("B", Size::new(1.0, 1.0))
            .chip_pin("B", "B.p1", Point::new(-0.5, 0.0), Side::XMinus)
            .group("G")
            .group_pin("G", "G.p1", Point::ORIGIN)
            .connect_pins("A.p1", "B.p1")
            .connect_net("G.p1", "VCC")
            .build()
    }

    #[test]
    fn pin_owner_index() {
        let problem = two_chip_problem();
        assert_eq!(
            problem.pin_owner(&PinId::from("A.p1")),
            Some(&PinOwner::Chip(ChipId::from("A")))
        );
        assert_eq!(
            problem.pin_owner(&PinId::from("G.p1")),
            Some(&PinOwner::Group(GroupId::from("G")))
        );
        assert_eq!(problem.chip_of_pin(&PinId::from("G.p1")), None);
        assert_eq!(problem.pin_owner(&PinId::from("Z.p9")), None);
    }

    #[test]
    fn strongly_connected_pins_is_symmetric() {
        let problem = two_chip_problem();
        let map = problem.strongly_connected_pins();
        assert_eq!(map[&PinId::from("A.p1")], vec![PinId::from("B.p1")]);
        assert_eq!(map[&PinId::from("B.p1")], vec![PinId::from("A.p1")]);
    }

    #[test]
    fn default_rotations_are_free() {
        let problem = two_chip_problem();
        let chip = problem.chip(&ChipId::from("A")).unwrap();
        assert_eq!(chip.rotations().len(), 4);
    }

    #[test]
    fn spacing_override_creates_new_problem() {
        let problem = two_chip_problem();
        let wider = problem.with_spacing(Some(1.0), None);
        assert_eq!(wider.chip_gap(), 1.0);
        assert_eq!(wider.partition_gap(), problem.partition_gap());
        assert_ne!(problem.chip_gap(), 1.0);
    }

    #[test]
    fn serde_roundtrip_rebuilds_index() {
        let problem = two_chip_problem();
        let json = serde_json::to_string(&problem).unwrap();
        let restored: Problem = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, problem);
        assert_eq!(
            restored.chip_of_pin(&PinId::from("B.p1")),
            Some(&ChipId::from("B"))
        );
    }
}
