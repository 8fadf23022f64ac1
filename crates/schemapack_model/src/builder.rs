//! Fluent construction of [`Problem`]s.

use crate::problem::{Chip, ChipPin, Group, GroupPin, Net, Problem, ProblemParts};
use schemapack_common::{Bounds, ChipId, GroupId, NetId, PinId, Point, Rotation, Side, Size};

/// Default minimum gap between chips of one partition.
pub const DEFAULT_CHIP_GAP: f64 = 0.2;

/// Default minimum gap between partitions.
pub const DEFAULT_PARTITION_GAP: f64 = 2.0;

/// Builds a [`Problem`] step by step.
///
/// Pins added through [`chip_pin`](Self::chip_pin) or
/// [`group_pin`](Self::group_pin) are appended to their owner's pin list, so
/// a builder never produces a chip that lists an unknown pin. Nets named by
/// [`connect_net`](Self::connect_net) are declared on first use.
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    parts: ProblemParts,
}

impl Default for ProblemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProblemBuilder {
    /// Starts an empty problem with the default spacing constants.
    pub fn new() -> Self {
        Self {
            parts: ProblemParts {
                chip_gap: DEFAULT_CHIP_GAP,
                partition_gap: DEFAULT_PARTITION_GAP,
                ..ProblemParts::default()
            },
        }
    }

    /// Declares a chip with no pins.
    pub fn chip(mut self, id: impl Into<ChipId>, size: Size) -> Self {
        let id = id.into();
        self.parts.chips.insert(
            id.clone(),
            Chip {
                id,
                pin_ids: Vec::new(),
                size,
                allowed_rotations: None,
            },
        );
        self
    }

    /// Restricts the rotations the packer may use for a chip.
    pub fn allowed_rotations(mut self, chip: impl Into<ChipId>, rotations: Vec<Rotation>) -> Self {
        if let Some(c) = self.parts.chips.get_mut(&chip.into()) {
            c.allowed_rotations = Some(rotations);
        }
        self
    }

    /// Adds a pin to an already-declared chip.
    pub fn chip_pin(
        mut self,
        chip: impl Into<ChipId>,
        pin: impl Into<PinId>,
        offset: Point,
        side: Side,
    ) -> Self {
        let pin = pin.into();
        if let Some(c) = self.parts.chips.get_mut(&chip.into()) {
            c.pin_ids.push(pin.clone());
            self.parts.chip_pins.insert(
                pin.clone(),
                ChipPin {
                    id: pin,
                    offset,
                    side,
                },
            );
        }
        self
    }

    /// Declares a group with no pins.
    pub fn group(mut self, id: impl Into<GroupId>) -> Self {
        let id = id.into();
        self.parts.groups.insert(
            id.clone(),
            Group {
                id,
                pin_ids: Vec::new(),
                shapes: Vec::new(),
            },
        );
        self
    }

    /// Adds a bounding shape to an already-declared group.
    pub fn group_shape(mut self, group: impl Into<GroupId>, shape: Bounds) -> Self {
        if let Some(g) = self.parts.groups.get_mut(&group.into()) {
            g.shapes.push(shape);
        }
        self
    }

    /// Adds a pin to an already-declared group.
    pub fn group_pin(mut self, group: impl Into<GroupId>, pin: impl Into<PinId>, offset: Point) -> Self {
        let pin = pin.into();
        if let Some(g) = self.parts.groups.get_mut(&group.into()) {
            g.pin_ids.push(pin.clone());
            self.parts
                .group_pins
                .insert(pin.clone(), GroupPin { id: pin, offset });
        }
        self
    }

    /// Declares a net.
    pub fn net(mut self, id: impl Into<NetId>) -> Self {
        let id = id.into();
        self.parts.nets.entry(id.clone()).or_insert(Net { id });
        self
    }

    /// Wires two pins together directly.
    pub fn connect_pins(mut self, a: impl Into<PinId>, b: impl Into<PinId>) -> Self {
        self.parts.strong.connect(a.into(), b.into());
        self
    }

    /// Makes a pin a member of a net, declaring the net if needed.
    pub fn connect_net(mut self, pin: impl Into<PinId>, net: impl Into<NetId>) -> Self {
        let net = net.into();
        self = self.net(net.clone());
        self.parts.weak.connect(pin.into(), net);
        self
    }

    /// Sets the minimum gap between chips in a partition.
    pub fn chip_gap(mut self, gap: f64) -> Self {
        self.parts.chip_gap = gap;
        self
    }

    /// Sets the minimum gap between partitions.
    pub fn partition_gap(mut self, gap: f64) -> Self {
        self.parts.partition_gap = gap;
        self
    }

    /// Finishes the problem.
    pub fn build(self) -> Problem {
        Problem::from_parts(self.parts)
    }
}
