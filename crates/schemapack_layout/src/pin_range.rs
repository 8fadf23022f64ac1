//! Groups each chip's pins into short runs along one side.
//!
//! Pins on a side are sorted by the coordinate running along that side and
//! walked in order. A pin joins the current range while the range holds
//! fewer than `max_pins` pins and the pin is at most `max_gap` from the
//! previous one; otherwise it starts a new range. Groups have no sides, so
//! all of a group's pins are treated as one [`Side::XMinus`] edge.

use indexmap::{IndexMap, IndexSet};
use schemapack_common::{ChipId, GroupId, PinId, Point, Side};
use schemapack_config::PinRangeConfig;
use schemapack_model::{Chip, Group, Problem};
use serde::{Deserialize, Serialize};

/// The side label used for group pins.
pub const GROUP_SIDE: Side = Side::XMinus;

/// The chip or group a range belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeOwner {
    /// A chip.
    Chip(ChipId),
    /// A group.
    Group(GroupId),
}

/// A run of neighbouring pins on one side of a chip or group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinRange {
    /// Owning chip or group.
    pub owner: RangeOwner,
    /// The side every pin of the range sits on.
    pub side: Side,
    /// Pins in order along the side. Never empty.
    pub pin_ids: Vec<PinId>,
    /// Chips reachable from these pins through strong wires or shared nets.
    #[serde(default)]
    pub connected_chips: Vec<ChipId>,
}

/// Splits one side's pins into ranges.
fn split_side(mut pins: Vec<(PinId, Point)>, side: Side, limits: &PinRangeConfig) -> Vec<Vec<PinId>> {
    pins.sort_by(|(_, a), (_, b)| side.along(*a).total_cmp(&side.along(*b)));

    let mut ranges = Vec::new();
    let mut current: Vec<PinId> = Vec::new();
    let mut previous: Option<Point> = None;
    for (pin, at) in pins {
        if let Some(prev) = previous {
            if current.len() >= limits.max_pins || prev.distance(at) > limits.max_gap {
                ranges.push(std::mem::take(&mut current));
            }
        }
        current.push(pin);
        previous = Some(at);
    }
    if !current.is_empty() {
        ranges.push(current);
    }
    ranges
}

/// Pin ranges of a chip, side by side in [`Side::ALL`] order.
///
/// Pins without a chip-pin record are skipped.
pub fn chip_pin_ranges(problem: &Problem, chip: &Chip, limits: &PinRangeConfig) -> Vec<PinRange> {
    let mut by_side: IndexMap<Side, Vec<(PinId, Point)>> =
        Side::ALL.iter().map(|&s| (s, Vec::new())).collect();
    for pin in &chip.pin_ids {
        if let Some(record) = problem.chip_pin(pin) {
            by_side
                .entry(record.side)
                .or_default()
                .push((pin.clone(), record.offset));
        }
    }

    by_side
        .into_iter()
        .flat_map(|(side, pins)| {
            split_side(pins, side, limits)
                .into_iter()
                .map(move |pin_ids| PinRange {
                    owner: RangeOwner::Chip(chip.id.clone()),
                    side,
                    pin_ids,
                    connected_chips: Vec::new(),
                })
        })
        .collect()
}

/// Pin ranges of a group, all on [`GROUP_SIDE`].
pub fn group_pin_ranges(problem: &Problem, group: &Group, limits: &PinRangeConfig) -> Vec<PinRange> {
    let pins: Vec<(PinId, Point)> = group
        .pin_ids
        .iter()
        .filter_map(|pin| {
            problem
                .group_pins()
                .get(pin)
                .map(|record| (pin.clone(), record.offset))
        })
        .collect();

    split_side(pins, GROUP_SIDE, limits)
        .into_iter()
        .map(|pin_ids| PinRange {
            owner: RangeOwner::Group(group.id.clone()),
            side: GROUP_SIDE,
            pin_ids,
            connected_chips: Vec::new(),
        })
        .collect()
}

/// Chips other than the range's own chip that its pins reach, first through
/// strong partners and then through shared nets, in discovery order.
pub fn connected_chips(
    problem: &Problem,
    strongly_connected: &IndexMap<PinId, Vec<PinId>>,
    range: &PinRange,
) -> Vec<ChipId> {
    let own = match &range.owner {
        RangeOwner::Chip(id) => Some(id),
        RangeOwner::Group(_) => None,
    };
    let mut found: IndexSet<ChipId> = IndexSet::new();
    let mut add = |pin: &PinId| {
        if let Some(chip) = problem.chip_of_pin(pin) {
            if Some(chip) != own {
                found.insert(chip.clone());
            }
        }
    };

    for pin in &range.pin_ids {
        for partner in strongly_connected.get(pin).into_iter().flatten() {
            add(partner);
        }
    }
    for pin in &range.pin_ids {
        for net in problem.weak().nets_of(pin) {
            for member in problem.weak().members_of(net) {
                add(member);
            }
        }
    }
    found.into_iter().collect()
}

/// Ranges for every chip of `problem`, with connected chips filled in.
pub fn problem_chip_ranges(problem: &Problem, limits: &PinRangeConfig) -> Vec<PinRange> {
    let strongly_connected = problem.strongly_connected_pins();
    let mut ranges = Vec::new();
    for chip in problem.chips().values() {
        for mut range in chip_pin_ranges(problem, chip, limits) {
            range.connected_chips = connected_chips(problem, &strongly_connected, &range);
            ranges.push(range);
        }
    }
    ranges
}

/// Ranges for every group of `problem`, with connected chips filled in.
pub fn problem_group_ranges(problem: &Problem, limits: &PinRangeConfig) -> Vec<PinRange> {
    let strongly_connected = problem.strongly_connected_pins();
    let mut ranges = Vec::new();
    for group in problem.groups().values() {
        for mut range in group_pin_ranges(problem, group, limits) {
            range.connected_chips = connected_chips(problem, &strongly_connected, &range);
            ranges.push(range);
        }
    }
    ranges
}
