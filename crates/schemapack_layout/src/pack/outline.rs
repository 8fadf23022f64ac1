//! A deterministic greedy packer.
//!
//! Components are placed one at a time. The first goes at the origin; each
//! later one is tried flush against every side of every placed box (centered
//! and aligned to both ends of that side) in every allowed rotation. Among
//! the positions that keep `min_gap` clearance from everything placed, the
//! cheapest under the placement strategy wins.

use super::{validate_input, PackComponent, PackError, PackInput, PackOutput, PackedComponent, Packer};
use schemapack_common::geom::EPSILON;
use schemapack_common::{Bounds, NetworkId, Point, Rotation, Size};
use schemapack_config::{OrderStrategy, PlacementStrategy};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// Greedy outline-following packer.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlinePacker;

impl OutlinePacker {
    /// Creates the packer.
    pub fn new() -> Self {
        Self
    }
}

/// A pad already fixed in space.
struct PlacedPad<'a> {
    network: &'a NetworkId,
    at: Point,
}

#[derive(Clone, Copy)]
struct Candidate {
    center: Point,
    rotation: Rotation,
    cost: f64,
    origin_distance: f64,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        if self.cost < other.cost - EPSILON {
            return true;
        }
        (self.cost - other.cost).abs() <= EPSILON
            && self.origin_distance < other.origin_distance - EPSILON
    }
}

impl Packer for OutlinePacker {
    fn pack(&self, input: &PackInput) -> Result<PackOutput, PackError> {
        validate_input(input)?;

        let mut placed: Vec<Bounds> = Vec::with_capacity(input.components.len());
        let mut pads: Vec<PlacedPad<'_>> = Vec::new();
        let mut output = PackOutput::default();

        for index in placement_order(input) {
            let component = &input.components[index];
            let best = best_position(component, &placed, &pads, input);
            placed.push(Bounds::from_center(
                best.center,
                component.size.rotated(best.rotation),
            ));
            for pad in &component.pads {
                pads.push(PlacedPad {
                    network: &pad.network,
                    at: best.center.offset_by(pad.offset.rotated(best.rotation)),
                });
            }
            output.placements.insert(
                component.id.clone(),
                PackedComponent {
                    center: best.center,
                    rotation: best.rotation,
                },
            );
        }

        tracing::debug!(components = input.components.len(), "packed components");
        Ok(output)
    }
}

/// Indices of `input.components` in the order they are placed.
fn placement_order(input: &PackInput) -> Vec<usize> {
    let components = &input.components;
    let mut order: Vec<usize> = (0..components.len()).collect();
    match input.order {
        OrderStrategy::InputOrder => {}
        OrderStrategy::LargestFirst => {
            order.sort_by(|&a, &b| {
                components[b]
                    .size
                    .area()
                    .total_cmp(&components[a].size.area())
            });
        }
        OrderStrategy::MostConnectedFirst => {
            let mut owners: HashMap<&NetworkId, HashSet<usize>> = HashMap::new();
            for (i, c) in components.iter().enumerate() {
                for pad in &c.pads {
                    owners.entry(&pad.network).or_default().insert(i);
                }
            }
            let shared = |i: usize| {
                components[i]
                    .pads
                    .iter()
                    .filter(|p| owners.get(&p.network).is_some_and(|o| o.len() > 1))
                    .count()
            };
            order.sort_by_key(|&i| Reverse(shared(i)));
        }
    }
    order
}

/// Centers flush against each side of `anchor` for a box of `size`.
fn flush_centers(anchor: &Bounds, size: Size, gap: f64) -> [Point; 12] {
    let hw = size.width / 2.0;
    let hh = size.height / 2.0;
    let mid = anchor.center();
    let right = anchor.max_x + gap + hw;
    let left = anchor.min_x - gap - hw;
    let top = anchor.max_y + gap + hh;
    let bottom = anchor.min_y - gap - hh;
    let ys = [mid.y, anchor.min_y + hh, anchor.max_y - hh];
    let xs = [mid.x, anchor.min_x + hw, anchor.max_x - hw];
    [
        Point::new(right, ys[0]),
        Point::new(right, ys[1]),
        Point::new(right, ys[2]),
        Point::new(left, ys[0]),
        Point::new(left, ys[1]),
        Point::new(left, ys[2]),
        Point::new(xs[0], top),
        Point::new(xs[1], top),
        Point::new(xs[2], top),
        Point::new(xs[0], bottom),
        Point::new(xs[1], bottom),
        Point::new(xs[2], bottom),
    ]
}

fn cost(
    component: &PackComponent,
    center: Point,
    rotation: Rotation,
    pads: &[PlacedPad<'_>],
    strategy: PlacementStrategy,
) -> f64 {
    match strategy {
        PlacementStrategy::ClosestToOrigin => center.distance(Point::ORIGIN),
        PlacementStrategy::MinimumSumDistanceToNetwork => component
            .pads
            .iter()
            .filter_map(|pad| {
                let at = center.offset_by(pad.offset.rotated(rotation));
                pads.iter()
                    .filter(|p| p.network == &pad.network)
                    .map(|p| at.distance(p.at))
                    .min_by(f64::total_cmp)
            })
            .sum(),
    }
}

fn best_position(
    component: &PackComponent,
    placed: &[Bounds],
    pads: &[PlacedPad<'_>],
    input: &PackInput,
) -> PackedComponent {
    let rotations: &[Rotation] = if component.allowed_rotations.is_empty() {
        &[Rotation::R0]
    } else {
        &component.allowed_rotations
    };
    let gap = input.min_gap;
    let extent = placed.iter().copied().reduce(|a, b| a.union(&b));

    let mut best: Option<Candidate> = None;
    for &rotation in rotations {
        let size = component.size.rotated(rotation);
        let mut centers: Vec<Point> = Vec::new();
        match extent {
            None => centers.push(Point::ORIGIN),
            Some(all) => {
                for anchor in placed {
                    centers.extend(flush_centers(anchor, size, gap));
                }
                // Right of everything; always clear.
                centers.push(Point::new(all.max_x + gap + size.width / 2.0, all.center().y));
            }
        }

        for center in centers {
            let bounds = Bounds::from_center(center, size);
            if placed.iter().any(|p| bounds.overlaps(p, gap)) {
                continue;
            }
            let candidate = Candidate {
                center,
                rotation,
                cost: cost(component, center, rotation, pads, input.placement),
                origin_distance: center.distance(Point::ORIGIN),
            };
            if best.as_ref().map_or(true, |b| candidate.beats(b)) {
                best = Some(candidate);
            }
        }
    }

    let chosen = best.unwrap_or(Candidate {
        center: Point::ORIGIN,
        rotation: rotations[0],
        cost: 0.0,
        origin_distance: 0.0,
    });
    PackedComponent {
        center: chosen.center,
        rotation: chosen.rotation,
    }
}
