//! Phase 5: pack the partitions against each other and place the groups.

use crate::output::{OutputLayout, Placement};
use crate::pack::{PackComponent, PackInput, PackPad, Packer};
use crate::pin_range::{PinRange, RangeOwner};
use indexmap::{IndexMap, IndexSet};
use schemapack_common::{Bounds, ChipId, NetworkId, Point, Rotation};
use schemapack_config::LayoutConfig;
use schemapack_model::{Group, Problem};
use schemapack_solver::{Graphic, Solver, SolverError, SolverState};
use std::rc::Rc;

/// Packs each partition as one rigid block, then places groups.
///
/// Step one packs the partition bounding boxes with the problem's partition
/// gap and moves every chip with its block. Step two centers each group on
/// the chips its pins share a net with (groups with no such chips are
/// stacked below the layout) and produces the [`OutputLayout`].
pub struct PartitionLayoutPackingSolver {
    state: SolverState,
    problem: Problem,
    partitions: Vec<Problem>,
    placements: Vec<IndexMap<ChipId, Placement>>,
    group_ranges: Vec<PinRange>,
    config: LayoutConfig,
    packer: Rc<dyn Packer>,
    chip_placements: Option<IndexMap<ChipId, Placement>>,
    output: Option<OutputLayout>,
}

/// Id of the packer component standing for partition `index`.
fn block_id(index: usize) -> String {
    format!("partition-{index}")
}

impl PartitionLayoutPackingSolver {
    /// Creates the solver. `placements[i]` are the local chip placements of
    /// `partitions[i]`.
    pub fn new(
        problem: Problem,
        partitions: Vec<Problem>,
        placements: Vec<IndexMap<ChipId, Placement>>,
        group_ranges: Vec<PinRange>,
        config: LayoutConfig,
        packer: Rc<dyn Packer>,
    ) -> Self {
        let max_iterations = config.solver.phase_max_iterations;
        Self {
            state: SolverState::new("PartitionLayoutPackingSolver", max_iterations),
            problem,
            partitions,
            placements,
            group_ranges,
            config,
            packer,
            chip_placements: None,
            output: None,
        }
    }

    /// The finished layout, once solved.
    pub fn output(&self) -> Option<&OutputLayout> {
        self.output.as_ref()
    }

    /// The box around a partition's placed chips, in partition coordinates.
    fn block_bounds(&self, index: usize) -> Option<Bounds> {
        let partition = self.partitions.get(index)?;
        self.placements
            .get(index)?
            .iter()
            .filter_map(|(id, p)| {
                let chip = partition.chip(id)?;
                Some(Bounds::from_center(p.center(), chip.size.rotated(p.rotation)))
            })
            .reduce(|a, b| a.union(&b))
    }

    /// Pads of a partition block: every chip pin that joins a net, relative
    /// to the block center.
    fn block_pads(&self, index: usize, bounds: &Bounds) -> Vec<PackPad> {
        let (Some(partition), Some(placements)) =
            (self.partitions.get(index), self.placements.get(index))
        else {
            return Vec::new();
        };
        let center = bounds.center();
        let mut pads = Vec::new();
        for (id, placement) in placements {
            let Some(chip) = partition.chip(id) else {
                continue;
            };
            for pin in &chip.pin_ids {
                let (Some(record), Some(net)) =
                    (partition.chip_pin(pin), self.problem.weak().nets_of(pin).next())
                else {
                    continue;
                };
                let at = placement
                    .center()
                    .offset_by(record.offset.rotated(placement.rotation));
                pads.push(PackPad {
                    id: pin.clone(),
                    offset: Point::new(at.x - center.x, at.y - center.y),
                    network: NetworkId::new(net.as_str()),
                });
            }
        }
        pads
    }

    fn pack_partitions(&self) -> Result<IndexMap<ChipId, Placement>, SolverError> {
        let mut blocks: Vec<(usize, Bounds)> = Vec::new();
        let mut components = Vec::new();
        for index in 0..self.partitions.len() {
            let Some(bounds) = self.block_bounds(index) else {
                continue;
            };
            components.push(PackComponent {
                id: block_id(index),
                size: bounds.size(),
                pads: self.block_pads(index, &bounds),
                allowed_rotations: vec![Rotation::R0],
            });
            blocks.push((index, bounds));
        }

        let input = PackInput {
            components,
            min_gap: self.problem.partition_gap(),
            order: self.config.packing.order,
            placement: self.config.packing.placement,
        };
        let packed = self.packer.pack(&input)?;

        let mut moved: IndexMap<ChipId, Placement> = IndexMap::new();
        for (index, bounds) in blocks {
            let id = block_id(index);
            let block = packed.placements.get(&id).ok_or_else(|| {
                SolverError::Packing(format!("packer returned no placement for `{id}`"))
            })?;
            let from = bounds.center();
            let (dx, dy) = (block.center.x - from.x, block.center.y - from.y);
            for (chip, placement) in &self.placements[index] {
                moved.insert(chip.clone(), placement.translated(dx, dy));
            }
        }

        let mut ordered = IndexMap::new();
        for id in self.problem.chips().keys() {
            let placement = moved.get(id).ok_or_else(|| {
                SolverError::Packing(format!("chip `{id}` was not placed by any partition"))
            })?;
            ordered.insert(id.clone(), *placement);
        }
        Ok(ordered)
    }

    fn place_groups(&self, chip_placements: IndexMap<ChipId, Placement>) -> OutputLayout {
        let mut layout = OutputLayout {
            chip_placements,
            group_placements: IndexMap::new(),
        };
        let gap = self.problem.partition_gap();
        let extent = layout.bounds(&self.problem);
        let left = extent.map_or(0.0, |b| b.min_x);
        let mut cursor = extent.map_or(0.0, |b| b.min_y - gap);

        for group in self.problem.groups().values() {
            let chips: IndexSet<&ChipId> = self
                .group_ranges
                .iter()
                .filter(|r| r.owner == RangeOwner::Group(group.id.clone()))
                .flat_map(|r| r.connected_chips.iter())
                .collect();
            let centers: Vec<Point> = chips
                .iter()
                .filter_map(|id| layout.chip_placements.get(*id))
                .map(|p| p.center())
                .collect();

            let placement = if centers.is_empty() {
                let shape = group_extent(group);
                let center = Point::new(left - shape.min_x, cursor - shape.max_y);
                cursor = center.y + shape.min_y - gap;
                Placement::new(center, Rotation::R0)
            } else {
                let n = centers.len() as f64;
                let sum = centers
                    .iter()
                    .fold(Point::ORIGIN, |acc, c| acc.offset_by(*c));
                Placement::new(Point::new(sum.x / n, sum.y / n), Rotation::R0)
            };
            layout.group_placements.insert(group.id.clone(), placement);
        }
        layout
    }
}

/// Union of a group's shapes; a point at its center when it has none.
fn group_extent(group: &Group) -> Bounds {
    group
        .shapes
        .iter()
        .copied()
        .reduce(|a, b| a.union(&b))
        .unwrap_or(Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        })
}

impl Solver for PartitionLayoutPackingSolver {
    fn state(&self) -> &SolverState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn iterate(&mut self) {
        match self.chip_placements.take() {
            None => match self.pack_partitions() {
                Ok(placements) => self.chip_placements = Some(placements),
                Err(err) => self.state.fail(err),
            },
            Some(placements) => {
                let layout = self.place_groups(placements.clone());
                tracing::info!(
                    chips = layout.chip_placements.len(),
                    groups = layout.group_placements.len(),
                    "layout complete"
                );
                self.chip_placements = Some(placements);
                self.output = Some(layout);
                self.state.mark_solved();
            }
        }
    }

    fn render(&self) -> Graphic {
        let mut graphic = Graphic::titled("partition layout packing");
        if let Some(output) = &self.output {
            for id in output.chip_placements.keys() {
                if let Some(bounds) = output.chip_bounds(&self.problem, id) {
                    graphic.rect(bounds, id.as_str());
                }
            }
            for (id, placement) in &output.group_placements {
                graphic.point(placement.center(), id.as_str());
            }
        } else {
            for index in 0..self.partitions.len() {
                if let Some(bounds) = self.block_bounds(index) {
                    graphic.rect(bounds, block_id(index));
                }
            }
        }
        graphic
    }

    fn constructor_params(&self) -> serde_json::Value {
        serde_json::json!({
            "problem": self.problem,
            "placements": self.placements,
            "group_ranges": self.group_ranges,
            "packing": self.config.packing,
        })
    }
}
