//! Phase 3: pack the chips of every partition.
//!
//! [`PartitionPackingSolver`] runs one [`SingleInnerPartitionPackingSolver`]
//! per partition as its active sub-solver. The inner solver filters the
//! partition's networks, turns its chips into packer components and calls
//! the packer, one stage per step.

use crate::network::{filter_networks, NetworkAssignment};
use crate::output::Placement;
use crate::pack::{PackComponent, PackInput, PackPad, Packer};
use crate::pin_range::{PinRange, RangeOwner};
use indexmap::IndexMap;
use schemapack_common::{Bounds, ChipId, Point};
use schemapack_config::LayoutConfig;
use schemapack_model::Problem;
use schemapack_solver::{
    step_sub_solver, Graphic, Solver, SolverError, SolverState, SubSolverStatus,
};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    FilterNetworks,
    BuildComponents,
    Pack,
}

/// Packs the chips of a single partition.
pub struct SingleInnerPartitionPackingSolver {
    state: SolverState,
    index: usize,
    partition: Problem,
    ranges: Vec<PinRange>,
    config: LayoutConfig,
    packer: Rc<dyn Packer>,
    stage: Stage,
    networks: NetworkAssignment,
    input: Option<PackInput>,
    placements: IndexMap<ChipId, Placement>,
}

impl SingleInnerPartitionPackingSolver {
    /// Creates the solver for partition number `index`.
    pub fn new(
        index: usize,
        partition: Problem,
        ranges: Vec<PinRange>,
        config: LayoutConfig,
        packer: Rc<dyn Packer>,
    ) -> Self {
        let max_iterations = config.solver.phase_max_iterations;
        Self {
            state: SolverState::new(
                format!("SingleInnerPartitionPackingSolver[{index}]"),
                max_iterations,
            ),
            index,
            partition,
            ranges,
            config,
            packer,
            stage: Stage::FilterNetworks,
            networks: NetworkAssignment::default(),
            input: None,
            placements: IndexMap::new(),
        }
    }

    /// The network id each pin was given.
    pub fn networks(&self) -> &NetworkAssignment {
        &self.networks
    }

    /// The input handed to the packer, once built.
    pub fn pack_input(&self) -> Option<&PackInput> {
        self.input.as_ref()
    }

    /// Chip placements relative to the partition's own origin.
    pub fn placements(&self) -> &IndexMap<ChipId, Placement> {
        &self.placements
    }

    /// Chips in packing order: most pin-range connections first, ties in
    /// declaration order.
    fn chip_order(&self) -> Vec<&ChipId> {
        let mut score: HashMap<&ChipId, usize> = HashMap::new();
        for range in &self.ranges {
            if let RangeOwner::Chip(id) = &range.owner {
                *score.entry(id).or_default() += range.connected_chips.len();
            }
        }
        let mut chips: Vec<&ChipId> = self.partition.chips().keys().collect();
        chips.sort_by_key(|id| Reverse(score.get(id).copied().unwrap_or(0)));
        chips
    }

    fn build_input(&self) -> PackInput {
        let components = self
            .chip_order()
            .into_iter()
            .filter_map(|id| self.partition.chip(id))
            .map(|chip| PackComponent {
                id: chip.id.to_string(),
                size: chip.size,
                pads: chip
                    .pin_ids
                    .iter()
                    .filter_map(|pin| {
                        let record = self.partition.chip_pin(pin)?;
                        let network = self.networks.network_of(pin)?;
                        Some(PackPad {
                            id: pin.clone(),
                            offset: record.offset,
                            network: network.clone(),
                        })
                    })
                    .collect(),
                allowed_rotations: chip.rotations(),
            })
            .collect();
        PackInput {
            components,
            min_gap: self.partition.chip_gap(),
            order: self.config.packing.order,
            placement: self.config.packing.placement,
        }
    }

    fn run_packer(&mut self) -> Result<(), SolverError> {
        let Some(input) = self.input.as_ref() else {
            return Err(SolverError::Packing("no packer input was built".into()));
        };
        let output = self.packer.pack(input)?;
        for id in self.partition.chips().keys() {
            let packed = output.placements.get(id.as_str()).ok_or_else(|| {
                SolverError::Packing(format!("packer returned no placement for chip `{id}`"))
            })?;
            self.placements
                .insert(id.clone(), Placement::new(packed.center, packed.rotation));
        }
        tracing::debug!(
            partition = self.index,
            chips = self.placements.len(),
            "partition packed"
        );
        Ok(())
    }

    fn chip_boxes(&self) -> impl Iterator<Item = (&ChipId, Bounds)> + '_ {
        self.placements.iter().filter_map(|(id, p)| {
            let chip = self.partition.chip(id)?;
            Some((id, Bounds::from_center(p.center(), chip.size.rotated(p.rotation))))
        })
    }
}

impl Solver for SingleInnerPartitionPackingSolver {
    fn state(&self) -> &SolverState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn iterate(&mut self) {
        match self.stage {
            Stage::FilterNetworks => {
                let strongly_connected = self.partition.strongly_connected_pins();
                self.networks = filter_networks(
                    &self.partition,
                    &strongly_connected,
                    self.config.network.mode,
                );
                self.stage = Stage::BuildComponents;
            }
            Stage::BuildComponents => {
                self.input = Some(self.build_input());
                self.stage = Stage::Pack;
            }
            Stage::Pack => match self.run_packer() {
                Ok(()) => self.state.mark_solved(),
                Err(err) => self.state.fail(err),
            },
        }
    }

    fn render(&self) -> Graphic {
        let mut graphic = self.render_preview();
        for (id, placement) in &self.placements {
            let Some(chip) = self.partition.chip(id) else {
                continue;
            };
            for pin in &chip.pin_ids {
                let (Some(record), Some(network)) =
                    (self.partition.chip_pin(pin), self.networks.network_of(pin))
                else {
                    continue;
                };
                let at = placement
                    .center()
                    .offset_by(record.offset.rotated(placement.rotation));
                graphic.point(at, network.as_str());
            }
        }
        graphic
    }

    fn render_preview(&self) -> Graphic {
        let mut graphic = Graphic::titled(format!("partition {} packing", self.index));
        for (id, bounds) in self.chip_boxes() {
            graphic.rect(bounds, id.as_str());
        }
        graphic
    }

    fn constructor_params(&self) -> serde_json::Value {
        serde_json::json!({
            "index": self.index,
            "partition": self.partition,
            "ranges": self.ranges,
            "packing": self.config.packing,
            "network": self.config.network,
        })
    }
}

/// Packs every partition in turn through an inner sub-solver.
pub struct PartitionPackingSolver {
    state: SolverState,
    partitions: Vec<Problem>,
    ranges: Vec<Vec<PinRange>>,
    config: LayoutConfig,
    packer: Rc<dyn Packer>,
    active: Option<SingleInnerPartitionPackingSolver>,
    placements: Vec<IndexMap<ChipId, Placement>>,
}

impl PartitionPackingSolver {
    /// Creates the solver. `ranges[i]` are the pin ranges of `partitions[i]`.
    pub fn new(
        partitions: Vec<Problem>,
        ranges: Vec<Vec<PinRange>>,
        config: LayoutConfig,
        packer: Rc<dyn Packer>,
    ) -> Self {
        let max_iterations = config.solver.phase_max_iterations;
        Self {
            state: SolverState::new("PartitionPackingSolver", max_iterations),
            partitions,
            ranges,
            config,
            packer,
            active: None,
            placements: Vec::new(),
        }
    }

    /// Per-partition chip placements, in partition order.
    pub fn placements(&self) -> &[IndexMap<ChipId, Placement>] {
        &self.placements
    }
}

impl Solver for PartitionPackingSolver {
    fn state(&self) -> &SolverState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn iterate(&mut self) {
        if let Some(inner) = self.active.as_mut() {
            if step_sub_solver(&mut self.state, inner) == SubSolverStatus::Solved {
                self.placements.push(inner.placements().clone());
                self.active = None;
            }
            return;
        }

        let next = self.placements.len();
        match self.partitions.get(next) {
            Some(partition) => {
                self.active = Some(SingleInnerPartitionPackingSolver::new(
                    next,
                    partition.clone(),
                    self.ranges.get(next).cloned().unwrap_or_default(),
                    self.config.clone(),
                    Rc::clone(&self.packer),
                ));
            }
            None => self.state.mark_solved(),
        }
    }

    fn active_sub_solver(&self) -> Option<&dyn Solver> {
        self.active.as_ref().map(|s| s as &dyn Solver)
    }

    fn render(&self) -> Graphic {
        let mut graphic = Graphic::titled("partition packing");
        for (i, placements) in self.placements.iter().enumerate() {
            graphic.text(
                Point::new(0.0, -(i as f64)),
                format!("partition {i}: {} chip(s) packed", placements.len()),
            );
        }
        graphic
    }

    fn constructor_params(&self) -> serde_json::Value {
        serde_json::json!({
            "partitions": self.partitions.len(),
            "packing": self.config.packing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{OutlinePacker, PackError, PackOutput};
    use crate::partition::partition_problem;
    use crate::pin_range::problem_chip_ranges;
    use schemapack_common::{NetworkId, PinId, Side, Size};
    use schemapack_model::ProblemBuilder;

    struct BrokenPacker;

    impl Packer for BrokenPacker {
        fn pack(&self, _: &PackInput) -> Result<PackOutput, PackError> {
            Err(PackError::InvalidGap(-1.0))
        }
    }

    fn problem() -> Problem {
        ProblemBuilder::new()
            .chip("U1", Size::new(2.0, 2.0))
            .chip_pin("U1", "U1.1", Point::new(1.0, 0.0), Side::XPlus)
            .chip("R1", Size::new(1.0, 0.4))
            .chip_pin("R1", "R1.1", Point::new(-0.5, 0.0), Side::XMinus)
            .chip_pin("R1", "R1.2", Point::new(0.5, 0.0), Side::XPlus)
            .chip("C1", Size::new(0.4, 1.0))
            .connect_pins("U1.1", "R1.1")
            .build()
    }

    fn solver(packer: Rc<dyn Packer>) -> PartitionPackingSolver {
        let config = LayoutConfig::default();
        let partitions = partition_problem(&problem());
        let ranges = partitions
            .iter()
            .map(|p| problem_chip_ranges(p, &config.pin_ranges))
            .collect();
        PartitionPackingSolver::new(partitions, ranges, config, packer)
    }

    #[test]
    fn inner_solver_runs_three_stages() {
        let partitions = partition_problem(&problem());
        let mut inner = SingleInnerPartitionPackingSolver::new(
            0,
            partitions[0].clone(),
            problem_chip_ranges(&partitions[0], &Default::default()),
            LayoutConfig::default(),
            Rc::new(OutlinePacker),
        );
        inner.step();
        assert_eq!(
            inner.networks().network_of(&PinId::from("R1.1")),
            Some(&NetworkId::from("U1.1-R1.1"))
        );
        inner.step();
        let input = inner.pack_input().unwrap();
        assert_eq!(input.components.len(), 2);
        assert_eq!(input.components[0].pads.len(), 1);
        assert_eq!(input.min_gap, 0.2);
        inner.step();
        assert!(inner.state().solved());
        assert_eq!(inner.placements().len(), 2);
        assert_eq!(inner.state().iterations, 3);
        assert_eq!(inner.visualize().points.len(), 2);
        assert_eq!(inner.preview().points.len(), 0);
    }

    #[test]
    fn packs_every_partition() {
        let mut s = solver(Rc::new(OutlinePacker));
        assert!(s.solve().is_ok());
        assert_eq!(s.placements().len(), 2);
        assert_eq!(s.placements()[0].len(), 2);
        assert_eq!(s.placements()[1].len(), 1);
        // per partition: start + three stages; then the finishing step.
        assert_eq!(s.state().iterations, 9);
        assert!(s.active_sub_solver().is_none());
    }

    #[test]
    fn delegates_visualization_to_active_inner() {
        let mut s = solver(Rc::new(OutlinePacker));
        s.step();
        assert_eq!(
            s.visualize().title.as_deref(),
            Some("partition 0 packing")
        );
    }

    #[test]
    fn packer_failure_propagates_verbatim() {
        let mut s = solver(Rc::new(BrokenPacker));
        let err = s.solve().unwrap_err();
        assert_eq!(err, SolverError::Packing("invalid minimum gap -1".into()));
        assert!(s.placements().is_empty());
        assert!(s.active_sub_solver().is_some_and(|a| a.state().failed()));
    }
}
