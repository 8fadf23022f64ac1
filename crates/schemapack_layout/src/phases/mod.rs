//! The five phases of the layout pipeline.
//!
//! Each phase is its own [`Solver`]. The pipeline holds them behind
//! [`LayoutPhaseSolver`] so one [`PhasedPipeline`](schemapack_solver::PhasedPipeline)
//! can drive all of them.

mod chip_partitions;
mod partition_layout_packing;
mod partition_packing;
mod pin_range_match;
mod pin_range_overlap;

pub use chip_partitions::ChipPartitionsSolver;
pub use partition_layout_packing::PartitionLayoutPackingSolver;
pub use partition_packing::{PartitionPackingSolver, SingleInnerPartitionPackingSolver};
pub use pin_range_match::PinRangeMatchSolver;
pub use pin_range_overlap::PinRangeOverlapSolver;

use schemapack_solver::{Graphic, Solver, SolverState};
use std::fmt;

/// A phase of the layout pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutPhase {
    /// Validate and split into independent partitions.
    ChipPartitions,
    /// Build pin ranges and the chips they reach.
    PinRangeMatch,
    /// Pack the chips of each partition.
    PartitionPacking,
    /// Push apart chips that still overlap.
    PinRangeOverlap,
    /// Pack partitions against each other and place groups.
    PartitionLayoutPacking,
}

impl LayoutPhase {
    /// Every phase, in execution order.
    pub const ALL: [LayoutPhase; 5] = [
        LayoutPhase::ChipPartitions,
        LayoutPhase::PinRangeMatch,
        LayoutPhase::PartitionPacking,
        LayoutPhase::PinRangeOverlap,
        LayoutPhase::PartitionLayoutPacking,
    ];

    /// The name the pipeline records the phase under.
    pub fn name(self) -> &'static str {
        match self {
            LayoutPhase::ChipPartitions => "chip_partitions",
            LayoutPhase::PinRangeMatch => "pin_range_match",
            LayoutPhase::PartitionPacking => "partition_packing",
            LayoutPhase::PinRangeOverlap => "pin_range_overlap",
            LayoutPhase::PartitionLayoutPacking => "partition_layout_packing",
        }
    }

    /// Parses a phase name.
    pub fn from_name(name: &str) -> Option<LayoutPhase> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for LayoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The solver of whichever phase is running.
pub enum LayoutPhaseSolver {
    /// Phase 1.
    ChipPartitions(ChipPartitionsSolver),
    /// Phase 2.
    PinRangeMatch(PinRangeMatchSolver),
    /// Phase 3.
    PartitionPacking(PartitionPackingSolver),
    /// Phase 4.
    PinRangeOverlap(PinRangeOverlapSolver),
    /// Phase 5.
    PartitionLayoutPacking(PartitionLayoutPackingSolver),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            LayoutPhaseSolver::ChipPartitions($s) => $body,
            LayoutPhaseSolver::PinRangeMatch($s) => $body,
            LayoutPhaseSolver::PartitionPacking($s) => $body,
            LayoutPhaseSolver::PinRangeOverlap($s) => $body,
            LayoutPhaseSolver::PartitionLayoutPacking($s) => $body,
        }
    };
}

impl LayoutPhaseSolver {
    /// Which phase this solver runs.
    pub fn phase(&self) -> LayoutPhase {
        match self {
            LayoutPhaseSolver::ChipPartitions(_) => LayoutPhase::ChipPartitions,
            LayoutPhaseSolver::PinRangeMatch(_) => LayoutPhase::PinRangeMatch,
            LayoutPhaseSolver::PartitionPacking(_) => LayoutPhase::PartitionPacking,
            LayoutPhaseSolver::PinRangeOverlap(_) => LayoutPhase::PinRangeOverlap,
            LayoutPhaseSolver::PartitionLayoutPacking(_) => LayoutPhase::PartitionLayoutPacking,
        }
    }
}

impl Solver for LayoutPhaseSolver {
    fn state(&self) -> &SolverState {
        dispatch!(self, s => s.state())
    }

    fn state_mut(&mut self) -> &mut SolverState {
        dispatch!(self, s => s.state_mut())
    }

    fn iterate(&mut self) {
        dispatch!(self, s => s.iterate())
    }

    fn active_sub_solver(&self) -> Option<&dyn Solver> {
        dispatch!(self, s => s.active_sub_solver())
    }

    fn render(&self) -> Graphic {
        dispatch!(self, s => s.render())
    }

    fn render_preview(&self) -> Graphic {
        dispatch!(self, s => s.render_preview())
    }

    fn constructor_params(&self) -> serde_json::Value {
        dispatch!(self, s => s.constructor_params())
    }
}
