//! Phase 2: build pin ranges and match them to the chips they reach.

use crate::pin_range::{problem_chip_ranges, problem_group_ranges, PinRange, RangeOwner};
use schemapack_common::Point;
use schemapack_config::PinRangeConfig;
use schemapack_model::Problem;
use schemapack_solver::{Graphic, Solver, SolverState};

/// Builds the pin ranges of one partition per step, then one more step for
/// the groups of the whole problem.
pub struct PinRangeMatchSolver {
    state: SolverState,
    problem: Problem,
    partitions: Vec<Problem>,
    limits: PinRangeConfig,
    partition_ranges: Vec<Vec<PinRange>>,
    group_ranges: Vec<PinRange>,
}

impl PinRangeMatchSolver {
    /// Creates the solver.
    pub fn new(
        problem: Problem,
        partitions: Vec<Problem>,
        limits: PinRangeConfig,
        max_iterations: u64,
    ) -> Self {
        Self {
            state: SolverState::new("PinRangeMatchSolver", max_iterations),
            problem,
            partitions,
            limits,
            partition_ranges: Vec::new(),
            group_ranges: Vec::new(),
        }
    }

    /// Chip pin ranges, one list per partition processed so far.
    pub fn partition_ranges(&self) -> &[Vec<PinRange>] {
        &self.partition_ranges
    }

    /// Group pin ranges, once solved.
    pub fn group_ranges(&self) -> &[PinRange] {
        &self.group_ranges
    }
}

impl Solver for PinRangeMatchSolver {
    fn state(&self) -> &SolverState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn iterate(&mut self) {
        let next = self.partition_ranges.len();
        if let Some(partition) = self.partitions.get(next) {
            let ranges = problem_chip_ranges(partition, &self.limits);
            tracing::trace!(partition = next, ranges = ranges.len(), "matched pin ranges");
            self.partition_ranges.push(ranges);
            return;
        }

        self.group_ranges = problem_group_ranges(&self.problem, &self.limits);
        self.state.mark_solved();
    }

    fn render(&self) -> Graphic {
        let mut graphic = Graphic::titled("pin ranges");
        let all = self.partition_ranges.iter().flatten().chain(&self.group_ranges);
        for (row, range) in all.enumerate() {
            let owner = match &range.owner {
                RangeOwner::Chip(id) => id.to_string(),
                RangeOwner::Group(id) => id.to_string(),
            };
            graphic.text(
                Point::new(0.0, -(row as f64)),
                format!(
                    "{owner} {} [{}] -> {} chip(s)",
                    range.side,
                    range.pin_ids.len(),
                    range.connected_chips.len()
                ),
            );
        }
        graphic
    }

    fn constructor_params(&self) -> serde_json::Value {
        serde_json::json!({
            "partitions": self.partitions.len(),
            "max_pins": self.limits.max_pins,
            "max_gap": self.limits.max_gap,
        })
    }
}
