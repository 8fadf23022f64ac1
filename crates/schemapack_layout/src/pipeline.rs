//! The layout pipeline: five phases driven by one [`PhasedPipeline`].
//!
//! [`LayoutContext`] is the state the phases share. Each phase is built from
//! it when the phase starts and writes its results back into it when the
//! phase solves, so a later phase only ever sees finished results of the
//! phases before it.

use crate::output::{OutputLayout, Placement};
use crate::pack::{OutlinePacker, Packer};
use crate::phases::{
    ChipPartitionsSolver, LayoutPhase, LayoutPhaseSolver, PartitionLayoutPackingSolver,
    PartitionPackingSolver, PinRangeMatchSolver, PinRangeOverlapSolver,
};
use crate::pin_range::PinRange;
use indexmap::IndexMap;
use schemapack_common::ChipId;
use schemapack_config::{LayoutConfig, DEFAULT_MAX_ITERATIONS};
use schemapack_diagnostics::Diagnostic;
use schemapack_model::Problem;
use schemapack_solver::{
    Clock, Graphic, PhaseDef, PhaseTiming, PhasedPipeline, Solver, SolverError, SolverState,
};
use std::rc::Rc;

/// Why [`layout_problem`] produced no layout.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// A phase failed.
    #[error("layout failed in phase `{phase}`: {source}")]
    PhaseFailed {
        /// Name of the failing phase.
        phase: String,
        /// The phase's own error.
        source: SolverError,
    },

    /// The pipeline itself failed, e.g. by running out of steps.
    #[error("layout failed: {0}")]
    Pipeline(SolverError),

    /// Every phase solved but no layout was recorded.
    #[error("layout pipeline finished without an output")]
    MissingOutput,
}

impl LayoutError {
    /// The failing phase, if a phase failed.
    pub fn phase(&self) -> Option<LayoutPhase> {
        match self {
            LayoutError::PhaseFailed { phase, .. } => LayoutPhase::from_name(phase),
            _ => None,
        }
    }
}

impl From<SolverError> for LayoutError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::Delegated { phase, source } => LayoutError::PhaseFailed {
                phase,
                source: *source,
            },
            other => LayoutError::Pipeline(other),
        }
    }
}

/// State shared by the phases of one layout run.
pub struct LayoutContext {
    /// The problem, with spacing overrides applied.
    pub problem: Problem,
    /// Run configuration.
    pub config: LayoutConfig,
    /// Packer used by the packing phases.
    pub packer: Rc<dyn Packer>,
    /// Partitions, from phase 1.
    pub partitions: Vec<Problem>,
    /// Chip pin ranges per partition, from phase 2.
    pub pin_ranges: Vec<Vec<PinRange>>,
    /// Group pin ranges, from phase 2.
    pub group_ranges: Vec<PinRange>,
    /// Per-partition chip placements, from phase 3 and then phase 4.
    pub placements: Vec<IndexMap<ChipId, Placement>>,
    /// The finished layout, from phase 5.
    pub output: Option<OutputLayout>,
}

fn layout_phases() -> Vec<PhaseDef<LayoutContext, LayoutPhaseSolver>> {
    vec![
        PhaseDef::new(LayoutPhase::ChipPartitions.name(), |ctx: &LayoutContext| {
            LayoutPhaseSolver::ChipPartitions(ChipPartitionsSolver::new(
                ctx.problem.clone(),
                ctx.config.solver.phase_max_iterations,
            ))
        })
        .on_solved(|ctx: &mut LayoutContext, solver: &LayoutPhaseSolver| {
            if let LayoutPhaseSolver::ChipPartitions(s) = solver {
                ctx.partitions = s.partitions().to_vec();
            }
        }),
        PhaseDef::new(LayoutPhase::PinRangeMatch.name(), |ctx: &LayoutContext| {
            LayoutPhaseSolver::PinRangeMatch(PinRangeMatchSolver::new(
                ctx.problem.clone(),
                ctx.partitions.clone(),
                ctx.config.pin_ranges.clone(),
                ctx.config.solver.phase_max_iterations,
            ))
        })
        .on_solved(|ctx: &mut LayoutContext, solver: &LayoutPhaseSolver| {
            if let LayoutPhaseSolver::PinRangeMatch(s) = solver {
                ctx.pin_ranges = s.partition_ranges().to_vec();
                ctx.group_ranges = s.group_ranges().to_vec();
            }
        }),
        PhaseDef::new(LayoutPhase::PartitionPacking.name(), |ctx: &LayoutContext| {
            LayoutPhaseSolver::PartitionPacking(PartitionPackingSolver::new(
                ctx.partitions.clone(),
                ctx.pin_ranges.clone(),
                ctx.config.clone(),
                Rc::clone(&ctx.packer),
            ))
        })
        .on_solved(|ctx: &mut LayoutContext, solver: &LayoutPhaseSolver| {
            if let LayoutPhaseSolver::PartitionPacking(s) = solver {
                ctx.placements = s.placements().to_vec();
            }
        }),
        PhaseDef::new(LayoutPhase::PinRangeOverlap.name(), |ctx: &LayoutContext| {
            LayoutPhaseSolver::PinRangeOverlap(PinRangeOverlapSolver::new(
                ctx.partitions.clone(),
                ctx.placements.clone(),
                ctx.config.solver.phase_max_iterations,
            ))
        })
        .on_solved(|ctx: &mut LayoutContext, solver: &LayoutPhaseSolver| {
            if let LayoutPhaseSolver::PinRangeOverlap(s) = solver {
                ctx.placements = s.placements().to_vec();
            }
        }),
        PhaseDef::new(
            LayoutPhase::PartitionLayoutPacking.name(),
            |ctx: &LayoutContext| {
                LayoutPhaseSolver::PartitionLayoutPacking(PartitionLayoutPackingSolver::new(
                    ctx.problem.clone(),
                    ctx.partitions.clone(),
                    ctx.placements.clone(),
                    ctx.group_ranges.clone(),
                    ctx.config.clone(),
                    Rc::clone(&ctx.packer),
                ))
            },
        )
        .on_solved(|ctx: &mut LayoutContext, solver: &LayoutPhaseSolver| {
            if let LayoutPhaseSolver::PartitionLayoutPacking(s) = solver {
                ctx.output = s.output().cloned();
            }
        }),
    ]
}

/// Pipeline steps one partition costs: one in pin-range matching, one to
/// start its packing sub-solver and one per packing stage.
pub const STEPS_PER_PARTITION: u64 = 5;

/// Pipeline steps one chip may cost in overlap resolution, which moves each
/// chip at most once.
pub const STEPS_PER_CHIP: u64 = 1;

/// Step budget of a pipeline without a fixed `solver.max_iterations`.
///
/// [`DEFAULT_MAX_ITERATIONS`] covers the fixed cost of the phases; the rest
/// grows with the work the problem actually needs, so only a run that stops
/// making progress can exhaust it.
pub fn scaled_budget(partitions: usize, chips: usize) -> u64 {
    let partitions = u64::try_from(partitions).unwrap_or(u64::MAX);
    let chips = u64::try_from(chips).unwrap_or(u64::MAX);
    DEFAULT_MAX_ITERATIONS
        .saturating_add(STEPS_PER_PARTITION.saturating_mul(partitions))
        .saturating_add(STEPS_PER_CHIP.saturating_mul(chips))
}

/// Lays out one problem, step by step.
///
/// Stepping the pipeline by hand (or with
/// [`solve_until_phase`](Self::solve_until_phase)) leaves every
/// intermediate result inspectable; [`layout_problem`] is the one-call form.
///
/// With `solver.max_iterations` set, the budget is exactly that value.
/// Otherwise it starts at [`DEFAULT_MAX_ITERATIONS`] and is replaced by
/// [`scaled_budget`] as soon as the problem has been partitioned.
pub struct LayoutPipeline {
    inner: PhasedPipeline<LayoutContext, LayoutPhaseSolver>,
    budget_pending: bool,
}

impl LayoutPipeline {
    /// Creates a pipeline using the [`OutlinePacker`] and the system clock.
    ///
    /// The spacing overrides of `config` replace the problem's gaps.
    pub fn new(problem: &Problem, config: &LayoutConfig) -> Self {
        let problem = problem.with_spacing(config.spacing.chip_gap, config.spacing.partition_gap);
        let params = serde_json::json!({
            "problem": problem,
            "config": config,
        });
        let context = LayoutContext {
            problem,
            config: config.clone(),
            packer: Rc::new(OutlinePacker),
            partitions: Vec::new(),
            pin_ranges: Vec::new(),
            group_ranges: Vec::new(),
            placements: Vec::new(),
            output: None,
        };
        let inner = PhasedPipeline::new(
            "LayoutPipeline",
            context,
            layout_phases(),
            config.solver.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
        )
        .with_constructor_params(params);
        Self {
            inner,
            budget_pending: config.solver.max_iterations.is_none(),
        }
    }

    /// Replaces the packer. Only takes effect for phases not yet started.
    pub fn with_packer(mut self, packer: impl Packer + 'static) -> Self {
        self.inner.context_mut().packer = Rc::new(packer);
        self
    }

    /// Replaces the clock used for phase timings.
    pub fn with_clock(self, clock: impl Clock + 'static) -> Self {
        Self {
            inner: self.inner.with_clock(clock),
            ..self
        }
    }

    /// The problem being laid out, with spacing overrides applied.
    pub fn problem(&self) -> &Problem {
        &self.inner.context().problem
    }

    /// The phase that is running or about to start; `None` once all ran.
    pub fn current_phase(&self) -> Option<LayoutPhase> {
        self.inner
            .current_phase_name()
            .and_then(LayoutPhase::from_name)
    }

    /// The solver a phase ran with, if it has started.
    pub fn phase_solver(&self, phase: LayoutPhase) -> Option<&LayoutPhaseSolver> {
        self.inner.phase_solver(phase.name())
    }

    /// Steps until `phase` is the current phase.
    ///
    /// Returns early with the pipeline's error if it fails first. Succeeds
    /// without stepping if the pipeline already solved.
    pub fn solve_until_phase(&mut self, phase: LayoutPhase) -> Result<(), SolverError> {
        while !self.state().is_terminal() && self.current_phase() != Some(phase) {
            let state = self.state();
            if state.iterations >= state.max_iterations {
                let error = SolverError::IterationBudgetExceeded {
                    solver: state.name.clone(),
                    max_iterations: state.max_iterations,
                };
                self.state_mut().fail(error);
                break;
            }
            self.step();
        }
        self.state().result()
    }

    /// Partitions, once phase 1 solved.
    pub fn partitions(&self) -> &[Problem] {
        &self.inner.context().partitions
    }

    /// Chip pin ranges per partition, once phase 2 solved.
    pub fn pin_ranges(&self) -> &[Vec<PinRange>] {
        &self.inner.context().pin_ranges
    }

    /// Group pin ranges, once phase 2 solved.
    pub fn group_ranges(&self) -> &[PinRange] {
        &self.inner.context().group_ranges
    }

    /// Per-partition placements from the latest solved packing phase.
    pub fn placements(&self) -> &[IndexMap<ChipId, Placement>] {
        &self.inner.context().placements
    }

    /// The finished layout.
    pub fn output(&self) -> Option<&OutputLayout> {
        self.inner.context().output.as_ref()
    }

    /// Validation findings and overlap moves reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        if let Some(LayoutPhaseSolver::ChipPartitions(s)) =
            self.phase_solver(LayoutPhase::ChipPartitions)
        {
            out.extend(s.diagnostics().iter().cloned());
        }
        if let Some(LayoutPhaseSolver::PinRangeOverlap(s)) =
            self.phase_solver(LayoutPhase::PinRangeOverlap)
        {
            out.extend(s.moves().iter().cloned());
        }
        out
    }

    /// Start, end and elapsed time of every phase started so far.
    pub fn phase_timings(&self) -> &IndexMap<&'static str, PhaseTiming> {
        self.inner.phase_timings()
    }
}

impl Solver for LayoutPipeline {
    fn state(&self) -> &SolverState {
        self.inner.state()
    }

    fn state_mut(&mut self) -> &mut SolverState {
        self.inner.state_mut()
    }

    fn iterate(&mut self) {
        self.inner.iterate();
        if self.budget_pending && self.inner.current_phase() > 0 {
            self.budget_pending = false;
            let budget = scaled_budget(self.partitions().len(), self.problem().chip_count());
            tracing::debug!(budget, "pipeline step budget sized to problem");
            self.inner.state_mut().max_iterations = budget;
        }
    }

    fn active_sub_solver(&self) -> Option<&dyn Solver> {
        self.inner.active_sub_solver()
    }

    fn render(&self) -> Graphic {
        match self.output() {
            Some(output) => {
                let mut graphic = Graphic::titled("layout");
                let problem = self.problem();
                for id in output.chip_placements.keys() {
                    if let Some(bounds) = output.chip_bounds(problem, id) {
                        graphic.rect(bounds, id.as_str());
                    }
                }
                for (id, placement) in &output.group_placements {
                    graphic.point(placement.center(), id.as_str());
                }
                graphic
            }
            None => self.inner.render(),
        }
    }

    fn constructor_params(&self) -> serde_json::Value {
        self.inner.constructor_params()
    }
}

/// Lays out `problem` with `config` in one call.
pub fn layout_problem(problem: &Problem, config: &LayoutConfig) -> Result<OutputLayout, LayoutError> {
    let mut pipeline = LayoutPipeline::new(problem, config);
    pipeline.solve()?;
    let output = pipeline.output().cloned().ok_or(LayoutError::MissingOutput)?;
    tracing::info!(
        chips = output.chip_placements.len(),
        groups = output.group_placements.len(),
        steps = pipeline.state().iterations,
        "layout finished"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{PackError, PackInput, PackOutput};
    use schemapack_common::{Point, Side, Size};
    use schemapack_model::ProblemBuilder;
    use schemapack_solver::ManualClock;
    use std::time::Duration;

    fn problem() -> Problem {
        ProblemBuilder::new()
            .chip("U1", Size::new(2.0, 1.0))
            .chip_pin("U1", "U1.1", Point::new(1.0, 0.0), Side::XPlus)
            .chip("R1", Size::new(1.0, 0.5))
            .chip_pin("R1", "R1.1", Point::new(-0.5, 0.0), Side::XMinus)
            .chip("C1", Size::new(0.5, 0.5))
            .chip_pin("C1", "C1.1", Point::new(0.0, 0.25), Side::YPlus)
            .connect_pins("U1.1", "R1.1")
            .connect_net("C1.1", "GND")
            .build()
    }

    struct BrokenPacker;

    impl Packer for BrokenPacker {
        fn pack(&self, _: &PackInput) -> Result<PackOutput, PackError> {
            Err(PackError::InvalidGap(-1.0))
        }
    }

    #[test]
    fn solves_and_places_every_chip() {
        let p = problem();
        let mut pipeline = LayoutPipeline::new(&p, &LayoutConfig::default());
        assert!(pipeline.solve().is_ok());
        assert_eq!(pipeline.current_phase(), None);
        assert_eq!(pipeline.partitions().len(), 2);
        let output = pipeline.output().unwrap();
        assert!(output.places_exactly(&p));
        assert!(output.overlapping_chips(&p).is_empty());
    }

    #[test]
    fn stops_at_requested_phase() {
        let mut pipeline = LayoutPipeline::new(&problem(), &LayoutConfig::default());
        pipeline
            .solve_until_phase(LayoutPhase::PartitionPacking)
            .unwrap();
        assert_eq!(pipeline.current_phase(), Some(LayoutPhase::PartitionPacking));
        assert_eq!(pipeline.partitions().len(), 2);
        assert_eq!(pipeline.pin_ranges().len(), 2);
        assert!(pipeline.placements().is_empty());
        assert!(pipeline.output().is_none());
        assert!(pipeline.phase_solver(LayoutPhase::PartitionPacking).is_none());
    }

    #[test]
    fn spacing_overrides_apply() {
        let mut config = LayoutConfig::default();
        config.spacing.chip_gap = Some(1.5);
        let pipeline = LayoutPipeline::new(&problem(), &config);
        assert_eq!(pipeline.problem().chip_gap(), 1.5);
    }

    #[test]
    fn packer_failure_names_phase() {
        let err = {
            let mut pipeline =
                LayoutPipeline::new(&problem(), &LayoutConfig::default()).with_packer(BrokenPacker);
            pipeline.solve().unwrap_err()
        };
        let err = LayoutError::from(err);
        assert_eq!(err.phase(), Some(LayoutPhase::PartitionPacking));
        assert!(matches!(
            err,
            LayoutError::PhaseFailed {
                source: SolverError::Packing(_),
                ..
            }
        ));
    }

    #[test]
    fn budget_is_exact() {
        let mut config = LayoutConfig::default();
        config.solver.max_iterations = Some(3);
        let mut pipeline = LayoutPipeline::new(&problem(), &config);
        let err = pipeline.solve().unwrap_err();
        assert_eq!(pipeline.state().iterations, 3);
        assert_eq!(
            err,
            SolverError::IterationBudgetExceeded {
                solver: "LayoutPipeline".into(),
                max_iterations: 3,
            }
        );
        assert!(matches!(LayoutError::from(err), LayoutError::Pipeline(_)));
    }

    #[test]
    fn default_budget_grows_after_partitioning() {
        let mut pipeline = LayoutPipeline::new(&problem(), &LayoutConfig::default());
        assert_eq!(pipeline.state().max_iterations, DEFAULT_MAX_ITERATIONS);
        pipeline.step();
        pipeline.step();
        assert_eq!(pipeline.current_phase(), Some(LayoutPhase::PinRangeMatch));
        assert_eq!(pipeline.state().max_iterations, scaled_budget(2, 3));
        assert_eq!(scaled_budget(2, 3), DEFAULT_MAX_ITERATIONS + 13);
    }

    #[test]
    fn fixed_budget_is_never_resized() {
        let mut config = LayoutConfig::default();
        config.solver.max_iterations = Some(40);
        let mut pipeline = LayoutPipeline::new(&problem(), &config);
        pipeline
            .solve_until_phase(LayoutPhase::PartitionPacking)
            .unwrap();
        assert_eq!(pipeline.state().max_iterations, 40);
    }

    #[test]
    fn phase_timings_use_injected_clock() {
        let clock = ManualClock::new();
        let mut pipeline =
            LayoutPipeline::new(&problem(), &LayoutConfig::default()).with_clock(clock.clone());
        pipeline.step();
        clock.advance(Duration::from_millis(5));
        pipeline.step();
        let timing = pipeline.phase_timings()["chip_partitions"];
        assert_eq!(timing.start, Duration::ZERO);
        assert_eq!(timing.elapsed, Some(Duration::from_millis(5)));
    }

    #[test]
    fn structural_error_fails_first_phase() {
        let mut parts = problem().into_parts();
        if let Some(chip) = parts.chips.get_mut(&ChipId::from("C1")) {
            chip.pin_ids.push("C1.ghost".into());
        }
        let broken = Problem::from_parts(parts);
        let err = layout_problem(&broken, &LayoutConfig::default()).unwrap_err();
        assert_eq!(err.phase(), Some(LayoutPhase::ChipPartitions));
    }

    #[test]
    fn diagnostics_include_validation_warnings() {
        let p = ProblemBuilder::new()
            .chip("A", Size::new(1.0, 1.0))
            .chip_pin("A", "A.1", Point::ORIGIN, Side::XPlus)
            .connect_pins("A.1", "Z.9")
            .build();
        let mut pipeline = LayoutPipeline::new(&p, &LayoutConfig::default());
        pipeline.solve().unwrap();
        assert_eq!(pipeline.diagnostics().len(), 1);
    }
}
