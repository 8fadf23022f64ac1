//! Phase 1: validate the problem and split it into partitions.

use crate::partition::partition_problem;
use schemapack_common::Point;
use schemapack_diagnostics::{Diagnostic, DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use schemapack_model::Problem;
use schemapack_solver::{Graphic, Solver, SolverError, SolverState};

/// Validates the problem, then partitions it in a single step.
///
/// Structural errors fail the phase; warnings are kept in
/// [`diagnostics`](Self::diagnostics) and the phase continues.
pub struct ChipPartitionsSolver {
    state: SolverState,
    problem: Problem,
    diagnostics: Vec<Diagnostic>,
    partitions: Vec<Problem>,
}

impl ChipPartitionsSolver {
    /// Creates the solver.
    pub fn new(problem: Problem, max_iterations: u64) -> Self {
        Self {
            state: SolverState::new("ChipPartitionsSolver", max_iterations),
            problem,
            diagnostics: Vec::new(),
            partitions: Vec::new(),
        }
    }

    /// The partitions, once solved.
    pub fn partitions(&self) -> &[Problem] {
        &self.partitions
    }

    /// Everything validation reported.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl Solver for ChipPartitionsSolver {
    fn state(&self) -> &SolverState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn iterate(&mut self) {
        let sink = DiagnosticSink::new();
        let usable = self.problem.validate(&sink);
        let errors = sink.error_count();
        self.diagnostics = sink.take_all();
        if !self.diagnostics.is_empty() {
            let rendered = TerminalRenderer::new(false).render_all(&self.diagnostics);
            tracing::warn!(errors, "problem validation reported:\n{rendered}");
        }

        if !usable {
            let first = self
                .diagnostics
                .iter()
                .find(|d| d.severity.is_error())
                .map(|d| format!("{}: {}", d.subject, d.message))
                .unwrap_or_default();
            self.state.fail(SolverError::structural(format!(
                "{errors} structural error(s) in problem; first: {first}"
            )));
            return;
        }

        self.partitions = partition_problem(&self.problem);
        self.state.mark_solved();
    }

    fn render(&self) -> Graphic {
        let mut graphic = Graphic::titled("chip partitions");
        for (row, partition) in self.partitions.iter().enumerate() {
            let names: Vec<&str> = partition.chips().keys().map(|c| c.as_str()).collect();
            graphic.text(
                Point::new(0.0, -(row as f64)),
                format!("partition {row}: {}", names.join(", ")),
            );
        }
        graphic
    }

    fn constructor_params(&self) -> serde_json::Value {
        serde_json::json!({ "problem": self.problem })
    }
}
