//! A solver that runs a fixed sequence of named phases.
//!
//! Each phase is a sub-solver built from the pipeline's shared context when
//! the phase starts. When it solves, the phase's callback copies its results
//! back into the context for the next phase to read. A failing phase fails
//! the pipeline and stays in place, so it can be inspected afterwards.

use crate::clock::{Clock, SystemClock};
use crate::error::SolverError;
use crate::graphics::Graphic;
use crate::solver::Solver;
use crate::state::{SolverState, SolverStatus};
use indexmap::IndexMap;
use schemapack_common::Point;
use std::time::Duration;

/// One phase of a [`PhasedPipeline`].
pub struct PhaseDef<C, P> {
    /// Phase name; also the key its solver and timing are stored under.
    pub name: &'static str,
    /// Builds the phase's solver from the shared context.
    pub construct: fn(&C) -> P,
    /// Copies the solved phase's results into the context.
    pub on_solved: Option<fn(&mut C, &P)>,
}

impl<C, P> PhaseDef<C, P> {
    /// A phase with no completion callback.
    pub fn new(name: &'static str, construct: fn(&C) -> P) -> Self {
        Self {
            name,
            construct,
            on_solved: None,
        }
    }

    /// Sets the completion callback.
    pub fn on_solved(mut self, callback: fn(&mut C, &P)) -> Self {
        self.on_solved = Some(callback);
        self
    }
}

/// When a phase ran, as read from the pipeline's clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTiming {
    /// Clock reading when the phase's solver was constructed.
    pub start: Duration,
    /// Clock reading when the phase solved. `None` while running or failed.
    pub end: Option<Duration>,
    /// `end - start`.
    pub elapsed: Option<Duration>,
}

/// Runs named phases in order, one sub-solver at a time.
///
/// Every call to [`step`](Solver::step) does exactly one of: start the
/// current phase, step the current phase's solver, or mark the pipeline
/// solved once the last phase has finished. The phase index never moves
/// backwards and never moves past a failed phase.
pub struct PhasedPipeline<C, P> {
    state: SolverState,
    context: C,
    phases: Vec<PhaseDef<C, P>>,
    current_phase: usize,
    active: bool,
    phase_solvers: IndexMap<&'static str, P>,
    timings: IndexMap<&'static str, PhaseTiming>,
    clock: Box<dyn Clock>,
    params: serde_json::Value,
}

impl<C, P: Solver> PhasedPipeline<C, P> {
    /// Creates a pipeline timed by a [`SystemClock`].
    pub fn new(
        name: impl Into<String>,
        context: C,
        phases: Vec<PhaseDef<C, P>>,
        max_iterations: u64,
    ) -> Self {
        Self {
            state: SolverState::new(name, max_iterations),
            context,
            phases,
            current_phase: 0,
            active: false,
            phase_solvers: IndexMap::new(),
            timings: IndexMap::new(),
            clock: Box::new(SystemClock::new()),
            params: serde_json::Value::Null,
        }
    }

    /// Replaces the clock used for phase timing.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Sets the value returned by [`Solver::constructor_params`].
    pub fn with_constructor_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    /// The shared context.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Mutable access to the shared context, for setup before solving.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Index of the current phase; equals the phase count once all finished.
    pub fn current_phase(&self) -> usize {
        self.current_phase
    }

    /// Name of the current phase, or `None` once all phases finished.
    pub fn current_phase_name(&self) -> Option<&'static str> {
        self.phases.get(self.current_phase).map(|p| p.name)
    }

    /// Phase names in execution order.
    pub fn phase_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.phases.iter().map(|p| p.name)
    }

    /// The solver a phase ran (or is running) with.
    pub fn phase_solver(&self, name: &str) -> Option<&P> {
        self.phase_solvers.get(name)
    }

    /// Timing of every phase started so far, in start order.
    pub fn phase_timings(&self) -> &IndexMap<&'static str, PhaseTiming> {
        &self.timings
    }

    /// Steps until the named phase is current, the pipeline is terminal, or
    /// the step budget runs out.
    pub fn solve_until_phase(&mut self, name: &str) -> Result<(), SolverError> {
        while !self.state.is_terminal() && self.current_phase_name() != Some(name) {
            if self.state.iterations >= self.state.max_iterations {
                let error = SolverError::IterationBudgetExceeded {
                    solver: self.state.name.clone(),
                    max_iterations: self.state.max_iterations,
                };
                self.state.fail(error);
                break;
            }
            self.step();
        }
        self.state.result()
    }

    fn start_phase(&mut self, index: usize) {
        let phase = &self.phases[index];
        let solver = (phase.construct)(&self.context);
        let start = self.clock.now();
        tracing::debug!(pipeline = %self.state.name, phase = phase.name, "phase started");
        self.phase_solvers.insert(phase.name, solver);
        self.timings.insert(
            phase.name,
            PhaseTiming {
                start,
                end: None,
                elapsed: None,
            },
        );
        self.active = true;
    }
}

impl<C, P: Solver> Solver for PhasedPipeline<C, P> {
    fn state(&self) -> &SolverState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn iterate(&mut self) {
        let index = self.current_phase;
        let Some(phase) = self.phases.get(index) else {
            self.state.mark_solved();
            return;
        };
        if !self.active {
            self.start_phase(index);
            return;
        }

        let name = phase.name;
        let Some(solver) = self.phase_solvers.get_mut(name) else {
            self.active = false;
            return;
        };
        solver.step();
        match solver.state().status() {
            SolverStatus::Running => {}
            SolverStatus::Solved => {
                let now = self.clock.now();
                let mut elapsed = Duration::ZERO;
                if let Some(timing) = self.timings.get_mut(name) {
                    elapsed = now.saturating_sub(timing.start);
                    timing.end = Some(now);
                    timing.elapsed = Some(elapsed);
                }
                if let Some(on_solved) = phase.on_solved {
                    on_solved(&mut self.context, solver);
                }
                tracing::info!(
                    pipeline = %self.state.name,
                    phase = name,
                    steps = solver.state().iterations,
                    elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
                    "phase solved"
                );
                self.active = false;
                self.current_phase += 1;
            }
            SolverStatus::Failed(err) => {
                let error = err.clone().in_phase(name);
                self.active = false;
                self.state.fail(error);
            }
        }
    }

    fn active_sub_solver(&self) -> Option<&dyn Solver> {
        if !self.active {
            return None;
        }
        let name = self.current_phase_name()?;
        self.phase_solvers.get(name).map(|s| s as &dyn Solver)
    }

    fn render(&self) -> Graphic {
        let mut graphic = Graphic::titled(self.state.name.clone());
        for (row, phase) in self.phases.iter().enumerate() {
            let status = match self.phase_solvers.get(phase.name) {
                None => "pending",
                Some(s) if s.state().solved() => "solved",
                Some(s) if s.state().failed() => "failed",
                Some(_) => "running",
            };
            graphic.text(
                Point::new(0.0, -(row as f64)),
                format!("{}: {status}", phase.name),
            );
        }
        graphic
    }

    fn constructor_params(&self) -> serde_json::Value {
        self.params.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::solver::tests::Countdown;

    type Log = Vec<&'static str>;

    fn two_phases() -> Vec<PhaseDef<Log, Countdown>> {
        vec![
            PhaseDef::new("first", |_: &Log| Countdown::new(2))
                .on_solved(|log: &mut Log, _: &Countdown| log.push("first")),
            PhaseDef::new("second", |log: &Log| Countdown::new(log.len() as u64))
                .on_solved(|log: &mut Log, _: &Countdown| log.push("second")),
        ]
    }

    #[test]
    fn runs_phases_in_order() {
        let mut p = PhasedPipeline::new("test", Log::new(), two_phases(), 100);
        assert!(p.solve().is_ok());
        assert_eq!(p.context(), &vec!["first", "second"]);
        // start + 2 steps, start + 1 step, final step.
        assert_eq!(p.state().iterations, 6);
        assert_eq!(p.current_phase_name(), None);
        assert_eq!(p.phase_solver("first").map(|s| s.state.iterations), Some(2));
    }

    #[test]
    fn phase_index_is_monotonic_and_timed() {
        let clock = ManualClock::new();
        let mut p = PhasedPipeline::new("test", Log::new(), two_phases(), 100)
            .with_clock(clock.clone());
        let mut last = 0;
        while !p.state().is_terminal() {
            clock.advance(Duration::from_millis(1));
            p.step();
            assert!(p.current_phase() >= last);
            last = p.current_phase();
        }
        let first = p.phase_timings()["first"];
        assert_eq!(first.start, Duration::from_millis(1));
        assert_eq!(first.end, Some(Duration::from_millis(3)));
        assert_eq!(first.elapsed, Some(Duration::from_millis(2)));
        let second = p.phase_timings()["second"];
        assert_eq!(second.elapsed, Some(Duration::from_millis(1)));
    }

    #[test]
    fn failed_phase_does_not_advance() {
        let phases: Vec<PhaseDef<Log, Countdown>> = vec![
            PhaseDef::new("first", |_: &Log| Countdown::new(1)),
            PhaseDef::new("broken", |_: &Log| Countdown::failing_at(2)),
            PhaseDef::new("never", |_: &Log| Countdown::new(1)),
        ];
        let mut p = PhasedPipeline::new("test", Log::new(), phases, 100);
        let err = p.solve().unwrap_err();
        assert_eq!(err.phase(), Some("broken"));
        assert_eq!(err.root(), &SolverError::structural("countdown broke"));
        assert_eq!(p.current_phase_name(), Some("broken"));
        assert!(p.phase_solver("broken").is_some_and(|s| s.state.failed()));
        assert!(p.phase_solver("never").is_none());
        assert!(p.active_sub_solver().is_none());
        assert_eq!(p.phase_timings()["broken"].end, None);
    }

    #[test]
    fn phase_longer_than_u64_micros_still_logs() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .finish();
        let clock = ManualClock::new();
        let mut p = PhasedPipeline::new("test", Log::new(), two_phases(), 100)
            .with_clock(clock.clone());
        p.step();
        clock.set(Duration::MAX);
        tracing::subscriber::with_default(subscriber, || {
            p.solve_until_phase("second")
        })
        .unwrap();
        assert_eq!(p.phase_timings()["first"].elapsed, Some(Duration::MAX));
    }

    #[test]
    fn stuck_phase_hits_pipeline_budget_exactly() {
        let phases: Vec<PhaseDef<Log, Countdown>> =
            vec![PhaseDef::new("stuck", |_: &Log| Countdown::new(u64::MAX))];
        let mut p = PhasedPipeline::new("stuck pipeline", Log::new(), phases, 50);
        let err = p.solve().unwrap_err();
        assert_eq!(p.state().iterations, 50);
        assert_eq!(
            err,
            SolverError::IterationBudgetExceeded {
                solver: "stuck pipeline".into(),
                max_iterations: 50,
            }
        );
    }

    #[test]
    fn solve_until_phase_stops_before_it_starts() {
        let mut p = PhasedPipeline::new("test", Log::new(), two_phases(), 100);
        assert!(p.solve_until_phase("second").is_ok());
        assert_eq!(p.current_phase_name(), Some("second"));
        assert!(p.phase_solver("second").is_none());
        assert_eq!(p.context(), &vec!["first"]);
        assert!(!p.state().is_terminal());
    }

    #[test]
    fn visualize_follows_active_phase() {
        let mut p = PhasedPipeline::new("test", Log::new(), two_phases(), 100);
        assert_eq!(p.visualize().title.as_deref(), Some("test"));
        p.step();
        p.step();
        assert_eq!(p.visualize().title.as_deref(), Some("countdown 1"));
        assert_eq!(p.render().texts[0].text, "first: running");
    }
}
