//! The [`Solver`] trait and sub-solver delegation.

use crate::error::SolverError;
use crate::graphics::Graphic;
use crate::state::{SolverState, SolverStatus};

/// A bounded-iteration unit of computation.
///
/// Implementors provide their state, one increment of work in
/// [`iterate`](Solver::iterate), and a drawing of themselves. The driver
/// methods [`step`](Solver::step) and [`solve`](Solver::solve) are provided
/// and should not be overridden: they own the iteration counter and the
/// budget check.
///
/// A solver that delegates to a nested solver keeps it as a field, steps it
/// from `iterate` with [`step_sub_solver`], and exposes it through
/// [`active_sub_solver`](Solver::active_sub_solver) for observers.
pub trait Solver {
    /// The solver's state.
    fn state(&self) -> &SolverState;

    /// Mutable access to the solver's state.
    fn state_mut(&mut self) -> &mut SolverState;

    /// Performs one unit of work. Only called while the solver is running.
    fn iterate(&mut self);

    /// The nested solver currently receiving this solver's steps, if any.
    fn active_sub_solver(&self) -> Option<&dyn Solver> {
        None
    }

    /// Complete drawing of this solver's own state.
    fn render(&self) -> Graphic;

    /// Cheaper, possibly partial drawing. Defaults to [`render`](Solver::render).
    fn render_preview(&self) -> Graphic {
        self.render()
    }

    /// The data needed to construct this solver again from scratch.
    fn constructor_params(&self) -> serde_json::Value;

    /// Performs exactly one step. A no-op once solved or failed.
    fn step(&mut self) {
        if self.state().is_terminal() {
            return;
        }
        self.state_mut().iterations += 1;
        self.iterate();
    }

    /// Steps until solved or failed.
    ///
    /// A solver still running after `max_iterations` steps is failed with
    /// [`SolverError::IterationBudgetExceeded`].
    fn solve(&mut self) -> Result<(), SolverError> {
        while !self.state().is_terminal() {
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

    /// Complete drawing, taken from the active sub-solver when there is one.
    fn visualize(&self) -> Graphic {
        match self.active_sub_solver() {
            Some(sub) => sub.visualize(),
            None => self.render(),
        }
    }

    /// Cheap drawing, taken from the active sub-solver when there is one.
    fn preview(&self) -> Graphic {
        match self.active_sub_solver() {
            Some(sub) => sub.preview(),
            None => self.render_preview(),
        }
    }
}

/// What happened to a sub-solver after one delegated step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubSolverStatus {
    /// Still running; the parent should keep delegating.
    Running,
    /// Finished; the parent should absorb its result and drop it.
    Solved,
    /// Failed; the parent has already been failed with the same error.
    Failed,
}

/// Steps `sub` once on behalf of `parent`.
///
/// A failed sub-solver's error is copied into `parent` unchanged.
pub fn step_sub_solver(parent: &mut SolverState, sub: &mut dyn Solver) -> SubSolverStatus {
    sub.step();
    match sub.state().status() {
        SolverStatus::Running => SubSolverStatus::Running,
        SolverStatus::Solved => SubSolverStatus::Solved,
        SolverStatus::Failed(err) => {
            parent.fail(err.clone());
            SubSolverStatus::Failed
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Solves after `needed` steps, or fails on step `fail_at`.
    pub(crate) struct Countdown {
        pub state: SolverState,
        pub needed: u64,
        pub fail_at: Option<u64>,
    }

    impl Countdown {
        pub fn new(needed: u64) -> Self {
            Self {
                state: SolverState::new("Countdown", 100),
                needed,
                fail_at: None,
            }
        }

        pub fn failing_at(step: u64) -> Self {
            Self {
                fail_at: Some(step),
                ..Self::new(u64::MAX)
            }
        }
    }

    impl Solver for Countdown {
        fn state(&self) -> &SolverState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut SolverState {
            &mut self.state
        }
        fn iterate(&mut self) {
            if self.fail_at == Some(self.state.iterations) {
                self.state.fail(SolverError::structural("countdown broke"));
            } else if self.state.iterations >= self.needed {
                self.state.mark_solved();
            }
        }
        fn render(&self) -> Graphic {
            Graphic::titled(format!("countdown {}", self.state.iterations))
        }
        fn constructor_params(&self) -> serde_json::Value {
            json!({ "needed": self.needed })
        }
    }

    struct Parent {
        state: SolverState,
        child: Option<Countdown>,
        absorbed: bool,
    }

    impl Solver for Parent {
        fn state(&self) -> &SolverState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut SolverState {
            &mut self.state
        }
        fn iterate(&mut self) {
            let Some(child) = self.child.as_mut() else {
                self.state.mark_solved();
                return;
            };
            if step_sub_solver(&mut self.state, child) == SubSolverStatus::Solved {
                self.absorbed = true;
                self.child = None;
            }
        }
        fn active_sub_solver(&self) -> Option<&dyn Solver> {
            self.child.as_ref().map(|c| c as &dyn Solver)
        }
        fn render(&self) -> Graphic {
            Graphic::titled("parent")
        }
        fn constructor_params(&self) -> serde_json::Value {
            json!({})
        }
    }

    #[test]
    fn solve_counts_steps() {
        let mut s = Countdown::new(3);
        assert!(s.solve().is_ok());
        assert!(s.state().solved());
        assert_eq!(s.state().iterations, 3);
    }

    #[test]
    fn step_after_terminal_is_noop() {
        let mut s = Countdown::new(1);
        s.step();
        assert!(s.state().solved());
        s.step();
        s.step();
        assert_eq!(s.state().iterations, 1);
    }

    #[test]
    fn budget_fails_after_exactly_max_steps() {
        let mut s = Countdown::new(u64::MAX);
        s.state.max_iterations = 7;
        let err = s.solve().unwrap_err();
        assert_eq!(s.state().iterations, 7);
        assert_eq!(
            err,
            SolverError::IterationBudgetExceeded {
                solver: "Countdown".into(),
                max_iterations: 7,
            }
        );
    }

    #[test]
    fn parent_absorbs_solved_child() {
        let mut p = Parent {
            state: SolverState::new("Parent", 100),
            child: Some(Countdown::new(2)),
            absorbed: false,
        };
        p.step();
        assert!(p.active_sub_solver().is_some());
        assert_eq!(p.visualize().title.as_deref(), Some("countdown 1"));
        p.step();
        assert!(p.absorbed);
        assert!(p.active_sub_solver().is_none());
        assert_eq!(p.visualize().title.as_deref(), Some("parent"));
        p.step();
        assert!(p.state().solved());
    }

    #[test]
    fn child_failure_propagates_verbatim() {
        let mut p = Parent {
            state: SolverState::new("Parent", 100),
            child: Some(Countdown::failing_at(2)),
            absorbed: false,
        };
        let err = p.solve().unwrap_err();
        assert_eq!(err, SolverError::structural("countdown broke"));
        assert_eq!(p.state().iterations, 2);
        assert!(!p.absorbed);
    }
}
