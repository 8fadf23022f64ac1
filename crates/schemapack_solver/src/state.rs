//! Observable solver state.

use crate::error::SolverError;

/// Where a solver is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SolverStatus {
    /// Still has work to do.
    #[default]
    Running,
    /// Finished successfully.
    Solved,
    /// Finished with an error. Terminal.
    Failed(SolverError),
}

/// The state every solver exposes to its driver and to observers.
///
/// `solved` and `failed` are mutually exclusive and both terminal: once
/// either is set, the status can no longer change.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverState {
    /// Solver name, used in budget errors and logs.
    pub name: String,
    /// Number of `step()` calls that performed work.
    pub iterations: u64,
    /// Step budget enforced by `solve()`.
    pub max_iterations: u64,
    status: SolverStatus,
}

impl SolverState {
    /// Creates a running state with zero iterations.
    pub fn new(name: impl Into<String>, max_iterations: u64) -> Self {
        Self {
            name: name.into(),
            iterations: 0,
            max_iterations,
            status: SolverStatus::Running,
        }
    }

    /// Current status.
    pub fn status(&self) -> &SolverStatus {
        &self.status
    }

    /// Returns `true` once the solver finished successfully.
    pub fn solved(&self) -> bool {
        matches!(self.status, SolverStatus::Solved)
    }

    /// Returns `true` once the solver failed.
    pub fn failed(&self) -> bool {
        matches!(self.status, SolverStatus::Failed(_))
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&SolverError> {
        match &self.status {
            SolverStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` if the solver is solved or failed.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, SolverStatus::Running)
    }

    /// Marks the solver solved. Ignored once terminal.
    pub fn mark_solved(&mut self) {
        if !self.is_terminal() {
            self.status = SolverStatus::Solved;
        }
    }

    /// Marks the solver failed. Ignored once terminal, so the first error wins.
    pub fn fail(&mut self, error: SolverError) {
        if !self.is_terminal() {
            tracing::warn!(solver = %self.name, iterations = self.iterations, %error, "solver failed");
            self.status = SolverStatus::Failed(error);
        }
    }

    /// The outcome as a `Result`. A running solver reports `Ok`.
    pub fn result(&self) -> Result<(), SolverError> {
        match &self.status {
            SolverStatus::Failed(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_running() {
        let state = SolverState::new("test", 10);
        assert_eq!(state.iterations, 0);
        assert!(!state.solved());
        assert!(!state.failed());
        assert!(!state.is_terminal());
        assert_eq!(state.error(), None);
    }

    #[test]
    fn solved_is_terminal() {
        let mut state = SolverState::new("test", 10);
        state.mark_solved();
        state.fail(SolverError::structural("late"));
        assert!(state.solved());
        assert!(!state.failed());
        assert!(state.result().is_ok());
    }

    #[test]
    fn first_failure_wins() {
        let mut state = SolverState::new("test", 10);
        state.fail(SolverError::structural("first"));
        state.fail(SolverError::structural("second"));
        state.mark_solved();
        assert!(state.failed());
        assert_eq!(state.error(), Some(&SolverError::structural("first")));
        assert_eq!(state.result(), Err(SolverError::structural("first")));
    }
}
