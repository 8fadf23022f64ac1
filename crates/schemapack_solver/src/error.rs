//! Solver failure kinds.
//!
//! Every variant is terminal for the solver that records it; nothing in the
//! framework retries.

/// Why a solver failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// The input references entities that do not exist.
    #[error("structural error: {message}")]
    Structural {
        /// What is malformed.
        message: String,
    },

    /// The solver did not finish within its step budget.
    #[error("max iterations exceeded in `{solver}` ({max_iterations})")]
    IterationBudgetExceeded {
        /// Name of the solver that ran out of budget.
        solver: String,
        /// The budget it had.
        max_iterations: u64,
    },

    /// A phase failed; the phase's own error is kept as the source.
    #[error("{phase}: {source}")]
    Delegated {
        /// Name of the failing phase.
        phase: String,
        /// The phase's error, unchanged.
        source: Box<SolverError>,
    },

    /// The packer rejected its input.
    #[error("packing failed: {0}")]
    Packing(String),
}

impl SolverError {
    /// Creates a structural error.
    pub fn structural(message: impl Into<String>) -> Self {
        SolverError::Structural {
            message: message.into(),
        }
    }

    /// Wraps `self` as the failure of the named phase.
    pub fn in_phase(self, phase: impl Into<String>) -> Self {
        SolverError::Delegated {
            phase: phase.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through phase wrappers.
    pub fn root(&self) -> &SolverError {
        match self {
            SolverError::Delegated { source, .. } => source.root(),
            other => other,
        }
    }

    /// The outermost phase name, if this is a phase failure.
    pub fn phase(&self) -> Option<&str> {
        match self {
            SolverError::Delegated { phase, .. } => Some(phase),
            _ => None,
        }
    }
}
