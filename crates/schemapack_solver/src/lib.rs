//! Bounded-iteration solver framework for the schemapack layout engine.
//!
//! Every stage of a layout is a [`Solver`]: a state machine advanced one
//! unit of work at a time by [`Solver::step`], which may hand its steps to a
//! nested sub-solver until that finishes. [`Solver::solve`] drives a solver
//! to completion under an iteration budget, the only guard against a phase
//! that never terminates.
//!
//! # Modules
//!
//! - `error`: [`SolverError`], the terminal failure kinds
//! - `state`: [`SolverState`], the observable iteration/outcome record
//! - `solver`: the [`Solver`] trait and sub-solver delegation
//! - `graphics`: [`Graphic`], a renderable snapshot for observers
//! - `clock`: the [`Clock`] time source used for phase timing
//! - `pipeline`: [`PhasedPipeline`], a solver that runs named phases in order

#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod graphics;
pub mod pipeline;
pub mod solver;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SolverError;
pub use graphics::{Graphic, GraphicLine, GraphicPoint, GraphicRect, GraphicText};
pub use pipeline::{PhaseDef, PhaseTiming, PhasedPipeline};
pub use solver::{step_sub_solver, Solver, SubSolverStatus};
pub use state::{SolverState, SolverStatus};
