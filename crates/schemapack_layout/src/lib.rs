//! Layout engine for schematic chips.
//!
//! This crate takes a [`Problem`](schemapack_model::Problem) (chips with edge pins, groups, pin-to-pin
//! wires and nets) and computes a non-overlapping [`OutputLayout`]: a center
//! and rotation for every chip, and a center for every group.
//!
//! # Pipeline
//!
//! 1. **Chip partitions**: validate the problem and split it into groups of
//!    chips joined by direct wires
//! 2. **Pin range match**: cut each chip side into short pin runs and find
//!    the chips every run reaches
//! 3. **Partition packing**: filter each partition's networks and pack its
//!    chips with the [`Packer`]
//! 4. **Pin range overlap**: push apart chips that still overlap
//! 5. **Partition layout packing**: pack the partitions as rigid blocks and
//!    place the groups
//!
//! Every phase is a stepped [`Solver`](schemapack_solver::Solver), so a run
//! can be paused between steps, inspected and rendered.
//!
//! # Usage
//!
//! ```ignore
//! use schemapack_layout::layout_problem;
//!
//! let layout = layout_problem(&problem, &config)?;
//! assert!(layout.places_exactly(&problem));
//! ```

#![warn(missing_docs)]

pub mod network;
pub mod output;
pub mod pack;
pub mod partition;
pub mod phases;
pub mod pin_range;
pub mod pipeline;

pub use network::{filter_networks, NetworkAssignment};
pub use output::{OutputLayout, Placement};
pub use pack::{OutlinePacker, PackError, PackInput, PackOutput, Packer};
pub use partition::partition_problem;
pub use phases::{LayoutPhase, LayoutPhaseSolver};
pub use pin_range::{PinRange, RangeOwner};
pub use pipeline::{
    layout_problem, scaled_budget, LayoutContext, LayoutError, LayoutPipeline, STEPS_PER_CHIP,
    STEPS_PER_PARTITION,
};
