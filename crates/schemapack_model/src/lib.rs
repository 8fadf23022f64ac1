//! The layout problem model.
//!
//! A [`Problem`] describes chips and their pins, groups, nets, the two
//! connectivity layers ([`StrongConnections`] between pins and
//! [`WeakConnections`] from pins to nets) and the spacing constants the
//! packer must honor. Problems are built once (with [`ProblemBuilder`] or
//! from [`ProblemParts`]) and never mutated afterwards; partitions are new
//! problems, not views.

#![warn(missing_docs)]

pub mod builder;
pub mod connections;
pub mod problem;
pub mod validate;

pub use builder::ProblemBuilder;
pub use connections::{StrongConnections, StrongEntry, WeakConnections, WeakEntry};
pub use problem::{Chip, ChipPin, Group, GroupPin, Net, PinOwner, Problem, ProblemParts};
