//! Shared foundational types used across the schemapack layout engine.
//!
//! This crate provides the string-backed identifiers for chips, pins, groups
//! and nets, plus the small amount of 2D geometry (points, sizes, chip sides,
//! right-angle rotations and axis-aligned bounds) every other crate needs.

#![warn(missing_docs)]

pub mod geom;
pub mod ids;

pub use geom::{Bounds, Point, Rotation, Side, Size, EPSILON};
pub use ids::{ChipId, GroupId, NetId, NetworkId, PinId};
