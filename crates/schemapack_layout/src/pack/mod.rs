//! The packing collaborator.
//!
//! A [`Packer`] turns a list of rectangular components, each carrying pads
//! tagged with a network id, into a center and rotation per component such
//! that no two rotated boxes come closer than `min_gap`. The layout phases
//! only depend on the trait; [`OutlinePacker`] is the bundled
//! implementation.

mod outline;

pub use outline::OutlinePacker;

use indexmap::IndexMap;
use schemapack_common::{NetworkId, PinId, Point, Rotation, Size};
use schemapack_config::{OrderStrategy, PlacementStrategy};
use schemapack_solver::SolverError;
use serde::{Deserialize, Serialize};

/// A pad of a component: a pin the packer tries to keep near its network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackPad {
    /// The pin this pad stands for.
    pub id: PinId,
    /// Offset from the component center, unrotated.
    pub offset: Point,
    /// Network the pad belongs to.
    pub network: NetworkId,
}

/// A rectangle to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackComponent {
    /// Component id, unique within one input.
    pub id: String,
    /// Unrotated size.
    pub size: Size,
    /// Pads pulling the component toward others on the same network.
    pub pads: Vec<PackPad>,
    /// Rotations the packer may try, in preference order.
    pub allowed_rotations: Vec<Rotation>,
}

/// Everything one packing run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackInput {
    /// Components, in the caller's preferred order.
    pub components: Vec<PackComponent>,
    /// Minimum clearance between any two placed boxes.
    pub min_gap: f64,
    /// How components are ordered before placement.
    pub order: OrderStrategy,
    /// How a position is chosen for each component.
    pub placement: PlacementStrategy,
}

/// Where the packer put one component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackedComponent {
    /// Center of the rotated box.
    pub center: Point,
    /// Chosen rotation.
    pub rotation: Rotation,
}

/// Result of a packing run, keyed by component id in placement order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackOutput {
    /// One entry per input component.
    pub placements: IndexMap<String, PackedComponent>,
}

/// Reasons a packer refuses its input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PackError {
    /// A component size is negative or not finite.
    #[error("component `{component}` has invalid size {width}x{height}")]
    InvalidSize {
        /// Offending component.
        component: String,
        /// Its width.
        width: f64,
        /// Its height.
        height: f64,
    },

    /// The clearance is negative or not finite.
    #[error("invalid minimum gap {0}")]
    InvalidGap(f64),

    /// Two components share an id.
    #[error("duplicate component `{0}`")]
    DuplicateComponent(String),
}

impl From<PackError> for SolverError {
    fn from(err: PackError) -> Self {
        SolverError::Packing(err.to_string())
    }
}

/// A geometric packing primitive.
///
/// Implementations must be deterministic: the same input always yields the
/// same output. Failures are returned, never retried.
pub trait Packer {
    /// Places every component of `input`.
    fn pack(&self, input: &PackInput) -> Result<PackOutput, PackError>;
}

/// Checks the parts of `input` every packer relies on.
pub fn validate_input(input: &PackInput) -> Result<(), PackError> {
    if !input.min_gap.is_finite() || input.min_gap < 0.0 {
        return Err(PackError::InvalidGap(input.min_gap));
    }
    let mut seen = std::collections::HashSet::new();
    for component in &input.components {
        if !component.size.is_valid() {
            return Err(PackError::InvalidSize {
                component: component.id.clone(),
                width: component.size.width,
                height: component.size.height,
            });
        }
        if !seen.insert(component.id.as_str()) {
            return Err(PackError::DuplicateComponent(component.id.clone()));
        }
    }
    Ok(())
}
