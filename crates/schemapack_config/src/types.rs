//! Configuration types deserialized from `schemapack.toml`.

use serde::{Deserialize, Serialize};

/// The top-level layout configuration parsed from `schemapack.toml`.
///
/// Every section is optional; a missing section takes its defaults, so an
/// empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Iteration budgets for the solver framework.
    #[serde(default)]
    pub solver: SolverConfig,
    /// Thresholds for grouping a chip's pins into ranges.
    #[serde(default)]
    pub pin_ranges: PinRangeConfig,
    /// Strategies handed to the packer.
    #[serde(default)]
    pub packing: PackingConfig,
    /// How the two connectivity layers are reconciled for the packer.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Overrides for the problem's own spacing constants.
    #[serde(default)]
    pub spacing: SpacingConfig,
}

/// Base step budget of the top-level layout pipeline.
pub const DEFAULT_MAX_ITERATIONS: u64 = 1000;

/// Iteration budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Fixed step budget of the top-level layout pipeline.
    ///
    /// When unset the pipeline starts from [`DEFAULT_MAX_ITERATIONS`] and
    /// grows the budget with the partition and chip counts once the problem
    /// has been partitioned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
    /// Maximum number of steps when solving a single phase on its own.
    pub phase_max_iterations: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            phase_max_iterations: 10_000,
        }
    }
}

/// Pin-range grouping thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PinRangeConfig {
    /// Maximum number of pins in one range.
    pub max_pins: usize,
    /// Maximum distance between consecutive pins of one range.
    pub max_gap: f64,
}

impl Default for PinRangeConfig {
    fn default() -> Self {
        Self {
            max_pins: 3,
            max_gap: 0.2,
        }
    }
}

/// Packing strategies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackingConfig {
    /// Order in which components are handed to the packer.
    pub order: OrderStrategy,
    /// Cost the packer minimises when choosing a position.
    pub placement: PlacementStrategy,
}

/// Order in which the packer places components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStrategy {
    /// Keep the order components were given in.
    InputOrder,
    /// Largest area first.
    LargestFirst,
    /// Most connected (by pin-range connectivity) first, then largest.
    #[default]
    MostConnectedFirst,
}

/// Cost the packer minimises when choosing among collision-free positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Sum of distances from each pad to the nearest placed pad of its network.
    #[default]
    MinimumSumDistanceToNetwork,
    /// Distance from the component center to the origin.
    ClosestToOrigin,
}

/// Network filter configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// How weak connections are filtered when strong connections exist.
    pub mode: NetworkFilterMode,
}

/// How weak (net) connections are filtered against strong (direct) ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkFilterMode {
    /// Drop every weak connection as soon as any strong connection exists,
    /// otherwise apply the opposite-side veto.
    #[default]
    SuppressAllWhenStrong,
    /// Never drop weak connections wholesale; only the opposite-side veto
    /// filters them.
    OppositeSideVeto,
}

/// Spacing overrides. `None` keeps the problem's own value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpacingConfig {
    /// Minimum gap between chips in the same partition.
    pub chip_gap: Option<f64>,
    /// Minimum gap between partitions.
    pub partition_gap: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn defaults_match_documented_values() {
        let config = LayoutConfig::default();
        assert_eq!(config.solver.max_iterations, None);
        assert_eq!(config.pin_ranges.max_pins, 3);
        assert_eq!(config.pin_ranges.max_gap, 0.2);
        assert_eq!(config.packing.order, OrderStrategy::MostConnectedFirst);
        assert_eq!(
            config.packing.placement,
            PlacementStrategy::MinimumSumDistanceToNetwork
        );
        assert_eq!(config.network.mode, NetworkFilterMode::SuppressAllWhenStrong);
        assert!(config.spacing.chip_gap.is_none());
    }

    #[test]
    fn strategy_names_are_snake_case() {
        let toml = r#"
[packing]
order = "largest_first"
placement = "closest_to_origin"

[network]
mode = "opposite_side_veto"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.packing.order, OrderStrategy::LargestFirst);
        assert_eq!(config.packing.placement, PlacementStrategy::ClosestToOrigin);
        assert_eq!(config.network.mode, NetworkFilterMode::OppositeSideVeto);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let toml = r#"
[pin_ranges]
max_gap = 0.5
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.pin_ranges.max_gap, 0.5);
        assert_eq!(config.pin_ranges.max_pins, 3);
    }
}
