//! Chooses the network each pin presents to the packer.
//!
//! A problem has two connectivity layers: direct pin-to-pin wires (strong)
//! and net membership (weak). The packer only understands one flat network
//! id per pad, so the two layers are merged here.
//!
//! 1. In the default [`NetworkFilterMode::SuppressAllWhenStrong`] mode, the
//!    existence of any strong connection anywhere suppresses every weak
//!    entry: the pin is recorded as filtered and gets no id from its net.
//! 2. Surviving weak entries pass an opposite-side veto. If the pin's chip
//!    has strong wires to another chip on the same net, but none of them
//!    leave from the side this pin is on, the pin gets a private
//!    `"{pin}-disconnected"` id instead of the net id.
//! 3. Strong connections are overlaid last: both ends of a wire adopt an id
//!    one of them already has, or else `"{a}-{b}"` from the wire itself.

use indexmap::{IndexMap, IndexSet};
use schemapack_common::{ChipId, NetworkId, PinId, Side};
use schemapack_config::NetworkFilterMode;
use schemapack_model::Problem;
use std::collections::{HashMap, HashSet};

/// Per-pin network ids plus the pins whose net membership was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkAssignment {
    /// Network id of every pin that has one, in assignment order.
    pub networks: IndexMap<PinId, NetworkId>,
    /// Pins whose weak connection was suppressed or vetoed.
    pub filtered: IndexSet<PinId>,
}

impl NetworkAssignment {
    /// The network a pin was assigned, if any.
    pub fn network_of(&self, pin: &PinId) -> Option<&NetworkId> {
        self.networks.get(pin)
    }

    /// Returns `true` if the pin's weak connection was not used.
    pub fn is_filtered(&self, pin: &PinId) -> bool {
        self.filtered.contains(pin)
    }

    /// Pins sharing `network`, in assignment order.
    pub fn members<'a>(&'a self, network: &'a NetworkId) -> impl Iterator<Item = &'a PinId> + 'a {
        self.networks
            .iter()
            .filter(move |(_, n)| *n == network)
            .map(|(p, _)| p)
    }
}

/// Synthetic id given to a pin whose net membership was vetoed.
pub fn disconnected_network(pin: &PinId) -> NetworkId {
    NetworkId::new(format!("{pin}-disconnected"))
}

/// Sides of `from` that carry a strong wire toward `to`, per chip pair.
fn strong_sides(
    problem: &Problem,
    strongly_connected: &IndexMap<PinId, Vec<PinId>>,
) -> HashMap<(ChipId, ChipId), HashSet<Side>> {
    let mut sides: HashMap<(ChipId, ChipId), HashSet<Side>> = HashMap::new();
    for (pin, partners) in strongly_connected {
        let (Some(from), Some(side)) = (problem.chip_of_pin(pin), problem.pin_side(pin)) else {
            continue;
        };
        for partner in partners {
            match problem.chip_of_pin(partner) {
                Some(to) if to != from => {
                    sides
                        .entry((from.clone(), to.clone()))
                        .or_default()
                        .insert(side);
                }
                _ => {}
            }
        }
    }
    sides
}

/// Assigns a network id to every connected pin of `problem`.
///
/// `strongly_connected` is the pin to partner-pins map of the same problem,
/// as returned by [`Problem::strongly_connected_pins`].
pub fn filter_networks(
    problem: &Problem,
    strongly_connected: &IndexMap<PinId, Vec<PinId>>,
    mode: NetworkFilterMode,
) -> NetworkAssignment {
    let mut out = NetworkAssignment::default();
    let suppress_weak =
        mode == NetworkFilterMode::SuppressAllWhenStrong && problem.has_strong_connections();
    let sides = strong_sides(problem, strongly_connected);

    for (pin, net) in problem.weak().memberships() {
        if suppress_weak {
            out.filtered.insert(pin.clone());
            continue;
        }

        let vetoed = match (problem.chip_of_pin(pin), problem.pin_side(pin)) {
            (Some(from), Some(side)) => problem.weak().members_of(net).any(|other| {
                let Some(to) = problem.chip_of_pin(other) else {
                    return false;
                };
                to != from
                    && sides
                        .get(&(from.clone(), to.clone()))
                        .is_some_and(|s| !s.contains(&side))
            }),
            _ => false,
        };

        if vetoed {
            tracing::debug!(%pin, %net, "weak connection vetoed by opposite-side strong wire");
            out.filtered.insert(pin.clone());
            out.networks
                .entry(pin.clone())
                .or_insert_with(|| disconnected_network(pin));
        } else {
            out.networks
                .entry(pin.clone())
                .or_insert_with(|| NetworkId::new(net.as_str()));
        }
    }

    for (a, b) in problem.strong().pairs() {
        let id = out
            .networks
            .get(a)
            .or_else(|| out.networks.get(b))
            .cloned()
            .unwrap_or_else(|| NetworkId::new(format!("{a}-{b}")));
        out.networks.insert(a.clone(), id.clone());
        out.networks.insert(b.clone(), id);
    }

    out
}
