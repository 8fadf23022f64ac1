//! Splits a problem into independently solvable partitions.
//!
//! Chips are nodes of an undirected graph with an edge wherever a strong
//! connection joins pins on two different chips. Each connected component
//! becomes a partition: a new [`Problem`] holding only that component's
//! chips, their pins, and the connections that stay inside it.
//!
//! Components are discovered in chip declaration order. Within a partition,
//! chips keep their declaration order regardless of traversal order.

use indexmap::{IndexMap, IndexSet};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::{Dfs, VisitMap};
use schemapack_common::{ChipId, PinId};
use schemapack_model::{Problem, ProblemParts};
use std::collections::HashSet;

/// Builds the chip adjacency graph induced by strong connections.
///
/// Node `i` is the `i`-th chip of the problem. Strong connections whose pins
/// do not both resolve to chips, or resolve to the same chip, add no edge.
pub fn chip_graph(problem: &Problem) -> UnGraph<ChipId, ()> {
    let mut graph = UnGraph::with_capacity(problem.chip_count(), problem.strong().len() / 2);
    let mut nodes: IndexMap<&ChipId, NodeIndex> = IndexMap::new();
    for id in problem.chips().keys() {
        nodes.insert(id, graph.add_node(id.clone()));
    }

    for (a, b) in problem.strong().pairs() {
        let (Some(chip_a), Some(chip_b)) = (problem.chip_of_pin(a), problem.chip_of_pin(b)) else {
            continue;
        };
        if chip_a == chip_b {
            continue;
        }
        if let (Some(&na), Some(&nb)) = (nodes.get(chip_a), nodes.get(chip_b)) {
            graph.update_edge(na, nb, ());
        }
    }
    graph
}

/// Chip ids of each connected component, in discovery order.
pub fn connected_components(problem: &Problem) -> Vec<Vec<ChipId>> {
    let graph = chip_graph(problem);
    let mut components = Vec::new();
    let mut dfs = Dfs::empty(&graph);

    for start in graph.node_indices() {
        if dfs.discovered.is_visited(&start) {
            continue;
        }
        dfs.move_to(start);
        let mut members = Vec::new();
        while let Some(node) = dfs.next(&graph) {
            members.push(node);
        }
        members.sort();
        components.push(members.into_iter().map(|n| graph[n].clone()).collect());
    }
    components
}

/// Splits `problem` into one partition per connected component.
pub fn partition_problem(problem: &Problem) -> Vec<Problem> {
    let components = connected_components(problem);
    let partitions: Vec<Problem> = components
        .iter()
        .map(|chips| restrict_to_chips(problem, chips))
        .collect();
    tracing::debug!(
        chips = problem.chip_count(),
        partitions = partitions.len(),
        "partitioned problem"
    );
    partitions
}

/// A new problem holding only `chips`, their pins and the connections
/// entirely among those pins. Nets survive if a kept weak entry names them.
pub fn restrict_to_chips(problem: &Problem, chips: &[ChipId]) -> Problem {
    let mut parts = ProblemParts {
        chip_gap: problem.chip_gap(),
        partition_gap: problem.partition_gap(),
        ..ProblemParts::default()
    };

    let mut pins: HashSet<PinId> = HashSet::new();
    for id in chips {
        let Some(chip) = problem.chip(id) else {
            continue;
        };
        for pin in &chip.pin_ids {
            if let Some(record) = problem.chip_pin(pin) {
                parts.chip_pins.insert(pin.clone(), record.clone());
            }
            pins.insert(pin.clone());
        }
        parts.chips.insert(id.clone(), chip.clone());
    }

    parts.strong = problem.strong().restricted_to(&pins);
    parts.weak = problem.weak().restricted_to(&pins);

    let used_nets: IndexSet<_> = parts.weak.entries().map(|(_, net, _)| net.clone()).collect();
    for net in used_nets {
        if let Some(record) = problem.nets().get(&net) {
            parts.nets.insert(net, record.clone());
        }
    }

    Problem::from_parts(parts)
}
