//! End-to-end tests of the layout pipeline on realistic boards.

use schemapack_common::{ChipId, GroupId, PinId, Point, Side, Size};
use schemapack_config::{load_config, LayoutConfig, NetworkFilterMode};
use schemapack_layout::network::filter_networks;
use schemapack_layout::partition::partition_problem;
use schemapack_layout::{layout_problem, LayoutError, LayoutPhase, LayoutPipeline};
use schemapack_model::{Problem, ProblemBuilder};
use schemapack_solver::{Solver, SolverError};
use std::collections::HashSet;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A regulator, its decoupling capacitors, a resistor divider and a
/// connector, plus ground and supply labels.
fn regulator_board() -> Problem {
    ProblemBuilder::new()
        .chip("U1", Size::new(3.0, 2.0))
        .chip_pin("U1", "U1.VIN", Point::new(-1.5, 0.5), Side::XMinus)
        .chip_pin("U1", "U1.EN", Point::new(-1.5, -0.5), Side::XMinus)
        .chip_pin("U1", "U1.VOUT", Point::new(1.5, 0.5), Side::XPlus)
        .chip_pin("U1", "U1.FB", Point::new(1.5, -0.5), Side::XPlus)
        .chip_pin("U1", "U1.GND", Point::new(0.0, -1.0), Side::YMinus)
        .chip("C1", Size::new(0.5, 1.0))
        .chip_pin("C1", "C1.1", Point::new(0.0, 0.5), Side::YPlus)
        .chip_pin("C1", "C1.2", Point::new(0.0, -0.5), Side::YMinus)
        .chip("C2", Size::new(0.5, 1.0))
        .chip_pin("C2", "C2.1", Point::new(0.0, 0.5), Side::YPlus)
        .chip_pin("C2", "C2.2", Point::new(0.0, -0.5), Side::YMinus)
        .chip("R1", Size::new(1.0, 0.4))
        .chip_pin("R1", "R1.1", Point::new(-0.5, 0.0), Side::XMinus)
        .chip_pin("R1", "R1.2", Point::new(0.5, 0.0), Side::XPlus)
        .chip("R2", Size::new(1.0, 0.4))
        .chip_pin("R2", "R2.1", Point::new(-0.5, 0.0), Side::XMinus)
        .chip_pin("R2", "R2.2", Point::new(0.5, 0.0), Side::XPlus)
        .chip("J1", Size::new(1.0, 2.0))
        .chip_pin("J1", "J1.1", Point::new(0.5, 0.5), Side::XPlus)
        .chip_pin("J1", "J1.2", Point::new(0.5, -0.5), Side::XPlus)
        .allowed_rotations("J1", vec![schemapack_common::Rotation::R0])
        .group("GND")
        .group_pin("GND", "GND.1", Point::ORIGIN)
        .group("VBUS")
        .group_pin("VBUS", "VBUS.1", Point::ORIGIN)
        .connect_pins("U1.VIN", "C1.1")
        .connect_pins("U1.VOUT", "C2.1")
        .connect_pins("U1.VOUT", "R1.1")
        .connect_pins("R1.2", "U1.FB")
        .connect_pins("U1.FB", "R2.1")
        .connect_net("U1.GND", "GND")
        .connect_net("C1.2", "GND")
        .connect_net("C2.2", "GND")
        .connect_net("R2.2", "GND")
        .connect_net("J1.2", "GND")
        .connect_net("GND.1", "GND")
        .connect_net("J1.1", "VBUS")
        .connect_net("U1.VIN", "VBUS")
        .connect_net("VBUS.1", "VBUS")
        .build()
}

#[test]
fn regulator_board_lays_out_without_overlap() {
    init_tracing();
    let problem = regulator_board();
    let layout = layout_problem(&problem, &LayoutConfig::default()).unwrap();

    assert!(layout.places_exactly(&problem));
    assert_eq!(layout.overlapping_chips(&problem), Vec::new());
    assert_eq!(layout.group_placements.len(), 2);
    assert!(layout.group_placements.contains_key(&GroupId::from("GND")));
    let j1 = layout.chip_placements[&ChipId::from("J1")];
    assert_eq!(j1.rotation, schemapack_common::Rotation::R0);
}

#[test]
fn layout_is_deterministic() {
    let problem = regulator_board();
    let config = LayoutConfig::default();
    let first = layout_problem(&problem, &config).unwrap();
    let second = layout_problem(&problem, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn serialized_problem_lays_out_identically() {
    let problem = regulator_board();
    let json = serde_json::to_string(&problem).unwrap();
    let restored: Problem = serde_json::from_str(&json).unwrap();
    let config = LayoutConfig::default();
    assert_eq!(
        layout_problem(&restored, &config).unwrap(),
        layout_problem(&problem, &config).unwrap()
    );
}

#[test]
fn partitions_cover_every_chip_once_and_keep_wires_inside() {
    let problem = regulator_board();
    let partitions = partition_problem(&problem);

    // U1 with its capacitors and divider, then J1 alone.
    assert_eq!(partitions.len(), 2);
    let mut seen = HashSet::new();
    for partition in &partitions {
        for id in partition.chips().keys() {
            assert!(seen.insert(id.clone()), "{id} is in two partitions");
        }
    }
    let all: HashSet<ChipId> = problem.chips().keys().cloned().collect();
    assert_eq!(seen, all);

    for (a, b) in problem.strong().pairs() {
        let home = |pin: &PinId| {
            partitions
                .iter()
                .position(|p| p.chip_pin(pin).is_some())
                .unwrap()
        };
        assert_eq!(home(a), home(b), "wire {a}-{b} crosses partitions");
    }

    let connector = partitions
        .iter()
        .find(|p| p.chip(&ChipId::from("J1")).is_some())
        .unwrap();
    assert_eq!(connector.chip_count(), 1);
}

#[test]
fn strong_wire_overrides_net_membership() {
    let problem = ProblemBuilder::new()
        .chip("A", Size::new(1.0, 1.0))
        .chip_pin("A", "A.p1", Point::new(0.5, 0.0), Side::XPlus)
        .chip("B", Size::new(1.0, 1.0))
        .chip_pin("B", "B.p1", Point::new(-0.5, 0.0), Side::XMinus)
        .connect_pins("A.p1", "B.p1")
        .connect_net("A.p1", "N1")
        .connect_net("B.p1", "N1")
        .build();
    let assignment = filter_networks(
        &problem,
        &problem.strongly_connected_pins(),
        NetworkFilterMode::SuppressAllWhenStrong,
    );
    let a = assignment.network_of(&PinId::from("A.p1")).unwrap();
    let b = assignment.network_of(&PinId::from("B.p1")).unwrap();
    assert_eq!(a.as_str(), "A.p1-B.p1");
    assert_eq!(a, b);
}

#[test]
fn phases_only_move_forward() {
    let mut pipeline = LayoutPipeline::new(&regulator_board(), &LayoutConfig::default());
    let mut visited: Vec<LayoutPhase> = Vec::new();
    while !pipeline.state().is_terminal() {
        if let Some(phase) = pipeline.current_phase() {
            if visited.last() != Some(&phase) {
                visited.push(phase);
            }
        }
        pipeline.step();
    }
    assert!(pipeline.state().solved());
    assert_eq!(visited, LayoutPhase::ALL.to_vec());
    assert_eq!(pipeline.phase_timings().len(), LayoutPhase::ALL.len());
    for timing in pipeline.phase_timings().values() {
        assert!(timing.end.is_some_and(|end| end >= timing.start));
    }
}

#[test]
fn budget_fails_after_exactly_max_steps() {
    for max in [1, 4, 9] {
        let mut config = LayoutConfig::default();
        config.solver.max_iterations = Some(max);
        let mut pipeline = LayoutPipeline::new(&regulator_board(), &config);
        let err = pipeline.solve().unwrap_err();
        assert_eq!(pipeline.state().iterations, max);
        assert!(matches!(
            err,
            SolverError::IterationBudgetExceeded { max_iterations, .. } if max_iterations == max
        ));
    }
}

#[test]
fn default_budget_covers_hundreds_of_partitions() {
    init_tracing();
    let mut builder = ProblemBuilder::new();
    for i in 0..220 {
        let chip = format!("C{i}");
        let pin = format!("C{i}.1");
        builder = builder
            .chip(chip.as_str(), Size::new(1.0, 1.0))
            .chip_pin(chip.as_str(), pin.as_str(), Point::new(0.0, 0.5), Side::YPlus)
            .connect_net(pin, "GND");
    }
    let board = builder.build();

    let mut pipeline = LayoutPipeline::new(&board, &LayoutConfig::default());
    pipeline.solve().unwrap();
    assert_eq!(pipeline.partitions().len(), 220);
    assert!(pipeline.state().iterations > schemapack_config::DEFAULT_MAX_ITERATIONS);
    assert_eq!(
        pipeline.state().max_iterations,
        schemapack_layout::scaled_budget(220, 220)
    );
    let output = pipeline.output().unwrap();
    assert!(output.places_exactly(&board));
    assert!(output.overlapping_chips(&board).is_empty());
}

#[test]
fn step_after_solve_changes_nothing() {
    let mut pipeline = LayoutPipeline::new(&regulator_board(), &LayoutConfig::default());
    pipeline.solve().unwrap();
    let steps = pipeline.state().iterations;
    let output = pipeline.output().cloned();
    pipeline.step();
    assert_eq!(pipeline.state().iterations, steps);
    assert_eq!(pipeline.output().cloned(), output);
}

#[test]
fn config_file_changes_partition_spacing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("schemapack.toml"),
        "[spacing]\npartition_gap = 5.0\n\n[packing]\norder = \"largest_first\"\n",
    )
    .unwrap();
    let config = load_config(dir.path()).unwrap();

    let problem = regulator_board();
    let layout = layout_problem(&problem, &config).unwrap();
    let j1 = layout.chip_bounds(&problem, &ChipId::from("J1")).unwrap();
    for id in ["U1", "C1", "C2", "R1", "R2"] {
        let other = layout.chip_bounds(&problem, &ChipId::from(id)).unwrap();
        assert!(!j1.overlaps(&other, 4.9), "J1 is within 4.9 of {id}");
    }
}

#[test]
fn missing_pin_record_names_first_phase() {
    let mut parts = regulator_board().into_parts();
    parts.chip_pins.shift_remove(&PinId::from("R2.2"));
    let broken = Problem::from_parts(parts);
    let err = layout_problem(&broken, &LayoutConfig::default()).unwrap_err();
    assert_eq!(err.phase(), Some(LayoutPhase::ChipPartitions));
    assert!(matches!(
        err,
        LayoutError::PhaseFailed {
            source: SolverError::Structural { .. },
            ..
        }
    ));
}
