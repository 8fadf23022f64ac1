//! Phase 4: separate chips that still overlap after packing.

use crate::output::Placement;
use indexmap::IndexMap;
use schemapack_common::{Bounds, ChipId};
use schemapack_diagnostics::{Diagnostic, DiagnosticCode, Subject};
use schemapack_model::Problem;
use schemapack_solver::{Graphic, Solver, SolverState};

/// One overlapping pair found inside a partition.
struct Overlap {
    partition: usize,
    fixed: Bounds,
    fixed_id: ChipId,
    moved: ChipId,
    moved_box: Bounds,
    /// Every chip placed before `moved`; none of them overlap each other.
    settled: Vec<Bounds>,
}

/// A direction a chip can be pushed in, in tie-break order.
#[derive(Debug, Clone, Copy)]
enum Push {
    Right,
    Left,
    Up,
    Down,
}

impl Push {
    const ALL: [Push; 4] = [Push::Right, Push::Left, Push::Up, Push::Down];

    /// How far `moved` travels in this direction to sit `gap` past `fixed`.
    fn distance(self, moved: &Bounds, fixed: &Bounds, gap: f64) -> f64 {
        match self {
            Push::Right => fixed.max_x + gap - moved.min_x,
            Push::Left => moved.max_x - (fixed.min_x - gap),
            Push::Up => fixed.max_y + gap - moved.min_y,
            Push::Down => moved.max_y - (fixed.min_y - gap),
        }
    }

    fn offset(self, distance: f64) -> (f64, f64) {
        match self {
            Push::Right => (distance, 0.0),
            Push::Left => (-distance, 0.0),
            Push::Up => (0.0, distance),
            Push::Down => (0.0, -distance),
        }
    }
}

/// The shortest straight push that takes `moved` clear of `fixed` and of
/// every settled chip, keeping `gap` to each.
///
/// A push that lands on a settled chip continues past it in the same
/// direction, so every direction ends clear; ties keep the earlier
/// direction of [`Push::ALL`].
fn clearing_offset(moved: Bounds, fixed: &Bounds, settled: &[Bounds], gap: f64) -> (f64, f64) {
    let mut best: Option<(f64, Push)> = None;
    for push in Push::ALL {
        let mut distance = push.distance(&moved, fixed, gap);
        loop {
            let (dx, dy) = push.offset(distance);
            let shifted = moved.translated(dx, dy);
            let Some(blocker) = settled.iter().find(|b| b.overlaps(&shifted, gap)) else {
                break;
            };
            distance += push.distance(&shifted, blocker, gap);
        }
        let shorter = match best {
            Some((d, _)) => distance < d,
            None => true,
        };
        if shorter {
            best = Some((distance, push));
        }
    }
    best.map_or((0.0, 0.0), |(distance, push)| push.offset(distance))
}

/// Resolves one overlapping chip pair per step.
///
/// Chips settle in partition order. Each step finds the first chip that
/// overlaps one placed before it and moves it by the shortest straight push
/// that clears every earlier chip by the partition's chip gap. The settled
/// prefix only grows, so each chip moves at most once and the phase needs
/// at most one step per chip, plus the step that finds no overlap.
pub struct PinRangeOverlapSolver {
    state: SolverState,
    partitions: Vec<Problem>,
    placements: Vec<IndexMap<ChipId, Placement>>,
    moves: Vec<Diagnostic>,
}

impl PinRangeOverlapSolver {
    /// Creates the solver over per-partition placements.
    pub fn new(
        partitions: Vec<Problem>,
        placements: Vec<IndexMap<ChipId, Placement>>,
        max_iterations: u64,
    ) -> Self {
        Self {
            state: SolverState::new("PinRangeOverlapSolver", max_iterations),
            partitions,
            placements,
            moves: Vec::new(),
        }
    }

    /// Placements after overlap resolution.
    pub fn placements(&self) -> &[IndexMap<ChipId, Placement>] {
        &self.placements
    }

    /// One note per chip moved.
    pub fn moves(&self) -> &[Diagnostic] {
        &self.moves
    }

    fn boxes(&self, index: usize) -> Vec<(&ChipId, Bounds)> {
        let (Some(partition), Some(placements)) =
            (self.partitions.get(index), self.placements.get(index))
        else {
            return Vec::new();
        };
        placements
            .iter()
            .filter_map(|(id, p)| {
                let chip = partition.chip(id)?;
                Some((id, Bounds::from_center(p.center(), chip.size.rotated(p.rotation))))
            })
            .collect()
    }

    fn find_overlap(&self) -> Option<Overlap> {
        for index in 0..self.placements.len() {
            let boxes = self.boxes(index);
            for (j, (b, box_b)) in boxes.iter().enumerate() {
                let earlier = &boxes[..j];
                if let Some((a, box_a)) = earlier.iter().find(|(_, a)| a.overlaps(box_b, 0.0)) {
                    return Some(Overlap {
                        partition: index,
                        fixed: *box_a,
                        fixed_id: (*a).clone(),
                        moved: (*b).clone(),
                        moved_box: *box_b,
                        settled: earlier.iter().map(|(_, bounds)| *bounds).collect(),
                    });
                }
            }
        }
        None
    }
}

impl Solver for PinRangeOverlapSolver {
    fn state(&self) -> &SolverState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    fn iterate(&mut self) {
        let Some(overlap) = self.find_overlap() else {
            self.state.mark_solved();
            return;
        };

        let gap = self
            .partitions
            .get(overlap.partition)
            .map_or(0.0, |p| p.chip_gap());
        let (dx, dy) = clearing_offset(overlap.moved_box, &overlap.fixed, &overlap.settled, gap);

        if let Some(p) = self
            .placements
            .get_mut(overlap.partition)
            .and_then(|m| m.get_mut(&overlap.moved))
        {
            *p = p.translated(dx, dy);
        }
        tracing::debug!(chip = %overlap.moved, dx, dy, "resolved chip overlap");
        self.moves.push(Diagnostic::note(
            DiagnosticCode::OVERLAP_RESOLVED,
            format!(
                "moved by ({dx:.3}, {dy:.3}) to clear chip `{}`",
                overlap.fixed_id
            ),
            Subject::Chip(overlap.moved),
        ));
    }

    fn render(&self) -> Graphic {
        let mut graphic = Graphic::titled("overlap resolution");
        for index in 0..self.placements.len() {
            for (id, bounds) in self.boxes(index) {
                graphic.rect(bounds, id.as_str());
            }
        }
        graphic
    }

    fn constructor_params(&self) -> serde_json::Value {
        serde_json::json!({
            "partitions": self.partitions.len(),
            "placements": self.placements,
        })
    }
}
