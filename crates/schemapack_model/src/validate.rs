//! Structural validation of a [`Problem`].
//!
//! Missing pin records on chips or groups are errors: no layout can place a
//! pin it knows nothing about. Connection entries that point at unknown pins
//! or nets are warnings, because every algorithm treats them as absent edges.

use crate::problem::Problem;
use schemapack_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Subject};
use std::collections::HashSet;

impl Problem {
    /// Reports structural problems into `sink`.
    ///
    /// Returns `true` when no error-severity diagnostic was emitted, i.e.
    /// the problem can be laid out.
    pub fn validate(&self, sink: &DiagnosticSink) -> bool {
        let mut ok = true;

        for chip in self.chips().values() {
            for pin in &chip.pin_ids {
                if self.chip_pin(pin).is_none() {
                    ok = false;
                    sink.emit(Diagnostic::error(
                        DiagnosticCode::MISSING_CHIP_PIN,
                        format!("chip lists pin `{pin}` which has no chip-pin record"),
                        Subject::Chip(chip.id.clone()),
                    ));
                }
            }
        }

        for group in self.groups().values() {
            for pin in &group.pin_ids {
                if !self.group_pins().contains_key(pin) {
                    ok = false;
                    sink.emit(Diagnostic::error(
                        DiagnosticCode::MISSING_GROUP_PIN,
                        format!("group lists pin `{pin}` which has no group-pin record"),
                        Subject::Group(group.id.clone()),
                    ));
                }
            }
        }

        let mut reported = HashSet::new();
        for (a, b, connected) in self.strong().entries() {
            for pin in [a, b] {
                if self.pin_owner(pin).is_none() && reported.insert(pin.clone()) {
                    sink.emit(
                        Diagnostic::warning(
                            DiagnosticCode::DANGLING_STRONG_PIN,
                            format!("strong connection references unknown pin `{pin}`"),
                            Subject::Pin(pin.clone()),
                        )
                        .with_note("the connection is ignored when partitioning"),
                    );
                }
            }
            if connected && !self.strong().contains_key(b, a) {
                sink.emit(Diagnostic::warning(
                    DiagnosticCode::ASYMMETRIC_STRONG,
                    format!("strong connection `{a}-{b}` is stored in one direction only"),
                    Subject::Pin(a.clone()),
                ));
            }
        }

        for (pin, net, _) in self.weak().entries() {
            if self.pin_owner(pin).is_none() {
                sink.emit(Diagnostic::warning(
                    DiagnosticCode::DANGLING_WEAK_REFERENCE,
                    format!("weak connection references unknown pin `{pin}`"),
                    Subject::Pin(pin.clone()),
                ));
            }
            if !self.nets().contains_key(net) {
                sink.emit(Diagnostic::warning(
                    DiagnosticCode::DANGLING_WEAK_REFERENCE,
                    format!("weak connection references unknown net `{net}`"),
                    Subject::Net(net.clone()),
                ));
            }
        }

        ok
    }
}
