//! Diagnostic messages about layout problems.

use crate::code::DiagnosticCode;
use schemapack_common::{ChipId, GroupId, NetId, PinId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a diagnostic message, least severe first.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// Additional context that does not indicate a problem.
    Note,
    /// Input the engine tolerates but which is probably a mistake.
    Warning,
    /// Input that prevents a layout from being computed.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// The layout entity a diagnostic is about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    /// The problem as a whole.
    Problem,
    /// A chip.
    Chip(ChipId),
    /// A pin of a chip or group.
    Pin(PinId),
    /// A group.
    Group(GroupId),
    /// A net.
    Net(NetId),
    /// A pipeline phase.
    Phase(String),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Problem => write!(f, "problem"),
            Subject::Chip(id) => write!(f, "chip `{id}`"),
            Subject::Pin(id) => write!(f, "pin `{id}`"),
            Subject::Group(id) => write!(f, "group `{id}`"),
            Subject::Net(id) => write!(f, "net `{id}`"),
            Subject::Phase(name) => write!(f, "phase `{name}`"),
        }
    }
}

/// A structured diagnostic message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The stable code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// The entity the diagnostic is about.
    pub subject: Subject,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        subject: Subject,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            subject,
            notes: Vec::new(),
        }
    }

    /// Creates an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, subject: Subject) -> Self {
        Self::with_severity(Severity::Error, code, message, subject)
    }

    /// Creates a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, subject: Subject) -> Self {
        Self::with_severity(Severity::Warning, code, message, subject)
    }

    /// Creates a note diagnostic.
    pub fn note(code: DiagnosticCode, message: impl Into<String>, subject: Subject) -> Self {
        Self::with_severity(Severity::Note, code, message, subject)
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}
