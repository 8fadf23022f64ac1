//! Diagnostic codes with category prefixes.
//!
//! Codes are stable across releases so callers can filter on them. The
//! well-known codes emitted by problem validation are defined here as
//! constants rather than scattered as literals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Structural errors that make a problem unusable, prefixed with `E`.
    Error,
    /// Suspicious input the engine works around, prefixed with `W`.
    Warning,
    /// Findings from the layout phases themselves, prefixed with `L`.
    Layout,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Layout => 'L',
        }
    }
}

/// A category prefix plus a number, displayed as e.g. `E101`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// A chip lists a pin that has no chip-pin record.
    pub const MISSING_CHIP_PIN: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
    /// A group lists a pin that has no group-pin record.
    pub const MISSING_GROUP_PIN: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);
    /// A strong connection names a pin that does not exist.
    pub const DANGLING_STRONG_PIN: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);
    /// A weak connection names a pin or net that does not exist.
    pub const DANGLING_WEAK_REFERENCE: DiagnosticCode =
        DiagnosticCode::new(Category::Warning, 202);
    /// A strong connection is stored in only one direction.
    pub const ASYMMETRIC_STRONG: DiagnosticCode = DiagnosticCode::new(Category::Warning, 203);
    /// Overlap resolution had to move a chip after packing.
    pub const OVERLAP_RESOLVED: DiagnosticCode = DiagnosticCode::new(Category::Layout, 301);

    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
