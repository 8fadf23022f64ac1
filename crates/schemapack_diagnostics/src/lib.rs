//! Structured diagnostics for layout problems.
//!
//! A [`Diagnostic`] names a severity, a stable [`DiagnosticCode`], the layout
//! entity it is about ([`Subject`]) and free-form notes. Solvers accumulate
//! diagnostics in a [`DiagnosticSink`] and callers format them with a
//! [`DiagnosticRenderer`] such as [`TerminalRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::{Diagnostic, Severity, Subject};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use sink::DiagnosticSink;
