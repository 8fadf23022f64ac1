//! Diagnostic rendering backends.

use crate::diagnostic::Diagnostic;

/// Formats diagnostics for a particular output target.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;

    /// Renders every diagnostic in order, concatenated.
    fn render_all(&self, diags: &[Diagnostic]) -> String {
        diags.iter().map(|d| self.render(d)).collect()
    }
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// ```text
/// warning[W201]: strong connection references unknown pin `X.p1`
///   --> pin `X.p1`
///    = note: the connection is ignored when partitioning
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in the header line.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header(&self, diag: &Diagnostic) -> String {
        let label = format!("{}[{}]", diag.severity, diag.code);
        if !self.color {
            return label;
        }
        let ansi = if diag.severity.is_error() { "31" } else { "33" };
        format!("\x1b[1;{ansi}m{label}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = format!("{}: {}\n", self.header(diag), diag.message);
        out.push_str(&format!("  --> {}\n", diag.subject));
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::DiagnosticCode;
    use crate::diagnostic::Subject;
    use schemapack_common::PinId;

    #[test]
    fn render_warning_with_note() {
        let diag = Diagnostic::warning(
            DiagnosticCode::DANGLING_STRONG_PIN,
            "strong connection references unknown pin `X.p1`",
            Subject::Pin(PinId::from("X.p1")),
        )
        .with_note("the connection is ignored when partitioning");

        let output = TerminalRenderer::new(false).render(&diag);
        assert!(output.starts_with("warning[W201]: strong connection"));
        assert!(output.contains("  --> pin `X.p1`\n"));
        assert!(output.contains("= note: the connection is ignored when partitioning"));
    }

    #[test]
    fn color_wraps_header_only() {
        let diag = Diagnostic::error(DiagnosticCode::MISSING_CHIP_PIN, "bad", Subject::Problem);
        let output = TerminalRenderer::new(true).render(&diag);
        assert!(output.starts_with("\x1b[1;31merror[E101]\x1b[0m: bad"));
    }

    #[test]
    fn render_all_concatenates() {
        let diags = vec![
            Diagnostic::error(DiagnosticCode::MISSING_CHIP_PIN, "one", Subject::Problem),
            Diagnostic::warning(DiagnosticCode::ASYMMETRIC_STRONG, "two", Subject::Problem),
        ];
        let output = TerminalRenderer::new(false).render_all(&diags);
        assert_eq!(output.matches("-->").count(), 2);
    }
}
