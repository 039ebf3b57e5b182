use std::fmt::Write;

use miette::Diagnostic;

/// Renders a diagnostic as plain text for inline snapshots: its message and help, those of every nested diagnostic,
/// then each top-level label next to the first line of the source it points at
pub(crate) fn render_diagnostic(source: &str, diagnostic: &dyn Diagnostic) -> String {
    let mut out = String::new();

    let mut current = Some(diagnostic);
    while let Some(diagnostic) = current {
        writeln!(out, "{diagnostic}").unwrap();
        if let Some(help) = diagnostic.help() {
            writeln!(out, "help: {help}").unwrap();
        }
        current = diagnostic.diagnostic_source();
    }

    for label in diagnostic.labels().into_iter().flatten() {
        let start = label.offset();
        let snippet = source[start..start + label.len()]
            .lines()
            .next()
            .unwrap_or_default()
            .trim();
        writeln!(out, "[{}] {snippet}", label.label().unwrap_or_default()).unwrap();
    }

    out
}
