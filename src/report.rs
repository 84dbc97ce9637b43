//! Renders an evaluation trace for the terminal

use crate::engine::{Evaluation, Verdict};
use std::fmt::Write;

/// Render the trace the way the tool prints it: one section header per
/// check, one `*` line per result, then the verdict.
pub fn render_text(evaluation: &Evaluation) -> String {
    let mut out = String::new();
    for outcome in &evaluation.outcomes {
        let _ = writeln!(out, "checking {}", outcome.kind.label());
        let _ = writeln!(out, "* {}", outcome.detail);
    }
    let verdict_line = match evaluation.verdict {
        Verdict::Allowed => "connection allowed",
        Verdict::Blocked => "connection blocked",
        Verdict::Indeterminate => "cannot determine connectivity",
    };
    let _ = writeln!(out, "{verdict_line}");
    out
}

/// Render the full trace as pretty JSON
pub fn render_json(evaluation: &Evaluation) -> serde_json::Result<String> {
    serde_json::to_string_pretty(evaluation)
}
