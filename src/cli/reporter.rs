use colored::Colorize;
use std::path::Path;

use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::pipeline::DebundleReport;

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    /// One line per diagnostic, in the order they were recorded.
    pub fn render(&self, diagnostics: &Diagnostics) -> String {
        let mut out = String::new();
        for (index, diagnostic) in diagnostics.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_diagnostic(diagnostic));
        }
        out
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let module = format!("module {}", diagnostic.module);
        let module = if self.color {
            module.bold().to_string()
        } else {
            module
        };

        format!(
            "{} - {}: {}",
            module,
            self.format_severity(diagnostic.severity),
            diagnostic.message
        )
    }

    /// Closing summary: counts, and where the files went.
    pub fn render_summary(&self, report: &DebundleReport, written: usize, out_dir: &Path) -> String {
        let resolved: usize = report.modules.iter().map(|m| m.references.resolved).sum();
        let unresolved: usize = report.modules.iter().map(|m| m.references.unresolved).sum();
        let skipped = report.modules.iter().filter(|m| m.skipped).count();
        let warnings = report.diagnostics.warning_count();

        let mut lines = vec![format!(
            "{} modules, {} references rewritten, {} left unresolved, {} skipped",
            report.modules.len(),
            resolved,
            unresolved,
            skipped
        )];
        if report.graph.modules_without_lookup > 0 || report.graph.dangling_edges > 0 {
            lines.push(format!(
                "graph: {} edges, {} modules without lookup tables, {} dangling edges",
                report.graph.total_edges, report.graph.modules_without_lookup, report.graph.dangling_edges
            ));
        }

        let written = format!("Wrote {} files to {}", written, out_dir.display());
        let status = match (warnings, self.color) {
            (0, true) => written.green().bold().to_string(),
            (0, false) => written,
            (n, true) => format!("{} ({})", written.green().bold(), format!("{n} warnings").yellow()),
            (n, false) => format!("{written} ({n} warnings)"),
        };
        lines.push(status);

        lines.join("\n")
    }

    fn format_severity(&self, severity: Severity) -> String {
        let label = match severity {
            Severity::Warning => "warning",
            Severity::Info => "info",
        };

        if !self.color {
            return label.to_string();
        }

        match severity {
            Severity::Warning => label.yellow().bold().to_string(),
            Severity::Info => label.cyan().bold().to_string(),
        }
    }
}
