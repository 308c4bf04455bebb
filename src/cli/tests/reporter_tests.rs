use std::path::Path;

use super::reporter::Reporter;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::module::ModuleId;
use crate::module_graph::ModuleGraphStats;
use crate::pipeline::DebundleReport;

fn diagnostics() -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    diagnostics.warn(
        &ModuleId::Num(2),
        DiagnosticKind::UnresolvedReference {
            target: "9".to_string(),
        },
        "module 9 cannot be found, leaving the loader call unchanged",
    );
    diagnostics.info(
        &ModuleId::Num(5),
        DiagnosticKind::MissingGraphData,
        "no lookup table or known path, using its id as the file name",
    );
    diagnostics
}

#[test]
fn renders_plain_diagnostics() {
    let reporter = Reporter::new(false);
    assert_eq!(
        reporter.render(&diagnostics()),
        "module 2 - warning: module 9 cannot be found, leaving the loader call unchanged\n\
         module 5 - info: no lookup table or known path, using its id as the file name"
    );
}

#[test]
fn renders_summary_with_warning_count() {
    let report = DebundleReport {
        modules: Vec::new(),
        placements: Vec::new(),
        diagnostics: diagnostics(),
        graph: ModuleGraphStats {
            total_modules: 5,
            total_edges: 4,
            modules_without_lookup: 1,
            dangling_edges: 0,
        },
    };
    let summary = Reporter::new(false).render_summary(&report, 5, Path::new("out"));

    assert_eq!(
        summary,
        "0 modules, 0 references rewritten, 0 left unresolved, 0 skipped\n\
         graph: 4 edges, 1 modules without lookup tables, 0 dangling edges\n\
         Wrote 5 files to out (1 warnings)"
    );
}
