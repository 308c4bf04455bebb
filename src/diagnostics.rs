//! Per-module diagnostics.
//!
//! Recoverable problems are recorded here, keyed by module id, so a run can
//! finish and the operator can add targeted `knownPaths` overrides next time.
//! Every entry is mirrored to `tracing` when it is recorded.

use std::fmt;

use tracing::{info, warn};

use crate::module::ModuleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A loader call names a module id that is not in the bundle.
    UnresolvedReference { target: String },
    /// No lookup table and no known path; the id-derived filename was used.
    MissingGraphData,
    /// The module has a lookup table but no chain from the entry point reaches it.
    Unreachable,
    /// The module root is not a function.
    NotAFunction,
    /// The module closure takes no parameters.
    NoParameters,
    /// An alias declaration could not be prepended (expression-bodied closure).
    AliasSkipped { name: String },
    /// Two modules resolved to the same file.
    LocationCollision { other: ModuleId, path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub module: ModuleId,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module {}: {}", self.module, self.message)
    }
}

/// Collected diagnostics for one run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, module: &ModuleId, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(module, Severity::Warning, kind, message.into());
    }

    pub fn info(&mut self, module: &ModuleId, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(module, Severity::Info, kind, message.into());
    }

    pub fn push(&mut self, module: &ModuleId, severity: Severity, kind: DiagnosticKind, message: String) {
        match severity {
            Severity::Warning => warn!(module = %module, "{message}"),
            Severity::Info => info!(module = %module, "{message}"),
        }
        self.entries.push(Diagnostic {
            module: module.clone(),
            severity,
            kind,
            message,
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn for_module<'a>(&'a self, module: &'a ModuleId) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| &d.module == module)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
