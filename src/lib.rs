//! Turn a browserify or webpack bundle back into one file per module.
//!
//! The input is the normalized module list a decoder extracts from the bundle
//! (id, closure code tree, optional specifier lookup table). The pipeline
//! places every module on disk from the chain of specifiers that reaches it
//! from the entry point, rewrites loader calls to relative `require` paths
//! and renames the minified closure parameters.

// Owned code tree and its printer
pub mod ast;
pub mod printer;

// Module records and the reference graph between them
pub mod module;
pub mod module_graph;
pub use module::{KnownPaths, Module, ModuleId};
pub use module_graph::ModuleGraph;

// Placement of modules and the specifiers between them
pub mod location;
pub mod relative;
pub use location::{LocationResolver, PackageRoot, ResolvedLocation};

// Scope-aware rewrites of closure parameters
pub mod rewrite;

// Run configuration, diagnostics and errors
pub mod diagnostics;
pub mod error;
pub mod options;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{DebundleError, Result};
pub use options::{BundlerKind, Hooks, ReplaceMode, ShadowPolicy, TransformOptions};

// Driving a whole run
pub mod output;
pub mod pipeline;
pub use pipeline::{debundle, resolve_locations, transform_modules};

pub mod cli;
pub mod tracing_config;
