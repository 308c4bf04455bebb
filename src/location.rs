//! Module Location Resolution
//!
//! Turns a module id into the file it should be written to, relative to the
//! output root and without an extension:
//!
//! - Known path overrides win outright
//! - Otherwise the first reference chain from the entry point is reduced to
//!   a path, crossing into `node_modules/<pkg>` when a hop uses a bare
//!   package specifier
//! - Modules with no usable graph data get a stable name derived from their id
//!
//! ```text
//! ['./foo']                 => foo
//! ['./foo', './bar/baz']    => foo/bar/baz
//! ['uuid', './lib/rnd']     => node_modules/uuid/lib/rnd
//! ['abc', './x', 'uuid']    => node_modules/uuid        (or .../uuid/index)
//! ```
//!
//! Results are pure functions of (module set, known paths, entry id) and are
//! memoized per module id for the lifetime of the resolver.

use std::fmt;
use std::hash::Hasher;

use rustc_hash::{FxHashMap, FxHasher};
use tracing::debug;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{DebundleError, Result};
use crate::module::{KnownPaths, ModuleId};
use crate::module_graph::{Chain, Hop, ModuleGraph};

/// Directory third-party packages are placed under.
pub const PACKAGE_DIR: &str = "node_modules";

const INDEX: &str = "index";

/// How a location that stops at a package root is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageRoot {
    /// `node_modules/pkg/index`, used for importers so that "directory of"
    /// lands inside the package
    AsIndex,
    /// `node_modules/pkg`, used for import targets so references can omit
    /// the trailing `/index`
    Bare,
}

/// Where a module's chain came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainSource {
    KnownPath,
    Graph,
    EntryPoint,
    Fallback,
}

/// Root-relative location of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleLocation {
    segments: Vec<String>,
    package: Option<String>,
}

impl ModuleLocation {
    /// Path segments from the output root.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Package this module lives in, if its chain crossed a package boundary.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Segments below the package root, or all segments outside a package.
    pub fn package_subpath(&self) -> &[String] {
        match &self.package {
            Some(pkg) => &self.segments[package_prefix_len(pkg).min(self.segments.len())..],
            None => &self.segments,
        }
    }

    /// Segments of the directory containing this file.
    pub fn dir_segments(&self) -> &[String] {
        &self.segments[..self.segments.len().saturating_sub(1)]
    }

    pub fn relative_path(&self) -> String {
        self.segments.join("/")
    }
}

/// A module location anchored at an output root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedLocation {
    path: String,
    location: ModuleLocation,
}

impl ResolvedLocation {
    fn new(root: &str, location: ModuleLocation) -> Self {
        let relative = location.relative_path();
        let path = match root {
            "" => relative,
            "/" => format!("/{relative}"),
            _ => format!("{root}/{relative}"),
        };
        Self { path, location }
    }

    /// Slash-separated path including the output root.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn location(&self) -> &ModuleLocation {
        &self.location
    }
}

impl fmt::Display for ResolvedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Resolves and caches module locations for one run.
pub struct LocationResolver<'a> {
    graph: &'a ModuleGraph,
    known_paths: &'a KnownPaths,
    entry: ModuleId,
    file_ext: Option<String>,
    chains: FxHashMap<ModuleId, (Chain, ChainSource)>,
    locations: FxHashMap<(ModuleId, PackageRoot), ModuleLocation>,
    diagnostics: Diagnostics,
}

impl<'a> LocationResolver<'a> {
    pub fn new(graph: &'a ModuleGraph, known_paths: &'a KnownPaths, entry: ModuleId) -> Self {
        Self {
            graph,
            known_paths,
            entry,
            file_ext: None,
            chains: FxHashMap::default(),
            locations: FxHashMap::default(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Strip `<ext>` (or `<ext>/index`) from the end of resolved paths.
    pub fn with_file_ext(mut self, ext: Option<String>) -> Self {
        self.file_ext = ext.filter(|e| !e.is_empty());
        self
    }

    pub fn graph(&self) -> &'a ModuleGraph {
        self.graph
    }

    pub fn entry(&self) -> &ModuleId {
        &self.entry
    }

    /// Diagnostics recorded while choosing chains, drained.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Location of `id` under `output_root`.
    pub fn resolve_location(
        &mut self,
        id: &ModuleId,
        output_root: &str,
        package_root: PackageRoot,
    ) -> Result<ResolvedLocation> {
        let location = self.module_location(id, package_root)?;
        Ok(ResolvedLocation::new(&normalize_root(output_root), location))
    }

    /// Root-relative location of `id`, memoized.
    pub fn module_location(&mut self, id: &ModuleId, package_root: PackageRoot) -> Result<ModuleLocation> {
        let key = (id.clone(), package_root);
        if let Some(cached) = self.locations.get(&key) {
            return Ok(cached.clone());
        }

        let (chain, source) = self.chain_for(id);
        let location = reduce_chain(id, &chain, package_root, self.file_ext.as_deref())?;
        debug!(module = %id, ?source, path = %location.relative_path(), "resolved location");

        self.locations.insert(key, location.clone());
        Ok(location)
    }

    /// The chain a module's location is derived from.
    pub fn chain_for(&mut self, id: &ModuleId) -> (Chain, ChainSource) {
        if let Some(cached) = self.chains.get(id) {
            return cached.clone();
        }

        let selected = self.select_chain(id);
        self.chains.insert(id.clone(), selected.clone());
        selected
    }

    fn select_chain(&mut self, id: &ModuleId) -> (Chain, ChainSource) {
        if let Some(path) = self.known_paths.get(id) {
            return (vec![Hop::new(id.clone(), path)], ChainSource::KnownPath);
        }

        if *id == self.entry {
            return (Vec::new(), ChainSource::EntryPoint);
        }

        if self.graph.lookup(id).is_some() {
            debug!(module = %id, "reconstructing reference chain");
            if let Some(chain) = self.graph.first_complete_chain(&self.entry, id) {
                return (chain, ChainSource::Graph);
            }
            self.diagnostics.warn(
                id,
                DiagnosticKind::Unreachable,
                format!(
                    "no reference chain from entry point {} reaches this module, using its id as the file name",
                    self.entry
                ),
            );
        } else {
            let message = "no lookup table or known path, using its id as the file name";
            if self.graph.modules().any(|m| m.lookup.is_some()) {
                self.diagnostics
                    .warn(id, DiagnosticKind::MissingGraphData, message);
            } else {
                // The bundler never embeds lookup tables; every module lands here.
                self.diagnostics
                    .info(id, DiagnosticKind::MissingGraphData, message);
            }
        }

        let path = format!("./{}", fallback_file_name(id));
        (vec![Hop::new(id.clone(), path)], ChainSource::Fallback)
    }
}

/// Reduce a chain to a root-relative location.
///
/// A bare specifier moves the walk to the root of that package and discards
/// everything accumulated so far. Relative specifiers stack: each hop's
/// segments are appended to the previous ones, so a module that imports
/// others becomes the directory those imports resolve against.
pub fn reduce_chain(
    id: &ModuleId,
    chain: &Chain,
    package_root: PackageRoot,
    file_ext: Option<&str>,
) -> Result<ModuleLocation> {
    let mut package: Option<String> = None;
    let mut segments: Vec<String> = Vec::new();
    let mut base = 0;
    // Levels above the root, and the hop where the walk first left it.
    let mut above = 0usize;
    let mut escaped_at: Option<usize> = None;

    for (index, hop) in chain.iter().enumerate() {
        let mut specifier = hop.path.as_str();
        if specifier.is_empty() {
            continue;
        }

        if let Some(rooted) = specifier.strip_prefix('/') {
            // Anchored at the output root.
            segments.clear();
            base = 0;
            package = None;
            above = 0;
            escaped_at = None;
            specifier = rooted;
        } else if !is_relative(specifier) {
            let parts: Vec<&str> = specifier.split('/').filter(|part| !part.is_empty()).collect();
            segments = std::iter::once(PACKAGE_DIR)
                .chain(parts.iter().copied())
                .map(str::to_string)
                .collect();
            base = segments.len();
            package = Some(parts.join("/"));
            above = 0;
            escaped_at = None;
            continue;
        }

        for part in specifier.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        above += 1;
                        escaped_at.get_or_insert(index);
                    } else if segments.len() < base {
                        // Walked out of the package into its parent directory.
                        package = None;
                        base = 0;
                    }
                }
                name => {
                    if above > 0 {
                        continue;
                    }
                    segments.push(name.to_string());
                }
            }
        }
    }

    if let Some(index) = escaped_at {
        return Err(DebundleError::EscapesOutputRoot {
            module: id.clone(),
            path: std::iter::repeat_n("..", above)
                .map(str::to_string)
                .chain(segments)
                .collect::<Vec<_>>()
                .join("/"),
            levels: above,
            hop: index + 1,
            hops: chain.len(),
            trail: describe_chain(chain),
        });
    }

    if segments.len() == base && (package.is_none() || package_root == PackageRoot::AsIndex) {
        segments.push(INDEX.to_string());
    }

    if let Some(ext) = file_ext {
        trim_extension(&mut segments, base, ext);
    }

    Ok(ModuleLocation { segments, package })
}

/// Strip a trailing `<ext>/index` or `<ext>` left by the reduction. The
/// package name itself is never trimmed.
fn trim_extension(segments: &mut Vec<String>, base: usize, ext: &str) {
    let len = segments.len();
    if len >= 2
        && len - 1 > base
        && segments[len - 1] == INDEX
        && segments[len - 2].len() > ext.len()
        && segments[len - 2].ends_with(ext)
    {
        segments.pop();
    }

    if segments.len() > base
        && let Some(last) = segments.last_mut()
        && last.len() > ext.len()
        && last.ends_with(ext)
    {
        last.truncate(last.len() - ext.len());
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with('.')
}

fn package_prefix_len(package: &str) -> usize {
    1 + package.split('/').count()
}

fn describe_chain(chain: &Chain) -> String {
    chain
        .iter()
        .map(|hop| format!("{} ({})", hop.id, hop.path))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Normalize an output root: slash-separated, no `.` segments, no trailing
/// separator. An absolute root keeps its leading `/`.
pub fn normalize_root(root: &str) -> String {
    let root = root.replace('\\', "/");
    let absolute = root.starts_with('/');
    let joined = root
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/");
    match (absolute, joined.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{joined}"),
        (false, _) => joined,
    }
}

/// File name for a module nothing else tells us how to place.
///
/// Numeric ids are used as-is. String ids (usually source paths in
/// development builds) are reduced to a single safe path segment; when that
/// changes the text, or the text reads as a number, a hash of the original id
/// is appended so distinct ids cannot collide.
pub fn fallback_file_name(id: &ModuleId) -> String {
    match id {
        ModuleId::Num(n) => n.to_string(),
        ModuleId::Str(raw) => {
            let mut sanitized: String = raw
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                        c
                    } else {
                        '_'
                    }
                })
                .collect();
            if sanitized.starts_with('.') {
                sanitized.replace_range(..1, "_");
            }
            if sanitized.is_empty() {
                sanitized.push('_');
            }

            // Numeric-looking strings would land on the same name as `Num` ids.
            if sanitized == *raw && raw.parse::<u64>().is_err() {
                sanitized
            } else {
                let mut hasher = FxHasher::default();
                hasher.write(raw.as_bytes());
                format!("{sanitized}_{:08x}", hasher.finish() as u32)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/location_tests.rs"]
mod tests;
