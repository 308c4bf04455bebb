//! Debundling pipeline.
//!
//! Drives the per-module rewrites and the placement of every module on disk:
//!
//! 1. root-shape check (the module must be a closure with parameters)
//! 2. loader calls rewritten to relative specifiers, plus the loader alias
//! 3. module-object and exports-object bindings renamed or aliased
//! 4. caller-supplied module hooks
//!
//! [`debundle`] runs both stages over one shared [`LocationResolver`], so
//! every chain is selected (and every location diagnostic recorded) once.

use tracing::{debug, info, info_span};

use crate::ast::Node;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::location::{LocationResolver, PackageRoot, ResolvedLocation};
use crate::module::{Module, ModuleId};
use crate::module_graph::{ModuleGraph, ModuleGraphStats};
use crate::options::{EXPORTS_NAME, Hooks, LOADER_NAME, MODULE_NAME, TransformOptions};
use crate::rewrite::alias::inject_alias;
use crate::rewrite::reference::{ReferenceRewriter, ReferenceStats};
use crate::rewrite::{RewriteSite, ShadowResolver, TargetedRewriter, rename_to};

/// What happened to one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReport {
    pub id: ModuleId,
    /// The root was not a closure with parameters; nothing was rewritten.
    pub skipped: bool,
    pub references: ReferenceStats,
    /// Module-object and exports-object sites renamed
    pub renamed: usize,
    /// Alias declarations prepended
    pub aliases: usize,
}

impl ModuleReport {
    fn new(id: ModuleId) -> Self {
        Self {
            id,
            skipped: false,
            references: ReferenceStats::default(),
            renamed: 0,
            aliases: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct TransformReport {
    pub modules: Vec<ModuleReport>,
    pub diagnostics: Diagnostics,
}

impl TransformReport {
    pub fn skipped(&self) -> usize {
        self.modules.iter().filter(|m| m.skipped).count()
    }

    pub fn references_resolved(&self) -> usize {
        self.modules.iter().map(|m| m.references.resolved).sum()
    }

    pub fn references_unresolved(&self) -> usize {
        self.modules.iter().map(|m| m.references.unresolved).sum()
    }
}

/// A module and the location it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub id: ModuleId,
    pub location: ResolvedLocation,
}

#[derive(Debug, Default)]
pub struct LocationReport {
    /// In module list order
    pub placements: Vec<Placement>,
    pub diagnostics: Diagnostics,
}

/// Result of a full [`debundle`] run.
#[derive(Debug)]
pub struct DebundleReport {
    pub modules: Vec<ModuleReport>,
    pub placements: Vec<Placement>,
    pub diagnostics: Diagnostics,
    pub graph: ModuleGraphStats,
}

/// Transform every module, then place every module.
pub fn debundle(
    modules: &mut [Module],
    options: &TransformOptions,
    hooks: &mut Hooks,
    prompt: &mut dyn ShadowResolver,
) -> Result<DebundleReport> {
    options.validate()?;
    let graph = ModuleGraph::from_modules(modules);
    let mut resolver = location_resolver(&graph, options);
    let mut diagnostics = Diagnostics::new();

    let reports = transform_with(modules, options, hooks, prompt, &mut resolver, &mut diagnostics)?;
    let placements = place_with(modules, options, &mut resolver)?;
    diagnostics.extend(resolver.take_diagnostics());

    Ok(DebundleReport {
        modules: reports,
        placements,
        diagnostics,
        graph: graph.stats(),
    })
}

/// Rewrite every module closure in place.
pub fn transform_modules(
    modules: &mut [Module],
    options: &TransformOptions,
    hooks: &mut Hooks,
    prompt: &mut dyn ShadowResolver,
) -> Result<TransformReport> {
    options.validate()?;
    let graph = ModuleGraph::from_modules(modules);
    let mut resolver = location_resolver(&graph, options);
    let mut diagnostics = Diagnostics::new();

    let modules = transform_with(modules, options, hooks, prompt, &mut resolver, &mut diagnostics)?;
    diagnostics.extend(resolver.take_diagnostics());
    Ok(TransformReport { modules, diagnostics })
}

/// Location of every module under the configured output root.
///
/// Fails on the first module whose location would leave the output root.
pub fn resolve_locations(modules: &[Module], options: &TransformOptions) -> Result<LocationReport> {
    options.validate()?;
    let graph = ModuleGraph::from_modules(modules);
    let mut resolver = location_resolver(&graph, options);
    let placements = place_with(modules, options, &mut resolver)?;
    Ok(LocationReport {
        placements,
        diagnostics: resolver.take_diagnostics(),
    })
}

fn location_resolver<'g>(graph: &'g ModuleGraph, options: &'g TransformOptions) -> LocationResolver<'g> {
    LocationResolver::new(graph, &options.known_paths, options.entry_point.clone())
        .with_file_ext(options.file_ext.clone())
}

fn transform_with(
    modules: &mut [Module],
    options: &TransformOptions,
    hooks: &mut Hooks,
    prompt: &mut dyn ShadowResolver,
    resolver: &mut LocationResolver<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<ModuleReport>> {
    info!(
        modules = modules.len(),
        bundler = ?options.bundler,
        entry = %options.entry_point,
        "transforming modules"
    );

    let mut reports = Vec::with_capacity(modules.len());
    for module in modules.iter_mut() {
        let span = info_span!("module", id = %module.id);
        let _guard = span.enter();
        reports.push(transform_module(module, options, hooks, prompt, resolver, diagnostics)?);
    }
    Ok(reports)
}

fn transform_module(
    module: &mut Module,
    options: &TransformOptions,
    hooks: &mut Hooks,
    prompt: &mut dyn ShadowResolver,
    resolver: &mut LocationResolver<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<ModuleReport> {
    let id = module.id.clone();
    let mut report = ModuleReport::new(id.clone());

    let Some(params) = module.code.params() else {
        diagnostics.warn(
            &id,
            DiagnosticKind::NotAFunction,
            "module root is not a function, writing it unchanged",
        );
        report.skipped = true;
        return Ok(report);
    };
    if params.is_empty() {
        diagnostics.info(
            &id,
            DiagnosticKind::NoParameters,
            "module closure takes no parameters, nothing to rewrite",
        );
        report.skipped = true;
        return Ok(report);
    }

    let slots = options.bundler.slots();
    let param = |slot: usize| params.get(slot).and_then(Node::as_identifier).map(str::to_string);
    let loader = param(slots.loader);
    let module_object = param(slots.module);
    let exports_object = param(slots.exports);

    if let Some(loader) = &loader {
        let mut references = ReferenceRewriter::new(
            &id,
            resolver,
            loader.as_str(),
            options.replace_requires,
            &mut hooks.reference,
            diagnostics,
        );
        let mut engine = TargetedRewriter::new(&id, options.shadow_policy, prompt, &mut hooks.rewrite);
        let rewrite = engine.rewrite(
            &mut module.code,
            loader,
            &mut |node: Node, site: &RewriteSite<'_>| references.update(node, site),
        )?;
        report.references = references.stats();
        debug!(
            loader = %loader,
            sites = rewrite.replaced,
            resolved = report.references.resolved,
            "loader rewritten"
        );
    }

    for (name, canonical, mode) in [
        (&module_object, MODULE_NAME, options.replace_modules),
        (&exports_object, EXPORTS_NAME, options.replace_exports),
    ] {
        let Some(name) = name else { continue };
        if mode.renames_inline() && name != canonical {
            let mut engine = TargetedRewriter::new(&id, options.shadow_policy, prompt, &mut hooks.rewrite);
            let rewrite = engine.rewrite(&mut module.code, name, &mut rename_to(canonical))?;
            report.renamed += rewrite.replaced + rewrite.declarations;
        }
    }

    // Each alias goes to the top of the body; reversed so the file reads
    // loader, module, exports.
    let aliases = [
        (loader, LOADER_NAME, options.replace_requires),
        (module_object, MODULE_NAME, options.replace_modules),
        (exports_object, EXPORTS_NAME, options.replace_exports),
    ];
    for (name, canonical, mode) in aliases.into_iter().rev() {
        let Some(name) = name else { continue };
        if inject_alias(module, &name, canonical, mode, options.variable_kind, diagnostics) {
            report.aliases += 1;
        }
    }

    for hook in hooks.module.iter_mut() {
        hook(module, options)?;
    }

    Ok(report)
}

fn place_with(
    modules: &[Module],
    options: &TransformOptions,
    resolver: &mut LocationResolver<'_>,
) -> Result<Vec<Placement>> {
    let root = options.output_root();
    modules
        .iter()
        .map(|module| {
            let location = resolver.resolve_location(&module.id, root, PackageRoot::AsIndex)?;
            info!(module = %module.id, path = %location, "placed module");
            Ok(Placement {
                id: module.id.clone(),
                location,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
