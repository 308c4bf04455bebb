use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing::info;

use crate::cli::args::CliArgs;
use crate::cli::config::DebundleConfig;
use crate::cli::prompt::{LinePrompt, stdin_is_terminal};
use crate::module::Module;
use crate::options::{Hooks, ShadowPolicy};
use crate::output::{render_files, write_files};
use crate::pipeline::{DebundleReport, debundle};
use crate::rewrite::{NonInteractive, ShadowResolver};

/// Outcome of a CLI run.
#[derive(Debug)]
pub struct RunSummary {
    pub report: DebundleReport,
    /// Files written to the output directory
    pub written: usize,
}

pub fn run(args: &CliArgs) -> Result<RunSummary> {
    let config = DebundleConfig::load(&args.config)?;
    let modules = load_modules(&args.input)?;

    if config.shadow_policy == ShadowPolicy::Ask {
        if !stdin_is_terminal() {
            bail!(
                "inDescendantsOfSameNameDeclaration is `ask` but stdin is not a terminal; \
                 use `keep` or `replace` for non-interactive runs"
            );
        }
        return run_with(config, modules, &args.output, &mut LinePrompt::stdio());
    }

    run_with(config, modules, &args.output, &mut NonInteractive)
}

/// Debundle `modules` under `config` and write the result to `out_dir`.
pub fn run_with(
    config: DebundleConfig,
    mut modules: Vec<Module>,
    out_dir: &Path,
    prompt: &mut dyn ShadowResolver,
) -> Result<RunSummary> {
    let replacement = config.result_replacement()?;
    let options = config.into_options();

    if !modules.iter().any(|module| module.id == options.entry_point) {
        bail!(
            "entry point {} is not in the module list",
            options.entry_point
        );
    }

    let mut hooks = Hooks::new();
    let mut report =
        debundle(&mut modules, &options, &mut hooks, prompt).context("failed to debundle modules")?;

    let files = render_files(
        &modules,
        &report.placements,
        replacement.as_ref(),
        &mut report.diagnostics,
    );
    let written = write_files(out_dir, &files)
        .with_context(|| format!("failed to write output to {}", out_dir.display()))?;

    info!(
        modules = modules.len(),
        written,
        warnings = report.diagnostics.warning_count(),
        "debundle finished"
    );
    Ok(RunSummary { report, written })
}

/// Read the normalized module list.
pub fn load_modules(path: &Path) -> Result<Vec<Module>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read modules {}", path.display()))?;
    let modules: Vec<Module> = serde_json::from_str(&source)
        .with_context(|| format!("failed to parse modules {}", path.display()))?;
    if modules.is_empty() {
        bail!("{} contains no modules", path.display());
    }
    Ok(modules)
}
