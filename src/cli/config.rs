use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::ast::DeclarationKind;
use crate::module::{KnownPaths, ModuleId};
use crate::options::{BundlerKind, ReplaceMode, ShadowPolicy, TransformOptions};
use crate::output::ResultReplacement;

/// The `debundle.json` document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebundleConfig {
    #[serde(rename = "type", default)]
    pub bundler: BundlerKind,
    pub entry_point: ModuleId,
    pub known_paths: KnownPaths,
    #[serde(default)]
    pub replace_requires: ReplaceMode,
    #[serde(default)]
    pub replace_modules: ReplaceMode,
    #[serde(default)]
    pub replace_exports: ReplaceMode,
    /// What to do inside nested functions that redeclare a rewritten name.
    #[serde(
        default,
        rename = "inDescendantsOfSameNameDeclaration",
        alias = "inDescendantsOfSameNameDeclaraton"
    )]
    pub shadow_policy: ShadowPolicy,
    #[serde(default)]
    pub variable_type: DeclarationKind,
    #[serde(default)]
    pub file_ext: Option<String>,
    #[serde(default)]
    pub output_prefix: Option<String>,
    #[serde(default)]
    pub replace_result_string: Option<ReplaceResultString>,
}

/// Post-processing applied to each written file.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceResultString {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub regexp: bool,
    /// Replace every match instead of the first; regexp mode only.
    #[serde(default = "default_true")]
    pub all: bool,
}

fn default_true() -> bool {
    true
}

impl DebundleConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&source).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(source: &str) -> Result<Self> {
        let config: DebundleConfig = serde_json::from_str(source)?;
        config.clone().into_options().validate()?;
        Ok(config)
    }

    /// The `replaceResultString` substitution, compiled.
    pub fn result_replacement(&self) -> Result<Option<ResultReplacement>> {
        let Some(spec) = &self.replace_result_string else {
            return Ok(None);
        };
        let replacement = ResultReplacement::new(&spec.from, &spec.to, spec.regexp, spec.all)
            .with_context(|| format!("invalid replaceResultString pattern `{}`", spec.from))?;
        Ok(Some(replacement))
    }

    pub fn into_options(self) -> TransformOptions {
        TransformOptions {
            bundler: self.bundler,
            entry_point: self.entry_point,
            known_paths: self.known_paths,
            replace_requires: self.replace_requires,
            replace_modules: self.replace_modules,
            replace_exports: self.replace_exports,
            shadow_policy: self.shadow_policy,
            variable_kind: self.variable_type,
            file_ext: self.file_ext,
            output_prefix: self.output_prefix,
        }
    }
}
