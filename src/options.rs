//! Run-wide transform options and extension hooks.
//!
//! [`TransformOptions`] is plain data (it round-trips through the JSON
//! configuration); [`Hooks`] holds the caller-supplied visitor lists and is
//! threaded alongside it explicitly.

use serde::{Deserialize, Serialize};

use crate::ast::DeclarationKind;
use crate::error::{DebundleError, Result};
use crate::module::{KnownPaths, Module, ModuleId};
use crate::rewrite::RewriteVisitor;
use crate::rewrite::reference::ReferenceVisitor;

/// Name the loader parameter is rewritten or aliased to.
pub const LOADER_NAME: &str = "require";
/// Name the module-object parameter is rewritten or aliased to.
pub const MODULE_NAME: &str = "module";
/// Name the exports-object parameter is rewritten or aliased to.
pub const EXPORTS_NAME: &str = "exports";

/// What to do with a minified closure parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplaceMode {
    /// Rename every use to the canonical name.
    #[default]
    Inline,
    /// Leave uses alone and prepend `var <minified> = <canonical>;`.
    Variable,
    /// Leave uses alone.
    Keep,
}

impl ReplaceMode {
    pub fn renames_inline(self) -> bool {
        self == ReplaceMode::Inline
    }

    pub fn adds_alias(self) -> bool {
        self == ReplaceMode::Variable
    }
}

/// How to treat occurrences inside a nested function that redeclares the
/// name being rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowPolicy {
    /// Leave the shadowed subtree untouched.
    Keep,
    /// Rewrite it anyway.
    #[default]
    Replace,
    /// Ask once per shadowing function.
    Ask,
}

/// Bundler that produced the module closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundlerKind {
    Webpack,
    #[default]
    Browserify,
}

/// Parameter positions of the injected bindings in a module closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSlots {
    pub loader: usize,
    pub module: usize,
    pub exports: usize,
}

impl BundlerKind {
    /// Browserify wraps modules as `(require, module, exports)`, webpack as
    /// `(module, exports, require)`.
    pub fn slots(self) -> ParamSlots {
        match self {
            BundlerKind::Browserify => ParamSlots {
                loader: 0,
                module: 1,
                exports: 2,
            },
            BundlerKind::Webpack => ParamSlots {
                loader: 2,
                module: 0,
                exports: 1,
            },
        }
    }
}

/// Options for one debundling run.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOptions {
    pub bundler: BundlerKind,
    pub entry_point: ModuleId,
    pub known_paths: KnownPaths,
    pub replace_requires: ReplaceMode,
    pub replace_modules: ReplaceMode,
    pub replace_exports: ReplaceMode,
    pub shadow_policy: ShadowPolicy,
    /// Keyword used for alias declarations.
    pub variable_kind: DeclarationKind,
    /// Extension marker trimmed from resolved paths, e.g. `.js`.
    pub file_ext: Option<String>,
    /// Directory under the output root that every module is placed in.
    pub output_prefix: Option<String>,
}

impl TransformOptions {
    pub fn new(entry_point: impl Into<ModuleId>) -> Self {
        Self {
            bundler: BundlerKind::default(),
            entry_point: entry_point.into(),
            known_paths: KnownPaths::new(),
            replace_requires: ReplaceMode::default(),
            replace_modules: ReplaceMode::default(),
            replace_exports: ReplaceMode::default(),
            shadow_policy: ShadowPolicy::default(),
            variable_kind: DeclarationKind::default(),
            file_ext: None,
            output_prefix: None,
        }
    }

    pub fn with_bundler(mut self, bundler: BundlerKind) -> Self {
        self.bundler = bundler;
        self
    }

    pub fn with_known_paths(mut self, known_paths: KnownPaths) -> Self {
        self.known_paths = known_paths;
        self
    }

    pub fn with_shadow_policy(mut self, policy: ShadowPolicy) -> Self {
        self.shadow_policy = policy;
        self
    }

    /// Apply the same mode to the loader, module and exports bindings.
    pub fn with_replace_mode(mut self, mode: ReplaceMode) -> Self {
        self.replace_requires = mode;
        self.replace_modules = mode;
        self.replace_exports = mode;
        self
    }

    /// Output root the resolver anchors locations at.
    pub fn output_root(&self) -> &str {
        self.output_prefix.as_deref().unwrap_or("")
    }

    /// Reject options no run can honor.
    pub fn validate(&self) -> Result<()> {
        if let Some(prefix) = &self.output_prefix
            && prefix.split(['/', '\\']).any(|segment| segment == "..")
        {
            return Err(DebundleError::InvalidConfig(format!(
                "output prefix `{prefix}` must stay inside the output directory"
            )));
        }
        if self.file_ext.as_deref().is_some_and(str::is_empty) {
            return Err(DebundleError::InvalidConfig("file extension marker is empty".to_string()));
        }
        Ok(())
    }
}

/// Hook run on each module after the built-in rewrites.
pub type ModuleHook = Box<dyn FnMut(&mut Module, &TransformOptions) -> Result<()>>;

/// Caller-supplied extension points, consulted in registration order.
#[derive(Default)]
pub struct Hooks {
    /// Consulted by the tree rewrite engine before any updater.
    pub rewrite: Vec<RewriteVisitor>,
    /// Consulted by the loader-call transformer before its own dispatch.
    pub reference: Vec<ReferenceVisitor>,
    pub module: Vec<ModuleHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rewrite.is_empty() && self.reference.is_empty() && self.module.is_empty()
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("rewrite", &self.rewrite.len())
            .field("reference", &self.reference.len())
            .field("module", &self.module.len())
            .finish()
    }
}
