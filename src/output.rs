//! Rendering placed modules to files and writing them out.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use regex::Regex;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{DebundleError, Result};
use crate::location::fallback_file_name;
use crate::module::{Module, ModuleId};
use crate::pipeline::Placement;
use crate::printer::JsPrinter;

/// File extension of every written module.
pub const OUTPUT_EXT: &str = "js";

/// Text substitution applied to each rendered file.
#[derive(Debug, Clone)]
pub enum ResultReplacement {
    /// Replace the first occurrence of `from`.
    Literal { from: String, to: String },
    /// Replace the first (or every) match. `to` may use `$1` / `${name}`.
    Pattern { regex: Regex, to: String, all: bool },
}

impl ResultReplacement {
    pub fn new(from: &str, to: &str, regexp: bool, all: bool) -> std::result::Result<Self, regex::Error> {
        if regexp {
            Ok(ResultReplacement::Pattern {
                regex: Regex::new(from)?,
                to: to.to_string(),
                all,
            })
        } else {
            Ok(ResultReplacement::Literal {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match self {
            ResultReplacement::Literal { from, to } => {
                if text.contains(from.as_str()) {
                    Cow::Owned(text.replacen(from.as_str(), to, 1))
                } else {
                    Cow::Borrowed(text)
                }
            }
            ResultReplacement::Pattern { regex, to, all: true } => regex.replace_all(text, to.as_str()),
            ResultReplacement::Pattern { regex, to, all: false } => regex.replace(text, to.as_str()),
        }
    }
}

/// One module's file, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub module: ModuleId,
    /// Slash-separated path relative to the output directory, with extension
    pub path: String,
    pub contents: String,
}

/// Print every placed module.
///
/// `placements` must be in module list order, as
/// [`resolve_locations`](crate::pipeline::resolve_locations) returns them.
/// When two modules land on the same file the later one gets its id appended
/// to the file stem and a [`DiagnosticKind::LocationCollision`] is recorded.
pub fn render_files(
    modules: &[Module],
    placements: &[Placement],
    replacement: Option<&ResultReplacement>,
    diagnostics: &mut Diagnostics,
) -> Vec<RenderedFile> {
    let mut taken: FxHashMap<String, ModuleId> = FxHashMap::default();
    let mut files = Vec::with_capacity(modules.len());

    for (module, placement) in modules.iter().zip(placements) {
        let mut stem = placement.location.as_str().to_string();
        if let Some(other) = taken.get(&stem) {
            diagnostics.warn(
                &module.id,
                DiagnosticKind::LocationCollision {
                    other: other.clone(),
                    path: stem.clone(),
                },
                format!("resolves to `{stem}` like module {other}, writing it next to it under a suffixed name"),
            );
            stem = format!("{stem}-{}", fallback_file_name(&module.id));
        }
        taken.insert(stem.clone(), module.id.clone());

        let printed = JsPrinter::emit_module_body(&module.code);
        let contents = match replacement {
            Some(replacement) => replacement.apply(&printed).into_owned(),
            None => printed,
        };

        files.push(RenderedFile {
            module: module.id.clone(),
            path: format!("{stem}.{OUTPUT_EXT}"),
            contents,
        });
    }

    files
}

/// Write rendered files under `out_dir`, creating directories as needed.
///
/// Returns the number of files written.
pub fn write_files(out_dir: &Path, files: &[RenderedFile]) -> Result<usize> {
    for file in files {
        let target = out_dir.join(file.path.trim_start_matches('/'));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| DebundleError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&target, &file.contents).map_err(|source| DebundleError::Write {
            path: target.clone(),
            source,
        })?;
        debug!(module = %file.module, path = %target.display(), "wrote module");
    }

    info!(files = files.len(), out_dir = %out_dir.display(), "output written");
    Ok(files.len())
}
