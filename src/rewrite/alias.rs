//! Alias declarations for minified closure parameters.
//!
//! Under [`ReplaceMode::Variable`] uses of a minified parameter are kept and
//! the module file instead starts with `var e = require;`, so the original
//! name keeps working once the closure wrapper is gone.

use tracing::debug;

use crate::ast::{DeclarationKind, Node};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::module::Module;
use crate::options::ReplaceMode;

/// Prepend `kind original = canonical;` to the module body.
///
/// No-op when the names match or `mode` is not [`ReplaceMode::Variable`].
/// Returns whether a declaration was added; a closure with an expression body
/// has nowhere to put one and is reported instead.
pub fn inject_alias(
    module: &mut Module,
    original: &str,
    canonical: &str,
    mode: ReplaceMode,
    kind: DeclarationKind,
    diagnostics: &mut Diagnostics,
) -> bool {
    if !mode.adds_alias() || original == canonical {
        return false;
    }

    let Some(body) = module.code.function_body_mut() else {
        diagnostics.warn(
            &module.id,
            DiagnosticKind::AliasSkipped {
                name: original.to_string(),
            },
            format!("cannot alias `{original}` to `{canonical}`: the closure has no block body"),
        );
        return false;
    };

    debug!(module = %module.id, original, canonical, "aliasing parameter");
    body.insert(0, Node::var_decl(kind, original, Some(Node::id(canonical))));
    true
}
