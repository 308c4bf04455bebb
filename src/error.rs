use crate::module::ModuleId;

/// Errors that abort a debundling run.
///
/// Everything recoverable (unresolved references, modules without graph data,
/// odd closure shapes) is reported through [`Diagnostics`](crate::diagnostics::Diagnostics)
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum DebundleError {
    #[error(
        "module {module}: location `{path}` walks {levels} level(s) above the output root \
         at hop {hop} of {hops} ({trail}). Not enough information to place this module; \
         add a knownPaths entry for it or for one of the modules along the chain"
    )]
    EscapesOutputRoot {
        module: ModuleId,
        path: String,
        levels: usize,
        /// 1-based index of the hop where the walk first left the root
        hop: usize,
        hops: usize,
        /// `id (specifier) -> id (specifier) ...`
        trail: String,
    },

    #[error(
        "module {module}: `{name}` is redeclared in a nested scope and the shadowing policy is \
         `ask`, but no interactive prompt is available"
    )]
    PromptUnavailable { module: ModuleId, name: String },

    #[error("prompt failed: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to write {}", path.display())]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = DebundleError> = std::result::Result<T, E>;
