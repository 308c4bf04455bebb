//! Tracing configuration.
//!
//! Supports three output formats controlled by `DEBUNDLE_LOG_FORMAT`:
//!
//! - `text` (default): Standard `tracing-subscriber` flat output
//! - `tree`: Hierarchical indented output via `tracing-tree`, one branch per
//!   module span
//! - `json`: One JSON object per span/event
//!
//! ## Quick start
//!
//! ```bash
//! # Which chain placed each module
//! DEBUNDLE_LOG=debug DEBUNDLE_LOG_FORMAT=tree debundle modules.json -o out -c debundle.json
//!
//! # Only the location resolver
//! DEBUNDLE_LOG="debundle::location=debug" debundle modules.json -o out -c debundle.json
//!
//! # Same thing through the CLI flag
//! debundle modules.json -o out -c debundle.json --log debug
//! ```
//!
//! The subscriber is only initialised when `DEBUNDLE_LOG`, `RUST_LOG` or a
//! default level is given.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

const LOG_ENV: &str = "DEBUNDLE_LOG";
const FORMAT_ENV: &str = "DEBUNDLE_LOG_FORMAT";

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Standard flat text lines.
    #[default]
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Unknown values fall back to [`LogFormat::Text`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var(FORMAT_ENV).unwrap_or_default())
    }
}

/// Pick the filter directive: `DEBUNDLE_LOG`, then `RUST_LOG`, then the
/// caller's default.
fn filter_directive(debundle_log: Option<String>, rust_log: Option<String>, default_level: Option<&str>) -> Option<String> {
    debundle_log
        .or(rust_log)
        .or_else(|| default_level.map(str::to_string))
}

/// Initialise the global tracing subscriber.
///
/// All output goes to stderr; stdout carries the run summary.
pub fn init_tracing(default_level: Option<&str>) {
    let Some(directive) = filter_directive(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
        default_level,
    ) else {
        return;
    };

    let filter = EnvFilter::builder().parse_lossy(directive);

    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_span_retrace(true)
                .with_targets(true);

            Registry::default().with(filter).with(tree_layer).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
