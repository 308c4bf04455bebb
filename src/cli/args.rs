use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the debundle binary.
#[derive(Parser, Debug)]
#[command(
    name = "debundle",
    version,
    about = "Split a browserify or webpack bundle back into one file per module"
)]
pub struct CliArgs {
    /// Normalized module list: a JSON array of `{ id, code, lookup }` records.
    pub input: PathBuf,

    /// Directory the module files are written to.
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Debundle configuration file (JSON).
    #[arg(short = 'c', long)]
    pub config: PathBuf,

    /// Log level used when neither DEBUNDLE_LOG nor RUST_LOG is set.
    #[arg(short = 'l', long)]
    pub log: Option<String>,
}
