#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;

use debundle::cli::args::CliArgs;
use debundle::cli::{driver, reporter::Reporter};

fn main() -> Result<()> {
    let args = CliArgs::parse();
    // DEBUNDLE_LOG / RUST_LOG win over --log; DEBUNDLE_LOG_FORMAT=tree|json|text
    debundle::tracing_config::init_tracing(args.log.as_deref());

    let summary = driver::run(&args)?;

    let reporter = Reporter::new(std::io::stderr().is_terminal());
    if !summary.report.diagnostics.is_empty() {
        eprintln!("{}", reporter.render(&summary.report.diagnostics));
    }
    eprintln!(
        "{}",
        reporter.render_summary(&summary.report, summary.written, &args.output)
    );

    Ok(())
}
