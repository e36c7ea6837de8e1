use std::path::Path;

use clap::Parser;
use linkspan_extract::{ExtractionPipeline, FileFilter, UnitOutcome};
use linkspan_parser::Frontend;
use tracing_subscriber::EnvFilter;

mod bootstrap;
mod cli;
mod emit;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("linkspan error: {error:#}");
            std::process::exit(1);
        }
    }
}

/// Returns whether every unit extracted cleanly. Records are emitted either
/// way.
fn run() -> anyhow::Result<bool> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = bootstrap::load_config(&cli)?;
    let database = bootstrap::load_database(cli.build_path.as_deref())?;
    let inputs = bootstrap::unit_inputs(&cli.sources, database.as_ref(), &cli.compiler_args)?;

    let frontend = Frontend::new(config.target.target_info())
        .with_follow_includes(config.extract.follow_includes);
    let filter = FileFilter::new(inputs.iter().map(|input| input.path.clone()));
    let report = ExtractionPipeline::new(frontend, filter)
        .with_jobs(config.extract.jobs)
        .run(&inputs);

    emit::emit(&report.records, config.output.file.as_deref().map(Path::new))?;

    let failures = report.failures(config.extract.syntax_errors_fail);
    for outcome in &failures {
        if let UnitOutcome::Failed { file, error } = outcome {
            eprintln!("linkspan: {file}: {error}");
        } else if let Some(error) = outcome.syntax_error() {
            eprintln!("linkspan: {error}");
        }
    }
    Ok(failures.is_empty())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_env("LINKSPAN_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;
    Ok(())
}
