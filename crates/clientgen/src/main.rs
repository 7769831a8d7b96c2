//! clientgen CLI

// The CLI reports generated files on stdout
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clientgen::cli;
use clientgen::tracing::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> miette::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();
    init_tracing(TracingConfig {
        format: cli.format,
        level: cli.level.into(),
        ..Default::default()
    })?;

    let report = cli::execute(cli.command).await?;
    for artifact in report.artifacts() {
        println!("{}\t{}", artifact.kind, artifact.path.display());
    }
    if let Some(reason) = report.skipped() {
        println!("engines skipped: {reason}");
    }

    Ok(())
}
