//! htc-results - manage results of HTCondor submissions in a dataset.

mod render;

use clap::Parser;
use htc_cli::Args;
use htc_results::Workspace;
use miette::{IntoDiagnostic, Result};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_logging(verbose: bool) {
    // RUST_LOG wins over the verbosity flag
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let workspace = Workspace::from_config(&args.config()).into_diagnostic()?;
    let traversal = workspace
        .run(args.operation(), args.filter(), args.all)
        .into_diagnostic()?;

    let mut stdout = io::stdout().lock();
    let mut failed = false;
    for record in traversal {
        failed |= record.is_error();
        if args.json {
            serde_json::to_writer(&mut stdout, &record).into_diagnostic()?;
            writeln!(stdout).into_diagnostic()?;
            continue;
        }
        if record.is_error() {
            eprintln!("{}", render::render_error(&record));
        } else if let Some(line) = render::render_text(&record) {
            writeln!(stdout, "{line}").into_diagnostic()?;
        } else {
            tracing::debug!(
                action = record.action(),
                status = record.status().as_str(),
                "not rendered"
            );
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
