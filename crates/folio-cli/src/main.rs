// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio — batch image to PDF converter.
//
// Entry point. Initialises logging, wires Ctrl-C to the session's cancel
// handle, runs one conversion session and maps its outcome to an exit status.
// A second Ctrl-C exits at once with the cancelled status.

mod cli;
mod reporter;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use folio_batch::ConversionSession;

use cli::{Cli, EXIT_CANCELLED, Interrupt, exit_status, on_interrupt};
use reporter::ConsoleReporter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(input = %cli.input.display(), package = cli.zip, "Folio starting");

    let session = ConversionSession::new(cli.request(), cli.config());

    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for Ctrl-C");
                return;
            }
            match on_interrupt(&cancel) {
                Interrupt::Cancel => tracing::warn!(
                    "interrupt received, finishing conversions already in progress (Ctrl-C again to abort)"
                ),
                Interrupt::ForceExit => {
                    tracing::warn!("second interrupt, aborting");
                    std::process::exit(i32::from(EXIT_CANCELLED));
                }
            }
        }
    });

    let reporter = ConsoleReporter::new(cli.verbose);
    let summary = session.run(&reporter).await;

    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "failed to serialise summary"),
        }
    }

    ExitCode::from(exit_status(summary.status))
}
