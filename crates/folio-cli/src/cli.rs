// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use folio_batch::CancelToken;
use folio_core::config::{ConversionConfig, DEFAULT_MAX_DIMENSION};
use folio_core::types::{ConversionRequest, MATCH_ALL, SessionStatus};

/// Exit status for an interrupted run (128 + SIGINT).
pub const EXIT_CANCELLED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "folio")]
#[command(version, about = "Convert every image under a directory into a PDF", long_about = None)]
pub struct Cli {
    /// Directory to scan recursively for images.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Package all PDFs into one ZIP archive instead of writing them out.
    #[arg(short, long)]
    pub zip: bool,

    /// Output directory, or archive file with --zip.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Case-insensitive glob matched against file names.
    #[arg(short, long, value_name = "GLOB", default_value = MATCH_ALL)]
    pub pattern: String,

    /// Conversions to run in parallel [default: min(cores, 4)].
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Downsample images whose width or height exceeds this many pixels.
    #[arg(long, value_name = "PX", default_value_t = DEFAULT_MAX_DIMENSION,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub max_dimension: u32,

    /// Print the final summary as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn request(&self) -> ConversionRequest {
        let mut request = ConversionRequest::new(&self.input).with_pattern(&self.pattern);
        if self.zip {
            request = request.packaged();
        }
        if let Some(output) = &self.output {
            request = request.with_output(output);
        }
        request
    }

    pub fn config(&self) -> ConversionConfig {
        ConversionConfig {
            max_dimension: self.max_dimension,
            workers: self.jobs.map(usize::from),
            ..ConversionConfig::default()
        }
    }
}

/// Process exit status: 0 completed, 1 failed, 130 cancelled.
pub fn exit_status(status: SessionStatus) -> u8 {
    match status {
        SessionStatus::Completed => 0,
        SessionStatus::Cancelled => EXIT_CANCELLED,
        _ => 1,
    }
}

/// What a Ctrl-C should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// First interrupt: stop dispatching and let in-flight work finish.
    Cancel,
    /// Repeat interrupt: leave immediately.
    ForceExit,
}

/// Cancel the session on the first interrupt; any later one forces an exit.
pub fn on_interrupt(cancel: &CancelToken) -> Interrupt {
    if cancel.cancel() {
        Interrupt::Cancel
    } else {
        Interrupt::ForceExit
    }
}
