// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable console rendering of session events (stderr, so stdout stays
// free for `--json`).

use folio_batch::{ProgressReporter, SessionEvent};
use folio_core::types::SessionStatus;

/// Prints one line per interesting event.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    /// Also print a progress line after every item.
    pub show_progress: bool,
}

impl ConsoleReporter {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    /// The line printed for `event`, if any.
    pub fn render(&self, event: &SessionEvent) -> Option<String> {
        let line = match event {
            SessionEvent::Started { input_root } => {
                format!("Scanning {}", input_root.display())
            }
            SessionEvent::ItemsFound { total } => format!("Found {total} image(s)"),
            SessionEvent::NoItems => "No images found".to_owned(),
            SessionEvent::ItemConverted { name, output } => {
                format!("  ok    {name} -> {}", output.display())
            }
            SessionEvent::ItemFailed { name, detail } => format!("  FAIL  {name}: {detail}"),
            SessionEvent::Progress(p) if self.show_progress => format!(
                "  [{}/{}] {:.0}%",
                p.completed,
                p.total,
                p.fraction() * 100.0
            ),
            SessionEvent::Progress(_) | SessionEvent::Finished => return None,
            SessionEvent::PackagingStarted => "Creating archive...".to_owned(),
            SessionEvent::ArchiveWritten { path, entries } => {
                format!("Archive written: {} ({entries} file(s))", path.display())
            }
            SessionEvent::Cancelled { completed, total } => {
                format!("Cancelled after {completed} of {total} image(s)")
            }
            SessionEvent::Failed { detail } => format!("Error: {detail}"),
            SessionEvent::Completed(summary) => {
                let verdict = match summary.status {
                    SessionStatus::Completed => "Done",
                    SessionStatus::Cancelled => "Stopped",
                    _ => "Failed",
                };
                format!(
                    "{verdict}: {} converted, {} failed, {} total",
                    summary.converted, summary.failed, summary.total
                )
            }
        };
        Some(line)
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: &SessionEvent) {
        if let Some(line) = self.render(event) {
            eprintln!("{line}");
        }
    }
}
