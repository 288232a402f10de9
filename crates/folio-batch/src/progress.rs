// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting — the closed set of lifecycle events a session emits,
// and the sink trait that receives them.
//
// Event order for one session:
//
//   Started → (NoItems | ItemsFound)
//           → { ItemConverted | ItemFailed, Progress }*
//           → [PackagingStarted → ArchiveWritten]
//           → [Cancelled | Failed]
//           → Completed → Finished
//
// `Finished` is always last, whatever the terminal state.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use folio_core::types::{Progress, SessionSummary};

/// One discrete lifecycle point of a conversion session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started { input_root: PathBuf },
    ItemsFound { total: usize },
    /// Discovery found nothing to convert.
    NoItems,
    ItemConverted { name: String, output: PathBuf },
    ItemFailed { name: String, detail: String },
    Progress(Progress),
    PackagingStarted,
    ArchiveWritten { path: PathBuf, entries: usize },
    Cancelled { completed: usize, total: usize },
    /// Session-level failure (discovery, workspace or archive).
    Failed { detail: String },
    /// Final tally.
    Completed(SessionSummary),
    Finished,
}

/// Sink for session events.
///
/// Called from the coordinating task only, one event at a time and in order.
/// Implementations should return quickly; rendering belongs elsewhere.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &SessionEvent);
}

/// Any closure over events is a reporter.
impl<F> ProgressReporter for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn report(&self, event: &SessionEvent) {
        self(event)
    }
}

// -- Tracing sink -------------------------------------------------------------

/// Reporter that writes every event to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Started { input_root } => {
                info!(input_root = %input_root.display(), "conversion session started")
            }
            SessionEvent::ItemsFound { total } => info!(total, "images found"),
            SessionEvent::NoItems => warn!("no images found"),
            SessionEvent::ItemConverted { name, output } => {
                info!(item = %name, output = %output.display(), "converted")
            }
            SessionEvent::ItemFailed { name, detail } => {
                warn!(item = %name, error = %detail, "conversion failed")
            }
            SessionEvent::Progress(p) => {
                debug!(completed = p.completed, total = p.total, "progress")
            }
            SessionEvent::PackagingStarted => info!("creating archive"),
            SessionEvent::ArchiveWritten { path, entries } => {
                info!(path = %path.display(), entries, "archive written")
            }
            SessionEvent::Cancelled { completed, total } => {
                warn!(completed, total, "conversion cancelled")
            }
            SessionEvent::Failed { detail } => error!(error = %detail, "session failed"),
            SessionEvent::Completed(summary) => info!(
                status = ?summary.status,
                converted = summary.converted,
                failed = summary.failed,
                total = summary.total,
                "session complete"
            ),
            SessionEvent::Finished => debug!("session finished"),
        }
    }
}

// -- Channel sink -------------------------------------------------------------

/// Reporter that forwards events to a dedicated rendering task.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelReporter {
    /// Create a reporter and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, event: &SessionEvent) {
        // A dropped receiver means nobody is rendering any more; the session
        // itself carries on.
        if self.tx.send(event.clone()).is_err() {
            debug!("progress receiver dropped");
        }
    }
}
