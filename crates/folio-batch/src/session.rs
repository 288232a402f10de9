// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion session — orchestrates one run end to end.
//
//   Idle → Discovering → Converting → [Packaging] → Completed
//                                   ↘ Cancelled (before packaging)
//   Discovering | Converting | Packaging → Failed (session-level error)
//
// Whatever the terminal state, the temporary workspace is removed and the
// reporter sees `Completed(summary)` followed by `Finished`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, instrument, warn};

use folio_core::config::ConversionConfig;
use folio_core::error::FolioError;
use folio_core::traits::ItemConverter;
use folio_core::types::{
    ConversionOutcome, ConversionRequest, DiscoveredItem, SessionStatus, SessionSummary,
};
use folio_document::ImagePdfConverter;

use crate::archive::ArchiveAssembler;
use crate::cancel::CancelToken;
use crate::discovery::ImageDiscoverer;
use crate::pool::ConversionPool;
use crate::progress::{ProgressReporter, SessionEvent};
use crate::workspace::TemporaryWorkspace;

// -- Session state ------------------------------------------------------------

/// Mutable tally for one run. Only the coordinator touches it.
#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    total: usize,
    converted: usize,
    failed: usize,
    outcomes: Vec<ConversionOutcome>,
    archive: Option<PathBuf>,
    error: Option<String>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            total: 0,
            converted: 0,
            failed: 0,
            outcomes: Vec::new(),
            archive: None,
            error: None,
        }
    }

    fn transition(&mut self, to: SessionStatus) {
        debug!(from = ?self.status, to = ?to, "session state change");
        self.status = to;
    }

    fn record(&mut self, outcome: ConversionOutcome) {
        if outcome.is_success() {
            self.converted += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    fn completed(&self) -> usize {
        self.converted + self.failed
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            status: self.status,
            total: self.total,
            converted: self.converted,
            failed: self.failed,
            archive: self.archive.clone(),
            error: self.error.clone(),
            outcomes: self.outcomes.clone(),
        }
    }
}

// -- Session ------------------------------------------------------------------

/// One conversion run over one input tree.
pub struct ConversionSession {
    request: ConversionRequest,
    config: ConversionConfig,
    converter: Arc<dyn ItemConverter>,
    cancel: CancelToken,
}

impl ConversionSession {
    /// Create a session converting images to PDF with `config`.
    pub fn new(request: ConversionRequest, config: ConversionConfig) -> Self {
        let converter: Arc<dyn ItemConverter> = Arc::new(ImagePdfConverter::new(&config));
        Self {
            request,
            config,
            converter,
            cancel: CancelToken::new(),
        }
    }

    /// Replace the per-item converter.
    pub fn with_converter(mut self, converter: Arc<dyn ItemConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Handle the caller keeps to request cancellation while `run` is in
    /// progress. Cancelling after the run ended does nothing.
    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the session to a terminal state and return the final tally.
    ///
    /// Never returns an error: session-level failures end in
    /// [`SessionStatus::Failed`] with the detail in `SessionSummary::error`.
    #[instrument(skip_all, fields(input = %self.request.input_root.display(), package = self.request.package))]
    pub async fn run(self, reporter: &dyn ProgressReporter) -> SessionSummary {
        let mut state = SessionState::new();
        let mut workspace = None;

        reporter.report(&SessionEvent::Started {
            input_root: self.request.input_root.clone(),
        });

        if let Err(e) = self.drive(&mut state, &mut workspace, reporter).await {
            state.transition(SessionStatus::Failed);
            state.error = Some(e.to_string());
            reporter.report(&SessionEvent::Failed {
                detail: e.to_string(),
            });
        }

        if let Some(workspace) = workspace.take() {
            remove_workspace(workspace).await;
        }

        let summary = state.summary();
        info!(
            status = ?summary.status,
            converted = summary.converted,
            failed = summary.failed,
            total = summary.total,
            "conversion session ended"
        );
        reporter.report(&SessionEvent::Completed(summary.clone()));
        reporter.report(&SessionEvent::Finished);
        summary
    }

    /// Everything between the start event and the summary. Leaves `state` in
    /// a terminal status on `Ok`; the caller marks it failed on `Err`.
    async fn drive(
        &self,
        state: &mut SessionState,
        workspace: &mut Option<TemporaryWorkspace>,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), FolioError> {
        // -- Discovering ----------------------------------------------------
        state.transition(SessionStatus::Discovering);
        let items = self.discover().await?;

        if items.is_empty() {
            reporter.report(&SessionEvent::NoItems);
            state.transition(SessionStatus::Completed);
            return Ok(());
        }
        state.total = items.len();
        reporter.report(&SessionEvent::ItemsFound { total: state.total });

        if self.cancel.is_cancelled() {
            self.mark_cancelled(state, reporter);
            return Ok(());
        }

        // -- Converting -----------------------------------------------------
        let destination_root = if self.request.package {
            let created = TemporaryWorkspace::create()?;
            let root = created.path().to_path_buf();
            *workspace = Some(created);
            root
        } else {
            self.request.artifact_root()
        };
        let packaged_root = self.request.package.then_some(destination_root.as_path());

        state.transition(SessionStatus::Converting);
        let pool = ConversionPool::new(Arc::clone(&self.converter), self.config.effective_workers());
        let run = pool
            .run(&items, &destination_root, &self.cancel, |outcome, progress| {
                let outcome = present(outcome, packaged_root);
                let event = match &outcome {
                    ConversionOutcome::Success {
                        source_name,
                        output_path,
                    } => SessionEvent::ItemConverted {
                        name: source_name.clone(),
                        output: output_path.clone(),
                    },
                    ConversionOutcome::Failure {
                        source_name,
                        error_detail,
                    } => SessionEvent::ItemFailed {
                        name: source_name.clone(),
                        detail: error_detail.clone(),
                    },
                };
                state.record(outcome);
                debug_assert_eq!(state.completed(), progress.completed);
                reporter.report(&event);
                reporter.report(&SessionEvent::Progress(progress));
            })
            .await;

        if run.cancelled || self.cancel.is_cancelled() {
            self.mark_cancelled(state, reporter);
            return Ok(());
        }

        // -- Packaging ------------------------------------------------------
        let Some(active) = workspace.as_ref() else {
            state.transition(SessionStatus::Completed);
            return Ok(());
        };

        state.transition(SessionStatus::Packaging);
        reporter.report(&SessionEvent::PackagingStarted);

        let archive_path = self.request.archive_path(Local::now());
        let entries = assemble(active.path().to_path_buf(), archive_path.clone()).await?;

        reporter.report(&SessionEvent::ArchiveWritten {
            path: archive_path.clone(),
            entries,
        });
        state.archive = Some(archive_path);
        state.transition(SessionStatus::Completed);
        Ok(())
    }

    async fn discover(&self) -> Result<Vec<DiscoveredItem>, FolioError> {
        let discoverer = ImageDiscoverer::new(&self.request.pattern)?;
        let root = self.request.input_root.clone();
        tokio::task::spawn_blocking(move || discoverer.discover(&root))
            .await
            .map_err(|e| FolioError::Discovery(format!("discovery task failed: {e}")))?
    }

    fn mark_cancelled(&self, state: &mut SessionState, reporter: &dyn ProgressReporter) {
        state.transition(SessionStatus::Cancelled);
        reporter.report(&SessionEvent::Cancelled {
            completed: state.completed(),
            total: state.total,
        });
    }
}

/// Outcome as the caller should see it. Artifacts in a packaging workspace
/// are named by their path inside the archive, since the workspace itself is
/// about to disappear.
fn present(outcome: &ConversionOutcome, packaged_root: Option<&Path>) -> ConversionOutcome {
    match (outcome, packaged_root) {
        (
            ConversionOutcome::Success {
                source_name,
                output_path,
            },
            Some(root),
        ) => ConversionOutcome::Success {
            source_name: source_name.clone(),
            output_path: output_path
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| output_path.clone()),
        },
        _ => outcome.clone(),
    }
}

async fn assemble(workspace_root: PathBuf, archive_path: PathBuf) -> Result<usize, FolioError> {
    tokio::task::spawn_blocking(move || ArchiveAssembler::new().assemble(&workspace_root, &archive_path))
        .await
        .map_err(|e| FolioError::Archive(format!("archive task failed: {e}")))?
}

async fn remove_workspace(workspace: TemporaryWorkspace) {
    match tokio::task::spawn_blocking(move || workspace.remove()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "temporary workspace cleanup failed"),
        Err(e) => warn!(error = %e, "temporary workspace cleanup task failed"),
    }
}
