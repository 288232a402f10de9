// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion pool — bounded fan-out of `ItemConverter` calls.
//
// The coordinator (the caller of `run`) is the single writer of all counts.
// Workers run on tokio's blocking pool and only ever hand back an outcome;
// they never see the cancellation token. Cancellation is checked before each
// dispatch and after each arrival: work already started is always drained.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use folio_core::traits::ItemConverter;
use folio_core::types::{ConversionOutcome, DiscoveredItem, Progress};

use crate::cancel::CancelToken;

/// What one pool run produced.
#[derive(Debug, Clone, Default)]
pub struct PoolRun {
    /// One outcome per dispatched item, in arrival order.
    pub outcomes: Vec<ConversionOutcome>,
    /// Cancellation was observed and dispatch stopped early.
    pub cancelled: bool,
    /// Items never dispatched because of cancellation.
    pub not_started: usize,
}

impl PoolRun {
    pub fn converted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.converted()
    }
}

/// Bounded-concurrency executor for per-item conversions.
pub struct ConversionPool {
    converter: Arc<dyn ItemConverter>,
    concurrency: usize,
}

impl ConversionPool {
    /// Create a pool running at most `concurrency` conversions at once
    /// (clamped to at least one).
    pub fn new(converter: Arc<dyn ItemConverter>, concurrency: usize) -> Self {
        Self {
            converter,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Convert `items` into artifacts under `destination_root`.
    ///
    /// `on_outcome` is invoked on the calling task after every arrival with
    /// the outcome and the running progress, so `completed` rises by exactly
    /// one per call and reaches `total` on an uninterrupted run.
    #[instrument(skip_all, fields(total = items.len(), concurrency = self.concurrency))]
    pub async fn run<F>(
        &self,
        items: &[DiscoveredItem],
        destination_root: &Path,
        cancel: &CancelToken,
        mut on_outcome: F,
    ) -> PoolRun
    where
        F: FnMut(&ConversionOutcome, Progress),
    {
        let total = items.len();
        let mut queue = items
            .iter()
            .zip(plan_destinations(items))
            .map(|(item, relative)| (item.clone(), destination_root.join(relative)));

        let mut in_flight = JoinSet::new();
        let mut run = PoolRun {
            outcomes: Vec::with_capacity(total),
            ..PoolRun::default()
        };
        let mut dispatched = 0usize;

        loop {
            // -- Dispatch up to the bound ----------------------------------
            while !run.cancelled && in_flight.len() < self.concurrency {
                if cancel.is_cancelled() {
                    run.cancelled = true;
                    info!(
                        dispatched,
                        in_flight = in_flight.len(),
                        "cancellation observed, draining in-flight conversions"
                    );
                    break;
                }
                let Some((item, destination)) = queue.next() else {
                    break;
                };
                dispatched += 1;
                in_flight.spawn(convert_one(Arc::clone(&self.converter), item, destination));
            }

            // -- Await the next arrival -------------------------------------
            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            let outcome = joined.unwrap_or_else(|e| {
                error!(error = %e, "conversion wrapper task failed");
                ConversionOutcome::Failure {
                    source_name: "<unknown>".to_owned(),
                    error_detail: format!("conversion task failed: {e}"),
                }
            });

            run.outcomes.push(outcome);
            let progress = Progress {
                completed: run.outcomes.len(),
                total,
            };
            if let Some(outcome) = run.outcomes.last() {
                on_outcome(outcome, progress);
            }
        }

        run.not_started = total - dispatched;
        debug!(
            completed = run.outcomes.len(),
            not_started = run.not_started,
            cancelled = run.cancelled,
            "pool run finished"
        );
        run
    }
}

/// Run one conversion on the blocking pool. Always yields an outcome, even if
/// the converter panics.
async fn convert_one(
    converter: Arc<dyn ItemConverter>,
    item: DiscoveredItem,
    destination: PathBuf,
) -> ConversionOutcome {
    let source_name = item.name();
    let output = destination.clone();
    let result = tokio::task::spawn_blocking(move || {
        converter.convert(&item.source, &destination)
    })
    .await;

    match result {
        Ok(Ok(())) => ConversionOutcome::Success {
            source_name,
            output_path: output,
        },
        Ok(Err(e)) => {
            warn!(item = %source_name, error = %e, "item conversion failed");
            ConversionOutcome::Failure {
                source_name,
                error_detail: e.to_string(),
            }
        }
        Err(e) => {
            error!(item = %source_name, error = %e, "conversion worker panicked");
            ConversionOutcome::Failure {
                source_name,
                error_detail: format!("conversion task panicked: {e}"),
            }
        }
    }
}

// -- Artifact naming -----------------------------------------------------------

/// Relative artifact path for each item, in the same order.
///
/// Normally the source's relative path with a `.pdf` extension. Items that
/// would collide with an earlier artifact keep their full file name
/// (`a.jpg.pdf`), falling back to a numbered stem (`a (2).pdf`). Collisions
/// are judged case-insensitively so `A.png` and `a.jpg` stay distinct on
/// case-insensitive filesystems too.
pub fn plan_destinations(items: &[DiscoveredItem]) -> Vec<PathBuf> {
    let mut taken: HashSet<String> = HashSet::with_capacity(items.len());
    let folded = |path: &Path| path.to_string_lossy().to_lowercase();

    items
        .iter()
        .map(|item| {
            let relative = &item.relative;
            let mut candidate = relative.with_extension("pdf");
            if taken.contains(&folded(&candidate)) {
                let mut full: OsString = relative.file_name().unwrap_or_default().to_owned();
                full.push(".pdf");
                candidate = relative.with_file_name(full);
            }
            let stem = relative
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut n = 2usize;
            while taken.contains(&folded(&candidate)) {
                candidate = relative.with_file_name(format!("{stem} ({n}).pdf"));
                n += 1;
            }
            taken.insert(folded(&candidate));
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use folio_core::error::ConversionError;

    fn items(names: &[&str]) -> Vec<DiscoveredItem> {
        names
            .iter()
            .map(|name| DiscoveredItem {
                source: PathBuf::from("/in").join(name),
                relative: PathBuf::from(name),
            })
            .collect()
    }

    /// Writes a marker file and records peak concurrency. Sources whose name
    /// contains "bad" fail; "panic" panics.
    #[derive(Default)]
    struct FakeConverter {
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl ItemConverter for FakeConverter {
        fn convert(&self, source: &Path, destination: &Path) -> Result<(), ConversionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(15));
            self.active.fetch_sub(1, Ordering::SeqCst);

            let name = source.to_string_lossy();
            if name.contains("panic") {
                panic!("decoder exploded");
            }
            if name.contains("bad") {
                return Err(ConversionError::Decode("not an image".into()));
            }
            std::fs::create_dir_all(destination.parent().unwrap())?;
            std::fs::write(destination, b"%PDF-fake")?;
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn converts_everything_and_bounds_concurrency() {
        let out = tempfile::tempdir().unwrap();
        let converter = Arc::new(FakeConverter::default());
        let pool = ConversionPool::new(converter.clone(), 3);
        let batch = items(&["a.png", "b.png", "sub/c.png", "sub/d.png", "e.png", "f.png", "g.png"]);

        let run = pool
            .run(&batch, out.path(), &CancelToken::new(), |_, _| {})
            .await;

        assert_eq!(run.outcomes.len(), 7);
        assert_eq!(run.converted(), 7);
        assert!(!run.cancelled);
        assert_eq!(run.not_started, 0);
        assert!(converter.peak.load(Ordering::SeqCst) <= 3);
        assert!(out.path().join("sub/c.pdf").is_file());
    }

    #[tokio::test]
    async fn failures_and_panics_do_not_abort_the_batch() {
        let out = tempfile::tempdir().unwrap();
        let pool = ConversionPool::new(Arc::new(FakeConverter::default()), 2);
        let batch = items(&["a.png", "bad.png", "c.png", "panic.png", "e.png"]);

        let run = pool
            .run(&batch, out.path(), &CancelToken::new(), |_, _| {})
            .await;

        assert_eq!(run.converted(), 3);
        assert_eq!(run.failed(), 2);
        let panicked = run
            .outcomes
            .iter()
            .find(|o| o.source_name() == "panic.png")
            .unwrap();
        assert!(matches!(
            panicked,
            ConversionOutcome::Failure { error_detail, .. } if error_detail.contains("panicked")
        ));
    }

    #[tokio::test]
    async fn progress_is_monotone_and_reaches_total() {
        let out = tempfile::tempdir().unwrap();
        let pool = ConversionPool::new(Arc::new(FakeConverter::default()), 4);
        let batch = items(&["1.png", "2.png", "bad3.png", "4.png", "5.png"]);
        let seen = Mutex::new(Vec::new());

        pool.run(&batch, out.path(), &CancelToken::new(), |_, p| {
            seen.lock().unwrap().push(p)
        })
        .await;

        let seen = seen.into_inner().unwrap();
        let completed: Vec<_> = seen.iter().map(|p| p.completed).collect();
        assert_eq!(completed, vec![1, 2, 3, 4, 5]);
        assert!(seen.iter().all(|p| p.total == 5));
    }

    #[tokio::test]
    async fn cancellation_stops_dispatch_after_k_items() {
        let out = tempfile::tempdir().unwrap();
        let converter = Arc::new(FakeConverter::default());
        let pool = ConversionPool::new(converter.clone(), 1);
        let batch = items(&["a.png", "b.png", "c.png", "d.png", "e.png"]);
        let cancel = CancelToken::new();

        let run = pool
            .run(&batch, out.path(), &cancel, |_, p| {
                if p.completed == 2 {
                    cancel.cancel();
                }
            })
            .await;

        assert!(run.cancelled);
        assert_eq!(run.outcomes.len(), 2);
        assert_eq!(run.not_started, 3);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelled_before_start_dispatches_nothing() {
        let out = tempfile::tempdir().unwrap();
        let converter = Arc::new(FakeConverter::default());
        let pool = ConversionPool::new(converter.clone(), 4);
        let cancel = CancelToken::new();
        cancel.cancel();

        let run = pool
            .run(&items(&["a.png", "b.png"]), out.path(), &cancel, |_, _| {})
            .await;

        assert!(run.cancelled);
        assert!(run.outcomes.is_empty());
        assert_eq!(run.not_started, 2);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_batch_finishes_immediately() {
        let out = tempfile::tempdir().unwrap();
        let pool = ConversionPool::new(Arc::new(FakeConverter::default()), 2);
        let run = pool.run(&[], out.path(), &CancelToken::new(), |_, _| {}).await;
        assert!(run.outcomes.is_empty());
        assert!(!run.cancelled);
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let pool = ConversionPool::new(Arc::new(FakeConverter::default()), 0);
        assert_eq!(pool.concurrency(), 1);
    }

    #[test]
    fn destinations_replace_extension() {
        let planned = plan_destinations(&items(&["a.png", "sub/b.JPG", "c.tiff"]));
        assert_eq!(
            planned,
            vec![
                PathBuf::from("a.pdf"),
                PathBuf::from("sub/b.pdf"),
                PathBuf::from("c.pdf")
            ]
        );
    }

    #[test]
    fn colliding_stems_are_disambiguated() {
        let planned = plan_destinations(&items(&["a.jpg", "a.png", "other/a.png"]));
        assert_eq!(
            planned,
            vec![
                PathBuf::from("a.pdf"),
                PathBuf::from("a.png.pdf"),
                PathBuf::from("other/a.pdf")
            ]
        );

        let planned = plan_destinations(&items(&["a.png.bmp", "a.bmp", "a.png"]));
        assert_eq!(
            planned,
            vec![
                PathBuf::from("a.png.pdf"),
                PathBuf::from("a.pdf"),
                PathBuf::from("a (2).pdf")
            ]
        );
    }

    #[test]
    fn collisions_ignore_case() {
        let planned = plan_destinations(&items(&["A.png", "a.jpg", "sub/Scan.TIFF", "sub/scan.gif"]));
        assert_eq!(
            planned,
            vec![
                PathBuf::from("A.pdf"),
                PathBuf::from("a.jpg.pdf"),
                PathBuf::from("sub/Scan.pdf"),
                PathBuf::from("sub/scan.gif.pdf")
            ]
        );
    }
}
