// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio Batch — the concurrent conversion engine.  Discovers images under an
// input root, fans conversions out over a bounded worker pool, reports
// progress through a sink, and optionally packages the artifacts into a ZIP
// archive that mirrors the input tree.

pub mod archive;
pub mod cancel;
pub mod discovery;
pub mod pool;
pub mod progress;
pub mod session;
pub mod workspace;

pub use archive::ArchiveAssembler;
pub use cancel::CancelToken;
pub use discovery::ImageDiscoverer;
pub use pool::ConversionPool;
pub use progress::{ChannelReporter, LogReporter, ProgressReporter, SessionEvent};
pub use session::ConversionSession;
pub use workspace::TemporaryWorkspace;
