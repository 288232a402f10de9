// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seam between the batch engine and the per-item conversion backend.

use std::path::Path;

use crate::error::ConversionError;

/// Converts one source image into one artifact on disk.
///
/// Implementations run on worker threads, several at once, each with a
/// distinct `destination`. They must create the destination's parent
/// directories themselves (tolerating sibling workers racing to do the same)
/// and must never modify `source`.
pub trait ItemConverter: Send + Sync + 'static {
    fn convert(&self, source: &Path, destination: &Path) -> Result<(), ConversionError>;
}
