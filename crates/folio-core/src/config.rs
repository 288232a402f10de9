// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion configuration.

use serde::{Deserialize, Serialize};

/// Largest width or height (in pixels) an image keeps before downsampling.
pub const DEFAULT_MAX_DIMENSION: u32 = 2000;

/// Nominal resolution the artifact pages are laid out at.
pub const DEFAULT_DPI: f32 = 100.0;

/// Upper bound on the default worker count; each worker holds a full decode
/// buffer in memory.
pub const MAX_DEFAULT_WORKERS: usize = 4;

/// Settings for one conversion session.
///
/// Passed explicitly to the session constructor; nothing here is global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Images larger than this in either dimension are downsampled to fit.
    pub max_dimension: u32,
    /// Resolution used to size each PDF page from the pixel dimensions.
    pub dpi: f32,
    /// RGB fill that transparent pixels are flattened onto.
    pub background: [u8; 3],
    /// Explicit worker count. `None` uses [`default_workers`].
    pub workers: Option<usize>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            dpi: DEFAULT_DPI,
            background: [255, 255, 255],
            workers: None,
        }
    }
}

impl ConversionConfig {
    /// Number of conversions allowed in flight at once. Never zero.
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(default_workers).max(1)
    }
}

/// `min(host parallelism, MAX_DEFAULT_WORKERS)`, evaluated at call time.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_WORKERS)
}
