// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-session scratch directory used when packaging.

use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, warn};

use folio_core::error::{FolioError, Result};

/// Exclusively-owned temporary directory for one session.
///
/// Removed by [`TemporaryWorkspace::remove`], or on drop if that was never
/// reached (panic, early return).
#[derive(Debug)]
pub struct TemporaryWorkspace {
    dir: TempDir,
}

impl TemporaryWorkspace {
    /// Create a fresh workspace in the system temporary directory.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("folio-")
            .tempdir()
            .map_err(|e| FolioError::Workspace(format!("create temporary workspace: {e}")))?;
        debug!(path = %dir.path().display(), "temporary workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Delete the workspace and everything in it.
    ///
    /// A failure is logged and returned; the directory may then remain on
    /// disk.
    pub fn remove(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            warn!(path = %path.display(), error = %e, "failed to remove temporary workspace");
            FolioError::Workspace(format!("remove {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "temporary workspace removed");
        Ok(())
    }
}
