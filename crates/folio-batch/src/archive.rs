// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Archive assembly — packs the workspace into one deflated ZIP.
//
// Entry names are paths relative to the workspace root with `/` separators,
// so the archive mirrors the input tree. The archive is staged in a temporary
// sibling file and only renamed to its final name once the central directory
// is written; on any error the staging file is dropped (and deleted).

use std::fs::File;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use folio_core::error::{FolioError, Result};

/// Packs a directory tree into a ZIP archive.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveAssembler;

impl ArchiveAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Write every file under `workspace_root` into `archive_path`.
    ///
    /// Returns the number of entries written. Either the complete archive
    /// exists at `archive_path` afterwards or nothing new does.
    #[instrument(skip(self), fields(workspace = %workspace_root.display(), archive = %archive_path.display()))]
    pub fn assemble(&self, workspace_root: &Path, archive_path: &Path) -> Result<usize> {
        let parent = archive_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)
            .map_err(|e| archive_err(format!("create {}: {e}", parent.display())))?;

        let mut staged = NamedTempFile::new_in(parent)
            .map_err(|e| archive_err(format!("stage archive in {}: {e}", parent.display())))?;

        let entries = {
            let mut zip = ZipWriter::new(staged.as_file_mut());
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            let mut entries = 0usize;

            for entry in WalkDir::new(workspace_root).sort_by_file_name() {
                let entry =
                    entry.map_err(|e| archive_err(format!("walk workspace: {e}")))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = entry_name(workspace_root, entry.path())?;

                zip.start_file(name.as_str(), options)
                    .map_err(|e| archive_err(format!("add {name}: {e}")))?;
                let mut source = File::open(entry.path())
                    .map_err(|e| archive_err(format!("open {}: {e}", entry.path().display())))?;
                std::io::copy(&mut source, &mut zip)
                    .map_err(|e| archive_err(format!("write {name}: {e}")))?;

                debug!(entry = %name, "archived");
                entries += 1;
            }

            zip.finish()
                .map_err(|e| archive_err(format!("finalize archive: {e}")))?;
            entries
        };

        staged
            .as_file()
            .sync_all()
            .map_err(|e| archive_err(format!("flush archive: {e}")))?;
        staged
            .persist(archive_path)
            .map_err(|e| archive_err(format!("persist {}: {e}", archive_path.display())))?;

        info!(entries, "archive assembled");
        Ok(entries)
    }
}

fn archive_err(detail: String) -> FolioError {
    FolioError::Archive(detail)
}

/// `path` relative to `root`, joined with `/`.
fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| archive_err(format!("{} outside workspace: {e}", path.display())))?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
