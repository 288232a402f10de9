// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image → PDF conversion of a single item.
//
// Pipeline: decode → cap dimensions → normalise colour → render PDF → write
// atomically beside the destination. The source is opened read-only and
// never touched again.

use std::io::Write;
use std::path::Path;

use tracing::{debug, instrument};

use folio_core::config::ConversionConfig;
use folio_core::error::ConversionError;
use folio_core::traits::ItemConverter;

use crate::image::processor::ImageProcessor;
use crate::pdf::writer::PdfWriter;

/// Production `ItemConverter`: one raster image in, one single-page PDF out.
pub struct ImagePdfConverter {
    max_dimension: u32,
    background: [u8; 3],
    writer: PdfWriter,
}

impl ImagePdfConverter {
    /// Build a converter from the session configuration.
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
            background: config.background,
            writer: PdfWriter::new(config.dpi),
        }
    }

    /// Render `source` into PDF bytes without touching the filesystem
    /// beyond reading the source.
    pub fn render(&self, source: &Path) -> Result<Vec<u8>, ConversionError> {
        let image = ImageProcessor::open(source)?
            .fit_within(self.max_dimension)
            .normalise_colour(self.background)
            .into_dynamic();
        let title = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.writer.create_from_image(&image, &title)
    }
}

impl Default for ImagePdfConverter {
    fn default() -> Self {
        Self::new(&ConversionConfig::default())
    }
}

impl ItemConverter for ImagePdfConverter {
    #[instrument(skip(self), fields(source = %source.display(), destination = %destination.display()))]
    fn convert(&self, source: &Path, destination: &Path) -> Result<(), ConversionError> {
        let bytes = self.render(source)?;

        let parent = destination.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;

        // Write next to the destination and rename into place so a partial
        // artifact is never visible under its final name.
        let mut staged = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| ConversionError::Encode(format!("stage {}: {e}", parent.display())))?;
        staged
            .write_all(&bytes)
            .map_err(|e| ConversionError::Encode(format!("write {}: {e}", destination.display())))?;
        staged
            .persist(destination)
            .map_err(|e| ConversionError::Encode(format!("persist {}: {e}", destination.display())))?;

        debug!(bytes = bytes.len(), "PDF artifact written");
        Ok(())
    }
}

/// Create `dir` and its ancestors. Sibling workers may race to create the
/// same directories; losing that race is not an error.
fn ensure_dir(dir: &Path) -> Result<(), ConversionError> {
    match std::fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(ConversionError::Encode(format!(
            "create directory {}: {e}",
            dir.display()
        ))),
    }
}
