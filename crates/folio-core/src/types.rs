// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Folio batch converter.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Pattern that matches every file name.
pub const MATCH_ALL: &str = "*";

/// Supported raster input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    Png,
    Jpeg,
    Bmp,
    Tiff,
    WebP,
    Gif,
    /// HEIC/HEIF containers. Discovered like any other image; decoding depends
    /// on the codecs compiled into the converter.
    Heif,
}

impl SourceFormat {
    /// Every extension (lowercase) accepted during discovery.
    pub const EXTENSIONS: &'static [&'static str] = &[
        "png", "jpg", "jpeg", "bmp", "tiff", "webp", "gif", "heic", "heif",
    ];

    /// Infer the format from a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            "tiff" => Some(Self::Tiff),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "heic" | "heif" => Some(Self::Heif),
            _ => None,
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// What the caller asked for. Immutable once a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Directory tree to convert.
    pub input_root: PathBuf,
    /// Package every artifact into one ZIP archive.
    pub package: bool,
    /// Case-insensitive glob matched against each file's base name.
    pub pattern: String,
    /// Artifact directory (unpackaged) or archive file (packaged).
    /// `None` means beside the sources, or a timestamped archive in the
    /// input root.
    pub output: Option<PathBuf>,
}

impl ConversionRequest {
    /// Convert everything under `input_root`, writing PDFs beside the sources.
    pub fn new(input_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            package: false,
            pattern: MATCH_ALL.to_owned(),
            output: None,
        }
    }

    /// Request packaging into a single archive.
    pub fn packaged(mut self) -> Self {
        self.package = true;
        self
    }

    /// Restrict discovery to file names matching `pattern`.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Set the artifact directory or archive path.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Root under which unpackaged artifacts are written.
    pub fn artifact_root(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input_root.clone())
    }

    /// Where the archive goes when packaging, stamped with `at` if no path
    /// was given.
    pub fn archive_path(&self, at: DateTime<Local>) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => self.input_root.join(default_archive_name(at)),
        }
    }
}

/// `PDFs_<YYYYMMDD_HHMMSS>.zip`.
pub fn default_archive_name(at: DateTime<Local>) -> String {
    format!("PDFs_{}.zip", at.format("%Y%m%d_%H%M%S"))
}

/// One candidate image found by discovery.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DiscoveredItem {
    /// Absolute path to the source image.
    pub source: PathBuf,
    /// Path relative to the input root.
    pub relative: PathBuf,
}

impl DiscoveredItem {
    /// Display name: the relative path with `/` separators.
    pub fn name(&self) -> String {
        self.relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Result of converting one discovered item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionOutcome {
    Success {
        source_name: String,
        output_path: PathBuf,
    },
    Failure {
        source_name: String,
        error_detail: String,
    },
}

impl ConversionOutcome {
    pub fn source_name(&self) -> &str {
        match self {
            Self::Success { source_name, .. } | Self::Failure { source_name, .. } => source_name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Completed-over-total progress snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Fraction complete in `0.0..=1.0`. An empty run counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Lifecycle states of a conversion session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Idle,
    Discovering,
    Converting,
    Packaging,
    /// Finished normally (possibly with per-item failures).
    Completed,
    /// Stopped at the caller's request before packaging.
    Cancelled,
    /// Discovery, workspace, or archive failure.
    Failed,
}

/// Final tally handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub status: SessionStatus,
    pub total: usize,
    pub converted: usize,
    pub failed: usize,
    /// Archive written by this session, if any.
    pub archive: Option<PathBuf>,
    /// Session-level error detail when `status` is `Failed`.
    pub error: Option<String>,
    /// Per-item outcomes in arrival order.
    pub outcomes: Vec<ConversionOutcome>,
}

impl SessionSummary {
    /// Items that finished, successfully or not.
    pub fn completed(&self) -> usize {
        self.converted + self.failed
    }
}
