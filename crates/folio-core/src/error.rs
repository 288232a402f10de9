// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.
//
// Item-level failures (`ConversionError`) are recovered by the pool and never
// escalate; every `FolioError` ends a session.

use thiserror::Error;

/// Failure converting a single source image into its artifact.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The source could not be opened or decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The artifact could not be produced or written.
    #[error("failed to encode PDF: {0}")]
    Encode(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type for session-level Folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Discovery --
    #[error("image discovery failed: {0}")]
    Discovery(String),

    #[error("invalid file pattern: {0}")]
    InvalidPattern(String),

    // -- Packaging --
    #[error("archive creation failed: {0}")]
    Archive(String),

    #[error("temporary workspace error: {0}")]
    Workspace(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_failures_are_item_level() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: ConversionError = io.into();
        assert!(matches!(err, ConversionError::Io(_)));
        assert_eq!(err.to_string(), "file I/O error: read-only");
    }

    #[test]
    fn session_errors_carry_detail() {
        let err = FolioError::Archive("disk full".into());
        assert_eq!(err.to_string(), "archive creation failed: disk full");
    }
}
