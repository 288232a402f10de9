// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio — Core types, error definitions, and configuration shared across all crates.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::ConversionConfig;
pub use error::{ConversionError, FolioError};
pub use traits::ItemConverter;
pub use types::*;
