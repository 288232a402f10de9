// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document — Document processing for the Folio batch converter.
//
// Provides image normalisation (size capping, colour-mode coercion), single
// page PDF creation, and `ImagePdfConverter`, the production `ItemConverter`.

pub mod convert;
pub mod image;
pub mod pdf;

#[cfg(test)]
mod fixtures;

// Re-export the primary structs so callers can use `folio_document::PdfWriter` etc.
pub use crate::convert::ImagePdfConverter;
pub use crate::image::processor::ImageProcessor;
pub use crate::pdf::writer::PdfWriter;
