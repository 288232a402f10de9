// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — single-page PDF documents from raster images using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.
//
// Unlike a print layout, the page is sized to the image itself: its physical
// size is the pixel size at the writer's nominal resolution.

use ::image::DynamicImage;
use folio_core::config::DEFAULT_DPI;
use folio_core::error::ConversionError;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, instrument};

/// Millimetres per inch.
const MM_PER_INCH: f32 = 25.4;

/// Creates single-page PDF documents from decoded raster images.
pub struct PdfWriter {
    /// Nominal resolution mapping pixels to physical page size.
    dpi: f32,
}

impl PdfWriter {
    /// Create a new writer laying images out at `dpi`.
    pub fn new(dpi: f32) -> Self {
        Self { dpi }
    }

    /// Physical page size for an image of `width` x `height` pixels.
    pub fn page_dimensions(&self, width: u32, height: u32) -> (Mm, Mm) {
        (
            Mm(width as f32 / self.dpi * MM_PER_INCH),
            Mm(height as f32 / self.dpi * MM_PER_INCH),
        )
    }

    // -- Image to PDF ---------------------------------------------------------

    /// Create a single-page PDF containing the given image, filling the page.
    /// `title` goes into the document metadata.
    ///
    /// 8-bit grayscale images are embedded as single-channel data; every other
    /// colour model is embedded as 8-bit RGB (callers are expected to have
    /// flattened alpha already, see `ImageProcessor::normalise_colour`).
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn create_from_image(
        &self,
        image: &DynamicImage,
        title: &str,
    ) -> Result<Vec<u8>, ConversionError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(ConversionError::Encode(format!(
                "cannot place a {width}x{height} image on a page"
            )));
        }

        let (page_w, page_h) = self.page_dimensions(width, height);

        let raw = match image {
            DynamicImage::ImageLuma8(gray) => RawImage {
                pixels: RawImageData::U8(gray.as_raw().clone()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::R8,
                tag: Vec::new(),
            },
            other => RawImage {
                pixels: RawImageData::U8(other.to_rgb8().into_raw()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            },
        };

        let mut doc = PdfDocument::new(title);
        let xobject_id = doc.add_image(&raw);

        // At `dpi` the image's natural size equals the page, so no scaling.
        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: None,
                scale_y: None,
                dpi: Some(self.dpi),
                rotate: None,
            },
        }];

        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);

        debug!(page_w_mm = page_w.0, page_h_mm = page_h.0, dpi = self.dpi, "Image placed on page");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings");
        }

        Ok(output)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new(DEFAULT_DPI)
    }
}
