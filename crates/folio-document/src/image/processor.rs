// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, cap dimensions, and coerce the colour model into
// something a PDF image XObject can carry (8-bit grayscale or 8-bit RGB).
// Operates on in-memory images using the `image` crate.

use image::{ColorType, DynamicImage, Rgb, RgbImage, RgbaImage};
use tracing::{debug, info, instrument};

use folio_core::error::ConversionError;

/// Image processing pipeline operating on a single in-memory image.
///
/// Each step consumes `self` and returns a new `ImageProcessor`, so the
/// conversion pipeline reads as a chain:
///
/// ```ignore
/// let image = ImageProcessor::open("scan.png")?
///     .fit_within(2000)
///     .normalise_colour([255, 255, 255])
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path. The source file is only read.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, ConversionError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            ConversionError::Decode(format!("{}: {}", path.as_ref().display(), err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Image loaded"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Downsample so that neither side exceeds `max_dimension`, preserving
    /// aspect ratio. Uses Lanczos3 filtering. Images already within bounds are
    /// returned untouched; this never upscales.
    #[instrument(skip(self))]
    pub fn fit_within(self, max_dimension: u32) -> Self {
        let (from_w, from_h) = (self.image.width(), self.image.height());
        if from_w <= max_dimension && from_h <= max_dimension {
            return self;
        }

        let resized = self.image.resize(
            max_dimension,
            max_dimension,
            image::imageops::FilterType::Lanczos3,
        );
        info!(
            from_w,
            from_h,
            new_w = resized.width(),
            new_h = resized.height(),
            "Downsampled oversized image"
        );
        Self { image: resized }
    }

    /// Coerce the colour model for PDF embedding.
    ///
    /// 8-bit grayscale and 8-bit RGB pass through; 16-bit grayscale is
    /// narrowed to 8-bit grayscale. Anything with an alpha channel is
    /// composited onto `background` and becomes RGB. Every other mode is
    /// converted to RGB. Palette images arrive here already expanded by the
    /// decoder.
    #[instrument(skip(self))]
    pub fn normalise_colour(self, background: [u8; 3]) -> Self {
        let color = self.image.color();
        let image = match color {
            ColorType::L8 | ColorType::Rgb8 => self.image,
            ColorType::L16 => DynamicImage::ImageLuma8(self.image.to_luma8()),
            c if c.has_alpha() => {
                DynamicImage::ImageRgb8(flatten_onto(&self.image.to_rgba8(), background))
            }
            _ => DynamicImage::ImageRgb8(self.image.to_rgb8()),
        };
        debug!(from = ?color, to = ?image.color(), "Colour mode normalised");
        Self { image }
    }
}

/// Composite an RGBA buffer onto an opaque background colour.
fn flatten_onto(rgba: &RgbaImage, background: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = u32::from(a);
        let blend = |channel: u8, bg: u8| -> u8 {
            ((u32::from(channel) * alpha + u32::from(bg) * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ])
    })
}
