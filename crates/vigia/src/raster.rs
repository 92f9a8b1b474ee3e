//! Raster helpers: decoding, PNG/Base64 encoding, ignore rectangles.
//!
//! The comparison engines work on decoded [`RgbaImage`] buffers. These helpers
//! sit at the edge where callers hand over encoded bytes or need the diff
//! artifact back as bytes for a report.

use crate::result::{VigiaError, VigiaResult};
use base64::Engine as _;
use image::{ImageEncoder, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Decode an encoded image (PNG, JPEG) into an RGBA buffer
///
/// `what` names the input in the error message ("baseline", "actual").
///
/// # Errors
///
/// Returns [`VigiaError::Decode`] if the bytes are not a supported image
pub fn decode(bytes: &[u8], what: &str) -> VigiaResult<RgbaImage> {
    let img = image::load_from_memory(bytes).map_err(|e| VigiaError::decode(what, e.to_string()))?;
    Ok(img.to_rgba8())
}

/// Encode an RGBA buffer as PNG
///
/// # Errors
///
/// Returns error if the encoder rejects the buffer
pub fn encode_png(img: &RgbaImage) -> VigiaResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buffer);
    encoder
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| VigiaError::image_processing(format!("Failed to encode PNG: {e}")))?;
    Ok(buffer)
}

/// Encode an RGBA buffer as a Base64 PNG string (standard alphabet, padded)
///
/// # Errors
///
/// Returns error if PNG encoding fails
pub fn encode_png_base64(img: &RgbaImage) -> VigiaResult<String> {
    let png = encode_png(img)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(png))
}

/// Axis-aligned rectangle, in baseline coordinates, excluded from comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IgnoreRegion {
    /// X coordinate of top-left corner
    pub x: u32,
    /// Y coordinate of top-left corner
    pub y: u32,
    /// Width of the region
    pub width: u32,
    /// Height of the region
    pub height: u32,
}

impl IgnoreRegion {
    /// Create a new ignore region
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Check if a point is within this region
    #[must_use]
    pub const fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x
            && py >= self.y
            && px - self.x < self.width
            && py - self.y < self.height
    }

    /// Clip to an image of `width` x `height`
    ///
    /// Returns the half-open pixel span `(x0, y0, x1, y1)`, or `None` when the
    /// region lies entirely outside the image or is empty.
    #[must_use]
    pub fn clip(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x1 = self.x.saturating_add(self.width).min(width);
        let y1 = self.y.saturating_add(self.height).min(height);
        (self.x < x1 && self.y < y1).then_some((self.x, self.y, x1, y1))
    }
}

impl From<(u32, u32, u32, u32)> for IgnoreRegion {
    fn from((x, y, width, height): (u32, u32, u32, u32)) -> Self {
        Self::new(x, y, width, height)
    }
}

/// Set every pixel inside the given regions to transparent black
pub fn blank_regions(img: &mut RgbaImage, regions: &[IgnoreRegion]) {
    let (width, height) = img.dimensions();
    for region in regions {
        if let Some((x0, y0, x1, y1)) = region.clip(width, height) {
            for y in y0..y1 {
                for x in x0..x1 {
                    img.put_pixel(x, y, Rgba([0, 0, 0, 0]));
                }
            }
        }
    }
}

/// Resample `img` to `width` x `height` (Catmull-Rom); borrowed when already that size
#[must_use]
pub fn resample_to(img: &RgbaImage, width: u32, height: u32) -> Cow<'_, RgbaImage> {
    if img.dimensions() == (width, height) {
        Cow::Borrowed(img)
    } else {
        Cow::Owned(image::imageops::resize(
            img,
            width,
            height,
            image::imageops::FilterType::CatmullRom,
        ))
    }
}

/// `img` with `regions` blanked; borrowed when there is nothing to blank
#[must_use]
pub fn with_regions_blanked<'a>(img: &'a RgbaImage, regions: &[IgnoreRegion]) -> Cow<'a, RgbaImage> {
    if regions.is_empty() {
        Cow::Borrowed(img)
    } else {
        let mut owned = img.clone();
        blank_regions(&mut owned, regions);
        Cow::Owned(owned)
    }
}
