//! Tunable parameters for the pixel comparator.

use serde::{Deserialize, Serialize};

/// Default per-channel delta above which a pixel counts as different.
///
/// Tolerant of anti-aliasing seams and JPEG ringing; revisions of the
/// pipeline have used 25 and 50.
pub const DEFAULT_COLOR_THRESHOLD: u8 = 25;

/// Configuration for [`ImageEngine`](super::ImageEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelConfig {
    /// Per-channel difference threshold (0-255); a pixel differs when any
    /// RGBA channel delta is strictly greater
    pub color_threshold: u8,
    /// Connected-component settings for diff regions
    pub regions: RegionConfig,
    /// Look of the annotated diff artifact
    pub annotation: AnnotationStyle,
}

impl Default for PixelConfig {
    fn default() -> Self {
        Self {
            color_threshold: DEFAULT_COLOR_THRESHOLD,
            regions: RegionConfig::default(),
            annotation: AnnotationStyle::default(),
        }
    }
}

impl PixelConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-channel color threshold
    #[must_use]
    pub const fn with_color_threshold(mut self, threshold: u8) -> Self {
        self.color_threshold = threshold;
        self
    }

    /// Set the region detection config
    #[must_use]
    pub const fn with_regions(mut self, regions: RegionConfig) -> Self {
        self.regions = regions;
        self
    }

    /// Set the annotation style
    #[must_use]
    pub const fn with_annotation(mut self, annotation: AnnotationStyle) -> Self {
        self.annotation = annotation;
        self
    }
}

/// Connected-component labeling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Chebyshev radius joining differing pixels into one component
    /// (1 = plain 8-connectivity, larger values bridge small gaps)
    pub gap_radius: u32,
    /// Components with fewer pixels are treated as noise and dropped
    pub min_pixels: usize,
    /// Bounding boxes grown by this many pixels per side are merged
    /// whenever they overlap
    pub merge_padding: u32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            gap_radius: 2,
            min_pixels: 10,
            merge_padding: 10,
        }
    }
}

impl RegionConfig {
    /// Set the flood-fill gap radius (clamped to at least 1)
    #[must_use]
    pub const fn with_gap_radius(mut self, radius: u32) -> Self {
        self.gap_radius = if radius == 0 { 1 } else { radius };
        self
    }

    /// Set the noise floor
    #[must_use]
    pub const fn with_min_pixels(mut self, min_pixels: usize) -> Self {
        self.min_pixels = min_pixels;
        self
    }

    /// Set the merge padding
    #[must_use]
    pub const fn with_merge_padding(mut self, padding: u32) -> Self {
        self.merge_padding = padding;
        self
    }
}

/// Styling of the annotated diff artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationStyle {
    /// Extra space between a region's bounding box and its ellipse
    pub ellipse_padding: u32,
    /// Ellipse stroke thickness in pixels
    pub stroke: u32,
    /// Ellipse outline color
    pub outline_color: [u8; 4],
    /// Tint blended over differing pixels (alpha = strength)
    pub tint_color: [u8; 4],
    /// Label text color
    pub label_color: [u8; 4],
    /// Label and header background color
    pub label_background: [u8; 4],
    /// Integer glyph scale for labels and header text
    pub glyph_scale: u32,
    /// Draw the summary header band
    pub header: bool,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            ellipse_padding: 6,
            stroke: 2,
            outline_color: [255, 0, 0, 255],
            tint_color: [255, 0, 0, 110],
            label_color: [255, 255, 255, 255],
            label_background: [200, 0, 0, 255],
            glyph_scale: 2,
            header: true,
        }
    }
}

impl AnnotationStyle {
    /// Set the outline color
    #[must_use]
    pub const fn with_outline_color(mut self, r: u8, g: u8, b: u8, a: u8) -> Self {
        self.outline_color = [r, g, b, a];
        self
    }

    /// Toggle the header band
    #[must_use]
    pub const fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Set the glyph scale (clamped to at least 1)
    #[must_use]
    pub const fn with_glyph_scale(mut self, scale: u32) -> Self {
        self.glyph_scale = if scale == 0 { 1 } else { scale };
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_config_defaults() {
        let config = PixelConfig::default();
        assert_eq!(config.color_threshold, 25);
        assert_eq!(config.regions.gap_radius, 2);
        assert_eq!(config.regions.min_pixels, 10);
        assert_eq!(config.regions.merge_padding, 10);
        assert!(config.annotation.header);
    }

    #[test]
    fn test_pixel_config_builder() {
        let config = PixelConfig::new()
            .with_color_threshold(50)
            .with_regions(RegionConfig::default().with_min_pixels(1));
        assert_eq!(config.color_threshold, 50);
        assert_eq!(config.regions.min_pixels, 1);
    }

    #[test]
    fn test_zero_radius_and_scale_clamped() {
        assert_eq!(RegionConfig::default().with_gap_radius(0).gap_radius, 1);
        assert_eq!(AnnotationStyle::default().with_glyph_scale(0).glyph_scale, 1);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = PixelConfig::default().with_color_threshold(40);
        let json = serde_json::to_string(&config).unwrap();
        let back: PixelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
