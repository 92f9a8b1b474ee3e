//! The deterministic pixel comparator.

use super::annotate::render_artifact;
use super::backend::PixelBackend;
use super::config::PixelConfig;
use super::regions::{detect_regions, DiffRegion};
use crate::raster::{resample_to, with_regions_blanked, IgnoreRegion};
use crate::result::{VigiaError, VigiaResult};
use image::RgbaImage;
use serde::Serialize;
use std::borrow::Cow;

/// Result of a pixel comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    /// Whether the diff percentage is within tolerance
    pub matches: bool,
    /// Fraction of differing pixels (0.0-1.0)
    pub diff_percentage: f64,
    /// Number of differing pixels
    pub diff_pixel_count: usize,
    /// Number of pixels compared (baseline width x height)
    pub total_pixel_count: usize,
    /// Annotated diff image, built from the (resampled) actual image
    #[serde(skip)]
    pub diff_artifact: Option<RgbaImage>,
    /// Whether actual was resampled to the baseline's dimensions
    pub was_scaled: bool,
    /// baseline width / actual width (1.0 when not scaled)
    pub scale_factor: f64,
    /// Actual image dimensions before resampling
    pub original_actual_size: (u32, u32),
    /// Labeled diff regions (empty when the artifact was not rendered)
    pub regions: Vec<DiffRegion>,
    /// Name of the diff backend that produced the mask
    pub backend: &'static str,
}

impl ComparisonResult {
    /// Check if images are identical (no differing pixels)
    #[must_use]
    pub const fn is_identical(&self) -> bool {
        self.diff_pixel_count == 0
    }

    /// Diff percentage on a 0-100 scale
    #[must_use]
    pub fn diff_percent(&self) -> f64 {
        self.diff_percentage * 100.0
    }

    /// Check if the diff is within another tolerance (0.0-1.0)
    #[must_use]
    pub fn within(&self, tolerance: f64) -> bool {
        self.diff_percentage <= tolerance
    }
}

/// Baseline and actual exactly as the diff mask saw them: actual resampled
/// to the baseline's size, ignore regions blanked in both
#[derive(Debug)]
pub(crate) struct AlignedPair<'a> {
    pub(crate) baseline: Cow<'a, RgbaImage>,
    pub(crate) actual: Cow<'a, RgbaImage>,
}

/// Pixel-difference engine
///
/// Baseline dimensions are authoritative: a differently-sized actual image is
/// resampled (bicubic) to the baseline, never the reverse.
#[derive(Debug, Clone, Default)]
pub struct ImageEngine {
    config: PixelConfig,
    backend: PixelBackend,
}

impl ImageEngine {
    /// Create an engine on the process-wide backend
    #[must_use]
    pub fn new(config: PixelConfig) -> Self {
        Self {
            config,
            backend: PixelBackend::shared(),
        }
    }

    /// Create an engine on a specific backend
    #[must_use]
    pub fn with_backend(config: PixelConfig, backend: PixelBackend) -> Self {
        Self { config, backend }
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &PixelConfig {
        &self.config
    }

    /// Get the diff backend
    #[must_use]
    pub const fn backend(&self) -> &PixelBackend {
        &self.backend
    }

    /// Compare `actual` against `baseline` and render the diff artifact
    ///
    /// # Errors
    ///
    /// Returns error if `tolerance` is outside [0, 1] or either image is empty
    pub fn compare(
        &self,
        baseline: &RgbaImage,
        actual: &RgbaImage,
        tolerance: f64,
        ignore_regions: &[IgnoreRegion],
    ) -> VigiaResult<ComparisonResult> {
        self.run(baseline, actual, tolerance, ignore_regions, true)
            .map(|(result, _)| result)
    }

    /// Same numbers as [`compare`](Self::compare), without regions or artifact
    ///
    /// # Errors
    ///
    /// Returns error if `tolerance` is outside [0, 1] or either image is empty
    pub fn measure(
        &self,
        baseline: &RgbaImage,
        actual: &RgbaImage,
        tolerance: f64,
        ignore_regions: &[IgnoreRegion],
    ) -> VigiaResult<ComparisonResult> {
        self.run(baseline, actual, tolerance, ignore_regions, false)
            .map(|(result, _)| result)
    }

    /// [`compare`](Self::compare), also handing back the aligned view
    pub(crate) fn compare_aligned<'a>(
        &self,
        baseline: &'a RgbaImage,
        actual: &'a RgbaImage,
        tolerance: f64,
        ignore_regions: &[IgnoreRegion],
    ) -> VigiaResult<(ComparisonResult, AlignedPair<'a>)> {
        self.run(baseline, actual, tolerance, ignore_regions, true)
    }

    fn run<'a>(
        &self,
        baseline: &'a RgbaImage,
        actual: &'a RgbaImage,
        tolerance: f64,
        ignore_regions: &[IgnoreRegion],
        render: bool,
    ) -> VigiaResult<(ComparisonResult, AlignedPair<'a>)> {
        if !(0.0..=1.0).contains(&tolerance) {
            return Err(VigiaError::invalid_argument(format!(
                "tolerance {tolerance} outside [0, 1]"
            )));
        }
        let (width, height) = baseline.dimensions();
        let (actual_w, actual_h) = actual.dimensions();
        if width == 0 || height == 0 || actual_w == 0 || actual_h == 0 {
            return Err(VigiaError::invalid_argument(format!(
                "cannot compare empty images (baseline {width}x{height}, actual {actual_w}x{actual_h})"
            )));
        }

        let was_scaled = (actual_w, actual_h) != (width, height);
        if was_scaled {
            tracing::debug!(
                from = %format!("{actual_w}x{actual_h}"),
                to = %format!("{width}x{height}"),
                "resampling actual to baseline dimensions"
            );
        }
        let resampled = resample_to(actual, width, height);
        let scale_factor = if was_scaled {
            f64::from(width) / f64::from(actual_w)
        } else {
            1.0
        };

        let baseline_view = with_regions_blanked(baseline, ignore_regions);
        // The artifact is drawn on the unblanked image, so keep both
        let actual_blanked = match with_regions_blanked(&resampled, ignore_regions) {
            Cow::Owned(img) => Some(img),
            Cow::Borrowed(_) => None,
        };

        let mask = self.backend.diff_mask(
            &baseline_view,
            actual_blanked.as_ref().unwrap_or(&*resampled),
            self.config.color_threshold,
        );

        let diff_pixel_count = mask.count();
        let total_pixel_count = mask.len();
        let diff_percentage =
            (diff_pixel_count as f64 / total_pixel_count as f64).clamp(0.0, 1.0);
        let matches = diff_percentage <= tolerance;

        let (regions, diff_artifact) = if render {
            let regions = detect_regions(&mask, &self.config.regions);
            let artifact = render_artifact(&resampled, &mask, &regions, &self.config.annotation);
            (regions, Some(artifact))
        } else {
            (Vec::new(), None)
        };

        tracing::debug!(
            diff_pixels = diff_pixel_count,
            total_pixels = total_pixel_count,
            diff_percentage,
            matches,
            regions = regions.len(),
            backend = self.backend.name(),
            "pixel comparison done"
        );

        let result = ComparisonResult {
            matches,
            diff_percentage,
            diff_pixel_count,
            total_pixel_count,
            diff_artifact,
            was_scaled,
            scale_factor,
            original_actual_size: (actual_w, actual_h),
            regions,
            backend: self.backend.name(),
        };
        let aligned = AlignedPair {
            baseline: baseline_view,
            actual: actual_blanked.map_or(resampled, Cow::Owned),
        };
        Ok((result, aligned))
    }
}
