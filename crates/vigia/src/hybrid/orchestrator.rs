//! The hybrid decision policy.

use super::config::HybridConfig;
use super::result::HybridResult;
use super::strategy::{Strategy, Zone};
use crate::perceptual::PerceptualEngine;
use crate::pixel::ImageEngine;
use crate::raster::{decode, IgnoreRegion};
use crate::result::VigiaResult;
use image::RgbaImage;
use std::sync::Arc;
use std::time::Instant;

/// Pixel comparison first, perceptual comparison only for the gray zone
///
/// ```text
/// pixel diff ──► ≤ low_pass ──────────────► PIXEL_PASS
///            ├─► > high_fail ─────────────► PIXEL_FAIL
///            └─► gray ─┬─ engine ready ───► AI_FALLBACK (similarity ≥ ai_similarity)
///                      └─ no engine ──────► PIXEL_ONLY  (diff ≤ tolerance)
/// ```
#[derive(Debug, Clone)]
pub struct HybridComparator {
    config: HybridConfig,
    image_engine: ImageEngine,
    perceptual: Option<Arc<PerceptualEngine>>,
}

impl HybridComparator {
    /// Comparator with the default pixel engine and the process-wide
    /// perceptual engine ([`PerceptualEngine::shared`])
    ///
    /// # Errors
    ///
    /// Returns error if `config` fails [`HybridConfig::validate`]
    pub fn new(config: HybridConfig) -> VigiaResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            image_engine: ImageEngine::default(),
            perceptual: Some(PerceptualEngine::shared()),
        })
    }

    /// Replace the pixel engine
    #[must_use]
    pub fn with_image_engine(mut self, image_engine: ImageEngine) -> Self {
        self.image_engine = image_engine;
        self
    }

    /// Use a shared perceptual engine
    #[must_use]
    pub fn with_perceptual(mut self, engine: Arc<PerceptualEngine>) -> Self {
        self.perceptual = Some(engine);
        self
    }

    /// Never consult a perceptual engine; gray zones go to PIXEL_ONLY
    #[must_use]
    pub fn without_perceptual(mut self) -> Self {
        self.perceptual = None;
        self
    }

    /// Thresholds in effect
    #[must_use]
    pub const fn config(&self) -> &HybridConfig {
        &self.config
    }

    /// The pixel engine
    #[must_use]
    pub const fn image_engine(&self) -> &ImageEngine {
        &self.image_engine
    }

    /// The perceptual engine, if any
    #[must_use]
    pub fn perceptual(&self) -> Option<&Arc<PerceptualEngine>> {
        self.perceptual.as_ref()
    }

    /// Compare decoded images
    ///
    /// # Errors
    ///
    /// Returns error if either image is empty; perceptual failures never
    /// surface here
    pub fn compare(
        &self,
        baseline: &RgbaImage,
        actual: &RgbaImage,
        ignore_regions: &[IgnoreRegion],
    ) -> VigiaResult<HybridResult> {
        let start = Instant::now();
        let (comparison, aligned) = self.image_engine.compare_aligned(
            baseline,
            actual,
            self.config.tolerance,
            ignore_regions,
        )?;
        let diff = comparison.diff_percentage;
        let zone = Zone::classify(diff, &self.config);

        let (strategy, matched, perceptual) = match zone {
            Zone::Pass => (Strategy::PixelPass, true, None),
            Zone::Fail => (Strategy::PixelFail, false, None),
            Zone::Gray => match self.available_perceptual() {
                Some(engine) => {
                    // Same aligned, masked view the pixel engine diffed
                    let result =
                        engine.compare(&aligned.baseline, &aligned.actual, self.config.ai_similarity);
                    if let Some(error) = &result.error {
                        tracing::warn!(%error, "perceptual comparison failed, using pixel tolerance");
                        (Strategy::PixelOnly, diff <= self.config.tolerance, Some(result))
                    } else {
                        (Strategy::AiFallback, result.matched, Some(result))
                    }
                }
                None => (Strategy::PixelOnly, diff <= self.config.tolerance, None),
            },
        };

        let result = HybridResult {
            matched,
            comparison,
            used_ai: strategy == Strategy::AiFallback,
            perceptual,
            strategy,
            zone,
            tolerance: self.config.tolerance,
            elapsed: start.elapsed(),
        };
        tracing::debug!(
            matched,
            diff_percentage = diff,
            %zone,
            %strategy,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "hybrid comparison done"
        );
        Ok(result)
    }

    /// Decode PNG/JPEG bytes and compare
    ///
    /// # Errors
    ///
    /// Returns [`crate::VigiaError::Decode`] naming the input that failed, or
    /// any error from [`compare`](Self::compare)
    pub fn compare_encoded(
        &self,
        baseline: &[u8],
        actual: &[u8],
        ignore_regions: &[IgnoreRegion],
    ) -> VigiaResult<HybridResult> {
        let baseline = decode(baseline, "baseline")?;
        let actual = decode(actual, "actual")?;
        self.compare(&baseline, &actual, ignore_regions)
    }

    fn available_perceptual(&self) -> Option<&PerceptualEngine> {
        let engine = self.perceptual.as_deref()?;
        if engine.is_available() {
            Some(engine)
        } else {
            tracing::debug!(status = %engine.status(), "gray zone without perceptual engine");
            None
        }
    }
}
