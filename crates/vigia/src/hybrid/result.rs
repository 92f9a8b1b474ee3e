//! The unified result of a hybrid comparison.

use super::strategy::{Strategy, Zone};
use crate::perceptual::PerceptualResult;
use crate::pixel::ComparisonResult;
use crate::raster::encode_png_base64;
use crate::result::{VigiaError, VigiaResult};
use serde::Serialize;
use std::time::Duration;

/// Pixel result, optional perceptual result, and the verdict drawn from them
#[derive(Debug, Clone, Serialize)]
pub struct HybridResult {
    /// Final verdict
    pub matched: bool,
    /// Pixel comparison (always run; carries the diff artifact)
    pub comparison: ComparisonResult,
    /// Perceptual comparison, when the gray zone invoked it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceptual: Option<PerceptualResult>,
    /// Rule that produced the verdict
    pub strategy: Strategy,
    /// Zone of the pixel diff
    pub zone: Zone,
    /// Whether the perceptual engine decided the verdict
    pub used_ai: bool,
    /// Gray-zone pixel tolerance in effect
    pub tolerance: f64,
    /// Wall-clock time for the whole comparison
    #[serde(serialize_with = "serialize_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

impl HybridResult {
    /// Fraction of differing pixels
    #[must_use]
    pub fn diff_percentage(&self) -> f64 {
        self.comparison.diff_percentage
    }

    /// One-line summary for logs and reports
    ///
    /// ```text
    /// MATCH diff=3.20% time=41ms strategy=AI_FALLBACK similarity=0.9712 scaled=1.333 (actual 150x150)
    /// ```
    #[must_use]
    pub fn summary(&self) -> String {
        let verdict = if self.matched { "MATCH" } else { "MISMATCH" };
        let mut line = format!(
            "{verdict} diff={:.2}% time={}ms strategy={}",
            self.comparison.diff_percent(),
            self.elapsed.as_millis(),
            self.strategy
        );
        if let Some(perceptual) = &self.perceptual {
            match &perceptual.error {
                None => line.push_str(&format!(" similarity={:.4}", perceptual.similarity)),
                Some(error) => line.push_str(&format!(" ai_error=\"{error}\"")),
            }
        }
        if self.comparison.was_scaled {
            let (aw, ah) = self.comparison.original_actual_size;
            line.push_str(&format!(
                " scaled={:.3} (actual {aw}x{ah})",
                self.comparison.scale_factor
            ));
        } else {
            line.push_str(" scaled=no");
        }
        line
    }

    /// The diff artifact as a Base64 PNG, for embedding in reports
    ///
    /// # Errors
    ///
    /// Returns error if there is no artifact or PNG encoding fails
    pub fn diff_image_base64(&self) -> VigiaResult<String> {
        let artifact = self
            .comparison
            .diff_artifact
            .as_ref()
            .ok_or_else(|| VigiaError::image_processing("comparison produced no diff artifact"))?;
        encode_png_base64(artifact)
    }
}
