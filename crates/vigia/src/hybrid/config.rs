//! Zone thresholds for the hybrid decision.

use crate::result::{VigiaError, VigiaResult};
use serde::{Deserialize, Serialize};

/// Thresholds, as diff fractions except `ai_similarity`
///
/// `low_pass <= tolerance <= high_fail`. Diffs at or under `low_pass` pass
/// outright, diffs over `high_fail` fail outright, and everything between is
/// the gray zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    /// Clear-pass ceiling
    pub low_pass: f64,
    /// Pixel-only verdict threshold inside the gray zone
    pub tolerance: f64,
    /// Clear-fail floor (exclusive)
    pub high_fail: f64,
    /// Minimum cosine similarity for a perceptual match
    pub ai_similarity: f64,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            low_pass: 0.01,
            tolerance: 0.05,
            high_fail: 0.20,
            ai_similarity: 0.95,
        }
    }
}

impl HybridConfig {
    /// Set the clear-pass ceiling
    #[must_use]
    pub const fn with_low_pass(mut self, low_pass: f64) -> Self {
        self.low_pass = low_pass;
        self
    }

    /// Set the gray-zone pixel tolerance
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the clear-fail floor
    #[must_use]
    pub const fn with_high_fail(mut self, high_fail: f64) -> Self {
        self.high_fail = high_fail;
        self
    }

    /// Set the perceptual similarity threshold
    #[must_use]
    pub const fn with_ai_similarity(mut self, ai_similarity: f64) -> Self {
        self.ai_similarity = ai_similarity;
        self
    }

    /// Check ordering and ranges
    ///
    /// # Errors
    ///
    /// Returns [`VigiaError::InvalidArgument`] naming the violated bound
    pub fn validate(&self) -> VigiaResult<()> {
        let fractions = [
            ("low_pass", self.low_pass),
            ("tolerance", self.tolerance),
            ("high_fail", self.high_fail),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(VigiaError::invalid_argument(format!(
                    "{name} {value} outside [0, 1]"
                )));
            }
        }
        if self.low_pass > self.tolerance || self.tolerance > self.high_fail {
            return Err(VigiaError::invalid_argument(format!(
                "thresholds must satisfy low_pass <= tolerance <= high_fail (got {} / {} / {})",
                self.low_pass, self.tolerance, self.high_fail
            )));
        }
        if !(-1.0..=1.0).contains(&self.ai_similarity) {
            return Err(VigiaError::invalid_argument(format!(
                "ai_similarity {} outside [-1, 1]",
                self.ai_similarity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HybridConfig::default();
        assert_eq!(config.low_pass, 0.01);
        assert_eq!(config.tolerance, 0.05);
        assert_eq!(config.high_fail, 0.20);
        assert_eq!(config.ai_similarity, 0.95);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_collapsed_zones_are_valid() {
        let config = HybridConfig::default()
            .with_low_pass(0.1)
            .with_tolerance(0.1)
            .with_high_fail(0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_misordered_rejected() {
        let config = HybridConfig::default().with_tolerance(0.5);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("low_pass <= tolerance <= high_fail"));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(HybridConfig::default().with_low_pass(-0.1).validate().is_err());
        assert!(HybridConfig::default()
            .with_high_fail(f64::NAN)
            .validate()
            .is_err());
        assert!(HybridConfig::default()
            .with_ai_similarity(1.5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: HybridConfig = serde_json::from_str(r#"{"tolerance": 0.1}"#).unwrap();
        assert_eq!(config.tolerance, 0.1);
        assert_eq!(config.high_fail, 0.20);
    }
}
