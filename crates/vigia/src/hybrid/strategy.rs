//! Zones and the strategy that decided a verdict.

use super::config::HybridConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a diff fraction falls relative to the configured thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    /// `diff <= low_pass`
    Pass,
    /// `diff > high_fail`
    Fail,
    /// Between the two; the pixel signal alone is ambiguous
    Gray,
}

impl Zone {
    /// Classify a diff fraction
    #[must_use]
    pub fn classify(diff_percentage: f64, config: &HybridConfig) -> Self {
        if diff_percentage <= config.low_pass {
            Self::Pass
        } else if diff_percentage > config.high_fail {
            Self::Fail
        } else {
            Self::Gray
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Gray => "GRAY",
        };
        f.write_str(s)
    }
}

/// Which rule produced the final verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    /// Clear pass on pixels alone
    PixelPass,
    /// Clear fail on pixels alone
    PixelFail,
    /// Gray zone without a perceptual engine; decided by pixel tolerance
    PixelOnly,
    /// Gray zone decided by perceptual similarity
    AiFallback,
}

impl Strategy {
    /// Upper-snake name used in summaries and JSON
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PixelPass => "PIXEL_PASS",
            Self::PixelFail => "PIXEL_FAIL",
            Self::PixelOnly => "PIXEL_ONLY",
            Self::AiFallback => "AI_FALLBACK",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
