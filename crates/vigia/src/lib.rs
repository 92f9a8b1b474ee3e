//! Vigia: hybrid visual comparison for screenshot regression tests
//!
//! Vigia ("watch" in Spanish and Portuguese) decides whether a freshly
//! captured screenshot still matches its trusted baseline. A deterministic
//! pixel comparator settles the clear cases; an embedded perceptual model
//! settles the ambiguous middle when it is available.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     VIGIA Architecture                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Baseline + │    │ Image      │    │ Zone       │            │
//! │   │ Actual     │───►│ Engine     │───►│ Policy     │──► Result  │
//! │   │ (RGBA)     │    │ (pixels)   │    │            │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             │ gray zone         │
//! │                                       ┌─────▼──────┐            │
//! │                                       │ Perceptual │            │
//! │                                       │ Engine     │            │
//! │                                       └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use vigia::{HybridComparator, HybridConfig};
//!
//! # fn main() -> vigia::VigiaResult<()> {
//! let baseline = std::fs::read("baseline.png")?;
//! let actual = std::fs::read("actual.png")?;
//! let hybrid = HybridComparator::new(HybridConfig::default())?;
//! let result = hybrid.compare_encoded(&baseline, &actual, &[])?;
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Zone policy combining the pixel and perceptual comparators
pub mod hybrid;

/// Embedding-based perceptual comparison with tiered model loading
pub mod perceptual;

/// Pixel difference engine: resampling, masking, regions, diff artifact
pub mod pixel;

/// Decoding, encoding and ignore rectangles
pub mod raster;

mod result;

pub use hybrid::{HybridComparator, HybridConfig, HybridResult, Strategy, Zone};
pub use perceptual::{EngineStatus, PerceptualConfig, PerceptualEngine, PerceptualResult};
pub use pixel::{ComparisonResult, DiffRegion, ImageEngine, PixelBackend, PixelConfig};
pub use raster::IgnoreRegion;
pub use result::{VigiaError, VigiaResult};
