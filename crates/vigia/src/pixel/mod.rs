//! Pixel comparator: the deterministic half of the hybrid comparison.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │ Resample │──►│ Blank    │──►│ Diff     │──►│ Regions  │──►│ Annotate │
//! │ actual   │   │ ignores  │   │ mask     │   │ (flood)  │   │ artifact │
//! └──────────┘   └──────────┘   └──────────┘   └──────────┘   └──────────┘
//! ```

mod annotate;
mod backend;
mod config;
mod engine;
mod mask;
mod regions;

pub use annotate::{header_height, header_text, render_artifact, text_width};
#[cfg(feature = "gpu")]
pub use backend::GpuBackend;
pub use backend::{channel_delta, DiffBackend, PixelBackend, ScalarBackend};
pub use config::{AnnotationStyle, PixelConfig, RegionConfig, DEFAULT_COLOR_THRESHOLD};
pub use engine::{ComparisonResult, ImageEngine};
pub use mask::DiffMask;
pub use regions::{detect_regions, DiffRegion};
