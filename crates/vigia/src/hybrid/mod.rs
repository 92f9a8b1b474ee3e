//! Hybrid comparison: pixel verdicts for clear cases, perceptual similarity
//! for the ambiguous middle.

mod config;
mod orchestrator;
mod result;
mod strategy;

pub use config::HybridConfig;
pub use orchestrator::HybridComparator;
pub use result::HybridResult;
pub use strategy::{Strategy, Zone};
