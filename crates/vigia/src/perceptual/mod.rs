//! Perceptual comparator: the learned half of the hybrid comparison.
//!
//! Both images pass through one frozen pipeline (resize, mean/std
//! normalization, forward pass) and are compared by cosine similarity of
//! their embeddings. The model is loaded lazily from the first loader tier
//! that succeeds; when none does, the engine stays unavailable and reports
//! that through its results instead of failing.

mod config;
mod engine;
mod loader;
mod model;
mod pipeline;
mod similarity;

pub use config::{
    PerceptualConfig, RepositoryRef, DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_REPOSITORY_BASE,
};
pub use engine::{EngineStatus, PerceptualEngine, PerceptualResult};
pub use loader::{
    loaders_from_config, EmbeddedLoader, LocalPathLoader, ModelLoader, RepositoryLoader,
    UrlLoader,
};
pub use model::{
    Layer, ModelArtifact, Tensor, IMAGENET_MEAN, IMAGENET_STD, MAX_INPUT_SIZE, MAX_TENSOR_ELEMENTS,
};
pub use pipeline::preprocess;
pub use similarity::{cosine_similarity, Embedding};
