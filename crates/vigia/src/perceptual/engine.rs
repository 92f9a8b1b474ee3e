//! The perceptual engine: lazy model load, embeddings, similarity verdicts.

use super::config::PerceptualConfig;
use super::loader::{loaders_from_config, ModelLoader};
use super::model::ModelArtifact;
use super::pipeline::preprocess;
use super::similarity::Embedding;
use crate::result::{VigiaError, VigiaResult};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Outcome of a perceptual comparison
///
/// Failures are reported through `error` with `matched = false`; the engine
/// never raises from [`PerceptualEngine::compare`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptualResult {
    /// Cosine similarity in [-1, 1]; 0 when the comparison failed
    pub similarity: f64,
    /// `similarity >= threshold`
    pub matched: bool,
    /// Threshold used for the verdict
    pub threshold: f64,
    /// Why the comparison could not run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PerceptualResult {
    fn failed(threshold: f64, error: impl Into<String>) -> Self {
        Self {
            similarity: 0.0,
            matched: false,
            threshold,
            error: Some(error.into()),
        }
    }

    /// Whether the comparison ran
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Engine lifecycle as seen from outside
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EngineStatus {
    /// No load attempted yet
    Uninitialized,
    /// A model is loaded
    Ready {
        /// Tier that produced the model
        tier: String,
        /// Model name
        model: String,
        /// Embedding length
        embedding_dim: usize,
    },
    /// Every tier failed; no retry for the life of the engine
    Unavailable {
        /// Collected tier failures
        reason: String,
    },
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Ready {
                tier,
                model,
                embedding_dim,
            } => write!(f, "ready ({model} via {tier}, {embedding_dim} dims)"),
            Self::Unavailable { reason } => write!(f, "unavailable: {reason}"),
        }
    }
}

#[derive(Debug)]
enum EngineState {
    Ready {
        tier: String,
        model: ModelArtifact,
        embedding_dim: usize,
    },
    Unavailable(String),
}

/// Perceptual comparator backed by a frozen feature extractor
///
/// The model is loaded once, on first use, by whichever caller gets there
/// first; concurrent callers wait for that load. Safe to share behind an
/// `Arc` across threads.
pub struct PerceptualEngine {
    loaders: Vec<Box<dyn ModelLoader>>,
    state: OnceLock<EngineState>,
}

impl fmt::Debug for PerceptualEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerceptualEngine")
            .field("loaders", &self.loaders)
            .field("status", &self.status())
            .finish()
    }
}

impl Default for PerceptualEngine {
    fn default() -> Self {
        Self::new(&PerceptualConfig::default())
    }
}

impl PerceptualEngine {
    /// Engine trying the tiers described by `config`
    #[must_use]
    pub fn new(config: &PerceptualConfig) -> Self {
        Self::with_loaders(loaders_from_config(config))
    }

    /// Engine trying `loaders` in order
    #[must_use]
    pub fn with_loaders(loaders: Vec<Box<dyn ModelLoader>>) -> Self {
        Self {
            loaders,
            state: OnceLock::new(),
        }
    }

    /// Process-wide engine over the default tiers
    ///
    /// Every caller gets the same engine, so the model is loaded (or found
    /// unavailable) at most once per process.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<PerceptualEngine>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::default())))
    }

    /// Engine that is permanently unavailable
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let state = OnceLock::new();
        let _ = state.set(EngineState::Unavailable(reason.into()));
        Self {
            loaders: Vec::new(),
            state,
        }
    }

    /// Load the model if not yet attempted; returns availability
    ///
    /// Idempotent. Only the first call does any work.
    pub fn initialize(&self) -> bool {
        matches!(self.state(), EngineState::Ready { .. })
    }

    /// Whether a model is loaded, loading it on first call
    pub fn is_available(&self) -> bool {
        self.initialize()
    }

    /// Current lifecycle state, without triggering a load
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        match self.state.get() {
            None => EngineStatus::Uninitialized,
            Some(EngineState::Ready {
                tier,
                model,
                embedding_dim,
            }) => EngineStatus::Ready {
                tier: tier.clone(),
                model: model.name.clone(),
                embedding_dim: *embedding_dim,
            },
            Some(EngineState::Unavailable(reason)) => EngineStatus::Unavailable {
                reason: reason.clone(),
            },
        }
    }

    /// Embed one image
    ///
    /// # Errors
    ///
    /// Returns [`VigiaError::PerceptualUnavailable`] if no model loaded, or
    /// an inference error if the forward pass fails or overflows
    pub fn embed(&self, img: &RgbaImage) -> VigiaResult<Embedding> {
        match self.state() {
            EngineState::Ready { model, .. } => {
                if img.width() == 0 || img.height() == 0 {
                    return Err(VigiaError::invalid_argument("cannot embed an empty image"));
                }
                let features = model.forward(preprocess(img, model))?;
                if features.iter().any(|v| !v.is_finite()) {
                    return Err(VigiaError::inference(format!(
                        "{} produced non-finite features",
                        model.name
                    )));
                }
                Ok(Embedding::new(features))
            }
            EngineState::Unavailable(reason) => {
                Err(VigiaError::perceptual_unavailable(reason.clone()))
            }
        }
    }

    /// Compare two images by embedding similarity
    ///
    /// `threshold` must lie in [-1, 1]. Never fails; problems come back in
    /// [`PerceptualResult::error`].
    pub fn compare(&self, baseline: &RgbaImage, actual: &RgbaImage, threshold: f64) -> PerceptualResult {
        if !(-1.0..=1.0).contains(&threshold) {
            return PerceptualResult::failed(
                threshold,
                format!("threshold {threshold} outside [-1, 1]"),
            );
        }
        let embeddings = self
            .embed(baseline)
            .and_then(|a| self.embed(actual).map(|b| (a, b)));
        match embeddings {
            Ok((a, b)) => {
                let similarity = a.cosine(&b);
                tracing::debug!(similarity, threshold, "perceptual comparison");
                PerceptualResult {
                    similarity,
                    matched: similarity >= threshold,
                    threshold,
                    error: None,
                }
            }
            Err(e) => PerceptualResult::failed(threshold, e.to_string()),
        }
    }

    fn state(&self) -> &EngineState {
        self.state.get_or_init(|| self.load())
    }

    fn load(&self) -> EngineState {
        let mut failures = Vec::new();
        for loader in &self.loaders {
            let tier = loader.tier();
            match loader.load().and_then(|model| {
                let dim = model.validate()?;
                Ok((model, dim))
            }) {
                Ok((model, embedding_dim)) => {
                    tracing::info!(tier, model = %model.name, embedding_dim, "perceptual model loaded");
                    return EngineState::Ready {
                        tier: tier.to_string(),
                        model,
                        embedding_dim,
                    };
                }
                Err(e) => {
                    tracing::warn!(tier, error = %e, "perceptual model tier failed");
                    failures.push(e.to_string());
                }
            }
        }
        let reason = if failures.is_empty() {
            String::from("no model loader configured")
        } else {
            failures.join("; ")
        };
        tracing::warn!(%reason, "perceptual engine unavailable");
        EngineState::Unavailable(reason)
    }
}
