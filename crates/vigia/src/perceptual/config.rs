//! Perceptual engine configuration: which loader tiers to try.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default model repository host
pub const DEFAULT_REPOSITORY_BASE: &str = "https://huggingface.co";

/// Default timeout for URL and repository downloads
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// A model file in a remote repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// Repository host, e.g. `https://huggingface.co`
    pub base_url: String,
    /// Model identifier, e.g. `acme/screenshot-embedder`
    pub model_id: String,
    /// Branch, tag or commit
    pub revision: String,
    /// File within the repository
    pub file: String,
}

impl RepositoryRef {
    /// Reference a file on the default host at revision `main`
    #[must_use]
    pub fn new(model_id: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            base_url: String::from(DEFAULT_REPOSITORY_BASE),
            model_id: model_id.into(),
            revision: String::from("main"),
            file: file.into(),
        }
    }

    /// Pin a revision
    #[must_use]
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    /// Use another host
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Download URL: `{base}/{model_id}/resolve/{revision}/{file}`
    #[must_use]
    pub fn resolve_url(&self) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.model_id.trim_matches('/'),
            self.revision,
            self.file.trim_start_matches('/')
        )
    }
}

/// Loader tiers, tried in order: embedded, local path, URL, repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptualConfig {
    /// Try the model compiled into the crate
    pub embedded: bool,
    /// Model file on disk (bincode or JSON)
    pub local_path: Option<PathBuf>,
    /// Direct download URL
    pub model_url: Option<String>,
    /// Remote repository file
    pub repository: Option<RepositoryRef>,
    /// Timeout for each download
    pub download_timeout: Duration,
}

impl Default for PerceptualConfig {
    fn default() -> Self {
        Self {
            embedded: true,
            local_path: None,
            model_url: None,
            repository: None,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }
}

impl PerceptualConfig {
    /// Configuration with every tier disabled
    #[must_use]
    pub fn none() -> Self {
        Self {
            embedded: false,
            ..Self::default()
        }
    }

    /// Enable or disable the embedded model
    #[must_use]
    pub const fn with_embedded(mut self, embedded: bool) -> Self {
        self.embedded = embedded;
        self
    }

    /// Set the local model path
    #[must_use]
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    /// Set the model download URL
    #[must_use]
    pub fn with_model_url(mut self, url: impl Into<String>) -> Self {
        self.model_url = Some(url.into());
        self
    }

    /// Set the repository reference
    #[must_use]
    pub fn with_repository(mut self, repository: RepositoryRef) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Set the download timeout
    #[must_use]
    pub const fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }
}
