//! Model loader tiers.
//!
//! The engine holds an ordered list of loaders and takes the first artifact
//! that loads and validates. Each tier reports its own failure so the engine
//! can log why it fell through.

use super::config::PerceptualConfig;
use super::model::ModelArtifact;
use crate::result::{VigiaError, VigiaResult};
use std::fmt::Debug;
use std::path::PathBuf;
use std::time::Duration;

/// One way of obtaining a model artifact
pub trait ModelLoader: Send + Sync + Debug {
    /// Short tier name for logs and errors
    fn tier(&self) -> &str;

    /// Produce a validated artifact
    ///
    /// # Errors
    ///
    /// Returns error if the artifact cannot be obtained or is malformed
    fn load(&self) -> VigiaResult<ModelArtifact>;
}

/// The extractor compiled into the crate
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedLoader;

impl ModelLoader for EmbeddedLoader {
    fn tier(&self) -> &str {
        "embedded"
    }

    fn load(&self) -> VigiaResult<ModelArtifact> {
        let model = ModelArtifact::builtin();
        model
            .validate()
            .map_err(|e| VigiaError::model_load(self.tier(), e.to_string()))?;
        Ok(model)
    }
}

/// A bincode or JSON artifact on disk
#[derive(Debug, Clone)]
pub struct LocalPathLoader {
    path: PathBuf,
}

impl LocalPathLoader {
    /// Load from `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ModelLoader for LocalPathLoader {
    fn tier(&self) -> &str {
        "local-path"
    }

    fn load(&self) -> VigiaResult<ModelArtifact> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            VigiaError::model_load(self.tier(), format!("{}: {e}", self.path.display()))
        })?;
        ModelArtifact::from_bytes(&bytes)
            .map_err(|e| VigiaError::model_load(self.tier(), e.to_string()))
    }
}

/// An artifact fetched over HTTP(S)
#[derive(Debug, Clone)]
pub struct UrlLoader {
    url: String,
    timeout: Duration,
}

impl UrlLoader {
    /// Fetch from `url`
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

impl ModelLoader for UrlLoader {
    fn tier(&self) -> &str {
        "url"
    }

    fn load(&self) -> VigiaResult<ModelArtifact> {
        fetch_artifact(self.tier(), &self.url, self.timeout)
    }
}

/// An artifact resolved from a model repository
#[derive(Debug, Clone)]
pub struct RepositoryLoader {
    url: String,
    timeout: Duration,
}

impl RepositoryLoader {
    /// Fetch `repository`'s file
    #[must_use]
    pub fn new(repository: &super::config::RepositoryRef, timeout: Duration) -> Self {
        Self {
            url: repository.resolve_url(),
            timeout,
        }
    }
}

impl ModelLoader for RepositoryLoader {
    fn tier(&self) -> &str {
        "repository"
    }

    fn load(&self) -> VigiaResult<ModelArtifact> {
        fetch_artifact(self.tier(), &self.url, self.timeout)
    }
}

/// Build the tier list described by `config`, in order
#[must_use]
pub fn loaders_from_config(config: &PerceptualConfig) -> Vec<Box<dyn ModelLoader>> {
    let mut loaders: Vec<Box<dyn ModelLoader>> = Vec::new();
    if config.embedded {
        loaders.push(Box::new(EmbeddedLoader));
    }
    if let Some(path) = &config.local_path {
        loaders.push(Box::new(LocalPathLoader::new(path.clone())));
    }
    if let Some(url) = &config.model_url {
        loaders.push(Box::new(UrlLoader::new(url.clone(), config.download_timeout)));
    }
    if let Some(repository) = &config.repository {
        loaders.push(Box::new(RepositoryLoader::new(
            repository,
            config.download_timeout,
        )));
    }
    loaders
}

fn fetch_artifact(tier: &str, url: &str, timeout: Duration) -> VigiaResult<ModelArtifact> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(VigiaError::model_load(
            tier,
            format!("unsupported URL scheme: {url}"),
        ));
    }
    let bytes = download(tier, url, timeout)?;
    ModelArtifact::from_bytes(&bytes).map_err(|e| VigiaError::model_load(tier, e.to_string()))
}

#[cfg(feature = "remote")]
fn download(tier: &str, url: &str, timeout: Duration) -> VigiaResult<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| VigiaError::model_load(tier, format!("failed to configure HTTP client: {e}")))?;
    tracing::debug!(tier, url, "downloading model artifact");
    let response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|e| VigiaError::model_load(tier, e.to_string()))?;
    let bytes = response
        .bytes()
        .map_err(|e| VigiaError::model_load(tier, e.to_string()))?;
    Ok(bytes.to_vec())
}

#[cfg(not(feature = "remote"))]
fn download(tier: &str, url: &str, _timeout: Duration) -> VigiaResult<Vec<u8>> {
    Err(VigiaError::model_load(
        tier,
        format!("cannot fetch {url}: built without the `remote` feature"),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::perceptual::config::RepositoryRef;
    use std::io::Write;

    #[test]
    fn test_embedded_loads() {
        let model = EmbeddedLoader.load().unwrap();
        assert_eq!(model, ModelArtifact::builtin());
    }

    #[test]
    fn test_local_path_bincode() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(&ModelArtifact::builtin().to_bincode().unwrap())
            .unwrap();
        let model = LocalPathLoader::new(file.path()).load().unwrap();
        assert_eq!(model.name, "vigia-builtin-v1");
    }

    #[test]
    fn test_local_path_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(ModelArtifact::builtin().to_json().unwrap().as_bytes())
            .unwrap();
        assert!(LocalPathLoader::new(file.path()).load().is_ok());
    }

    #[test]
    fn test_local_path_missing_file() {
        let err = LocalPathLoader::new("/nonexistent/model.bin")
            .load()
            .unwrap_err();
        assert!(matches!(err, VigiaError::ModelLoad { ref tier, .. } if tier == "local-path"));
    }

    #[test]
    fn test_local_path_corrupt_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a model").unwrap();
        assert!(LocalPathLoader::new(file.path()).load().is_err());
    }

    #[test]
    fn test_url_rejects_non_http_scheme() {
        let err = UrlLoader::new("ftp://host/model.bin", Duration::from_secs(1))
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("unsupported URL scheme"));
    }

    #[test]
    fn test_config_order() {
        let config = PerceptualConfig::default()
            .with_local_path("/tmp/model.bin")
            .with_model_url("https://example.invalid/model.bin")
            .with_repository(RepositoryRef::new("acme/model", "model.bin"));
        let tiers: Vec<String> = loaders_from_config(&config)
            .iter()
            .map(|l| l.tier().to_string())
            .collect();
        assert_eq!(tiers, vec!["embedded", "local-path", "url", "repository"]);
    }

    #[test]
    fn test_config_without_tiers() {
        assert!(loaders_from_config(&PerceptualConfig::none()).is_empty());
    }
}
