//! Result and error types for Vigia.

use thiserror::Error;

/// Result type for Vigia operations
pub type VigiaResult<T> = Result<T, VigiaError>;

/// Errors that can occur in Vigia
#[derive(Debug, Error)]
pub enum VigiaError {
    /// Input bytes could not be decoded into an image
    #[error("Failed to decode {what} image: {message}")]
    Decode {
        /// Which input failed ("baseline", "actual", ...)
        what: String,
        /// Error message
        message: String,
    },

    /// Argument outside its accepted range
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Image processing error (resizing, encoding, etc.)
    #[error("Image processing failed: {message}")]
    ImageProcessing {
        /// Error message
        message: String,
    },

    /// A perceptual model loader tier failed
    #[error("Model load via {tier} failed: {message}")]
    ModelLoad {
        /// Loader tier name
        tier: String,
        /// Error message
        message: String,
    },

    /// Forward pass could not run (shape mismatch in the model)
    #[error("Inference failed: {message}")]
    Inference {
        /// Error message
        message: String,
    },

    /// Perceptual engine has no model to run
    #[error("Perceptual engine unavailable: {reason}")]
    PerceptualUnavailable {
        /// Why every loader tier failed, or why the engine was disabled
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VigiaError {
    /// Create a decode error
    #[must_use]
    pub fn decode(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an image processing error
    #[must_use]
    pub fn image_processing(message: impl Into<String>) -> Self {
        Self::ImageProcessing {
            message: message.into(),
        }
    }

    /// Create a model load error for a loader tier
    #[must_use]
    pub fn model_load(tier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            tier: tier.into(),
            message: message.into(),
        }
    }

    /// Create a perceptual-unavailable error
    #[must_use]
    pub fn perceptual_unavailable(reason: impl Into<String>) -> Self {
        Self::PerceptualUnavailable {
            reason: reason.into(),
        }
    }

    /// Create an inference error
    #[must_use]
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error() {
        let err = VigiaError::decode("baseline", "not a png");
        assert!(err.to_string().contains("baseline"));
        assert!(err.to_string().contains("not a png"));
    }

    #[test]
    fn test_model_load_error_names_tier() {
        let err = VigiaError::model_load("local-path", "missing file");
        assert_eq!(
            err.to_string(),
            "Model load via local-path failed: missing file"
        );
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = VigiaError::invalid_argument("tolerance 1.5 outside [0, 1]");
        assert!(err.to_string().starts_with("Invalid argument"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VigiaError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
