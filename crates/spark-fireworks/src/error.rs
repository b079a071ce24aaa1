use spark_core::ContextError;
use thiserror::Error;

/// Errors that can occur while serving an inference call
#[derive(Debug, Error)]
pub enum InferenceError {
    /// No API key in configuration or in the caller's provider data
    #[error("{message}")]
    MissingCredential { message: String },

    /// Model identifier is not in the alias table
    #[error("unknown model: {model}")]
    UnknownModel { model: String },

    /// Request carries media the selected call shape cannot express
    #[error("unsupported media: {0}")]
    UnsupportedMedia(String),

    /// Response format tag has no provider mapping
    #[error("unsupported response format: {format}")]
    UnsupportedResponseFormat { format: String },

    /// Operation is not offered by this adapter
    #[error("{operation} is not supported by the fireworks adapter")]
    NotSupported { operation: &'static str },

    /// Request cannot be rendered for the selected model
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Provider returned an error status or could not be reached
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Stream failed after it started
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl InferenceError {
    /// Whether the caller can fix the error by changing the request
    ///
    /// Provider-side and internal failures are not caller errors; this layer
    /// never retries them either way.
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. }
                | Self::UnknownModel { .. }
                | Self::UnsupportedMedia(_)
                | Self::UnsupportedResponseFormat { .. }
                | Self::NotSupported { .. }
                | Self::InvalidRequest(_)
        )
    }
}

impl From<ContextError> for InferenceError {
    fn from(e: ContextError) -> Self {
        Self::InvalidRequest(e.to_string())
    }
}
