//! Public inference adapter

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use spark_config::FireworksConfig;
use spark_core::ModelFamily;

use crate::builder::build_call;
use crate::client::FireworksClient;
use crate::credentials::resolve_api_key;
use crate::dispatch::{RawOutput, RequestKind, dispatch};
use crate::error::InferenceError;
use crate::media::MediaOptions;
use crate::normalize;
use crate::registry::{ModelRegistry, ModelResolver};
use crate::types::{
    ChatCompletionInput, ChatCompletionResponse, ChatCompletionResponseStreamChunk, CompletionInput,
    CompletionResponse, CompletionResponseStreamChunk, Content, EmbeddingsResponse, Generation, GenerationRequest,
};

/// Inference operations offered by a provider adapter
#[async_trait]
pub trait Inference: Send + Sync {
    /// Complete raw content
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unknown, the request cannot be
    /// expressed for the provider, no credential is available, or the
    /// provider rejects an awaited call
    async fn complete(
        &self,
        model_id: &str,
        input: CompletionInput,
    ) -> Result<Generation<CompletionResponse, CompletionResponseStreamChunk>, InferenceError>;

    /// Continue a conversation
    ///
    /// # Errors
    ///
    /// Same conditions as [`Inference::complete`], plus tool prompt errors
    async fn chat_complete(
        &self,
        model_id: &str,
        input: ChatCompletionInput,
    ) -> Result<Generation<ChatCompletionResponse, ChatCompletionResponseStreamChunk>, InferenceError>;

    /// Embed each content item
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::NotSupported` when the adapter has no embeddings
    async fn embeddings(&self, model_id: &str, contents: Vec<Content>) -> Result<EmbeddingsResponse, InferenceError>;
}

/// Fireworks implementation of [`Inference`]
///
/// Holds only immutable configuration and the model resolver; every call
/// builds its own HTTP client with the credential resolved for that call.
#[derive(Clone)]
pub struct FireworksInferenceAdapter {
    config: Arc<FireworksConfig>,
    resolver: Arc<dyn ModelResolver>,
}

impl FireworksInferenceAdapter {
    /// Adapter resolving models through the built-in and configured aliases
    pub fn new(config: FireworksConfig) -> Self {
        let resolver = Arc::new(ModelRegistry::from_config(&config));
        Self {
            config: Arc::new(config),
            resolver,
        }
    }

    /// Replace the model resolver
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn ModelResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &FireworksConfig {
        &self.config
    }

    async fn send(
        &self,
        request: &GenerationRequest,
        kind: RequestKind,
        family: ModelFamily,
    ) -> Result<RawOutput, InferenceError> {
        let media = MediaOptions {
            download_images: self.config.download_images,
            timeout: self.config.timeout,
        };
        let call = build_call(request, family, &media).await?;

        let api_key = resolve_api_key(self.config.api_key.as_ref())?;
        let client = FireworksClient::new(self.config.base_url.clone(), api_key, self.config.timeout)?;

        dispatch(client, call, kind).await
    }
}

impl fmt::Debug for FireworksInferenceAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FireworksInferenceAdapter")
            .field("base_url", &self.config.base_url.as_str())
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Inference for FireworksInferenceAdapter {
    async fn complete(
        &self,
        model_id: &str,
        input: CompletionInput,
    ) -> Result<Generation<CompletionResponse, CompletionResponseStreamChunk>, InferenceError> {
        let model = self.resolver.resolve(model_id).await?;
        let request = GenerationRequest::Completion(input.into_request(model.provider_resource_id));

        match self.send(&request, RequestKind::Completion, model.family).await? {
            RawOutput::Response(response) => normalize::completion_response(&response).map(Generation::Response),
            RawOutput::Stream(chunks) => Ok(Generation::Stream(normalize::completion_stream(chunks))),
        }
    }

    async fn chat_complete(
        &self,
        model_id: &str,
        input: ChatCompletionInput,
    ) -> Result<Generation<ChatCompletionResponse, ChatCompletionResponseStreamChunk>, InferenceError> {
        let model = self.resolver.resolve(model_id).await?;
        let request = GenerationRequest::ChatCompletion(input.into_request(model.provider_resource_id));

        match self.send(&request, RequestKind::ChatCompletion, model.family).await? {
            RawOutput::Response(response) => normalize::chat_response(&response).map(Generation::Response),
            RawOutput::Stream(chunks) => Ok(Generation::Stream(normalize::chat_stream(chunks))),
        }
    }

    async fn embeddings(&self, model_id: &str, _contents: Vec<Content>) -> Result<EmbeddingsResponse, InferenceError> {
        tracing::debug!(model = %model_id, "embeddings requested");
        Err(InferenceError::NotSupported {
            operation: "embeddings",
        })
    }
}
