//! Fireworks inference adapter for Spark
//!
//! Resolves caller model names to Fireworks resources, renders requests into
//! Llama 3 prompts or structured messages, sends them to the Fireworks
//! `OpenAI`-compatible API and normalizes the results, streamed or not.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod adapter;
pub mod builder;
pub mod client;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod media;
pub mod normalize;
pub mod options;
pub mod prompt;
pub mod protocol;
pub mod registry;
pub mod types;

pub use adapter::{FireworksInferenceAdapter, Inference};
pub use builder::{CallShape, ProviderCall, build_call};
pub use error::InferenceError;
pub use registry::{ModelRegistry, ModelResolver, ResolvedModel};
pub use types::{
    ChatCompletionInput, ChatCompletionResponse, ChatCompletionResponseStreamChunk, CompletionInput,
    CompletionResponse, CompletionResponseStreamChunk, Generation,
};
