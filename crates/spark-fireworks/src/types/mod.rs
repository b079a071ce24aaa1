//! Provider-agnostic request and response types
//!
//! Callers build requests from these types and receive normalized results in
//! them, independent of the Fireworks wire format.

pub mod content;
pub mod message;
pub mod request;
pub mod response;
pub mod stream;
pub mod tool;

pub use content::{Content, ContentPart, ImageMedia};
pub use message::{CompletionMessage, Message};
pub use request::{
    ChatCompletionInput, ChatCompletionRequest, CompletionInput, CompletionRequest, GenerationRequest, LogProbConfig,
    ResponseFormat, SamplingParams, SamplingStrategy,
};
pub use response::{ChatCompletionResponse, CompletionResponse, EmbeddingsResponse, StopReason, TokenLogProbs};
pub use stream::{
    ChatCompletionResponseEvent, ChatCompletionResponseStreamChunk, ChatEventType, CompletionResponseStreamChunk,
    EventDelta, EventStream, Generation, ToolCallContent, ToolCallDelta, ToolCallParseStatus,
};
pub use tool::{BuiltinTool, ToolCall, ToolChoice, ToolDefinition, ToolName, ToolParamDefinition, ToolPromptFormat};
