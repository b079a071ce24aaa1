use std::fmt;
use std::pin::Pin;

use futures_util::Stream;
use serde::{Deserialize, Serialize};

use super::response::{StopReason, TokenLogProbs};
use super::tool::ToolCall;
use crate::error::InferenceError;

/// Lazy, finite sequence of normalized events
///
/// Each call produces a fresh stream; dropping it releases the underlying
/// HTTP response.
pub type EventStream<T> = Pin<Box<dyn Stream<Item = Result<T, InferenceError>> + Send>>;

/// Outcome of a call: a complete response or a stream of chunks
pub enum Generation<R, C> {
    Response(R),
    Stream(EventStream<C>),
}

impl<R, C> Generation<R, C> {
    /// Take the complete response, if the call was not streamed
    pub fn into_response(self) -> Option<R> {
        match self {
            Self::Response(response) => Some(response),
            Self::Stream(_) => None,
        }
    }

    /// Take the event stream, if the call was streamed
    pub fn into_stream(self) -> Option<EventStream<C>> {
        match self {
            Self::Response(_) => None,
            Self::Stream(stream) => Some(stream),
        }
    }
}

impl<R: fmt::Debug, C> fmt::Debug for Generation<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(response) => f.debug_tuple("Response").field(response).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Incremental completion output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponseStreamChunk {
    pub delta: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Vec<TokenLogProbs>>,
}

/// Phase of a streamed chat response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatEventType {
    Start,
    Progress,
    Complete,
}

/// Progress of tool call parsing within a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallParseStatus {
    Started,
    InProgress,
    Failure,
    Success,
}

/// Raw tool call text while streaming, or the parsed call at the end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolCallContent {
    Text(String),
    Call(ToolCall),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    pub content: ToolCallContent,
    pub parse_status: ToolCallParseStatus,
}

/// Payload of a chat stream event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventDelta {
    Text(String),
    ToolCall(ToolCallDelta),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponseEvent {
    pub event_type: ChatEventType,
    pub delta: EventDelta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Vec<TokenLogProbs>>,
}

/// Incremental chat output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponseStreamChunk {
    pub event: ChatCompletionResponseEvent,
}

impl ChatCompletionResponseStreamChunk {
    pub(crate) fn new(event_type: ChatEventType, delta: EventDelta, stop_reason: Option<StopReason>) -> Self {
        Self {
            event: ChatCompletionResponseEvent {
                event_type,
                delta,
                stop_reason,
                logprobs: None,
            },
        }
    }

    pub(crate) fn tool_call(delta: ToolCallDelta, stop_reason: Option<StopReason>) -> Self {
        Self::new(ChatEventType::Progress, EventDelta::ToolCall(delta), stop_reason)
    }
}
