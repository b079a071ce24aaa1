use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::message::CompletionMessage;

/// Why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Model finished its turn
    EndOfTurn,
    /// Model paused for a tool result
    EndOfMessage,
    /// Token budget exhausted or generation cut short
    OutOfTokens,
}

/// Candidate tokens and their log probabilities at one position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenLogProbs {
    pub logprobs_by_token: IndexMap<String, f64>,
}

/// Normalized result of a non-streaming completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub stop_reason: StopReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Vec<TokenLogProbs>>,
}

/// Normalized result of a non-streaming chat completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub completion_message: CompletionMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Vec<TokenLogProbs>>,
}

/// Vectors for each input, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vec<f32>>,
}
