//! Fireworks response wire format
//!
//! Both endpoints return OpenAI-style bodies. Prompt calls carry generated
//! text in `choices[].text`, message calls in `choices[].message.content`,
//! and streamed message calls in `choices[].delta.content`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Response body, or one streamed chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FireworksResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<FireworksChoice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FireworksChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<FireworksMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<FireworksMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<FireworksLogProbs>,
}

/// Message or delta body within a choice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FireworksMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Completion-style log probabilities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FireworksLogProbs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<Vec<IndexMap<String, f64>>>,
}

impl FireworksResponse {
    /// First choice; Fireworks returns one per request
    pub fn first_choice(&self) -> Option<&FireworksChoice> {
        self.choices.first()
    }
}

impl FireworksChoice {
    /// Generated text, wherever this body shape carries it
    pub fn text(&self) -> Option<&str> {
        if let Some(delta) = &self.delta {
            return delta.content.as_deref();
        }
        if let Some(message) = &self.message {
            return message.content.as_deref();
        }
        self.text.as_deref()
    }
}
