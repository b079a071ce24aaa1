use serde::{Deserialize, Serialize};

use super::content::Content;
use super::response::StopReason;
use super::tool::{ToolCall, ToolName};

/// Conversation message, tagged by role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: Content,
    },
    User {
        content: Content,
        /// Retrieved context appended after the user's content
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<Content>,
    },
    Assistant(CompletionMessage),
    /// Result of a tool call
    Tool {
        call_id: String,
        tool_name: ToolName,
        content: Content,
    },
}

/// Assistant turn, as produced by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub content: Content,
    pub stop_reason: StopReason,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    pub fn system(content: impl Into<Content>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<Content>) -> Self {
        Self::User {
            content: content.into(),
            context: None,
        }
    }

    pub fn assistant(content: impl Into<Content>) -> Self {
        Self::Assistant(CompletionMessage {
            content: content.into(),
            stop_reason: StopReason::EndOfTurn,
            tool_calls: Vec::new(),
        })
    }

    /// Role name used in the provider's structured message form
    pub const fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant(_) => "assistant",
            Self::Tool { .. } => "tool",
        }
    }

    pub const fn content(&self) -> &Content {
        match self {
            Self::System { content } | Self::User { content, .. } | Self::Tool { content, .. } => content,
            Self::Assistant(message) => &message.content,
        }
    }

    /// Whether the message content or user context carries an image
    pub fn has_media(&self) -> bool {
        match self {
            Self::User { content, context } => content.has_media() || context.as_ref().is_some_and(Content::has_media),
            other => other.content().has_media(),
        }
    }
}
