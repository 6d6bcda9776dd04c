//! Conversation transcript types.
//!
//! A [`ChatMessage`] carries either plain text or structured tool-call /
//! tool-result parts. Transcripts are append-only within a turn and are
//! persisted as a full replacement list once the turn completes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in a conversation transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    Tool,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
            ChatRole::Tool => write!(f, "tool"),
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            "tool" => Ok(ChatRole::Tool),
            other => Err(format!("invalid chat role: '{other}'")),
        }
    }
}

/// A tool invocation issued by the model within an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPart {
    /// Provider-assigned call id; pairs the call with its result.
    pub id: String,
    /// Registered tool name (e.g., "get_weather").
    pub name: String,
    /// Raw model-supplied arguments, validated before execution.
    pub arguments: serde_json::Value,
}

/// The outcome of one tool invocation, carried in a tool message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultPart {
    /// Call id this result answers.
    pub id: String,
    pub name: String,
    pub output: serde_json::Value,
}

/// Message payload: plain text, or structured tool parts.
///
/// Untagged so that client requests can send `"content": "hello"` directly;
/// the structured variants serialize as objects and are only produced by the
/// orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    ToolCalls { tool_calls: Vec<ToolCallPart> },
    ToolResults { tool_results: Vec<ToolResultPart> },
}

impl MessageContent {
    /// Plain text of the message, if it is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A single message in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn tool_calls(calls: Vec<ToolCallPart>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: MessageContent::ToolCalls { tool_calls: calls },
        }
    }

    pub fn tool_results(results: Vec<ToolResultPart>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: MessageContent::ToolResults {
                tool_results: results,
            },
        }
    }
}
