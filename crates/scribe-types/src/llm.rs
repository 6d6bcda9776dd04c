//! LLM request/response types.
//!
//! These types model the data shapes for completion provider interactions:
//! streaming requests, generation events, tool definitions, usage tracking,
//! and error handling. The provider implementation lives in scribe-infra.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::message::ChatMessage;

/// A tool the model may invoke, described to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameter record.
    pub parameters: serde_json::Value,
}

/// Constrained output format for a structured generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResponseFormat {
    /// The provider must emit JSON conforming to the named schema.
    JsonSchema {
        name: String,
        schema: serde_json::Value,
    },
}

/// Request to a completion provider for a streaming generation.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub system: Option<String>,
    pub tools: Vec<ToolDefinition>,
    pub response_format: Option<ResponseFormat>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// A plain text generation with no tools or output constraints.
    pub fn text(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            system: None,
            tools: Vec::new(),
            response_format: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Reason why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolCalls,
    MaxTokens,
    ContentFilter,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndTurn => write!(f, "end_turn"),
            StopReason::ToolCalls => write!(f, "tool_calls"),
            StopReason::MaxTokens => write!(f, "max_tokens"),
            StopReason::ContentFilter => write!(f, "content_filter"),
        }
    }
}

impl FromStr for StopReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "end_turn" | "stop" => Ok(StopReason::EndTurn),
            "tool_calls" => Ok(StopReason::ToolCalls),
            "max_tokens" | "length" => Ok(StopReason::MaxTokens),
            "content_filter" => Ok(StopReason::ContentFilter),
            other => Err(format!("invalid stop reason: '{other}'")),
        }
    }
}

/// Token usage for a generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Events emitted during a streaming generation.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    /// A delta of assistant text.
    TextDelta(String),
    /// A tool invocation whose arguments have been fully assembled.
    ToolCallComplete {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },
    /// The generation is finishing with a stop reason.
    Finish(StopReason),
    /// Token usage information.
    Usage(Usage),
    /// The stream has completed.
    Done,
}

/// Errors from completion provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("rate limited")]
    RateLimited,

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
