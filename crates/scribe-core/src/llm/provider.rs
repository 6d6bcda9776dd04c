//! LlmProvider trait definition.
//!
//! This is the core abstraction the completion backend implements. Both
//! methods return `Pin<Box<dyn Stream>>` so the trait stays object-safe:
//! the orchestrator and every tool execution hold the provider as
//! `Arc<dyn LlmProvider>`.

use std::pin::Pin;

use futures_util::Stream;

use scribe_types::llm::{CompletionRequest, GenerationEvent, LlmError};

/// Boxed stream of generation events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<GenerationEvent, LlmError>> + Send + 'static>>;

/// Boxed stream of structured-output array elements.
pub type ElementStream =
    Pin<Box<dyn Stream<Item = Result<serde_json::Value, LlmError>> + Send + 'static>>;

/// Trait for completion provider backends.
///
/// Implementations live in scribe-infra (e.g., `OpenAiCompatProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Start a streaming generation. Text deltas, assembled tool calls,
    /// stop reason, and usage arrive as [`GenerationEvent`]s.
    fn stream(&self, request: CompletionRequest) -> EventStream;

    /// Start a structured-output generation constrained by the request's
    /// `response_format` and yield the top-level array elements of the
    /// result as they complete. The stream is finite and not restartable.
    fn stream_elements(&self, request: CompletionRequest) -> ElementStream;
}
