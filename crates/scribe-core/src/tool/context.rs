//! Execution context passed into every tool.
//!
//! The outbound event channel and all collaborators are explicit
//! dependencies of an execution; nested generations reuse the same sink so
//! their deltas interleave with, but never reorder relative to, their own
//! emission sequence.

use std::sync::Arc;

use crate::llm::LlmProvider;
use crate::turn::sink::EventSink;

/// Collaborators available to a tool execution.
pub struct ToolContext<'a, D, S, F> {
    /// Completion provider for nested streaming generations.
    pub provider: &'a Arc<dyn LlmProvider>,
    pub documents: &'a D,
    pub suggestions: &'a S,
    pub forecast: &'a F,
    /// The turn's ordered outbound event channel.
    pub sink: &'a EventSink,
    /// Provider model identifier for nested generations.
    pub model: &'a str,
    /// Present when the session carries a user identity; gates persistence.
    pub user_id: Option<&'a str>,
}
