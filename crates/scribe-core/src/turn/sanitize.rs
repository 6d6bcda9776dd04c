//! Response transcript sanitization.
//!
//! A generation cut off mid tool round can leave a trailing tool-call
//! message with no matching result. Those calls are stripped before the
//! chat is persisted; complete call/result pairs pass through unchanged.

use std::collections::HashSet;

use scribe_types::message::{ChatMessage, MessageContent};

/// Remove incomplete tool calls and empty text messages from a response
/// transcript.
pub fn sanitize_response_messages(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let result_ids: HashSet<&str> = messages
        .iter()
        .filter_map(|m| match &m.content {
            MessageContent::ToolResults { tool_results } => {
                Some(tool_results.iter().map(|r| r.id.as_str()))
            }
            _ => None,
        })
        .flatten()
        .collect();

    messages
        .iter()
        .filter_map(|message| match &message.content {
            MessageContent::Text(text) if text.is_empty() => None,
            MessageContent::ToolCalls { tool_calls } => {
                let kept: Vec<_> = tool_calls
                    .iter()
                    .filter(|call| result_ids.contains(call.id.as_str()))
                    .cloned()
                    .collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(ChatMessage::tool_calls(kept))
                }
            }
            _ => Some(message.clone()),
        })
        .collect()
}
