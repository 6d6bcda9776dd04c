//! Client-facing stream event types.
//!
//! [`StreamEvent`] is the side-channel union delivered alongside the model's
//! own text output; [`TurnEvent`] is the single ordered envelope the
//! orchestrator and all tool executions write into. Events are transient --
//! only the derived entities (Chat, Document, Suggestion) are persisted.

use serde::{Deserialize, Serialize};

use crate::chat::Suggestion;

/// Side-channel event delivered to the client in strict production order.
///
/// Wire shape: `{"type": "...", "content": ...}`. The content visible in a
/// document panel equals the concatenation of all `text-delta` events since
/// the most recent `clear` for that stream session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "kebab-case")]
pub enum StreamEvent {
    /// Id of a freshly created document.
    Id(String),
    /// Title of the document being drafted.
    Title(String),
    /// Reset the panel; carries the existing title on updates.
    Clear(String),
    /// An increment of drafted document text.
    TextDelta(String),
    /// A produced suggestion, emitted as soon as it is complete.
    Suggestion(Suggestion),
    /// The current drafting session is complete.
    Finish(String),
}

impl StreamEvent {
    pub fn finish() -> Self {
        StreamEvent::Finish(String::new())
    }
}

/// One element of the ordered outbound stream for a conversational turn.
///
/// The orchestrator multiplexes the model's own text deltas, the
/// side-channel events, and the terminal close signal onto one channel so
/// ordering is preserved end to end.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// A delta of the assistant's chat text.
    Message(String),
    /// A side-channel event from a tool execution.
    Data(StreamEvent),
    /// The turn failed after streaming began.
    Error(String),
    /// Explicit close signal; always the final event.
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_event_wire_shape() {
        let event = StreamEvent::TextDelta("Hello".to_string());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "text-delta");
        assert_eq!(json["content"], "Hello");

        let event = StreamEvent::finish();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "finish");
        assert_eq!(json["content"], "");
    }

    #[test]
    fn test_suggestion_event_carries_record() {
        let suggestion = Suggestion {
            id: "s1".to_string(),
            document_id: "d1".to_string(),
            document_created_at: chrono::Utc::now(),
            original_text: "a".to_string(),
            suggested_text: "b".to_string(),
            description: "c".to_string(),
            is_resolved: false,
            user_id: "u1".to_string(),
            created_at: chrono::Utc::now(),
        };

        let json = serde_json::to_value(StreamEvent::Suggestion(suggestion)).unwrap();
        assert_eq!(json["type"], "suggestion");
        assert_eq!(json["content"]["documentId"], "d1");
    }
}
