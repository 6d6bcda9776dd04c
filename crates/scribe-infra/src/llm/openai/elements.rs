//! Incremental JSON array element extraction.
//!
//! A structured-output generation streams one JSON document of the shape
//! `{"elements": [ {...}, {...} ]}` as text deltas. The splitter tracks
//! nesting depth and string state to cut complete top-level elements of the
//! first array encountered, so each element can be parsed and emitted the
//! moment it closes rather than when the whole document arrives.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::SecretString;
use tracing::warn;

use scribe_core::llm::ElementStream;
use scribe_types::llm::LlmError;

use super::streaming::send_request;
use super::types::{ChatCompletionChunk, ChatCompletionRequest};

/// Streaming splitter for the top-level elements of the first JSON array in
/// the input.
#[derive(Default)]
pub struct ArrayElementSplitter {
    buffer: String,
    depth: u32,
    in_array: bool,
    in_string: bool,
    escaped: bool,
    finished: bool,
}

impl ArrayElementSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the array has been closed; further input is ignored.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed a chunk of text, returning any elements completed by it.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        let mut complete = Vec::new();

        for c in chunk.chars() {
            if self.finished {
                break;
            }
            if !self.in_array {
                self.scan_for_array_start(c);
                continue;
            }

            if self.in_string {
                self.buffer.push(c);
                if self.escaped {
                    self.escaped = false;
                } else if c == '\\' {
                    self.escaped = true;
                } else if c == '"' {
                    self.in_string = false;
                }
                continue;
            }

            match c {
                '"' => {
                    self.in_string = true;
                    self.buffer.push(c);
                }
                '{' | '[' => {
                    self.depth += 1;
                    self.buffer.push(c);
                }
                '}' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.buffer.push(c);
                }
                ']' if self.depth == 0 => {
                    self.take_element(&mut complete);
                    self.finished = true;
                }
                ']' => {
                    self.depth -= 1;
                    self.buffer.push(c);
                }
                ',' if self.depth == 0 => {
                    self.take_element(&mut complete);
                }
                c if c.is_whitespace() && self.buffer.is_empty() => {}
                _ => self.buffer.push(c),
            }
        }

        complete
    }

    fn scan_for_array_start(&mut self, c: char) {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            }
        } else if c == '"' {
            self.in_string = true;
        } else if c == '[' {
            self.in_array = true;
        }
    }

    fn take_element(&mut self, complete: &mut Vec<String>) {
        let element = self.buffer.trim();
        if !element.is_empty() {
            complete.push(element.to_string());
        }
        self.buffer.clear();
    }
}

/// Create a structured-output SSE stream yielding array elements as they
/// complete. The stream is finite and not restartable.
pub fn create_element_stream(
    client: reqwest::Client,
    url: String,
    api_key: SecretString,
    body: ChatCompletionRequest,
) -> ElementStream {
    Box::pin(async_stream::try_stream! {
        let response = send_request(&client, &url, &api_key, &body).await?;
        let mut events = response.bytes_stream().eventsource();
        let mut splitter = ArrayElementSplitter::new();

        while let Some(event) = events.next().await {
            let event = event.map_err(|e| LlmError::Stream(e.to_string()))?;
            if event.data == "[DONE]" {
                break;
            }

            let chunk: ChatCompletionChunk = serde_json::from_str(&event.data)
                .map_err(|e| LlmError::Deserialization(format!("chunk: {e}")))?;

            for choice in &chunk.choices {
                let Some(content) = &choice.delta.content else {
                    continue;
                };
                for element in splitter.push(content) {
                    match serde_json::from_str::<serde_json::Value>(&element) {
                        Ok(value) => yield value,
                        Err(err) => {
                            warn!(error = %err, "skipping unparseable array element");
                        }
                    }
                }
            }

            if splitter.is_finished() {
                break;
            }
        }
    })
}
