//! SSE stream to [`GenerationEvent`] adapter.
//!
//! Maps chat-completions chunks onto the provider-agnostic event enum.
//! Tool call arguments arrive as partial JSON fragments across multiple
//! chunks (keyed by tool call index); these are accumulated and emitted as
//! [`GenerationEvent::ToolCallComplete`] when the finish reason arrives.

use std::collections::BTreeMap;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use scribe_core::llm::EventStream;
use scribe_types::llm::{GenerationEvent, LlmError, StopReason, Usage};

use super::types::{ChatCompletionChunk, ChatCompletionRequest, ToolCallDelta};

/// Accumulates partial JSON fragments for a tool call during streaming.
#[derive(Default)]
pub(crate) struct ToolCallAccumulator {
    pub id: String,
    pub name: String,
    pub json_buffer: String,
}

impl ToolCallAccumulator {
    pub(crate) fn absorb(&mut self, delta: &ToolCallDelta) {
        if let Some(id) = &delta.id {
            if !id.is_empty() {
                self.id = id.clone();
            }
        }
        if let Some(function) = &delta.function {
            if let Some(name) = &function.name {
                if !name.is_empty() {
                    self.name = name.clone();
                }
            }
            if let Some(arguments) = &function.arguments {
                self.json_buffer.push_str(arguments);
            }
        }
    }

    pub(crate) fn finish(self) -> Result<GenerationEvent, LlmError> {
        let arguments: serde_json::Value = if self.json_buffer.is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_str(&self.json_buffer).map_err(|e| {
                LlmError::Deserialization(format!("tool call JSON for '{}': {e}", self.name))
            })?
        };

        Ok(GenerationEvent::ToolCallComplete {
            id: self.id,
            name: self.name,
            arguments,
        })
    }
}

/// Map an HTTP error status onto an [`LlmError`].
pub(crate) fn status_error(status: reqwest::StatusCode, body: String) -> LlmError {
    match status.as_u16() {
        401 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited,
        503 | 529 => LlmError::Overloaded(body),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

/// Send the request and verify the status before streaming the body.
pub(crate) async fn send_request(
    client: &reqwest::Client,
    url: &str,
    api_key: &SecretString,
    body: &ChatCompletionRequest,
) -> Result<reqwest::Response, LlmError> {
    let response = client
        .post(url)
        .bearer_auth(api_key.expose_secret())
        .json(body)
        .send()
        .await
        .map_err(|e| LlmError::Provider {
            message: format!("HTTP request failed: {e}"),
        })?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(status_error(status, error_body));
    }

    Ok(response)
}

/// Create a streaming SSE connection to a chat-completions endpoint.
///
/// The returned stream emits events in this order:
/// 1. `TextDelta` -- for each text content chunk
/// 2. `ToolCallComplete` -- when tool call JSON is fully assembled
/// 3. `Finish` -- with the stop reason when finish_reason appears
/// 4. `Usage` -- token usage (requires `stream_options.include_usage`)
/// 5. `Done` -- at the end of the stream
pub fn create_completion_stream(
    client: reqwest::Client,
    url: String,
    api_key: SecretString,
    body: ChatCompletionRequest,
) -> EventStream {
    Box::pin(async_stream::try_stream! {
        let response = send_request(&client, &url, &api_key, &body).await?;
        let mut events = response.bytes_stream().eventsource();
        let mut accumulators: BTreeMap<u32, ToolCallAccumulator> = BTreeMap::new();

        while let Some(event) = events.next().await {
            let event = event.map_err(|e| LlmError::Stream(e.to_string()))?;
            if event.data == "[DONE]" {
                break;
            }

            let chunk: ChatCompletionChunk = serde_json::from_str(&event.data)
                .map_err(|e| LlmError::Deserialization(format!("chunk: {e}")))?;

            // The final chunk carries usage with an empty choices array.
            if let Some(usage) = &chunk.usage {
                yield GenerationEvent::Usage(Usage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                });
            }

            for choice in &chunk.choices {
                if let Some(content) = &choice.delta.content {
                    if !content.is_empty() {
                        yield GenerationEvent::TextDelta(content.clone());
                    }
                }

                if let Some(tool_calls) = &choice.delta.tool_calls {
                    for delta in tool_calls {
                        accumulators.entry(delta.index).or_default().absorb(delta);
                    }
                }

                if let Some(finish_reason) = &choice.finish_reason {
                    if finish_reason == "tool_calls" {
                        // BTreeMap drains in index order.
                        for (_, accumulator) in std::mem::take(&mut accumulators) {
                            yield accumulator.finish()?;
                        }
                    }

                    let stop_reason = finish_reason
                        .parse::<StopReason>()
                        .unwrap_or(StopReason::EndTurn);
                    yield GenerationEvent::Finish(stop_reason);
                }
            }
        }

        yield GenerationEvent::Done;
    })
}
