//! OpenAiCompatProvider -- concrete [`LlmProvider`] implementation for
//! OpenAI-compatible chat completions endpoints.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::SecretString;

use scribe_core::llm::{ElementStream, EventStream, LlmProvider};
use scribe_types::llm::{CompletionRequest, ResponseFormat};
use scribe_types::message::{ChatRole, MessageContent};

use super::elements::create_element_stream;
use super::streaming::create_completion_stream;
use super::types::{
    ChatCompletionRequest, StreamOptions, WireFunction, WireFunctionCall, WireMessage, WireTool,
    WireToolCall,
};

/// OpenAI-compatible completion provider.
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiCompatProvider {
    /// Create a new provider.
    ///
    /// # Arguments
    ///
    /// * `api_key` - API key wrapped in SecretString
    /// * `base_url` - Endpoint root (e.g., "https://api.openai.com")
    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // 5 min timeout for long generations
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: base_url.into(),
        }
    }

    fn url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Convert a generic [`CompletionRequest`] into the wire request body.
    fn to_wire_request(request: &CompletionRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system {
            messages.push(WireMessage::text("system", system.clone()));
        }

        for message in &request.messages {
            match &message.content {
                MessageContent::Text(text) => {
                    let role = match message.role {
                        ChatRole::User => "user",
                        ChatRole::Assistant => "assistant",
                        ChatRole::Tool => "tool",
                    };
                    messages.push(WireMessage::text(role, text.clone()));
                }
                MessageContent::ToolCalls { tool_calls } => {
                    messages.push(WireMessage {
                        role: "assistant",
                        content: None,
                        tool_calls: Some(
                            tool_calls
                                .iter()
                                .map(|call| WireToolCall {
                                    id: call.id.clone(),
                                    call_type: "function",
                                    function: WireFunctionCall {
                                        name: call.name.clone(),
                                        arguments: call.arguments.to_string(),
                                    },
                                })
                                .collect(),
                        ),
                        tool_call_id: None,
                    });
                }
                MessageContent::ToolResults { tool_results } => {
                    // One wire message per result, keyed by call id.
                    for result in tool_results {
                        messages.push(WireMessage {
                            role: "tool",
                            content: Some(result.output.to_string()),
                            tool_calls: None,
                            tool_call_id: Some(result.id.clone()),
                        });
                    }
                }
            }
        }

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|tool| WireTool {
                        tool_type: "function",
                        function: WireFunction {
                            name: tool.name.clone(),
                            description: tool.description.clone(),
                            parameters: tool.parameters.clone(),
                        },
                    })
                    .collect(),
            )
        };

        let response_format = request.response_format.as_ref().map(|format| match format {
            ResponseFormat::JsonSchema { name, schema } => serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": name,
                    "schema": schema,
                }
            }),
        });

        ChatCompletionRequest {
            model: request.model.clone(),
            messages,
            stream: true,
            stream_options: StreamOptions {
                include_usage: true,
            },
            tools,
            response_format,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

// OpenAiCompatProvider intentionally does NOT derive Debug so the key can
// never be printed, even though SecretString already redacts itself.

impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let body = Self::to_wire_request(&request);
        create_completion_stream(self.client.clone(), self.url(), self.api_key.clone(), body)
    }

    fn stream_elements(&self, request: CompletionRequest) -> ElementStream {
        let body = Self::to_wire_request(&request);
        create_element_stream(self.client.clone(), self.url(), self.api_key.clone(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_types::llm::ToolDefinition;
    use scribe_types::message::{ChatMessage, ToolCallPart, ToolResultPart};

    fn make_provider() -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(
            SecretString::from("test-key-not-real"),
            "https://api.openai.com",
        )
    }

    #[test]
    fn test_provider_name_and_url() {
        let provider = make_provider();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_system_prompt_becomes_first_message() {
        let request = CompletionRequest::text("gpt-4o", vec![ChatMessage::user("hi")])
            .with_system("Be grounded");

        let wire = OpenAiCompatProvider::to_wire_request(&request);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[0].content.as_deref(), Some("Be grounded"));
        assert_eq!(wire.messages[1].role, "user");
    }

    #[test]
    fn test_tool_transcript_round_trip_to_wire() {
        let request = CompletionRequest::text(
            "gpt-4o",
            vec![
                ChatMessage::user("weather?"),
                ChatMessage::tool_calls(vec![ToolCallPart {
                    id: "call_1".to_string(),
                    name: "getWeather".to_string(),
                    arguments: serde_json::json!({"latitude": 52.5, "longitude": 13.4}),
                }]),
                ChatMessage::tool_results(vec![ToolResultPart {
                    id: "call_1".to_string(),
                    name: "getWeather".to_string(),
                    output: serde_json::json!({"current": {"temperature_2m": 18.4}}),
                }]),
            ],
        );

        let wire = OpenAiCompatProvider::to_wire_request(&request);
        assert_eq!(wire.messages.len(), 3);

        let call_message = &wire.messages[1];
        assert_eq!(call_message.role, "assistant");
        assert!(call_message.content.is_none());
        let calls = call_message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "getWeather");

        let result_message = &wire.messages[2];
        assert_eq!(result_message.role, "tool");
        assert_eq!(result_message.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_tools_and_response_format_serialization() {
        let mut request = CompletionRequest::text("gpt-4o", vec![ChatMessage::user("go")]);
        request.tools = vec![ToolDefinition {
            name: "createDocument".to_string(),
            description: "Create a document".to_string(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        request.response_format = Some(ResponseFormat::JsonSchema {
            name: "suggestions".to_string(),
            schema: serde_json::json!({"type": "object"}),
        });

        let wire = OpenAiCompatProvider::to_wire_request(&request);
        let tools = wire.tools.as_ref().unwrap();
        assert_eq!(tools[0].function.name, "createDocument");

        let format = wire.response_format.as_ref().unwrap();
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], "suggestions");
    }
}
