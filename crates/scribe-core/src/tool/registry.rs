//! Tool definitions and invocation parsing.
//!
//! Tool availability is gated by [`ToolMode`]: the canvas set (document
//! authoring) and the weather set are mutually exclusive per request.
//! Model-supplied arguments are validated here, before any execution.

use serde::Deserialize;
use serde_json::json;

use scribe_types::error::ToolError;
use scribe_types::llm::ToolDefinition;
use scribe_types::model::ToolMode;

pub const GET_WEATHER: &str = "getWeather";
pub const CREATE_DOCUMENT: &str = "createDocument";
pub const UPDATE_DOCUMENT: &str = "updateDocument";
pub const REQUEST_SUGGESTIONS: &str = "requestSuggestions";

/// A parsed, validated tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    GetWeather { latitude: f64, longitude: f64 },
    CreateDocument { title: String },
    UpdateDocument { id: String, description: String },
    RequestSuggestions { document_id: String },
}

#[derive(Deserialize)]
struct WeatherParams {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct CreateDocumentParams {
    title: String,
}

#[derive(Deserialize)]
struct UpdateDocumentParams {
    id: String,
    description: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestSuggestionsParams {
    document_id: String,
}

fn invalid(tool: &str, message: impl Into<String>) -> ToolError {
    ToolError::InvalidParameters {
        tool: tool.to_string(),
        message: message.into(),
    }
}

impl ToolCall {
    /// Parse and validate a model-supplied invocation.
    pub fn parse(name: &str, arguments: &serde_json::Value) -> Result<Self, ToolError> {
        match name {
            GET_WEATHER => {
                let params: WeatherParams = serde_json::from_value(arguments.clone())
                    .map_err(|e| invalid(name, e.to_string()))?;
                if !params.latitude.is_finite() || !params.longitude.is_finite() {
                    return Err(invalid(name, "latitude and longitude must be finite numbers"));
                }
                Ok(ToolCall::GetWeather {
                    latitude: params.latitude,
                    longitude: params.longitude,
                })
            }
            CREATE_DOCUMENT => {
                let params: CreateDocumentParams = serde_json::from_value(arguments.clone())
                    .map_err(|e| invalid(name, e.to_string()))?;
                if params.title.trim().is_empty() {
                    return Err(invalid(name, "title must not be empty"));
                }
                Ok(ToolCall::CreateDocument {
                    title: params.title,
                })
            }
            UPDATE_DOCUMENT => {
                let params: UpdateDocumentParams = serde_json::from_value(arguments.clone())
                    .map_err(|e| invalid(name, e.to_string()))?;
                Ok(ToolCall::UpdateDocument {
                    id: params.id,
                    description: params.description,
                })
            }
            REQUEST_SUGGESTIONS => {
                let params: RequestSuggestionsParams = serde_json::from_value(arguments.clone())
                    .map_err(|e| invalid(name, e.to_string()))?;
                Ok(ToolCall::RequestSuggestions {
                    document_id: params.document_id,
                })
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    /// Registered wire name of this tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GetWeather { .. } => GET_WEATHER,
            ToolCall::CreateDocument { .. } => CREATE_DOCUMENT,
            ToolCall::UpdateDocument { .. } => UPDATE_DOCUMENT,
            ToolCall::RequestSuggestions { .. } => REQUEST_SUGGESTIONS,
        }
    }
}

/// Tool definitions advertised to the model for the given mode.
pub fn definitions(mode: ToolMode) -> Vec<ToolDefinition> {
    match mode {
        ToolMode::Weather => vec![ToolDefinition {
            name: GET_WEATHER.to_string(),
            description: "Get the current weather at a location".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "latitude": { "type": "number" },
                    "longitude": { "type": "number" }
                },
                "required": ["latitude", "longitude"]
            }),
        }],
        ToolMode::Canvas => vec![
            ToolDefinition {
                name: CREATE_DOCUMENT.to_string(),
                description: "Create a document for a writing activity".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" }
                    },
                    "required": ["title"]
                }),
            },
            ToolDefinition {
                name: UPDATE_DOCUMENT.to_string(),
                description: "Update a document with the given description".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "string",
                            "description": "The ID of the document to update"
                        },
                        "description": {
                            "type": "string",
                            "description": "The description of changes that need to be made"
                        }
                    },
                    "required": ["id", "description"]
                }),
            },
            ToolDefinition {
                name: REQUEST_SUGGESTIONS.to_string(),
                description: "Request suggestions for a document".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "documentId": {
                            "type": "string",
                            "description": "The ID of the document to request edits"
                        }
                    },
                    "required": ["documentId"]
                }),
            },
        ],
    }
}
