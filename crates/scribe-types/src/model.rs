//! Configured chat model catalog.
//!
//! The requested model id must match a catalog entry before any retrieval or
//! generation work starts. Each entry also selects which tool set the model
//! may invoke during a turn -- the two sets are mutually exclusive.

use serde::{Deserialize, Serialize};

/// Which tool set is active for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    /// Document authoring: create, update, request suggestions.
    Canvas,
    /// Weather lookup only.
    Weather,
}

/// A configured chat model.
#[derive(Debug, Clone, Serialize)]
pub struct ChatModel {
    /// Public identifier clients request (e.g., "gpt-4o-canvas").
    pub id: &'static str,
    pub label: &'static str,
    /// Identifier sent to the completion provider.
    pub api_identifier: &'static str,
    pub description: &'static str,
    pub tool_mode: ToolMode,
}

/// The full list of models this deployment serves.
pub const MODELS: &[ChatModel] = &[
    ChatModel {
        id: "gpt-4o-canvas",
        label: "GPT-4o Canvas",
        api_identifier: "gpt-4o",
        description: "Grounded chat with side-panel document drafting",
        tool_mode: ToolMode::Canvas,
    },
    ChatModel {
        id: "gpt-4o",
        label: "GPT-4o",
        api_identifier: "gpt-4o",
        description: "Grounded chat with weather lookup",
        tool_mode: ToolMode::Weather,
    },
];

pub const DEFAULT_MODEL_ID: &str = "gpt-4o-canvas";

/// Look up a configured model by its public id.
pub fn find_model(id: &str) -> Option<&'static ChatModel> {
    MODELS.iter().find(|m| m.id == id)
}
