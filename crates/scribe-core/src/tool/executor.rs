//! Tool execution.
//!
//! Dispatch is an exhaustive match over [`ToolCall`]. Failures never abort
//! the turn: they are logged and returned to the model as an error result,
//! mirroring the document-not-found convention of the original tools.

use chrono::Utc;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use scribe_types::chat::{Document, Suggestion};
use scribe_types::error::ToolError;
use scribe_types::llm::{CompletionRequest, GenerationEvent, ResponseFormat};
use scribe_types::message::ChatMessage;
use scribe_types::stream::StreamEvent;

use crate::llm::LlmProvider as _;
use crate::prompt::{DOCUMENT_AUTHOR_PROMPT, DOCUMENT_REVISER_PROMPT, SUGGESTION_AUTHOR_PROMPT};
use crate::repository::{DocumentStore, SuggestionStore};
use crate::weather::ForecastClient;

use super::context::ToolContext;
use super::registry::ToolCall;

/// One element of the suggestions structured-output stream.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionElement {
    original_sentence: String,
    suggested_sentence: String,
    description: String,
}

/// JSON Schema for the suggestions structured generation: an object with an
/// `elements` array whose items are suggestion records.
pub fn suggestion_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "elements": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "originalSentence": {
                            "type": "string",
                            "description": "The original sentence"
                        },
                        "suggestedSentence": {
                            "type": "string",
                            "description": "The suggested sentence"
                        },
                        "description": {
                            "type": "string",
                            "description": "The description of the suggestion"
                        }
                    },
                    "required": ["originalSentence", "suggestedSentence", "description"]
                }
            }
        },
        "required": ["elements"]
    })
}

/// Execute a tool call, converting any failure into an error result the
/// model can read.
pub async fn execute<D, S, F>(
    call: ToolCall,
    ctx: &ToolContext<'_, D, S, F>,
) -> serde_json::Value
where
    D: DocumentStore,
    S: SuggestionStore,
    F: ForecastClient,
{
    let tool = call.name();
    match run(call, ctx).await {
        Ok(output) => output,
        Err(ToolError::DocumentNotFound) => {
            warn!(tool, "tool targeted a missing document");
            json!({ "error": "Document not found" })
        }
        Err(err) => {
            warn!(tool, error = %err, "tool execution failed");
            json!({ "error": err.to_string() })
        }
    }
}

async fn run<D, S, F>(
    call: ToolCall,
    ctx: &ToolContext<'_, D, S, F>,
) -> Result<serde_json::Value, ToolError>
where
    D: DocumentStore,
    S: SuggestionStore,
    F: ForecastClient,
{
    match call {
        ToolCall::GetWeather {
            latitude,
            longitude,
        } => get_weather(ctx, latitude, longitude).await,
        ToolCall::CreateDocument { title } => create_document(ctx, title).await,
        ToolCall::UpdateDocument { id, description } => {
            update_document(ctx, id, description).await
        }
        ToolCall::RequestSuggestions { document_id } => {
            request_suggestions(ctx, document_id).await
        }
    }
}

async fn get_weather<D, S, F>(
    ctx: &ToolContext<'_, D, S, F>,
    latitude: f64,
    longitude: f64,
) -> Result<serde_json::Value, ToolError>
where
    F: ForecastClient,
{
    ctx.forecast
        .fetch(latitude, longitude)
        .await
        .map_err(|e| ToolError::Execution(e.to_string()))
}

async fn create_document<D, S, F>(
    ctx: &ToolContext<'_, D, S, F>,
    title: String,
) -> Result<serde_json::Value, ToolError>
where
    D: DocumentStore,
{
    let id = Uuid::now_v7().to_string();

    ctx.sink.data(StreamEvent::Id(id.clone())).await;
    ctx.sink.data(StreamEvent::Title(title.clone())).await;
    ctx.sink.data(StreamEvent::Clear(String::new())).await;

    let draft = stream_draft(
        ctx,
        DOCUMENT_AUTHOR_PROMPT,
        vec![ChatMessage::user(title.clone())],
    )
    .await?;

    ctx.sink.data(StreamEvent::finish()).await;

    if let Some(user_id) = ctx.user_id {
        let document = Document {
            id: id.clone(),
            title: title.clone(),
            content: draft,
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        ctx.documents
            .save(&document)
            .await
            .map_err(|e| ToolError::Execution(format!("failed to save document: {e}")))?;
    }

    // The draft is visible in the panel; only a confirmation goes back into
    // the model context.
    Ok(json!({
        "id": id,
        "title": title,
        "content": "A document was created and is now visible to the user.",
    }))
}

async fn update_document<D, S, F>(
    ctx: &ToolContext<'_, D, S, F>,
    id: String,
    description: String,
) -> Result<serde_json::Value, ToolError>
where
    D: DocumentStore,
{
    let document = ctx
        .documents
        .get(&id)
        .await
        .map_err(|e| ToolError::Execution(format!("failed to load document: {e}")))?
        .ok_or(ToolError::DocumentNotFound)?;

    ctx.sink
        .data(StreamEvent::Clear(document.title.clone()))
        .await;

    let draft = stream_draft(
        ctx,
        DOCUMENT_REVISER_PROMPT,
        vec![
            ChatMessage::user(description),
            ChatMessage::user(document.content.clone()),
        ],
    )
    .await?;

    ctx.sink.data(StreamEvent::finish()).await;

    if let Some(user_id) = ctx.user_id {
        let replaced = Document {
            id: document.id.clone(),
            title: document.title.clone(),
            content: draft,
            user_id: user_id.to_string(),
            created_at: document.created_at,
        };
        ctx.documents
            .save(&replaced)
            .await
            .map_err(|e| ToolError::Execution(format!("failed to save document: {e}")))?;
    }

    Ok(json!({
        "id": document.id,
        "title": document.title,
        "content": "The document has been updated successfully.",
    }))
}

async fn request_suggestions<D, S, F>(
    ctx: &ToolContext<'_, D, S, F>,
    document_id: String,
) -> Result<serde_json::Value, ToolError>
where
    D: DocumentStore,
    S: SuggestionStore,
{
    let document = ctx
        .documents
        .get(&document_id)
        .await
        .map_err(|e| ToolError::Execution(format!("failed to load document: {e}")))?
        .filter(|d| !d.content.is_empty())
        .ok_or(ToolError::DocumentNotFound)?;

    let request = CompletionRequest {
        model: ctx.model.to_string(),
        messages: vec![ChatMessage::user(document.content.clone())],
        system: Some(SUGGESTION_AUTHOR_PROMPT.to_string()),
        tools: Vec::new(),
        response_format: Some(ResponseFormat::JsonSchema {
            name: "suggestions".to_string(),
            schema: suggestion_schema(),
        }),
        temperature: None,
        max_tokens: None,
    };

    let mut elements = ctx.provider.stream_elements(request);
    let mut suggestions: Vec<Suggestion> = Vec::new();

    while let Some(element) = elements.next().await {
        let element =
            element.map_err(|e| ToolError::Execution(format!("suggestion stream failed: {e}")))?;

        let parsed: SuggestionElement = match serde_json::from_value(element) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "skipping malformed suggestion element");
                continue;
            }
        };

        let suggestion = Suggestion {
            id: Uuid::now_v7().to_string(),
            document_id: document.id.clone(),
            document_created_at: document.created_at,
            original_text: parsed.original_sentence,
            suggested_text: parsed.suggested_sentence,
            description: parsed.description,
            is_resolved: false,
            user_id: ctx.user_id.unwrap_or_default().to_string(),
            created_at: Utc::now(),
        };

        // Emit as soon as the element is complete, not batched at the end.
        ctx.sink
            .data(StreamEvent::Suggestion(suggestion.clone()))
            .await;
        suggestions.push(suggestion);
    }

    if ctx.user_id.is_some() && !suggestions.is_empty() {
        ctx.suggestions
            .save_batch(&suggestions)
            .await
            .map_err(|e| ToolError::Execution(format!("failed to save suggestions: {e}")))?;
    }

    Ok(json!({
        "id": document.id,
        "title": document.title,
        "message": "Suggestions have been added to the document",
    }))
}

/// Drive a nested streaming generation, accumulating every text delta into
/// the draft buffer and re-emitting it on the side channel.
async fn stream_draft<D, S, F>(
    ctx: &ToolContext<'_, D, S, F>,
    system: &str,
    messages: Vec<ChatMessage>,
) -> Result<String, ToolError> {
    let request = CompletionRequest::text(ctx.model, messages).with_system(system);
    let mut stream = ctx.provider.stream(request);
    let mut draft = String::new();

    while let Some(event) = stream.next().await {
        match event {
            Ok(GenerationEvent::TextDelta(delta)) => {
                draft.push_str(&delta);
                ctx.sink.data(StreamEvent::TextDelta(delta)).await;
            }
            Ok(_) => {}
            Err(err) => {
                return Err(ToolError::Execution(format!("draft generation failed: {err}")));
            }
        }
    }

    Ok(draft)
}
