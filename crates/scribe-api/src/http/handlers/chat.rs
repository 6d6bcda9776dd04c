//! Chat endpoints.
//!
//! POST /api/v1/chat -- run one conversational turn, streamed as SSE.
//! DELETE /api/v1/chat?id=<id> -- delete an owned chat.
//!
//! SSE event types:
//! - `message` -- a delta of the assistant's chat text: `{ "text": "..." }`
//! - `data` -- a side-channel event: `{ "type": "...", "content": ... }`
//! - `error` -- the turn failed after streaming began: `{ "message": "..." }`
//! - `done` -- stream complete: `{}`

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;

use scribe_core::repository::ChatStore;
use scribe_core::turn::sink::EventSink;
use scribe_core::turn::{EVENT_CHANNEL_CAPACITY, TurnRequest};
use scribe_types::message::ChatMessage;
use scribe_types::model::find_model;
use scribe_types::stream::TurnEvent;

use crate::http::error::AppError;
use crate::http::extractors::auth::Session;
use crate::state::AppState;

/// Request body for the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Opaque client-supplied chat id.
    pub id: String,
    /// The conversation so far, ending with the newest user message.
    pub messages: Vec<ChatMessage>,
    /// Must match a configured model.
    #[serde(rename = "modelId")]
    pub model_id: String,
}

/// POST /api/v1/chat -- stream one conversational turn.
///
/// 401 without a valid session, 404 for an unknown model id; both are
/// rejected before any retrieval or generation work starts.
pub async fn stream_chat(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let model = find_model(&body.model_id)
        .ok_or_else(|| AppError::NotFound("Model not found".to_string()))?;

    let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);

    let request = TurnRequest {
        chat_id: body.id,
        messages: body.messages,
        model: model.clone(),
        user_id: session.user_id().map(str::to_string),
    };

    // The turn runs as its own task; the response drains the event channel.
    // A dropped client closes the channel, which stops further emission
    // while the turn finishes its best-effort persistence.
    let service = state.turn_service.clone();
    tokio::spawn(async move {
        service.run_turn(request, sink).await;
    });

    let sse_stream =
        ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(to_sse_event(event)));

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

fn to_sse_event(event: TurnEvent) -> Event {
    match event {
        TurnEvent::Message(text) => Event::default()
            .event("message")
            .data(serde_json::json!({ "text": text }).to_string()),
        TurnEvent::Data(data) => Event::default()
            .event("data")
            .data(serde_json::to_string(&data).unwrap_or_default()),
        TurnEvent::Error(message) => Event::default()
            .event("error")
            .data(serde_json::json!({ "message": message }).to_string()),
        TurnEvent::Done => Event::default().event("done").data("{}"),
    }
}

/// Query parameters for chat deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteChatQuery {
    pub id: Option<String>,
}

/// DELETE /api/v1/chat?id=<id> -- delete an owned chat.
pub async fn delete_chat(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<DeleteChatQuery>,
) -> Result<(StatusCode, &'static str), AppError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::NotFound("Not Found".to_string()))?;

    let chat = state
        .chats
        .get(&id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Chat not found".to_string()))?;

    if session.user_id() != Some(chat.user_id.as_str()) {
        return Err(AppError::Unauthorized(
            "You do not own this chat".to_string(),
        ));
    }

    state
        .chats
        .delete(&id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::OK, "Chat deleted"))
}
