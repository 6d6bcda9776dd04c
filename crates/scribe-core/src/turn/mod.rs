//! Streaming turn orchestration.
//!
//! One conversational turn is one cooperative task: retrieve grounding
//! context, compose the prompt, drive the bounded tool-round generation
//! loop, multiplex all events onto the turn's ordered channel, and persist
//! the sanitized transcript on completion. There is no cross-request shared
//! mutable state; every turn owns its buffers.

pub mod sanitize;
pub mod sink;

use std::sync::Arc;

use chrono::Utc;
use futures_util::StreamExt;
use serde_json::json;
use tracing::{error, warn};

use scribe_types::chat::Chat;
use scribe_types::llm::{CompletionRequest, GenerationEvent, StopReason};
use scribe_types::message::{ChatMessage, ChatRole, ToolCallPart, ToolResultPart};
use scribe_types::model::ChatModel;

use crate::llm::LlmProvider;
use crate::prompt::grounded_system_prompt;
use crate::repository::{ChatStore, DocumentStore, SuggestionStore};
use crate::retrieval::{RetrievalClient, retrieve_context};
use crate::tool::{ToolCall, ToolContext, definitions, executor};
use crate::weather::ForecastClient;

use sanitize::sanitize_response_messages;
use sink::EventSink;

/// Maximum sequential tool-invocation rounds per turn.
pub const MAX_TOOL_ROUNDS: usize = 5;

/// Bound on the turn's outbound event queue.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Prefix of the synthetic assistant message carrying retrieved context.
const CONTEXT_MESSAGE_PREFIX: &str = "Here is the document-based answer:";

/// Inputs for one conversational turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Opaque client-supplied chat id.
    pub chat_id: String,
    /// The conversation so far, ending with the newest user message.
    pub messages: Vec<ChatMessage>,
    /// Catalog entry selected by the request's model id.
    pub model: ChatModel,
    /// Present when the session carries a user identity; gates persistence.
    pub user_id: Option<String>,
}

/// Orchestrates conversational turns.
///
/// Generic over the persistence and client ports; the API layer pins these
/// to the concrete infra implementations. The provider is held as a trait
/// object so tool executions can start nested generations through the same
/// handle.
pub struct TurnService<C, D, S, R, F> {
    provider: Arc<dyn LlmProvider>,
    retrieval: Arc<R>,
    chats: Arc<C>,
    documents: Arc<D>,
    suggestions: Arc<S>,
    forecast: Arc<F>,
}

impl<C, D, S, R, F> TurnService<C, D, S, R, F>
where
    C: ChatStore,
    D: DocumentStore,
    S: SuggestionStore,
    R: RetrievalClient,
    F: ForecastClient,
{
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        retrieval: Arc<R>,
        chats: Arc<C>,
        documents: Arc<D>,
        suggestions: Arc<S>,
        forecast: Arc<F>,
    ) -> Self {
        Self {
            provider,
            retrieval,
            chats,
            documents,
            suggestions,
            forecast,
        }
    }

    /// Run one turn, writing every event into `sink` in production order.
    ///
    /// Never returns an error: failures before streaming are the caller's
    /// to reject (auth, model validation); failures after streaming began
    /// are reported on the stream or logged and swallowed.
    pub async fn run_turn(&self, request: TurnRequest, sink: EventSink) {
        // Retrieval never fails the turn; an absent user message skips it.
        let query = first_user_text(&request.messages);
        let context = if query.is_empty() {
            String::new()
        } else {
            retrieve_context(self.retrieval.as_ref(), &query).await
        };

        let mut conversation = request.messages.clone();
        conversation.push(ChatMessage::assistant(format!(
            "{CONTEXT_MESSAGE_PREFIX}\n{context}"
        )));

        let system_prompt = grounded_system_prompt(&context);
        let tools = definitions(request.model.tool_mode);

        let mut responses: Vec<ChatMessage> = Vec::new();
        let mut had_error = false;

        'rounds: for _round in 0..MAX_TOOL_ROUNDS {
            let mut messages = conversation.clone();
            messages.extend(responses.iter().cloned());

            let completion = CompletionRequest {
                model: request.model.api_identifier.to_string(),
                messages,
                system: Some(system_prompt.clone()),
                tools: tools.clone(),
                response_format: None,
                temperature: None,
                max_tokens: None,
            };

            let mut stream = self.provider.stream(completion);
            let mut text = String::new();
            let mut calls: Vec<ToolCallPart> = Vec::new();
            let mut stop_reason = StopReason::EndTurn;

            while let Some(event) = stream.next().await {
                match event {
                    Ok(GenerationEvent::TextDelta(delta)) => {
                        sink.message(delta.clone()).await;
                        text.push_str(&delta);
                    }
                    Ok(GenerationEvent::ToolCallComplete {
                        id,
                        name,
                        arguments,
                    }) => {
                        calls.push(ToolCallPart {
                            id,
                            name,
                            arguments,
                        });
                    }
                    Ok(GenerationEvent::Finish(reason)) => stop_reason = reason,
                    Ok(GenerationEvent::Usage(_)) | Ok(GenerationEvent::Done) => {}
                    Err(err) => {
                        error!(chat_id = %request.chat_id, error = %err, "generation stream failed");
                        sink.error(err.to_string()).await;
                        had_error = true;
                        break 'rounds;
                    }
                }
            }

            if !text.is_empty() {
                responses.push(ChatMessage::assistant(text));
            }
            if calls.is_empty() {
                break;
            }

            responses.push(ChatMessage::tool_calls(calls.clone()));

            let ctx = ToolContext {
                provider: &self.provider,
                documents: self.documents.as_ref(),
                suggestions: self.suggestions.as_ref(),
                forecast: self.forecast.as_ref(),
                sink: &sink,
                model: request.model.api_identifier,
                user_id: request.user_id.as_deref(),
            };

            let mut results = Vec::with_capacity(calls.len());
            for part in calls {
                // Validation failures are rejected before execute and fed
                // back to the model as error results.
                let output = match ToolCall::parse(&part.name, &part.arguments) {
                    Ok(call) => executor::execute(call, &ctx).await,
                    Err(err) => {
                        warn!(tool = %part.name, error = %err, "rejected tool invocation");
                        json!({ "error": err.to_string() })
                    }
                };
                results.push(ToolResultPart {
                    id: part.id,
                    name: part.name,
                    output,
                });
            }
            responses.push(ChatMessage::tool_results(results));

            if stop_reason != StopReason::ToolCalls {
                break;
            }
        }

        if !had_error {
            self.persist_chat(&request, conversation, &responses).await;
        }

        sink.done().await;
    }

    /// Persist the sanitized transcript. Failures are logged and swallowed:
    /// the client already holds the authoritative streamed content.
    async fn persist_chat(
        &self,
        request: &TurnRequest,
        conversation: Vec<ChatMessage>,
        responses: &[ChatMessage],
    ) {
        let Some(user_id) = request.user_id.as_deref() else {
            return;
        };

        let mut messages = conversation;
        messages.extend(sanitize_response_messages(responses));

        let chat = Chat {
            id: request.chat_id.clone(),
            user_id: user_id.to_string(),
            messages,
            created_at: Utc::now(),
        };

        if let Err(err) = self.chats.save(&chat).await {
            error!(chat_id = %request.chat_id, error = %err, "failed to save chat");
        }
    }
}

/// Text of the first user-role message, or empty.
fn first_user_text(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .find(|m| m.role == ChatRole::User)
        .and_then(|m| m.content.as_text())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use scribe_types::chat::{Document, Suggestion};
    use scribe_types::error::{ForecastError, RepositoryError, RetrievalError};
    use scribe_types::llm::LlmError;
    use scribe_types::message::MessageContent;
    use scribe_types::model::find_model;
    use scribe_types::stream::{StreamEvent, TurnEvent};

    use crate::llm::{ElementStream, EventStream};

    // -----------------------------------------------------------------
    // Mock collaborators
    // -----------------------------------------------------------------

    /// Scripted provider: each `stream` call pops the next event script.
    struct MockProvider {
        scripts: Mutex<VecDeque<Vec<Result<GenerationEvent, LlmError>>>>,
        element_scripts: Mutex<VecDeque<Vec<Result<serde_json::Value, LlmError>>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockProvider {
        fn new(scripts: Vec<Vec<Result<GenerationEvent, LlmError>>>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into_iter().collect()),
                element_scripts: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn with_elements(
            self,
            elements: Vec<Vec<Result<serde_json::Value, LlmError>>>,
        ) -> Self {
            *self.element_scripts.lock().unwrap() = elements.into_iter().collect();
            self
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl LlmProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn stream(&self, request: CompletionRequest) -> EventStream {
            self.requests.lock().unwrap().push(request);
            let events = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| vec![Ok(GenerationEvent::Done)]);
            Box::pin(futures_util::stream::iter(events))
        }

        fn stream_elements(&self, request: CompletionRequest) -> ElementStream {
            self.requests.lock().unwrap().push(request);
            let elements = self
                .element_scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default();
            Box::pin(futures_util::stream::iter(elements))
        }
    }

    struct MockRetrieval {
        answer: String,
        calls: AtomicUsize,
    }

    impl MockRetrieval {
        fn new(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    impl RetrievalClient for MockRetrieval {
        async fn search(&self, _query: &str) -> Result<String, RetrievalError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.answer.clone())
        }
    }

    #[derive(Default)]
    struct MemoryChatStore {
        chats: Mutex<HashMap<String, Chat>>,
    }

    impl ChatStore for MemoryChatStore {
        async fn get(&self, id: &str) -> Result<Option<Chat>, RepositoryError> {
            Ok(self.chats.lock().unwrap().get(id).cloned())
        }

        async fn save(&self, chat: &Chat) -> Result<(), RepositoryError> {
            self.chats
                .lock()
                .unwrap()
                .insert(chat.id.clone(), chat.clone());
            Ok(())
        }

        async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
            match self.chats.lock().unwrap().remove(id) {
                Some(_) => Ok(()),
                None => Err(RepositoryError::NotFound),
            }
        }
    }

    #[derive(Default)]
    struct MemoryDocumentStore {
        documents: Mutex<HashMap<String, Document>>,
    }

    impl MemoryDocumentStore {
        fn insert(&self, document: Document) {
            self.documents
                .lock()
                .unwrap()
                .insert(document.id.clone(), document);
        }
    }

    impl DocumentStore for MemoryDocumentStore {
        async fn get(&self, id: &str) -> Result<Option<Document>, RepositoryError> {
            Ok(self.documents.lock().unwrap().get(id).cloned())
        }

        async fn save(&self, document: &Document) -> Result<(), RepositoryError> {
            self.insert(document.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemorySuggestionStore {
        suggestions: Mutex<Vec<Suggestion>>,
    }

    impl SuggestionStore for MemorySuggestionStore {
        async fn save_batch(&self, suggestions: &[Suggestion]) -> Result<(), RepositoryError> {
            self.suggestions
                .lock()
                .unwrap()
                .extend(suggestions.iter().cloned());
            Ok(())
        }
    }

    struct MockForecast;

    impl ForecastClient for MockForecast {
        async fn fetch(
            &self,
            latitude: f64,
            longitude: f64,
        ) -> Result<serde_json::Value, ForecastError> {
            Ok(json!({ "latitude": latitude, "longitude": longitude, "current": { "temperature_2m": 18.4 } }))
        }
    }

    // -----------------------------------------------------------------
    // Harness
    // -----------------------------------------------------------------

    struct Harness {
        service: TurnService<
            MemoryChatStore,
            MemoryDocumentStore,
            MemorySuggestionStore,
            MockRetrieval,
            MockForecast,
        >,
        provider: Arc<MockProvider>,
        retrieval: Arc<MockRetrieval>,
        chats: Arc<MemoryChatStore>,
        documents: Arc<MemoryDocumentStore>,
        suggestions: Arc<MemorySuggestionStore>,
    }

    fn harness(provider: MockProvider, answer: &str) -> Harness {
        let provider = Arc::new(provider);
        let retrieval = Arc::new(MockRetrieval::new(answer));
        let chats = Arc::new(MemoryChatStore::default());
        let documents = Arc::new(MemoryDocumentStore::default());
        let suggestions = Arc::new(MemorySuggestionStore::default());

        let service = TurnService::new(
            provider.clone() as Arc<dyn LlmProvider>,
            retrieval.clone(),
            chats.clone(),
            documents.clone(),
            suggestions.clone(),
            Arc::new(MockForecast),
        );

        Harness {
            service,
            provider,
            retrieval,
            chats,
            documents,
            suggestions,
        }
    }

    fn canvas_request(user_id: Option<&str>) -> TurnRequest {
        TurnRequest {
            chat_id: "c1".to_string(),
            messages: vec![ChatMessage::user(
                "What does J-PAL research on microcredit?",
            )],
            model: find_model("gpt-4o-canvas").unwrap().clone(),
            user_id: user_id.map(str::to_string),
        }
    }

    async fn collect_events(service_run: impl std::future::Future<Output = ()>, mut rx: tokio::sync::mpsc::Receiver<TurnEvent>) -> Vec<TurnEvent> {
        service_run.await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn text_call(id: &str, name: &str, arguments: serde_json::Value) -> GenerationEvent {
        GenerationEvent::ToolCallComplete {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    // -----------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_plain_turn_streams_text_and_persists_chat() {
        let provider = MockProvider::new(vec![vec![
            Ok(GenerationEvent::TextDelta("Microcredit take-up ".to_string())),
            Ok(GenerationEvent::TextDelta("was modest.".to_string())),
            Ok(GenerationEvent::Finish(StopReason::EndTurn)),
            Ok(GenerationEvent::Done),
        ]]);
        let h = harness(provider, "Page 7: Microcredit take-up was modest.");

        let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);
        let events =
            collect_events(h.service.run_turn(canvas_request(Some("u1")), sink), rx).await;

        // Text deltas then the close signal, in order.
        assert_eq!(
            events,
            vec![
                TurnEvent::Message("Microcredit take-up ".to_string()),
                TurnEvent::Message("was modest.".to_string()),
                TurnEvent::Done,
            ]
        );

        // The system prompt embedded the retrieved answer with its page number.
        let requests = h.provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(
            requests[0]
                .system
                .as_deref()
                .unwrap()
                .contains("Page 7: Microcredit take-up was modest.")
        );

        // Chat persisted under the request id, ending with the assistant reply.
        let chat = h.chats.get("c1").await.unwrap().unwrap();
        assert_eq!(chat.user_id, "u1");
        let last = chat.messages.last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(
            last.content.as_text(),
            Some("Microcredit take-up was modest.")
        );
        // Synthetic context message precedes the response transcript.
        assert!(chat.messages.iter().any(|m| {
            m.role == ChatRole::Assistant
                && m.content
                    .as_text()
                    .is_some_and(|t| t.starts_with(CONTEXT_MESSAGE_PREFIX))
        }));
    }

    #[tokio::test]
    async fn test_create_document_emits_panel_events_and_persists() {
        let provider = MockProvider::new(vec![
            // Round 1: the model invokes createDocument.
            vec![
                Ok(text_call("call_1", "createDocument", json!({"title": "Essay"}))),
                Ok(GenerationEvent::Finish(StopReason::ToolCalls)),
                Ok(GenerationEvent::Done),
            ],
            // Nested draft generation.
            vec![
                Ok(GenerationEvent::TextDelta("Hello ".to_string())),
                Ok(GenerationEvent::TextDelta("world.".to_string())),
                Ok(GenerationEvent::Done),
            ],
            // Round 2: the model wraps up.
            vec![
                Ok(GenerationEvent::TextDelta("The essay is ready.".to_string())),
                Ok(GenerationEvent::Finish(StopReason::EndTurn)),
                Ok(GenerationEvent::Done),
            ],
        ]);
        let h = harness(provider, "Page 1: context");

        let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);
        let events =
            collect_events(h.service.run_turn(canvas_request(Some("u1")), sink), rx).await;

        // Side-channel events arrive in emission order.
        let data: Vec<&StreamEvent> = events
            .iter()
            .filter_map(|e| match e {
                TurnEvent::Data(se) => Some(se),
                _ => None,
            })
            .collect();
        assert!(matches!(data[0], StreamEvent::Id(_)));
        assert_eq!(data[1], &StreamEvent::Title("Essay".to_string()));
        assert_eq!(data[2], &StreamEvent::Clear(String::new()));
        assert_eq!(data[3], &StreamEvent::TextDelta("Hello ".to_string()));
        assert_eq!(data[4], &StreamEvent::TextDelta("world.".to_string()));
        assert_eq!(data[5], &StreamEvent::finish());

        // Document persisted with the accumulated draft.
        let id = match data[0] {
            StreamEvent::Id(id) => id.clone(),
            _ => unreachable!(),
        };
        let document = h.documents.get(&id).await.unwrap().unwrap();
        assert_eq!(document.title, "Essay");
        assert_eq!(document.content, "Hello world.");
        assert_eq!(document.user_id, "u1");

        // The transcript carries the call/result pair and the wrap-up text.
        let chat = h.chats.get("c1").await.unwrap().unwrap();
        let has_result = chat.messages.iter().any(|m| match &m.content {
            MessageContent::ToolResults { tool_results } => tool_results
                .iter()
                .any(|r| r.output["content"] == "A document was created and is now visible to the user."),
            _ => false,
        });
        assert!(has_result);
        assert_eq!(
            chat.messages.last().unwrap().content.as_text(),
            Some("The essay is ready.")
        );
    }

    #[tokio::test]
    async fn test_update_document_missing_id_writes_nothing() {
        let provider = MockProvider::new(vec![
            vec![
                Ok(text_call(
                    "call_1",
                    "updateDocument",
                    json!({"id": "missing", "description": "tighten the intro"}),
                )),
                Ok(GenerationEvent::Finish(StopReason::ToolCalls)),
                Ok(GenerationEvent::Done),
            ],
            vec![
                Ok(GenerationEvent::TextDelta(
                    "I could not find that document.".to_string(),
                )),
                Ok(GenerationEvent::Finish(StopReason::EndTurn)),
                Ok(GenerationEvent::Done),
            ],
        ]);
        let h = harness(provider, "Page 1: context");

        let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);
        let events =
            collect_events(h.service.run_turn(canvas_request(Some("u1")), sink), rx).await;

        // No panel events: the tool failed before any clear/delta.
        assert!(!events.iter().any(|e| matches!(e, TurnEvent::Data(_))));

        // No document written.
        assert!(h.documents.documents.lock().unwrap().is_empty());

        // The model saw the error result.
        let chat = h.chats.get("c1").await.unwrap().unwrap();
        let error_result = chat.messages.iter().any(|m| match &m.content {
            MessageContent::ToolResults { tool_results } => {
                tool_results.iter().any(|r| r.output["error"] == "Document not found")
            }
            _ => false,
        });
        assert!(error_result);
    }

    #[tokio::test]
    async fn test_suggestions_stream_incrementally_and_reference_document_text() {
        let h = {
            let provider = MockProvider::new(vec![
                vec![
                    Ok(text_call(
                        "call_1",
                        "requestSuggestions",
                        json!({"documentId": "d1"}),
                    )),
                    Ok(GenerationEvent::Finish(StopReason::ToolCalls)),
                    Ok(GenerationEvent::Done),
                ],
                vec![
                    Ok(GenerationEvent::TextDelta("Added suggestions.".to_string())),
                    Ok(GenerationEvent::Finish(StopReason::EndTurn)),
                    Ok(GenerationEvent::Done),
                ],
            ])
            .with_elements(vec![vec![
                Ok(json!({
                    "originalSentence": "The sky is green.",
                    "suggestedSentence": "The sky is blue.",
                    "description": "Fix the color."
                })),
                Ok(json!({
                    "originalSentence": "Grass is purple.",
                    "suggestedSentence": "Grass is green.",
                    "description": "Fix the color."
                })),
            ]]);
            harness(provider, "Page 1: context")
        };

        h.documents.insert(Document {
            id: "d1".to_string(),
            title: "Colors".to_string(),
            content: "The sky is green. Grass is purple.".to_string(),
            user_id: "u1".to_string(),
            created_at: Utc::now(),
        });

        let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);
        let events =
            collect_events(h.service.run_turn(canvas_request(Some("u1")), sink), rx).await;

        // Both suggestions were emitted on the side channel.
        let emitted: Vec<&Suggestion> = events
            .iter()
            .filter_map(|e| match e {
                TurnEvent::Data(StreamEvent::Suggestion(s)) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(emitted.len(), 2);

        // Every suggestion references text present in the persisted document.
        let document = h.documents.get("d1").await.unwrap().unwrap();
        for suggestion in &emitted {
            assert!(document.content.contains(&suggestion.original_text));
            assert!(!suggestion.is_resolved);
            assert_eq!(suggestion.document_id, "d1");
        }

        // And the batch was persisted.
        assert_eq!(h.suggestions.suggestions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_user_identity_streams_but_skips_persistence() {
        let provider = MockProvider::new(vec![
            vec![
                Ok(text_call("call_1", "createDocument", json!({"title": "Essay"}))),
                Ok(GenerationEvent::Finish(StopReason::ToolCalls)),
                Ok(GenerationEvent::Done),
            ],
            vec![
                Ok(GenerationEvent::TextDelta("Draft.".to_string())),
                Ok(GenerationEvent::Done),
            ],
            vec![
                Ok(GenerationEvent::TextDelta("Done.".to_string())),
                Ok(GenerationEvent::Finish(StopReason::EndTurn)),
                Ok(GenerationEvent::Done),
            ],
        ]);
        let h = harness(provider, "Page 1: context");

        let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);
        let events = collect_events(h.service.run_turn(canvas_request(None), sink), rx).await;

        // Streaming still happened.
        assert!(
            events
                .iter()
                .any(|e| matches!(e, TurnEvent::Data(StreamEvent::TextDelta(_))))
        );

        // But nothing was persisted.
        assert!(h.chats.chats.lock().unwrap().is_empty());
        assert!(h.documents.documents.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tool_rounds_are_bounded() {
        // The model asks for weather every round, forever.
        let scripts = (0..10)
            .map(|i| {
                vec![
                    Ok(text_call(
                        &format!("call_{i}"),
                        "getWeather",
                        json!({"latitude": 52.5, "longitude": 13.4}),
                    )),
                    Ok(GenerationEvent::Finish(StopReason::ToolCalls)),
                    Ok(GenerationEvent::Done),
                ]
            })
            .collect();
        let provider = MockProvider::new(scripts);

        let mut request = canvas_request(Some("u1"));
        request.model = find_model("gpt-4o").unwrap().clone();

        let h = harness(provider, "Page 1: context");
        let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);
        let _ = collect_events(h.service.run_turn(request, sink), rx).await;

        // Weather invokes no nested generation, so every captured request is
        // one orchestrator round.
        assert_eq!(h.provider.requests().len(), MAX_TOOL_ROUNDS);
    }

    #[tokio::test]
    async fn test_stream_failure_reports_error_and_skips_persistence() {
        let provider = MockProvider::new(vec![vec![
            Ok(GenerationEvent::TextDelta("Partial".to_string())),
            Err(LlmError::Stream("connection reset".to_string())),
        ]]);
        let h = harness(provider, "Page 1: context");

        let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);
        let events =
            collect_events(h.service.run_turn(canvas_request(Some("u1")), sink), rx).await;

        assert!(events.iter().any(|e| matches!(e, TurnEvent::Error(_))));
        assert_eq!(events.last(), Some(&TurnEvent::Done));
        assert!(h.chats.chats.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_user_message_skips_retrieval() {
        let provider = MockProvider::new(vec![vec![
            Ok(GenerationEvent::TextDelta("Hello!".to_string())),
            Ok(GenerationEvent::Finish(StopReason::EndTurn)),
            Ok(GenerationEvent::Done),
        ]]);
        let h = harness(provider, "unused");

        let mut request = canvas_request(Some("u1"));
        request.messages = vec![ChatMessage::user("")];

        let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);
        let _ = collect_events(h.service.run_turn(request, sink), rx).await;

        assert_eq!(h.retrieval.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_tool_parameters_become_error_result() {
        let provider = MockProvider::new(vec![
            vec![
                Ok(text_call(
                    "call_1",
                    "getWeather",
                    json!({"latitude": "not-a-number"}),
                )),
                Ok(GenerationEvent::Finish(StopReason::ToolCalls)),
                Ok(GenerationEvent::Done),
            ],
            vec![
                Ok(GenerationEvent::TextDelta("Sorry.".to_string())),
                Ok(GenerationEvent::Finish(StopReason::EndTurn)),
                Ok(GenerationEvent::Done),
            ],
        ]);

        let mut request = canvas_request(Some("u1"));
        request.model = find_model("gpt-4o").unwrap().clone();

        let h = harness(provider, "Page 1: context");
        let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);
        let _ = collect_events(h.service.run_turn(request, sink), rx).await;

        let chat = h.chats.get("c1").await.unwrap().unwrap();
        let saw_error = chat.messages.iter().any(|m| match &m.content {
            MessageContent::ToolResults { tool_results } => tool_results
                .iter()
                .any(|r| r.output["error"].as_str().is_some_and(|e| e.contains("invalid parameters"))),
            _ => false,
        });
        assert!(saw_error);
    }
}
