//! OpenAI-compatible chat-completions adapter.
//!
//! Raw reqwest client plus SSE decoding; the streaming state machine maps
//! wire chunks onto the provider-agnostic [`GenerationEvent`] enum, and the
//! element splitter turns a structured-output generation into an
//! incremental stream of array elements.
//!
//! [`GenerationEvent`]: scribe_types::llm::GenerationEvent

pub mod client;
pub mod elements;
pub mod streaming;
pub mod types;

pub use client::OpenAiCompatProvider;
