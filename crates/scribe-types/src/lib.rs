//! Shared domain types for scribe.
//!
//! This crate contains the core domain types used across the scribe service:
//! chat transcripts, documents, suggestions, stream events, the model
//! catalog, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod error;
pub mod identity;
pub mod llm;
pub mod message;
pub mod model;
pub mod stream;
