//! Tool registry and execution.
//!
//! Each tool is a tagged variant with a schema-validated parameter record,
//! dispatched via exhaustive matching. Executions receive their
//! collaborators through an explicit [`ToolContext`], never captured scope.

pub mod context;
pub mod executor;
pub mod registry;

pub use context::ToolContext;
pub use registry::{ToolCall, definitions};
