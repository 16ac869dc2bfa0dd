//! Conversation threads.

use serde::Deserialize;
use serde_json::Value;

use super::Metadata;

/// A thread, as announced by `thread.created`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AssistantThread {
    /// Thread identifier.
    pub id: String,
    /// Always `"thread"`.
    #[serde(default)]
    pub object: String,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub created_at: i64,
    /// Attached metadata.
    #[serde(default)]
    pub metadata: Option<Metadata>,
    /// Tool resources made available to the thread, kept opaque.
    #[serde(default)]
    pub tool_resources: Option<Value>,
}
