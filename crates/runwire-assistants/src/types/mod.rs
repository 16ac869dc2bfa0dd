//! Payload shapes carried by assistant-run events.
//!
//! Entities arriving as top-level payloads are plain `Deserialize` structs.
//! Elements of nested arrays (step details, tool calls, message content,
//! annotations, required actions) are lenient unions: each element is
//! resolved by its own `"type"` field through a static
//! [`UnionTable`](runwire_stream::UnionTable), and an unrecognized type
//! decodes into that union's `Unknown` variant instead of failing.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Implements `Deserialize` for a lenient union by deferring to its table.
macro_rules! union_deserialize {
    ($ty:ty => $table:ident) => {
        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                runwire_stream::deserialize_union(deserializer, &$table)
            }
        }
    };
}

pub mod message;
pub mod run;
pub mod run_step;
pub mod thread;

pub use message::{
    FileCitation, FileCitationAnnotation, FilePathAnnotation, FilePathRef, MessageContent,
    MessageDelta, MessageDeltaChunk, MessageDeltaContent, MessageDeltaImageFile,
    MessageDeltaText, MessageDeltaTextContent, MessageImageFileContent, MessageRole,
    MessageStatus, MessageText, MessageTextAnnotation, MessageTextContent, ThreadMessage,
};
pub use run::{
    RequiredAction, RequiredFunctionToolCall, RequiredToolCall, RunStatus, SubmitToolOutputs,
    SubmitToolOutputsAction, ThreadRun,
};
pub use run_step::{
    CodeInterpreterCall, CodeInterpreterDelta, CodeInterpreterImage, CodeInterpreterLogs,
    CodeInterpreterOutput, CodeInterpreterToolCall, FileSearchToolCall, FunctionToolCall,
    MessageCreation, MessageCreationDetails, RunStep, RunStepDelta, RunStepDeltaChunk,
    RunStepDeltaCodeInterpreter, RunStepDeltaDetails, RunStepDeltaFileSearch,
    RunStepDeltaFunction, RunStepDeltaMessageCreation, RunStepDeltaToolCall,
    RunStepDeltaToolCalls, RunStepDetails, RunStepStatus, RunStepToolCall, ToolCallDetails,
};
pub use thread::AssistantThread;

/// Free-form key/value pairs attached to an entity.
pub type Metadata = HashMap<String, String>;

/// Base shape for union elements whose `"type"` is missing or unrecognized.
///
/// Keeps the discriminator and the common locator fields, and every other
/// field as raw JSON. Decoding this shape never fails on a JSON object: a
/// locator field of an unexpected JSON type reads as `None`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UnknownVariant {
    /// The `"type"` value, if it was a string.
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    /// Position within a delta's array, if it was a non-negative integer.
    #[serde(default, deserialize_with = "lenient_u32")]
    pub index: Option<u32>,
    /// Identifier, if it was a string.
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    /// Everything else.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accepts any JSON value, keeping it only if it is a string.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Accepts any JSON value, keeping it only if it is an integer that fits `u32`.
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?
        .as_u64()
        .and_then(|n| u32::try_from(n).ok()))
}

/// A function invocation, as requested by a run or recorded in a step.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct FunctionCall {
    /// Function name.
    pub name: String,
    /// JSON-encoded arguments.
    #[serde(default)]
    pub arguments: String,
    /// Output submitted for the call, once known.
    #[serde(default)]
    pub output: Option<String>,
}

/// Partial [`FunctionCall`] carried by step deltas.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct FunctionCallDelta {
    /// Function name.
    #[serde(default)]
    pub name: Option<String>,
    /// Next fragment of the JSON-encoded arguments.
    #[serde(default)]
    pub arguments: Option<String>,
    /// Output submitted for the call.
    #[serde(default)]
    pub output: Option<String>,
}

/// Reference to an uploaded image file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ImageFileRef {
    /// File identifier.
    #[serde(default)]
    pub file_id: Option<String>,
}

/// Token accounting for a run or a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Tokens generated.
    #[serde(default)]
    pub completion_tokens: u64,
    /// Sum of both.
    #[serde(default)]
    pub total_tokens: u64,
}

/// Error attached to a failed run or step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct LastError {
    /// Machine-readable code (e.g. `rate_limit_exceeded`).
    pub code: String,
    /// Human-readable description.
    #[serde(default)]
    pub message: String,
}

/// Why an entity ended incomplete.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct IncompleteDetails {
    /// Reason code.
    #[serde(default)]
    pub reason: String,
}
