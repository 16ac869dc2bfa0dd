//! Run steps and their incremental deltas.
//!
//! Step details nest two levels of unions: a step's details list tool calls,
//! and a code-interpreter tool call lists outputs. Every level is resolved
//! independently through its own table.

use std::sync::LazyLock;

use runwire_stream::UnionTable;
use serde::Deserialize;
use serde_json::Value;

use super::{
    FunctionCall, FunctionCallDelta, ImageFileRef, LastError, Metadata, UnknownVariant, Usage,
};

/// One unit of work performed during a run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RunStep {
    /// Step identifier.
    pub id: String,
    /// Always `"thread.run.step"`.
    #[serde(default)]
    pub object: String,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub created_at: i64,
    /// Assistant executing the run.
    #[serde(default)]
    pub assistant_id: String,
    /// Owning thread.
    #[serde(default)]
    pub thread_id: String,
    /// Owning run.
    pub run_id: String,
    /// `message_creation` or `tool_calls`, mirrored by [`RunStep::step_details`].
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Lifecycle status.
    pub status: RunStepStatus,
    /// What the step did.
    pub step_details: RunStepDetails,
    /// Failure details, when `status` is `failed`.
    #[serde(default)]
    pub last_error: Option<LastError>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub expired_at: Option<i64>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub cancelled_at: Option<i64>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub failed_at: Option<i64>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub completed_at: Option<i64>,
    /// Attached metadata.
    #[serde(default)]
    pub metadata: Option<Metadata>,
    /// Token accounting, present once the step is terminal.
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Step lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStepStatus {
    /// Executing.
    InProgress,
    /// Cancelled.
    Cancelled,
    /// Failed.
    Failed,
    /// Finished successfully.
    Completed,
    /// Timed out.
    Expired,
    /// A status this crate does not know yet.
    #[serde(other)]
    Unknown,
}

// ─────────────────────────────────────────────────────────────────────────────
// Step details
// ─────────────────────────────────────────────────────────────────────────────

/// What a step did, resolved by `"type"`.
#[derive(Clone, Debug, PartialEq)]
pub enum RunStepDetails {
    /// `message_creation`
    MessageCreation(MessageCreationDetails),
    /// `tool_calls`
    ToolCalls(ToolCallDetails),
    /// Unrecognized detail type.
    Unknown(UnknownVariant),
}

/// Body of `message_creation` details.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MessageCreationDetails {
    /// The message the step created.
    pub message_creation: MessageCreation,
}

/// Message created by a step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct MessageCreation {
    /// Message identifier.
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Body of `tool_calls` details.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ToolCallDetails {
    /// Calls made by the step, each resolved by its own `"type"`.
    #[serde(default)]
    pub tool_calls: Vec<RunStepToolCall>,
}

/// Tool call recorded in a step, resolved by `"type"`.
#[derive(Clone, Debug, PartialEq)]
pub enum RunStepToolCall {
    /// `code_interpreter`
    CodeInterpreter(CodeInterpreterToolCall),
    /// `file_search`
    FileSearch(FileSearchToolCall),
    /// `function`
    Function(FunctionToolCall),
    /// Unrecognized tool type.
    Unknown(UnknownVariant),
}

impl RunStepToolCall {
    /// Call identifier.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::CodeInterpreter(call) => Some(&call.id),
            Self::FileSearch(call) => Some(&call.id),
            Self::Function(call) => Some(&call.id),
            Self::Unknown(unknown) => unknown.id.as_deref(),
        }
    }
}

/// Code interpreter invocation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CodeInterpreterToolCall {
    /// Call identifier.
    pub id: String,
    /// Input and outputs.
    pub code_interpreter: CodeInterpreterCall,
}

/// Code interpreter input and outputs.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CodeInterpreterCall {
    /// Source code that was run.
    #[serde(default)]
    pub input: String,
    /// Outputs, each resolved by its own `"type"`.
    #[serde(default)]
    pub outputs: Vec<CodeInterpreterOutput>,
}

/// File search invocation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FileSearchToolCall {
    /// Call identifier.
    pub id: String,
    /// Search details, kept opaque.
    #[serde(default)]
    pub file_search: Value,
}

/// Function invocation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FunctionToolCall {
    /// Call identifier.
    pub id: String,
    /// Function, arguments and (once submitted) output.
    pub function: FunctionCall,
}

/// Code interpreter output, resolved by `"type"`.
///
/// Shared by full steps and deltas; `index` is only set in deltas.
#[derive(Clone, Debug, PartialEq)]
pub enum CodeInterpreterOutput {
    /// `logs`
    Logs(CodeInterpreterLogs),
    /// `image`
    Image(CodeInterpreterImage),
    /// Unrecognized output type.
    Unknown(UnknownVariant),
}

/// Text output of a code interpreter call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CodeInterpreterLogs {
    /// Position within a delta's output array.
    #[serde(default)]
    pub index: Option<u32>,
    /// Captured text.
    #[serde(default)]
    pub logs: String,
}

/// Image output of a code interpreter call.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CodeInterpreterImage {
    /// Position within a delta's output array.
    #[serde(default)]
    pub index: Option<u32>,
    /// Generated file.
    #[serde(default)]
    pub image: ImageFileRef,
}

// ─────────────────────────────────────────────────────────────────────────────
// Deltas
// ─────────────────────────────────────────────────────────────────────────────

/// Payload of `thread.run.step.delta`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RunStepDeltaChunk {
    /// Step the delta applies to.
    pub id: String,
    /// Always `"thread.run.step.delta"`.
    #[serde(default)]
    pub object: String,
    /// Changed fields.
    pub delta: RunStepDelta,
}

/// Changed fields of a step.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RunStepDelta {
    /// Changed details, if any.
    #[serde(default)]
    pub step_details: Option<RunStepDeltaDetails>,
}

/// Changed step details, resolved by `"type"`.
#[derive(Clone, Debug, PartialEq)]
pub enum RunStepDeltaDetails {
    /// `message_creation`
    MessageCreation(RunStepDeltaMessageCreation),
    /// `tool_calls`
    ToolCalls(RunStepDeltaToolCalls),
    /// Unrecognized detail type.
    Unknown(UnknownVariant),
}

/// Partial `message_creation` details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RunStepDeltaMessageCreation {
    /// The message being created.
    #[serde(default)]
    pub message_creation: Option<MessageCreation>,
}

/// Partial `tool_calls` details.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RunStepDeltaToolCalls {
    /// Changed calls, each resolved by its own `"type"`.
    #[serde(default)]
    pub tool_calls: Vec<RunStepDeltaToolCall>,
}

/// Changed tool call, resolved by `"type"`.
#[derive(Clone, Debug, PartialEq)]
pub enum RunStepDeltaToolCall {
    /// `code_interpreter`
    CodeInterpreter(RunStepDeltaCodeInterpreter),
    /// `file_search`
    FileSearch(RunStepDeltaFileSearch),
    /// `function`
    Function(RunStepDeltaFunction),
    /// Unrecognized tool type.
    Unknown(UnknownVariant),
}

impl RunStepDeltaToolCall {
    /// Position within the step's tool call array.
    pub fn index(&self) -> Option<u32> {
        match self {
            Self::CodeInterpreter(call) => Some(call.index),
            Self::FileSearch(call) => Some(call.index),
            Self::Function(call) => Some(call.index),
            Self::Unknown(unknown) => unknown.index,
        }
    }
}

/// Partial code interpreter call.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RunStepDeltaCodeInterpreter {
    /// Position within the step's tool call array.
    pub index: u32,
    /// Call identifier, sent with the first delta.
    #[serde(default)]
    pub id: Option<String>,
    /// Changed input and outputs.
    #[serde(default)]
    pub code_interpreter: Option<CodeInterpreterDelta>,
}

/// Changed code interpreter input and outputs.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CodeInterpreterDelta {
    /// Next fragment of the source code.
    #[serde(default)]
    pub input: Option<String>,
    /// New outputs, each resolved by its own `"type"`.
    #[serde(default)]
    pub outputs: Vec<CodeInterpreterOutput>,
}

/// Partial file search call.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RunStepDeltaFileSearch {
    /// Position within the step's tool call array.
    pub index: u32,
    /// Call identifier, sent with the first delta.
    #[serde(default)]
    pub id: Option<String>,
    /// Search details, kept opaque.
    #[serde(default)]
    pub file_search: Option<Value>,
}

/// Partial function call.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RunStepDeltaFunction {
    /// Position within the step's tool call array.
    pub index: u32,
    /// Call identifier, sent with the first delta.
    #[serde(default)]
    pub id: Option<String>,
    /// Changed name, arguments or output.
    #[serde(default)]
    pub function: Option<FunctionCallDelta>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tables
// ─────────────────────────────────────────────────────────────────────────────

static STEP_DETAILS: LazyLock<UnionTable<RunStepDetails>> = LazyLock::new(|| {
    UnionTable::new("run_step_details", |b| {
        serde_json::from_slice(b).map(RunStepDetails::Unknown)
    })
    .variant("message_creation", |b| {
        serde_json::from_slice(b).map(RunStepDetails::MessageCreation)
    })
    .variant("tool_calls", |b| {
        serde_json::from_slice(b).map(RunStepDetails::ToolCalls)
    })
});

static STEP_TOOL_CALLS: LazyLock<UnionTable<RunStepToolCall>> = LazyLock::new(|| {
    UnionTable::new("run_step_tool_call", |b| {
        serde_json::from_slice(b).map(RunStepToolCall::Unknown)
    })
    .variant("code_interpreter", |b| {
        serde_json::from_slice(b).map(RunStepToolCall::CodeInterpreter)
    })
    .variant("file_search", |b| {
        serde_json::from_slice(b).map(RunStepToolCall::FileSearch)
    })
    .variant("function", |b| {
        serde_json::from_slice(b).map(RunStepToolCall::Function)
    })
});

static CODE_INTERPRETER_OUTPUTS: LazyLock<UnionTable<CodeInterpreterOutput>> =
    LazyLock::new(|| {
        UnionTable::new("code_interpreter_output", |b| {
            serde_json::from_slice(b).map(CodeInterpreterOutput::Unknown)
        })
        .variant("logs", |b| {
            serde_json::from_slice(b).map(CodeInterpreterOutput::Logs)
        })
        .variant("image", |b| {
            serde_json::from_slice(b).map(CodeInterpreterOutput::Image)
        })
    });

static STEP_DELTA_DETAILS: LazyLock<UnionTable<RunStepDeltaDetails>> = LazyLock::new(|| {
    UnionTable::new("run_step_delta_details", |b| {
        serde_json::from_slice(b).map(RunStepDeltaDetails::Unknown)
    })
    .variant("message_creation", |b| {
        serde_json::from_slice(b).map(RunStepDeltaDetails::MessageCreation)
    })
    .variant("tool_calls", |b| {
        serde_json::from_slice(b).map(RunStepDeltaDetails::ToolCalls)
    })
});

static STEP_DELTA_TOOL_CALLS: LazyLock<UnionTable<RunStepDeltaToolCall>> = LazyLock::new(|| {
    UnionTable::new("run_step_delta_tool_call", |b| {
        serde_json::from_slice(b).map(RunStepDeltaToolCall::Unknown)
    })
    .variant("code_interpreter", |b| {
        serde_json::from_slice(b).map(RunStepDeltaToolCall::CodeInterpreter)
    })
    .variant("file_search", |b| {
        serde_json::from_slice(b).map(RunStepDeltaToolCall::FileSearch)
    })
    .variant("function", |b| {
        serde_json::from_slice(b).map(RunStepDeltaToolCall::Function)
    })
});

union_deserialize!(RunStepDetails => STEP_DETAILS);
union_deserialize!(RunStepToolCall => STEP_TOOL_CALLS);
union_deserialize!(CodeInterpreterOutput => CODE_INTERPRETER_OUTPUTS);
union_deserialize!(RunStepDeltaDetails => STEP_DELTA_DETAILS);
union_deserialize!(RunStepDeltaToolCall => STEP_DELTA_TOOL_CALLS);
