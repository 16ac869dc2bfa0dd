//! Runs and the actions they can require from the caller.

use std::sync::LazyLock;

use runwire_stream::UnionTable;
use serde::Deserialize;
use serde_json::Value;

use super::{FunctionCall, IncompleteDetails, LastError, Metadata, UnknownVariant, Usage};

/// One execution of an assistant on a thread.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ThreadRun {
    /// Run identifier.
    pub id: String,
    /// Always `"thread.run"`.
    #[serde(default)]
    pub object: String,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub created_at: i64,
    /// Owning thread.
    pub thread_id: String,
    /// Assistant executing the run.
    #[serde(default)]
    pub assistant_id: String,
    /// Lifecycle status.
    pub status: RunStatus,
    /// What the caller must do before the run can continue.
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    /// Failure details, when `status` is `failed`.
    #[serde(default)]
    pub last_error: Option<LastError>,
    /// Why the run ended incomplete.
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub started_at: Option<i64>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub cancelled_at: Option<i64>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub failed_at: Option<i64>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub completed_at: Option<i64>,
    /// Model (or deployment) name.
    #[serde(default)]
    pub model: String,
    /// Instructions the run was started with.
    #[serde(default)]
    pub instructions: Option<String>,
    /// Tool definitions, kept opaque.
    #[serde(default)]
    pub tools: Vec<Value>,
    /// Attached metadata.
    #[serde(default)]
    pub metadata: Option<Metadata>,
    /// Token accounting, present once the run is terminal.
    #[serde(default)]
    pub usage: Option<Usage>,
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Nucleus sampling mass.
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Prompt token ceiling.
    #[serde(default)]
    pub max_prompt_tokens: Option<u32>,
    /// Completion token ceiling.
    #[serde(default)]
    pub max_completion_tokens: Option<u32>,
    /// Whether tool calls may run in parallel.
    #[serde(default)]
    pub parallel_tool_calls: Option<bool>,
}

impl ThreadRun {
    /// Function calls awaiting outputs, if the run is blocked on them.
    pub fn pending_tool_calls(&self) -> &[RequiredToolCall] {
        match &self.required_action {
            Some(RequiredAction::SubmitToolOutputs(action)) => {
                &action.submit_tool_outputs.tool_calls
            }
            _ => &[],
        }
    }
}

/// Run lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting to start.
    Queued,
    /// Executing.
    InProgress,
    /// Blocked on the caller (see [`ThreadRun::required_action`]).
    RequiresAction,
    /// Cancellation requested.
    Cancelling,
    /// Cancelled.
    Cancelled,
    /// Failed (see [`ThreadRun::last_error`]).
    Failed,
    /// Finished successfully.
    Completed,
    /// Stopped early (see [`ThreadRun::incomplete_details`]).
    Incomplete,
    /// Timed out.
    Expired,
    /// A status this crate does not know yet.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Failed | Self::Completed | Self::Incomplete | Self::Expired
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Required actions
// ─────────────────────────────────────────────────────────────────────────────

/// Action the caller must take to unblock a run.
#[derive(Clone, Debug, PartialEq)]
pub enum RequiredAction {
    /// `submit_tool_outputs`
    SubmitToolOutputs(SubmitToolOutputsAction),
    /// Unrecognized action type.
    Unknown(UnknownVariant),
}

/// Body of a `submit_tool_outputs` action.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SubmitToolOutputsAction {
    /// Calls that need outputs.
    pub submit_tool_outputs: SubmitToolOutputs,
}

/// Tool calls awaiting outputs.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SubmitToolOutputs {
    /// The calls, each resolved by its own `"type"`.
    #[serde(default)]
    pub tool_calls: Vec<RequiredToolCall>,
}

/// Tool call the caller must answer.
#[derive(Clone, Debug, PartialEq)]
pub enum RequiredToolCall {
    /// `function`
    Function(RequiredFunctionToolCall),
    /// Unrecognized tool type.
    Unknown(UnknownVariant),
}

impl RequiredToolCall {
    /// Call identifier, used when submitting its output.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Function(call) => Some(&call.id),
            Self::Unknown(unknown) => unknown.id.as_deref(),
        }
    }
}

/// Function call the caller must execute.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RequiredFunctionToolCall {
    /// Call identifier.
    pub id: String,
    /// Function and arguments.
    pub function: FunctionCall,
}

static REQUIRED_ACTIONS: LazyLock<UnionTable<RequiredAction>> = LazyLock::new(|| {
    UnionTable::new("required_action", |b| {
        serde_json::from_slice(b).map(RequiredAction::Unknown)
    })
    .variant("submit_tool_outputs", |b| {
        serde_json::from_slice(b).map(RequiredAction::SubmitToolOutputs)
    })
});

static REQUIRED_TOOL_CALLS: LazyLock<UnionTable<RequiredToolCall>> = LazyLock::new(|| {
    UnionTable::new("required_tool_call", |b| {
        serde_json::from_slice(b).map(RequiredToolCall::Unknown)
    })
    .variant("function", |b| {
        serde_json::from_slice(b).map(RequiredToolCall::Function)
    })
});

union_deserialize!(RequiredAction => REQUIRED_ACTIONS);
union_deserialize!(RequiredToolCall => REQUIRED_TOOL_CALLS);
