//! The closed set of assistant-run events.
//!
//! [`EventKind`], [`ALL_EVENT_KINDS`], the wire-name helpers and the strict
//! event-name table are all generated by `define_event_kinds!` from one list,
//! so a wire name cannot be added to one without the others.

use runwire_stream::EventTable;

use crate::types::{
    AssistantThread, MessageDeltaChunk, RunStep, RunStepDeltaChunk, ThreadMessage, ThreadRun,
};

/// Decoded payload, one variant per entity shape.
///
/// Several event kinds share a shape (every `thread.run.*` lifecycle event
/// carries a [`ThreadRun`]).
#[derive(Clone, Debug, PartialEq)]
pub enum EventPayload {
    /// A thread.
    Thread(AssistantThread),
    /// A run snapshot.
    Run(ThreadRun),
    /// A run step snapshot.
    RunStep(RunStep),
    /// Incremental run step change.
    RunStepDelta(RunStepDeltaChunk),
    /// A message snapshot.
    Message(ThreadMessage),
    /// Incremental message change.
    MessageDelta(MessageDeltaChunk),
}

/// One decoded record: the wire event name it arrived under and its payload.
#[derive(Clone, Debug, PartialEq)]
pub struct AssistantEvent {
    /// Wire event name, kept for diagnostics.
    pub kind: EventKind,
    /// Decoded payload.
    pub payload: EventPayload,
}

impl AssistantEvent {
    /// Whether this event blocks the run on caller action.
    ///
    /// Callers typically stop reading, submit tool outputs and open a new
    /// stream when this is true.
    pub fn requires_action(&self) -> bool {
        self.kind == EventKind::RunRequiresAction
    }

    /// The run payload, if this is a `thread.run.*` event.
    pub fn as_run(&self) -> Option<&ThreadRun> {
        match &self.payload {
            EventPayload::Run(run) => Some(run),
            _ => None,
        }
    }
}

macro_rules! define_event_kinds {
    (
        $(
            $(#[doc = $doc:literal])*
            $variant:ident => $wire:literal => $payload:ident($shape:ty)
        ),* $(,)?
    ) => {
        /// Wire event name of an assistant-run record.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum EventKind {
            $(
                $(#[doc = $doc])*
                $variant,
            )*
        }

        /// Every event kind, in declaration order.
        pub const ALL_EVENT_KINDS: &[EventKind] = &[$(EventKind::$variant,)*];

        impl EventKind {
            /// Wire name (e.g. `"thread.run.created"`).
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)*
                }
            }

            /// Kind for a wire name, if it is one this crate decodes.
            pub fn from_wire(name: &str) -> Option<Self> {
                match name {
                    $($wire => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }

        /// Strict table from wire name to payload constructor.
        pub(crate) fn payload_table() -> EventTable<EventPayload> {
            EventTable::new()
                $(
                    .group(&[$wire], |b| {
                        serde_json::from_slice::<$shape>(b).map(EventPayload::$payload)
                    })
                )*
        }
    };
}

define_event_kinds! {
    /// A thread was created.
    ThreadCreated => "thread.created" => Thread(AssistantThread),

    /// A run was created.
    RunCreated => "thread.run.created" => Run(ThreadRun),
    /// A run moved to `queued`.
    RunQueued => "thread.run.queued" => Run(ThreadRun),
    /// A run moved to `in_progress`.
    RunInProgress => "thread.run.in_progress" => Run(ThreadRun),
    /// A run is blocked on caller action.
    RunRequiresAction => "thread.run.requires_action" => Run(ThreadRun),
    /// A run completed.
    RunCompleted => "thread.run.completed" => Run(ThreadRun),
    /// A run ended incomplete.
    RunIncomplete => "thread.run.incomplete" => Run(ThreadRun),
    /// A run failed.
    RunFailed => "thread.run.failed" => Run(ThreadRun),
    /// A run moved to `cancelling`.
    RunCancelling => "thread.run.cancelling" => Run(ThreadRun),
    /// A run was cancelled.
    RunCancelled => "thread.run.cancelled" => Run(ThreadRun),
    /// A run expired.
    RunExpired => "thread.run.expired" => Run(ThreadRun),

    /// A run step was created.
    RunStepCreated => "thread.run.step.created" => RunStep(RunStep),
    /// A run step moved to `in_progress`.
    RunStepInProgress => "thread.run.step.in_progress" => RunStep(RunStep),
    /// Part of a run step changed.
    RunStepDelta => "thread.run.step.delta" => RunStepDelta(RunStepDeltaChunk),
    /// A run step completed.
    RunStepCompleted => "thread.run.step.completed" => RunStep(RunStep),
    /// A run step failed.
    RunStepFailed => "thread.run.step.failed" => RunStep(RunStep),
    /// A run step was cancelled.
    RunStepCancelled => "thread.run.step.cancelled" => RunStep(RunStep),
    /// A run step expired.
    RunStepExpired => "thread.run.step.expired" => RunStep(RunStep),

    /// A message was created.
    MessageCreated => "thread.message.created" => Message(ThreadMessage),
    /// A message moved to `in_progress`.
    MessageInProgress => "thread.message.in_progress" => Message(ThreadMessage),
    /// Part of a message changed.
    MessageDelta => "thread.message.delta" => MessageDelta(MessageDeltaChunk),
    /// A message completed.
    MessageCompleted => "thread.message.completed" => Message(ThreadMessage),
    /// A message ended incomplete.
    MessageIncomplete => "thread.message.incomplete" => Message(ThreadMessage),
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
