//! Maps `(event name, payload)` records to [`AssistantEvent`]s.

use std::sync::LazyLock;

use runwire_core::text::preview;
use runwire_settings::StreamSettings;
use runwire_stream::{Dispatch, EventTable, StreamError};
use tracing::{trace, warn};

use crate::events::{AssistantEvent, EventKind, EventPayload, payload_table};

/// Event name under which the server reports an asynchronous failure.
///
/// Its payload is free-form diagnostic text, not JSON.
pub const SERVER_ERROR_EVENT: &str = "error";

static EVENT_TABLE: LazyLock<EventTable<EventPayload>> = LazyLock::new(payload_table);

/// Dispatcher for assistant-run streams.
#[derive(Clone, Copy, Debug)]
pub struct AssistantDispatcher {
    preview_bytes: usize,
}

impl AssistantDispatcher {
    /// Dispatcher logging previews of up to `preview_bytes` of server error text.
    pub fn new(preview_bytes: usize) -> Self {
        Self { preview_bytes }
    }

    /// Dispatcher configured from stream settings.
    pub fn from_settings(settings: &StreamSettings) -> Self {
        Self::new(settings.log_preview_bytes)
    }
}

impl Default for AssistantDispatcher {
    fn default() -> Self {
        Self::from_settings(&StreamSettings::default())
    }
}

impl Dispatch for AssistantDispatcher {
    type Output = AssistantEvent;

    fn dispatch(&self, event: Option<&str>, data: &[u8]) -> Result<AssistantEvent, StreamError> {
        let name = event.unwrap_or_default();
        if name == SERVER_ERROR_EVENT {
            warn!(
                data_preview = %preview(data, self.preview_bytes),
                "server reported an error on the event stream"
            );
            let text = String::from_utf8_lossy(data).trim().to_owned();
            return Err(StreamError::ServerReported(text));
        }

        let payload = EVENT_TABLE.decode(name, data)?;
        let kind = EventKind::from_wire(name)
            .ok_or_else(|| StreamError::UnhandledEventKind(name.to_owned()))?;
        trace!(event = %kind, "decoded assistant event");
        Ok(AssistantEvent { kind, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn dispatch(event: Option<&str>, data: &serde_json::Value) -> Result<AssistantEvent, StreamError> {
        AssistantDispatcher::default().dispatch(event, data.to_string().as_bytes())
    }

    fn run(status: &str) -> serde_json::Value {
        json!({"id": "run_1", "thread_id": "thread_1", "status": status})
    }

    #[test]
    fn lifecycle_names_share_the_run_shape() {
        for (name, status) in [
            ("thread.run.created", "queued"),
            ("thread.run.in_progress", "in_progress"),
            ("thread.run.completed", "completed"),
            ("thread.run.expired", "expired"),
        ] {
            let event = dispatch(Some(name), &run(status)).unwrap();
            assert_eq!(event.kind.as_str(), name);
            assert_matches!(event.payload, EventPayload::Run(_));
        }
    }

    #[test]
    fn requires_action_is_flagged() {
        let event = dispatch(Some("thread.run.requires_action"), &run("requires_action")).unwrap();
        assert!(event.requires_action());
        assert!(event.as_run().is_some());

        let other = dispatch(Some("thread.run.queued"), &run("queued")).unwrap();
        assert!(!other.requires_action());
    }

    #[test]
    fn unknown_name_is_unhandled() {
        let err = dispatch(Some("thread.run.paused"), &run("queued")).unwrap_err();
        assert_matches!(err, StreamError::UnhandledEventKind(name) if name == "thread.run.paused");
    }

    #[test]
    fn missing_name_is_unhandled_empty() {
        let err = dispatch(None, &json!({})).unwrap_err();
        assert_matches!(err, StreamError::UnhandledEventKind(name) if name.is_empty());
    }

    #[test]
    fn error_event_surfaces_raw_text() {
        let err = AssistantDispatcher::new(16)
            .dispatch(Some("error"), b"  rate_limit_exceeded: slow down \n")
            .unwrap_err();
        assert_matches!(err, StreamError::ServerReported(text) if text == "rate_limit_exceeded: slow down");
    }

    #[test]
    fn error_event_is_not_parsed_as_json() {
        let err = AssistantDispatcher::default()
            .dispatch(Some("error"), br#"{"code":"server_error"}"#)
            .unwrap_err();
        assert_matches!(err, StreamError::ServerReported(text) if text.contains("server_error"));
    }

    #[test]
    fn shape_mismatch_is_json_error() {
        let err = dispatch(Some("thread.message.created"), &json!({"id": "msg_1"})).unwrap_err();
        assert_matches!(err, StreamError::Json { event, .. } if event == "thread.message.created");
    }
}
