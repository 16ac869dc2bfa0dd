//! End-to-end decoding of assistant-run streams.

use std::convert::Infallible;

use assert_matches::assert_matches;
use bytes::Bytes;
use futures::StreamExt;
use runwire_assistants::types::{
    MessageContent, RequiredToolCall, RunStatus, RunStepDetails, RunStepToolCall,
};
use runwire_assistants::{AssistantDispatcher, AssistantStream, EventKind, EventPayload};
use runwire_stream::{EventStream, JsonRecords, StreamError};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Body = futures::stream::Iter<std::vec::IntoIter<Result<Bytes, Infallible>>>;

fn body(wire: &str) -> Body {
    body_chunks(wire, usize::MAX)
}

fn body_chunks(wire: &str, size: usize) -> Body {
    let chunks: Vec<Result<Bytes, Infallible>> = wire
        .as_bytes()
        .chunks(size.max(1))
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    futures::stream::iter(chunks)
}

fn assistant_stream(wire: &str) -> AssistantStream<Body> {
    EventStream::new(body(wire), AssistantDispatcher::default())
}

fn record(event: &str, data: &Value) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

fn run(status: &str) -> Value {
    json!({
        "id": "run_1",
        "object": "thread.run",
        "created_at": 1_700_000_000,
        "thread_id": "thread_1",
        "assistant_id": "asst_1",
        "status": status,
        "model": "gpt-4o",
        "tools": [{"type": "function"}],
    })
}

// ─── Scenarios ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn lone_record_then_eof_is_incomplete() {
    let mut stream = EventStream::new(body("data: {}\n"), JsonRecords::<Value>::new());
    assert_eq!(stream.read().await.unwrap(), Some(json!({})));
    assert_matches!(stream.read().await, Err(StreamError::IncompleteStream));
    assert_matches!(stream.read().await, Err(StreamError::IncompleteStream));
}

#[tokio::test]
async fn unknown_event_name_is_unhandled() {
    let mut stream = assistant_stream("event: foo\ndata: {\"a\":1}\n");
    assert_matches!(
        stream.read().await,
        Err(StreamError::UnhandledEventKind(name)) if name == "foo"
    );
    assert_matches!(
        stream.read().await,
        Err(StreamError::UnhandledEventKind(name)) if name == "foo"
    );
}

#[tokio::test]
async fn space_after_colon_does_not_matter() {
    let payload = run("queued").to_string();
    let wire = format!(
        "event: thread.run.queued\ndata: {payload}\n\nevent:thread.run.queued\ndata:{payload}\n\ndata: [DONE]\n"
    );
    let mut stream = assistant_stream(&wire);
    let first = stream.read().await.unwrap().unwrap();
    let second = stream.read().await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_matches!(stream.read().await, Ok(None));
}

#[tokio::test]
async fn server_error_event_is_an_error() {
    let wire = format!(
        "{}event: error\ndata: rate_limit_exceeded\n\ndata: [DONE]\n",
        record("thread.run.created", &run("queued"))
    );
    let mut stream = assistant_stream(&wire);
    assert!(stream.read().await.unwrap().is_some());
    let err = stream.read().await.unwrap_err();
    assert!(err.to_string().contains("rate_limit_exceeded"));
    assert_matches!(stream.read().await, Err(StreamError::ServerReported(_)));
}

// ─── Ordering and grouping ──────────────────────────────────────────────────

#[tokio::test]
async fn full_run_decodes_in_wire_order() {
    let thread = json!({"id": "thread_1", "object": "thread", "created_at": 1, "metadata": {}});
    let step = json!({
        "id": "step_1", "run_id": "run_1", "thread_id": "thread_1", "type": "message_creation",
        "status": "in_progress",
        "step_details": {"type": "message_creation", "message_creation": {"message_id": "msg_1"}},
    });
    let message = json!({
        "id": "msg_1", "thread_id": "thread_1", "role": "assistant", "status": "in_progress",
        "content": [],
    });
    let delta = json!({
        "id": "msg_1", "object": "thread.message.delta",
        "delta": {"content": [{"index": 0, "type": "text", "text": {"value": "Hi"}}]},
    });
    let mut completed = message.clone();
    completed["status"] = json!("completed");
    completed["content"] = json!([{"type": "text", "text": {"value": "Hi", "annotations": []}}]);

    let mut wire = String::from(": stream opened\n\n");
    wire.push_str(&record("thread.created", &thread));
    wire.push_str(&record("thread.run.created", &run("queued")));
    wire.push_str(&record("thread.run.in_progress", &run("in_progress")));
    wire.push_str(&record("thread.run.step.created", &step));
    wire.push_str(&record("thread.message.created", &message));
    wire.push_str(&record("thread.message.delta", &delta));
    wire.push_str(&record("thread.message.completed", &completed));
    wire.push_str(&record("thread.run.completed", &run("completed")));
    wire.push_str("event: done\ndata: [DONE]\n\n");

    let events: Vec<_> = assistant_stream(&wire)
        .into_stream()
        .map(Result::unwrap)
        .collect()
        .await;
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::ThreadCreated,
            EventKind::RunCreated,
            EventKind::RunInProgress,
            EventKind::RunStepCreated,
            EventKind::MessageCreated,
            EventKind::MessageDelta,
            EventKind::MessageCompleted,
            EventKind::RunCompleted,
        ]
    );
    assert_matches!(&events[7].payload, EventPayload::Run(r) if r.status == RunStatus::Completed);
    assert_matches!(&events[5].payload, EventPayload::MessageDelta(d) if d.text() == "Hi");
    assert_matches!(&events[6].payload, EventPayload::Message(m) if m.text() == "Hi");
}

#[tokio::test]
async fn every_kind_round_trips_through_the_wire() {
    let shape = |kind: EventKind| -> Value {
        let name = kind.as_str();
        if name == "thread.created" {
            json!({"id": "thread_1"})
        } else if name.ends_with(".delta") {
            json!({"id": "x_1", "delta": {}})
        } else if name.starts_with("thread.run.step.") {
            json!({
                "id": "step_1", "run_id": "run_1", "status": "completed",
                "step_details": {"type": "tool_calls", "tool_calls": []},
            })
        } else if name.starts_with("thread.run.") {
            run("completed")
        } else {
            json!({"id": "msg_1", "thread_id": "thread_1", "role": "user"})
        }
    };

    for &kind in runwire_assistants::ALL_EVENT_KINDS {
        let wire = format!("{}data: [DONE]\n", record(kind.as_str(), &shape(kind)));
        let mut stream = assistant_stream(&wire);
        let event = stream.read().await.unwrap().unwrap();
        assert_eq!(event.kind, kind);
        let shape_matches = match &event.payload {
            EventPayload::Thread(_) => kind == EventKind::ThreadCreated,
            EventPayload::Run(_) => kind.as_str().starts_with("thread.run.") && !kind.as_str().starts_with("thread.run.step."),
            EventPayload::RunStep(_) => kind.as_str().starts_with("thread.run.step.") && kind != EventKind::RunStepDelta,
            EventPayload::RunStepDelta(_) => kind == EventKind::RunStepDelta,
            EventPayload::Message(_) => kind.as_str().starts_with("thread.message.") && kind != EventKind::MessageDelta,
            EventPayload::MessageDelta(_) => kind == EventKind::MessageDelta,
        };
        assert!(shape_matches, "{kind} decoded into {:?}", event.payload);
        assert_matches!(stream.read().await, Ok(None));
    }
}

// ─── Nested unions ──────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_nested_types_degrade_beside_known_siblings() {
    let step = json!({
        "id": "step_1", "run_id": "run_1", "type": "tool_calls", "status": "completed",
        "step_details": {"type": "tool_calls", "tool_calls": [
            {"id": "c1", "type": "code_interpreter", "code_interpreter": {"input": "1+1", "outputs": [
                {"type": "logs", "logs": "2"},
                {"type": "hologram", "frames": 3},
            ]}},
            {"id": "c2", "type": "computer_use", "action": "click"},
            {"id": "c3", "type": "function", "function": {"name": "f", "arguments": "{}"}},
        ]},
    });
    let message = json!({
        "id": "msg_1", "thread_id": "thread_1", "role": "assistant",
        "content": [{"type": "video", "url": "v"}, {"type": "text", "text": {"value": "ok"}}],
    });
    let wire = format!(
        "{}{}data: [DONE]\n",
        record("thread.run.step.completed", &step),
        record("thread.message.completed", &message)
    );
    let mut stream = assistant_stream(&wire);

    let step_event = stream.read().await.unwrap().unwrap();
    let EventPayload::RunStep(step) = step_event.payload else {
        panic!("expected a run step");
    };
    let RunStepDetails::ToolCalls(details) = step.step_details else {
        panic!("expected tool call details");
    };
    assert_matches!(&details.tool_calls[1], RunStepToolCall::Unknown(u) if u.kind.as_deref() == Some("computer_use"));
    assert_matches!(&details.tool_calls[2], RunStepToolCall::Function(_));
    let RunStepToolCall::CodeInterpreter(ci) = &details.tool_calls[0] else {
        panic!("expected code interpreter call");
    };
    assert_eq!(ci.code_interpreter.outputs.len(), 2);

    let message_event = stream.read().await.unwrap().unwrap();
    let EventPayload::Message(message) = message_event.payload else {
        panic!("expected a message");
    };
    assert_matches!(&message.content[0], MessageContent::Unknown(_));
    assert_matches!(&message.content[1], MessageContent::Text(_));
    assert_matches!(stream.read().await, Ok(None));
}

#[tokio::test]
async fn requires_action_lets_caller_stop_early() {
    let mut blocked = run("requires_action");
    blocked["required_action"] = json!({
        "type": "submit_tool_outputs",
        "submit_tool_outputs": {"tool_calls": [
            {"id": "call_1", "type": "function", "function": {"name": "weather", "arguments": "{}"}},
        ]},
    });
    let wire = format!(
        "{}{}{}",
        record("thread.run.in_progress", &run("in_progress")),
        record("thread.run.requires_action", &blocked),
        record("thread.run.completed", &run("completed")),
    );
    let mut stream = assistant_stream(&wire);

    let mut pending = Vec::new();
    while let Some(event) = stream.read().await.unwrap() {
        if event.requires_action() {
            pending.extend(event.as_run().unwrap().pending_tool_calls().iter().cloned());
            stream.close();
            break;
        }
    }
    stream.close();
    assert_matches!(pending.as_slice(), [RequiredToolCall::Function(call)] if call.id == "call_1");
    assert_matches!(stream.read().await, Err(StreamError::Closed));
}

// ─── Framing edge cases ─────────────────────────────────────────────────────

#[tokio::test]
async fn message_over_64k_in_one_read() {
    let value = "lorem ipsum ".repeat(8 * 1024);
    let message = json!({
        "id": "msg_1", "thread_id": "thread_1", "role": "assistant",
        "content": [{"type": "text", "text": {"value": value}}],
    });
    let wire = format!("{}data: [DONE]\n", record("thread.message.completed", &message));
    assert!(wire.len() > 64 * 1024);

    let mut stream = EventStream::new(body_chunks(&wire, 4096), AssistantDispatcher::default());
    let event = stream.read().await.unwrap().unwrap();
    assert_matches!(event.payload, EventPayload::Message(m) if m.text().len() == value.len());
    assert_matches!(stream.read().await, Ok(None));
}

#[tokio::test]
async fn cancellation_surfaces_as_error() {
    let cancel = CancellationToken::new();
    let mut stream: AssistantStream<_> = EventStream::new(
        futures::stream::pending::<Result<Bytes, Infallible>>(),
        AssistantDispatcher::default(),
    );
    cancel.cancel();
    assert_matches!(stream.read_with_cancel(&cancel).await, Err(StreamError::Cancelled));
}

#[tokio::test]
async fn stray_field_is_a_protocol_error() {
    let mut stream = assistant_stream("id: 7\nevent: thread.run.created\n");
    assert_matches!(
        stream.read().await,
        Err(StreamError::UnexpectedField { field }) if field == "id"
    );
}

// ─── HTTP ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn decodes_events_from_http_response() {
    runwire_assistants::init_logging();
    let server = MockServer::start().await;
    let wire = format!(
        "{}{}event: done\ndata: [DONE]\n\n",
        record("thread.run.created", &run("queued")),
        record("thread.run.completed", &run("completed")),
    );
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/runs"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(wire),
        )
        .mount(&server)
        .await;

    let response = reqwest::Client::new()
        .post(format!("{}/threads/thread_1/runs", server.uri()))
        .json(&json!({"assistant_id": "asst_1", "stream": true}))
        .send()
        .await
        .unwrap();
    let mut stream = runwire_assistants::from_response(response).await.unwrap();

    let kinds = [
        stream.read().await.unwrap().map(|e| e.kind),
        stream.read().await.unwrap().map(|e| e.kind),
        stream.read().await.unwrap().map(|e| e.kind),
    ];
    assert_eq!(kinds, [Some(EventKind::RunCreated), Some(EventKind::RunCompleted), None]);
}

#[tokio::test]
async fn rejected_request_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"error": {"message": "Rate limit reached", "code": "429"}})),
        )
        .mount(&server)
        .await;

    let response = reqwest::Client::new()
        .post(server.uri())
        .send()
        .await
        .unwrap();
    let err = runwire_assistants::from_response(response).await.err().unwrap();
    assert_matches!(err, StreamError::Api { status: 429, message } if message == "Rate limit reached");
}
