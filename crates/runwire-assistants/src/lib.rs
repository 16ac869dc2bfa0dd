//! # runwire-assistants
//!
//! Typed decoding of assistant-run event streams.
//!
//! A run streams lifecycle snapshots and incremental deltas for threads,
//! runs, run steps and messages. This crate supplies the closed event union
//! ([`AssistantEvent`]), the strict event-name table behind
//! [`AssistantDispatcher`], and the lenient nested unions in [`types`]; the
//! framing itself lives in `runwire-stream`.
//!
//! ```text
//! let mut stream = runwire_assistants::from_response(response).await?;
//! while let Some(event) = stream.read().await? {
//!     if event.requires_action() {
//!         stream.close();
//!         break;
//!     }
//! }
//! ```

#![deny(unsafe_code)]

pub mod dispatcher;
pub mod events;
pub mod types;

pub use dispatcher::{AssistantDispatcher, SERVER_ERROR_EVENT};
pub use events::{ALL_EVENT_KINDS, AssistantEvent, EventKind, EventPayload};

use bytes::Bytes;
use futures::Stream;
use runwire_stream::{BoxError, EventStream, ResponseBody, StreamError};

/// Decoder yielding [`AssistantEvent`]s from body `S`.
pub type AssistantStream<S = ResponseBody> = EventStream<S, AssistantDispatcher>;

/// Install the stderr log subscriber at the configured level.
///
/// `RUST_LOG` wins when set. Calling this more than once is harmless.
pub fn init_logging() {
    runwire_core::logging::init_subscriber(&runwire_settings::get_settings().logging.level);
}

/// Open an assistant-run stream over an HTTP response, using global settings.
pub async fn from_response(response: reqwest::Response) -> Result<AssistantStream, StreamError> {
    let settings = &runwire_settings::get_settings().stream;
    EventStream::from_response_with_settings(
        response,
        AssistantDispatcher::from_settings(settings),
        settings,
    )
    .await
}

/// Open an assistant-run stream over any byte stream, using global settings.
pub fn from_body<S, E>(body: S) -> AssistantStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<BoxError>,
{
    let settings = &runwire_settings::get_settings().stream;
    EventStream::with_settings(body, AssistantDispatcher::from_settings(settings), settings)
}
