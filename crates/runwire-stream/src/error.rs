//! Stream error taxonomy.
//!
//! Every variant is terminal for the stream that produced it. Errors are
//! `Clone` so a decoder can hand the same terminal result back on every
//! subsequent read; non-`Clone` sources are held behind [`Arc`].

use std::sync::Arc;

/// Boxed error type accepted from transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors surfaced by [`EventStream::read`](crate::EventStream::read).
#[derive(Clone, Debug, thiserror::Error)]
pub enum StreamError {
    /// The transport failed while reading the body.
    #[error("transport error: {0}")]
    Transport(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// The transport closed cleanly before the `[DONE]` sentinel arrived.
    /// Records may have been lost.
    #[error("event stream ended before the [DONE] sentinel")]
    IncompleteStream,

    /// A line used a field other than `event` or `data`.
    #[error("unexpected field {field:?} in event stream")]
    UnexpectedField {
        /// The offending field name, trimmed.
        field: String,
    },

    /// The record's event name is not in the dispatch table.
    #[error("unhandled event kind {0:?}")]
    UnhandledEventKind(String),

    /// The server sent an `error` record. Carries the raw diagnostic text.
    #[error("server reported an error: {0}")]
    ServerReported(String),

    /// The payload did not decode into the shape its discriminator selected.
    #[error("failed to decode {event:?} payload: {source}")]
    Json {
        /// Event name of the record (empty when the record had none).
        event: String,
        /// Underlying parser error.
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// A line was not valid UTF-8.
    #[error("event stream line is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The server rejected the request before streaming began.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// The caller's cancellation token fired during a read.
    #[error("event stream cancelled")]
    Cancelled,

    /// The stream was closed by its owner before reaching a terminal state.
    #[error("event stream closed")]
    Closed,
}

impl StreamError {
    /// Wrap a transport failure.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(Arc::from(err.into()))
    }

    /// Wrap a payload decode failure for the record named `event`.
    pub fn json(event: impl Into<String>, err: serde_json::Error) -> Self {
        Self::Json {
            event: event.into(),
            source: Arc::new(err),
        }
    }

    /// Category string for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::IncompleteStream => "incomplete",
            Self::UnexpectedField { .. } | Self::Utf8(_) => "protocol",
            Self::UnhandledEventKind(_) => "dispatch",
            Self::ServerReported(_) => "server",
            Self::Json { .. } => "parse",
            Self::Api { .. } => "api",
            Self::Cancelled => "cancelled",
            Self::Closed => "closed",
        }
    }
}
