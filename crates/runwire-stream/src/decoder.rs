//! # Event stream decoder
//!
//! [`EventStream`] owns a response body and turns it into records, one per
//! [`read`](EventStream::read) call:
//!
//! 1. Buffer incoming chunks in a growable [`BytesMut`]; there is no line
//!    length limit, so a single record of any size decodes in one read
//! 2. Split on `\n` (dropping a trailing `\r`) and classify with [`parse_line`]
//! 3. Remember the `event:` name until the next `data:` line
//! 4. Hand the `data:` value and pending name to the [`Dispatch`] impl, or
//!    stop cleanly on `[DONE]`
//!
//! Once a read has produced a clean end or an error, the decoder releases the
//! body and every later read returns that same result.

use bytes::{Bytes, BytesMut};
use futures::Stream;
use runwire_core::text::preview;
use runwire_settings::StreamSettings;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::dispatch::Dispatch;
use crate::error::{BoxError, StreamError};
use crate::line::{DONE_SENTINEL, Line, parse_line};

#[derive(Debug)]
enum State {
    Streaming,
    Done,
    Failed(StreamError),
    Closed,
}

/// Pull-based decoder over one response body.
///
/// Single consumer: `read` takes `&mut self`, so concurrent reads on one
/// instance are ruled out by the borrow checker. Not reusable across bodies.
pub struct EventStream<S, D> {
    body: Option<S>,
    buffer: BytesMut,
    /// Bytes of `buffer` already known to contain no `\n`.
    scanned: usize,
    eof: bool,
    pending_event: Option<String>,
    state: State,
    dispatcher: D,
    preview_bytes: usize,
}

impl<S, E, D> EventStream<S, D>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<BoxError>,
    D: Dispatch,
{
    /// Decoder over `body` with default settings.
    pub fn new(body: S, dispatcher: D) -> Self {
        Self::with_settings(body, dispatcher, &StreamSettings::default())
    }

    /// Decoder over `body` tuned by `settings`.
    pub fn with_settings(body: S, dispatcher: D, settings: &StreamSettings) -> Self {
        Self {
            body: Some(body),
            buffer: BytesMut::with_capacity(settings.initial_buffer_bytes),
            scanned: 0,
            eof: false,
            pending_event: None,
            state: State::Streaming,
            dispatcher,
            preview_bytes: settings.log_preview_bytes,
        }
    }

    /// Read the next record.
    ///
    /// - `Ok(Some(record))`: one decoded record, in wire order
    /// - `Ok(None)`: the `[DONE]` sentinel was seen; the stream is finished
    /// - `Err(e)`: the stream failed; it cannot be resumed
    ///
    /// The only await point is the transport read, so dropping the returned
    /// future loses no buffered data.
    pub async fn read(&mut self) -> Result<Option<D::Output>, StreamError> {
        if let Some(terminal) = self.replay() {
            return terminal;
        }
        match self.advance().await {
            Ok(Some(record)) => Ok(Some(record)),
            Ok(None) => {
                debug!("event stream finished");
                self.state = State::Done;
                self.release();
                Ok(None)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Read the next record, giving up if `cancel` fires first.
    ///
    /// Cancellation is terminal and reported as [`StreamError::Cancelled`].
    /// The token belongs to the caller; the decoder does not keep it.
    pub async fn read_with_cancel(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<D::Output>, StreamError> {
        if let Some(terminal) = self.replay() {
            return terminal;
        }
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = self.read() => Some(result),
        };
        match outcome {
            Some(result) => result,
            None => Err(self.fail(StreamError::Cancelled)),
        }
    }

    /// Release the body.
    ///
    /// Safe to call at any time and any number of times. Reads after a close
    /// return [`StreamError::Closed`], unless the stream had already finished
    /// or failed, in which case they keep returning that result. Closing
    /// cannot fail: dropping the body has no error to report.
    pub fn close(&mut self) {
        if matches!(self.state, State::Streaming) {
            debug!(
                buffered = self.buffer.len(),
                pending_event = ?self.pending_event,
                "event stream closed before completion"
            );
            self.state = State::Closed;
        }
        self.release();
    }

    /// Whether the stream has reached a terminal state (including close).
    pub fn is_terminated(&self) -> bool {
        !matches!(self.state, State::Streaming)
    }

    /// Event name waiting for its `data:` line.
    pub fn pending_event(&self) -> Option<&str> {
        self.pending_event.as_deref()
    }

    /// Adapt the decoder into a [`Stream`].
    ///
    /// The stream ends after the `[DONE]` sentinel, or right after yielding the
    /// first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<D::Output, StreamError>> {
        futures::stream::unfold(Some(self), |decoder| async move {
            let mut decoder = decoder?;
            match decoder.read().await {
                Ok(Some(record)) => Some((Ok(record), Some(decoder))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    fn replay(&self) -> Option<Result<Option<D::Output>, StreamError>> {
        match &self.state {
            State::Streaming => None,
            State::Done => Some(Ok(None)),
            State::Failed(e) => Some(Err(e.clone())),
            State::Closed => Some(Err(StreamError::Closed)),
        }
    }

    fn fail(&mut self, err: StreamError) -> StreamError {
        warn!(
            category = err.category(),
            error = %err,
            pending_event = ?self.pending_event,
            "event stream failed"
        );
        self.state = State::Failed(err.clone());
        self.release();
        err
    }

    fn release(&mut self) {
        self.body = None;
        self.buffer = BytesMut::new();
        self.scanned = 0;
    }

    /// Consume lines until a record completes, the sentinel arrives, or the
    /// body ends.
    async fn advance(&mut self) -> Result<Option<D::Output>, StreamError> {
        loop {
            let Some(raw) = self.next_line().await? else {
                return Err(StreamError::IncompleteStream);
            };
            let line = std::str::from_utf8(&raw)?;

            match parse_line(line) {
                Line::Blank | Line::Comment => {}
                Line::Field {
                    name: "event",
                    value,
                } => {
                    self.pending_event = Some(value.to_owned());
                }
                Line::Field {
                    name: "data",
                    value,
                } => {
                    if value == DONE_SENTINEL {
                        return Ok(None);
                    }
                    let event = self.pending_event.take();
                    trace!(event = ?event, bytes = value.len(), "dispatching record");
                    return self
                        .dispatcher
                        .dispatch(event.as_deref(), value.as_bytes())
                        .map(Some)
                        .inspect_err(|e| {
                            if matches!(e, StreamError::Json { .. }) {
                                warn!(
                                    event = ?event,
                                    data_preview = %preview(value.as_bytes(), self.preview_bytes),
                                    "record payload did not decode"
                                );
                            }
                        });
                }
                Line::Field { name, .. } => {
                    return Err(StreamError::UnexpectedField {
                        field: name.to_owned(),
                    });
                }
            }
        }
    }

    /// Next line without its terminator, or `None` once the body is exhausted.
    ///
    /// A trailing fragment with no `\n` is returned as a final line.
    async fn next_line(&mut self) -> Result<Option<BytesMut>, StreamError> {
        loop {
            if let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
                let end = self.scanned + offset;
                let mut line = self.buffer.split_to(end + 1);
                line.truncate(end);
                strip_cr(&mut line);
                self.scanned = 0;
                return Ok(Some(line));
            }
            self.scanned = self.buffer.len();

            if self.eof {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let mut line = self.buffer.split();
                strip_cr(&mut line);
                self.scanned = 0;
                return Ok(Some(line));
            }

            let Some(body) = self.body.as_mut() else {
                self.eof = true;
                continue;
            };
            match body.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => return Err(StreamError::transport(e)),
                None => {
                    trace!(buffered = self.buffer.len(), "transport reached end of body");
                    self.eof = true;
                }
            }
        }
    }
}

fn strip_cr(line: &mut BytesMut) {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
}
