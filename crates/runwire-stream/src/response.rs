//! Building an [`EventStream`] from an HTTP response.

use bytes::Bytes;
use futures::StreamExt as _;
use futures::stream::BoxStream;
use runwire_settings::StreamSettings;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::decoder::EventStream;
use crate::dispatch::Dispatch;
use crate::error::StreamError;

/// Body type of streams opened from a [`reqwest::Response`].
pub type ResponseBody = BoxStream<'static, reqwest::Result<Bytes>>;

impl<D: Dispatch> EventStream<ResponseBody, D> {
    /// Take ownership of `response` and decode its body.
    ///
    /// A non-2xx response is read to the end and reported as
    /// [`StreamError::Api`] without producing a stream.
    pub async fn from_response(response: reqwest::Response, dispatcher: D) -> Result<Self, StreamError> {
        Self::from_response_with_settings(response, dispatcher, &StreamSettings::default()).await
    }

    /// [`from_response`](Self::from_response) with explicit settings.
    pub async fn from_response_with_settings(
        response: reqwest::Response,
        dispatcher: D,
        settings: &StreamSettings,
    ) -> Result<Self, StreamError> {
        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(status = status.as_u16(), error = %e, "failed to read error response body");
                    String::new()
                }
            };
            let message = api_error_message(&body);
            error!(status = status.as_u16(), message = %message, "event stream request rejected");
            return Err(StreamError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(
            status = status.as_u16(),
            content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(""),
            "event stream opened"
        );
        let body: ResponseBody = response.bytes_stream().boxed();
        Ok(Self::with_settings(body, dispatcher, settings))
    }
}

/// Extract a human-readable message from an error response body.
///
/// Tries `{"error":{"message":..}}`, then `{"message":..}`, then falls back
/// to the trimmed body.
pub fn api_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = json["error"]["message"].as_str() {
            return msg.to_owned();
        }
        if let Some(msg) = json["message"].as_str() {
            return msg.to_owned();
        }
    }
    body.trim().to_owned()
}
