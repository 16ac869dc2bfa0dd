//! Record dispatch seam between line framing and payload decoding.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::StreamError;

/// Turns one completed record into a caller-facing value.
///
/// `event` is the name from the most recent `event:` line before this
/// record's `data:` line, or `None` if there was none. `data` is the trimmed
/// `data:` value; the `[DONE]` sentinel never reaches a dispatcher.
pub trait Dispatch {
    /// Value produced per record.
    type Output;

    /// Decode one record.
    fn dispatch(&self, event: Option<&str>, data: &[u8]) -> Result<Self::Output, StreamError>;
}

/// Dispatcher for single-shape streams: every record decodes as `T` and the
/// event name is ignored.
pub struct JsonRecords<T> {
    _shape: PhantomData<fn() -> T>,
}

impl<T> JsonRecords<T> {
    /// Dispatcher decoding every record as `T`.
    pub fn new() -> Self {
        Self {
            _shape: PhantomData,
        }
    }
}

impl<T> Default for JsonRecords<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonRecords<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonRecords<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRecords")
            .field("shape", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned> Dispatch for JsonRecords<T> {
    type Output = T;

    fn dispatch(&self, event: Option<&str>, data: &[u8]) -> Result<T, StreamError> {
        serde_json::from_slice(data).map_err(|e| StreamError::json(event.unwrap_or_default(), e))
    }
}
