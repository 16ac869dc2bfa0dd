//! # runwire-stream
//!
//! Pull-based decoder for `text/event-stream` response bodies whose records
//! carry JSON payloads.
//!
//! - [`line`]: the line grammar (`event:`, `data:`, comments, the `[DONE]` sentinel)
//! - [`decoder`]: [`EventStream`], which frames lines from an unbounded byte
//!   stream and hands each completed record to a [`Dispatch`] implementation
//! - [`union`]: discriminator tables, strict ([`EventTable`]) for event names
//!   and lenient ([`UnionTable`]) for `"type"` fields embedded in payloads
//! - [`error`]: the terminal error taxonomy shared by all of the above

#![deny(unsafe_code)]

pub mod decoder;
pub mod dispatch;
pub mod error;
pub mod line;
pub mod response;
pub mod union;

pub use decoder::EventStream;
pub use dispatch::{Dispatch, JsonRecords};
pub use error::{BoxError, StreamError, StreamResult};
pub use line::{DONE_SENTINEL, Line, parse_line};
pub use response::{ResponseBody, api_error_message};
pub use union::{Constructor, EventTable, UnionTable, deserialize_union};
