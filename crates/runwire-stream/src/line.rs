//! Line grammar for `text/event-stream` bodies.
//!
//! ```text
//! : comment            ignored
//! <blank>              ignored
//! event: <name>        sets the pending event name
//! data: <json>         completes a record, or ends the stream if <json> is [DONE]
//! <other>: <value>     protocol error
//! ```
//!
//! Both the field name and the value are trimmed after splitting on the first
//! `:`. This accepts `data:{..}` and `data:   {..}` alike, which is looser than
//! stripping a single leading space from the value, and is kept on purpose.

/// Payload value that marks a clean end of stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One classified line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Line<'a> {
    /// Empty or whitespace-only line.
    Blank,
    /// Line starting with `:`.
    Comment,
    /// `name: value`, both trimmed. A line without a colon has an empty value.
    Field {
        /// Field name.
        name: &'a str,
        /// Field value.
        value: &'a str,
    },
}

/// Classify a single line (without its line terminator).
pub fn parse_line(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if line.starts_with(':') {
        return Line::Comment;
    }
    match line.split_once(':') {
        Some((name, value)) => Line::Field {
            name: name.trim(),
            value: value.trim(),
        },
        None => Line::Field {
            name: line.trim(),
            value: "",
        },
    }
}
