//! Thread messages and their incremental deltas.

use std::sync::LazyLock;

use runwire_stream::UnionTable;
use serde::Deserialize;
use serde_json::Value;

use super::{ImageFileRef, IncompleteDetails, Metadata, UnknownVariant};

/// A message on a thread.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ThreadMessage {
    /// Message identifier.
    pub id: String,
    /// Always `"thread.message"`.
    #[serde(default)]
    pub object: String,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub created_at: i64,
    /// Owning thread.
    pub thread_id: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: MessageStatus,
    /// Author role.
    pub role: MessageRole,
    /// Content parts, each resolved by its own `"type"`.
    #[serde(default)]
    pub content: Vec<MessageContent>,
    /// Assistant that authored the message.
    #[serde(default)]
    pub assistant_id: Option<String>,
    /// Run that produced the message.
    #[serde(default)]
    pub run_id: Option<String>,
    /// Files attached to the message, kept opaque.
    #[serde(default)]
    pub attachments: Vec<Value>,
    /// Why the message ended incomplete.
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub completed_at: Option<i64>,
    /// Unix timestamp (seconds).
    #[serde(default)]
    pub incomplete_at: Option<i64>,
    /// Attached metadata.
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl ThreadMessage {
    /// Concatenated text of all `text` parts.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                MessageContent::Text(t) => Some(t.text.value.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Message lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Being written.
    InProgress,
    /// Stopped early.
    Incomplete,
    /// Finished.
    Completed,
    /// A status this crate does not know yet.
    #[default]
    #[serde(other)]
    Unknown,
}

/// Message author role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// End user.
    User,
    /// Assistant.
    Assistant,
    /// A role this crate does not know yet.
    #[serde(other)]
    Unknown,
}

// ─────────────────────────────────────────────────────────────────────────────
// Content
// ─────────────────────────────────────────────────────────────────────────────

/// One content part, resolved by `"type"`.
#[derive(Clone, Debug, PartialEq)]
pub enum MessageContent {
    /// `text`
    Text(MessageTextContent),
    /// `image_file`
    ImageFile(MessageImageFileContent),
    /// Unrecognized content type.
    Unknown(UnknownVariant),
}

/// Body of a `text` part.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MessageTextContent {
    /// Text and annotations.
    pub text: MessageText,
}

/// Text with annotations.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MessageText {
    /// The text.
    pub value: String,
    /// Annotations, each resolved by its own `"type"`.
    #[serde(default)]
    pub annotations: Vec<MessageTextAnnotation>,
}

/// Body of an `image_file` part.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MessageImageFileContent {
    /// The image.
    pub image_file: ImageFileRef,
}

/// Text annotation, resolved by `"type"`.
///
/// Shared by full messages and deltas; `index` is only set in deltas, and
/// every field is optional because deltas may carry any subset.
#[derive(Clone, Debug, PartialEq)]
pub enum MessageTextAnnotation {
    /// `file_citation`
    FileCitation(FileCitationAnnotation),
    /// `file_path`
    FilePath(FilePathAnnotation),
    /// Unrecognized annotation type.
    Unknown(UnknownVariant),
}

/// Citation of a file used to produce the text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FileCitationAnnotation {
    /// Position within a delta's annotation array.
    #[serde(default)]
    pub index: Option<u32>,
    /// Text being replaced by the citation.
    #[serde(default)]
    pub text: Option<String>,
    /// Cited file.
    #[serde(default)]
    pub file_citation: Option<FileCitation>,
    /// Start offset in the text.
    #[serde(default)]
    pub start_index: Option<u32>,
    /// End offset in the text.
    #[serde(default)]
    pub end_index: Option<u32>,
}

/// Cited file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FileCitation {
    /// File identifier.
    #[serde(default)]
    pub file_id: Option<String>,
    /// Quoted passage.
    #[serde(default)]
    pub quote: Option<String>,
}

/// Path of a file generated while producing the text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FilePathAnnotation {
    /// Position within a delta's annotation array.
    #[serde(default)]
    pub index: Option<u32>,
    /// Text being replaced by the path.
    #[serde(default)]
    pub text: Option<String>,
    /// Generated file.
    #[serde(default)]
    pub file_path: Option<FilePathRef>,
    /// Start offset in the text.
    #[serde(default)]
    pub start_index: Option<u32>,
    /// End offset in the text.
    #[serde(default)]
    pub end_index: Option<u32>,
}

/// Generated file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FilePathRef {
    /// File identifier.
    #[serde(default)]
    pub file_id: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Deltas
// ─────────────────────────────────────────────────────────────────────────────

/// Payload of `thread.message.delta`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MessageDeltaChunk {
    /// Message the delta applies to.
    pub id: String,
    /// Always `"thread.message.delta"`.
    #[serde(default)]
    pub object: String,
    /// Changed fields.
    pub delta: MessageDelta,
}

impl MessageDeltaChunk {
    /// Concatenated text fragments in this delta.
    pub fn text(&self) -> String {
        self.delta
            .content
            .iter()
            .filter_map(|part| match part {
                MessageDeltaContent::Text(t) => t.text.as_ref()?.value.as_deref(),
                _ => None,
            })
            .collect()
    }
}

/// Changed fields of a message.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MessageDelta {
    /// Author role, sent with the first delta.
    #[serde(default)]
    pub role: Option<MessageRole>,
    /// Changed content parts, each resolved by its own `"type"`.
    #[serde(default)]
    pub content: Vec<MessageDeltaContent>,
}

/// Changed content part, resolved by `"type"`.
#[derive(Clone, Debug, PartialEq)]
pub enum MessageDeltaContent {
    /// `text`
    Text(MessageDeltaTextContent),
    /// `image_file`
    ImageFile(MessageDeltaImageFile),
    /// Unrecognized content type.
    Unknown(UnknownVariant),
}

impl MessageDeltaContent {
    /// Position within the message's content array.
    pub fn index(&self) -> Option<u32> {
        match self {
            Self::Text(part) => Some(part.index),
            Self::ImageFile(part) => Some(part.index),
            Self::Unknown(unknown) => unknown.index,
        }
    }
}

/// Partial `text` part.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MessageDeltaTextContent {
    /// Position within the message's content array.
    pub index: u32,
    /// Changed text.
    #[serde(default)]
    pub text: Option<MessageDeltaText>,
}

/// Text fragment with new annotations.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MessageDeltaText {
    /// Next fragment of the text.
    #[serde(default)]
    pub value: Option<String>,
    /// New annotations, each resolved by its own `"type"`.
    #[serde(default)]
    pub annotations: Vec<MessageTextAnnotation>,
}

/// Partial `image_file` part.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MessageDeltaImageFile {
    /// Position within the message's content array.
    pub index: u32,
    /// The image.
    #[serde(default)]
    pub image_file: Option<ImageFileRef>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tables
// ─────────────────────────────────────────────────────────────────────────────

static CONTENT: LazyLock<UnionTable<MessageContent>> = LazyLock::new(|| {
    UnionTable::new("message_content", |b| {
        serde_json::from_slice(b).map(MessageContent::Unknown)
    })
    .variant("text", |b| serde_json::from_slice(b).map(MessageContent::Text))
    .variant("image_file", |b| {
        serde_json::from_slice(b).map(MessageContent::ImageFile)
    })
});

static ANNOTATIONS: LazyLock<UnionTable<MessageTextAnnotation>> = LazyLock::new(|| {
    UnionTable::new("message_text_annotation", |b| {
        serde_json::from_slice(b).map(MessageTextAnnotation::Unknown)
    })
    .variant("file_citation", |b| {
        serde_json::from_slice(b).map(MessageTextAnnotation::FileCitation)
    })
    .variant("file_path", |b| {
        serde_json::from_slice(b).map(MessageTextAnnotation::FilePath)
    })
});

static DELTA_CONTENT: LazyLock<UnionTable<MessageDeltaContent>> = LazyLock::new(|| {
    UnionTable::new("message_delta_content", |b| {
        serde_json::from_slice(b).map(MessageDeltaContent::Unknown)
    })
    .variant("text", |b| {
        serde_json::from_slice(b).map(MessageDeltaContent::Text)
    })
    .variant("image_file", |b| {
        serde_json::from_slice(b).map(MessageDeltaContent::ImageFile)
    })
});

union_deserialize!(MessageContent => CONTENT);
union_deserialize!(MessageTextAnnotation => ANNOTATIONS);
union_deserialize!(MessageDeltaContent => DELTA_CONTENT);

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn content_parts_resolve_independently() {
        let json = r#"{"id":"msg_1","thread_id":"thread_1","status":"completed","role":"assistant","content":[
            {"type":"text","text":{"value":"See ","annotations":[
                {"type":"file_citation","text":"[1]","file_citation":{"file_id":"file_1"},"start_index":4,"end_index":7},
                {"type":"url_citation","url":"https://example.com"}
            ]}},
            {"type":"audio","audio":{"id":"a1"}},
            {"type":"image_file","image_file":{"file_id":"file_2"}},
            {"type":"text","text":{"value":"the chart."}}
        ]}"#;
        let message: ThreadMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.status, MessageStatus::Completed);
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.content.len(), 4);
        assert_matches!(&message.content[1], MessageContent::Unknown(u) if u.kind.as_deref() == Some("audio"));
        assert_matches!(&message.content[2], MessageContent::ImageFile(i) if i.image_file.file_id.as_deref() == Some("file_2"));
        assert_eq!(message.text(), "See the chart.");

        let MessageContent::Text(first) = &message.content[0] else {
            panic!("expected text part");
        };
        assert_matches!(&first.text.annotations[0], MessageTextAnnotation::FileCitation(c) if c.end_index == Some(7));
        assert_matches!(&first.text.annotations[1], MessageTextAnnotation::Unknown(_));
    }

    #[test]
    fn missing_status_is_unknown() {
        let json = r#"{"id":"msg_1","thread_id":"thread_1","role":"user"}"#;
        let message: ThreadMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.status, MessageStatus::Unknown);
        assert!(message.content.is_empty());
    }

    #[test]
    fn known_content_with_bad_body_fails() {
        let json = r#"{"id":"msg_1","thread_id":"thread_1","role":"user","content":[{"type":"text","text":7}]}"#;
        assert!(serde_json::from_str::<ThreadMessage>(json).is_err());
    }

    #[test]
    fn delta_text_fragments() {
        let json = r#"{"id":"msg_1","object":"thread.message.delta","delta":{"content":[
            {"index":0,"type":"text","text":{"value":"Hel"}},
            {"index":1,"type":"refusal","refusal":"no"},
            {"index":2,"type":"text","text":{"value":"lo","annotations":[{"index":0,"type":"file_path","file_path":{"file_id":"f"}}]}}
        ]}}"#;
        let chunk: MessageDeltaChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.text(), "Hello");
        let indices: Vec<_> = chunk.delta.content.iter().map(MessageDeltaContent::index).collect();
        assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);
        let MessageDeltaContent::Text(last) = &chunk.delta.content[2] else {
            panic!("expected text delta");
        };
        assert_matches!(
            &last.text.as_ref().unwrap().annotations[0],
            MessageTextAnnotation::FilePath(p) if p.index == Some(0)
        );
    }
}
