//! Discriminator tables.
//!
//! Two lookup behaviours, kept as separate types:
//!
//! - [`EventTable`] is keyed by the record's event name, which travels outside
//!   the JSON. A miss is an error ([`StreamError::UnhandledEventKind`]).
//! - [`UnionTable`] is keyed by the `"type"` field inside a JSON object that
//!   sits in an array nested in some payload. A miss decodes the element into
//!   the table's fallback (base) shape instead of failing, so payloads can grow
//!   new element kinds without breaking older decoders.
//!
//! Tables are meant to be built once (in a `LazyLock`) and never mutated.

use std::collections::HashMap;

use serde::de::{Deserialize, Deserializer, Error as _};
use serde_json::value::RawValue;
use tracing::trace;

use crate::error::StreamError;

/// Decodes raw JSON bytes into one variant of `T`.
pub type Constructor<T> = fn(&[u8]) -> serde_json::Result<T>;

// ─────────────────────────────────────────────────────────────────────────────
// EventTable
// ─────────────────────────────────────────────────────────────────────────────

/// Strict table from event name to constructor.
///
/// Several names may share one constructor, so a family of lifecycle events
/// (`created`, `in_progress`, `completed`, ..) can decode into one shape.
pub struct EventTable<T: 'static> {
    entries: HashMap<&'static str, Constructor<T>>,
}

impl<T> EventTable<T> {
    /// Empty table.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `names`, all decoding through `ctor`.
    ///
    /// # Panics
    ///
    /// Panics if a name is registered twice. Tables are static, so this is a
    /// programming error caught on first use.
    #[must_use]
    pub fn group(mut self, names: &[&'static str], ctor: Constructor<T>) -> Self {
        for &name in names {
            let previous = self.entries.insert(name, ctor);
            assert!(previous.is_none(), "event name {name:?} registered twice");
        }
        self
    }

    /// Constructor registered for `name`.
    pub fn resolve(&self, name: &str) -> Option<Constructor<T>> {
        self.entries.get(name).copied()
    }

    /// Decode `data` with the constructor registered for `name`.
    pub fn decode(&self, name: &str, data: &[u8]) -> Result<T, StreamError> {
        let ctor = self
            .resolve(name)
            .ok_or_else(|| StreamError::UnhandledEventKind(name.to_owned()))?;
        ctor(data).map_err(|e| StreamError::json(name, e))
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for EventTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// UnionTable
// ─────────────────────────────────────────────────────────────────────────────

/// Lenient table keyed by the embedded `"type"` field.
pub struct UnionTable<T: 'static> {
    name: &'static str,
    entries: HashMap<&'static str, Constructor<T>>,
    fallback: Constructor<T>,
}

/// Reads only the discriminator, skipping everything else.
#[derive(serde::Deserialize)]
struct TypeTag {
    #[serde(rename = "type", default)]
    kind: Option<serde_json::Value>,
}

impl<T> UnionTable<T> {
    /// Table named `name` (used in logs) whose misses decode through `fallback`.
    pub fn new(name: &'static str, fallback: Constructor<T>) -> Self {
        Self {
            name,
            entries: HashMap::new(),
            fallback,
        }
    }

    /// Register the constructor for discriminator value `kind`.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is registered twice.
    #[must_use]
    pub fn variant(mut self, kind: &'static str, ctor: Constructor<T>) -> Self {
        let previous = self.entries.insert(kind, ctor);
        assert!(
            previous.is_none(),
            "{} variant {kind:?} registered twice",
            self.name
        );
        self
    }

    /// Table name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `kind` has a dedicated constructor.
    pub fn contains(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }

    /// Decode one element.
    ///
    /// A missing, non-string or unregistered `"type"` selects the fallback
    /// shape. A registered `"type"` whose body does not fit its shape is an
    /// error.
    pub fn decode(&self, data: &[u8]) -> serde_json::Result<T> {
        let tag: TypeTag = serde_json::from_slice(data)?;
        let kind = tag.kind.as_ref().and_then(serde_json::Value::as_str);
        match kind.and_then(|k| self.entries.get(k)) {
            Some(ctor) => ctor(data),
            None => {
                trace!(union = self.name, kind = ?kind, "unrecognized variant, decoding base shape");
                (self.fallback)(data)
            }
        }
    }
}

/// Deserialize one union element through `table`.
///
/// Meant for hand-written `Deserialize` impls of nested union types. The
/// element is captured as raw JSON first, so this works with
/// `serde_json::from_slice`, `from_str` and `from_reader`, not `from_value`.
pub fn deserialize_union<'de, D, T>(deserializer: D, table: &UnionTable<T>) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Box::<RawValue>::deserialize(deserializer)?;
    table.decode(raw.get().as_bytes()).map_err(D::Error::custom)
}
