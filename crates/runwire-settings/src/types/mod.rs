//! Settings type definitions.
//!
//! Field names are camelCase on the wire. Every section implements
//! [`Default`] and is `#[serde(default)]`, so partial JSON is accepted.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunwireSettings {
    /// Stream decoder tuning.
    pub stream: StreamSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl RunwireSettings {
    /// Reject values the decoder cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.stream.initial_buffer_bytes == 0 {
            return Err(SettingsError::InvalidValue(
                "stream.initialBufferBytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Stream decoder tuning.
///
/// There is no maximum record size: a single `data:` line may be arbitrarily
/// large and the line buffer grows to fit it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamSettings {
    /// Initial capacity of the line buffer in bytes.
    pub initial_buffer_bytes: usize,
    /// Maximum payload bytes echoed into warning logs.
    pub log_preview_bytes: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            initial_buffer_bytes: 8192,
            log_preview_bytes: 100,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}
