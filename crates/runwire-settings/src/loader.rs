//! Settings loading with deep merge and environment variable overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::RunwireSettings;

/// Resolve the path to the settings file (`~/.runwire/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".runwire").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<RunwireSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON or out-of-range values are errors.
pub fn load_settings_from_path(path: &Path) -> Result<RunwireSettings> {
    let defaults = serde_json::to_value(RunwireSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: RunwireSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `RUNWIRE_*` environment overrides. Invalid values are ignored.
pub fn apply_env_overrides(settings: &mut RunwireSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply `RUNWIRE_*` overrides read through `lookup`.
///
/// Empty strings count as unset. Out-of-range or non-numeric sizes are
/// logged at warn and leave the current value in place.
pub fn apply_overrides(settings: &mut RunwireSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("RUNWIRE_LOG_LEVEL").filter(|v| !v.is_empty()) {
        settings.logging.level = v;
    }
    if let Some(v) = read_usize(&lookup, "RUNWIRE_STREAM_BUFFER_BYTES", 1, 64 * 1024 * 1024) {
        settings.stream.initial_buffer_bytes = v;
    }
    if let Some(v) = read_usize(&lookup, "RUNWIRE_LOG_PREVIEW_BYTES", 0, 1024 * 1024) {
        settings.stream.log_preview_bytes = v;
    }
}

/// Parse a string as a `usize` within an inclusive range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

fn read_usize(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    min: usize,
    max: usize,
) -> Option<usize> {
    let val = lookup(name).filter(|v| !v.is_empty())?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}
