//! # runwire-settings
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`RunwireSettings::default()`]
//! 2. **User file**: `~/.runwire/settings.json`, deep-merged over defaults
//! 3. **Environment variables**: `RUNWIRE_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

static SETTINGS: OnceLock<RunwireSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// Loaded once on first access. If loading fails the compiled defaults are
/// used and the failure is logged.
pub fn get_settings() -> &'static RunwireSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            RunwireSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Hands the value back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: RunwireSettings) -> std::result::Result<(), RunwireSettings> {
    SETTINGS.set(settings)
}
