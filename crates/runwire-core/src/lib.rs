//! # runwire-core
//!
//! Shared vocabulary for the runwire crates:
//!
//! - **Text**: UTF-8 safe truncation used when payload previews end up in logs
//! - **Logging**: `tracing` subscriber bootstrap and an in-memory capture layer for tests

#![deny(unsafe_code)]

pub mod logging;
pub mod text;
