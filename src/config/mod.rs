//! Configuration loading and layering.
//!
//! Handles `.render-diff.toml` loading, environment variable resolution,
//! and CLI flag merging with proper priority ordering.

pub mod loader;

pub use loader::{BuildConfig, ColorMode, Config, ConfigError, OutputConfig, RenderConfig};
