//! render-diff: render and diff kustomize components affected by a GitOps
//! change (library crate).
//!
//! Re-exports public modules for the binary and integration tests.

pub mod builder;
pub mod config;
pub mod constants;
pub mod detector;
pub mod diff;
pub mod engine;
pub mod env;
pub mod git;
pub mod logging;
pub mod models;
pub mod output;
pub mod progress;
