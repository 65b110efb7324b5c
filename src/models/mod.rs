//! Shared types used across all modules.
//!
//! The detector produces [`AffectedComponents`]; the engine turns them into
//! a [`DiffResult`] of [`ComponentDiff`] entries that the output layer
//! reads.

pub mod component;
pub mod diff;

pub use component::{AffectedComponents, ComponentPath, Environment, job_count};
pub use diff::{ComponentDiff, DiffResult, sort_diffs};
