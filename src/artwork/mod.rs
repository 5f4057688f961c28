//! Grid artwork resolution
//!
//! This module handles:
//! - Per-shortcut task state (task.rs)
//! - The lookup service seams and their HTTP clients
//! - Synthesizing a grid image from a cover when no grid exists
//! - Driving every shortcut through the fallback chain (pipeline.rs)

pub mod compose;
pub mod griddb;
pub mod igdb;
pub mod pipeline;
pub mod sources;
pub mod task;

#[cfg(test)]
mod http_fixture;
