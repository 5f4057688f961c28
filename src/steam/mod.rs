//! Steam installation layout
//!
//! This module handles:
//! - Finding the Steam root directory
//! - Enumerating account directories under `userdata/`
//! - Loading each account's shortcuts store
//! - Computing where grid images belong

pub mod library;
