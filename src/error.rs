//! Error types for gridfill
//!
//! - Parse errors are per record and never abort a store
//! - Source errors drive the artwork fallback chain
//! - Artwork errors are fatal for one record, not the run
//! - Library and config errors belong to the outer CLI layer

use std::fmt;
use std::path::PathBuf;

/// Why a record slice could not be turned into a shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    MissingExe,
    MissingStartDir,
    EmptyExe,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingExe => f.write_str("no Exe field"),
            Self::MissingStartDir => f.write_str("no StartDir field after Exe"),
            Self::EmptyExe => f.write_str("empty Exe value"),
        }
    }
}

/// Errors while recovering records from a shortcuts store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Record slice is missing a required marker
    #[error("malformed shortcut record #{index} at byte {offset}: {reason}")]
    MalformedRecord {
        index: usize,
        offset: usize,
        reason: MalformedReason,
    },
}

/// Errors from an artwork lookup service
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Service answered but had nothing usable
    #[error("no match: {0}")]
    LookupMiss(String),

    /// Request could not be completed
    #[error("transport failure: {0}")]
    Transport(String),

    /// Response arrived but could not be understood
    #[error("unreadable response: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn miss(what: impl Into<String>) -> Self {
        Self::LookupMiss(what.into())
    }

    /// Transport and decode failures are handled the same way
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Decode(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Errors while producing the image for one record
#[derive(Debug, thiserror::Error)]
pub enum ArtworkError {
    /// Destination could not be created or written
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cover could not be decoded or the result encoded
    #[error("could not compose grid image: {0}")]
    Compose(#[from] image::ImageError),

    /// Task was already terminal, or the target state is not
    #[error("invalid state transition for app {app_id}")]
    InvalidTransition { app_id: u64 },

    /// Composition worker panicked or was cancelled
    #[error("composition worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ArtworkError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// Errors locating the Steam installation and its user data
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("could not find a Steam installation (tried: {tried})")]
    SteamRootNotFound { tried: String },

    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LibraryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors reading configuration from the environment
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} is invalid: {message}")]
    Invalid { name: &'static str, message: String },
}
