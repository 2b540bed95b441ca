//! Error types for the preference persistence seam.
//!
//! These errors never reach callers of the registry or the emitter: the
//! toggle store logs them and falls back to in-memory defaults.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a [`crate::store::PreferenceStore`] backend
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("preference file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("preference file {path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("preferences could not be serialized: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("value {value} stored under {key} is not a valid mask")]
    OutOfRange { key: String, value: i64 },

    #[error("preference store unavailable: {0}")]
    Unavailable(String),
}

pub type PreferenceResult<T> = Result<T, PreferenceError>;
