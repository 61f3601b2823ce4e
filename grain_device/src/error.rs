//! Error taxonomy for the device facade.
//!
//! Setup errors ([`PatchLoadError`], [`DependencyLoadError`]) are fatal for
//! the device being built.  [`UnknownParameterError`] is a programmer error.
//! [`OutputError`] means there is no sound card to talk to; callers fall
//! back to a null output.  [`ResumeError`] is transient: the output context stays suspended and the
//! caller may try again.

use std::path::PathBuf;
use thiserror::Error;

/// The patch definition could not be parsed or instantiated.
#[derive(Debug, Error)]
pub enum PatchLoadError {
    #[error("failed to read patch '{path}': {source}")]
    Read {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse patch: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("patch declares parameter '{0}' more than once")]
    DuplicateParameter(String),

    #[error("patch declares buffer '{0}' more than once")]
    DuplicateBuffer(String),

    #[error("parameter '{id}' has an invalid range [{min}, {max}]")]
    InvalidRange { id: String, min: f32, max: f32 },

    #[error("patch is missing required parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("patch is missing required buffer '{0}'")]
    MissingBuffer(&'static str),
}

/// One dependency that did not make it into the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDependency {
    pub id:     String,
    pub reason: String,
}

/// The dependency manifest could not be read, or at least one entry in it
/// failed to resolve.
#[derive(Debug, Error)]
pub enum DependencyLoadError {
    #[error("failed to read dependency manifest '{path}': {source}")]
    Read {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dependency manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{} of {total} dependencies failed to load: {}", failed.len(), summarize(failed))]
    Unresolved {
        total:  usize,
        failed: Vec<FailedDependency>,
    },
}

fn summarize(failed: &[FailedDependency]) -> String {
    failed.iter()
        .map(|f| format!("{} ({})", f.id, f.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Raw audio bytes could not be turned into a playable buffer.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed audio data: {0}")]
    Malformed(#[from] hound::Error),

    #[error("audio data contains no samples")]
    Empty,

    #[error("unknown buffer slot '{0}'")]
    UnknownSlot(String),
}

/// A parameter name the device does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown parameter '{0}'")]
pub struct UnknownParameterError(pub String);

/// No usable audio output could be opened.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to list output devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("no output device matching '{0}'")]
    NoMatch(String),

    #[error("no audio output device found")]
    NoDefault,

    #[error("failed to get audio config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    Stream(#[from] cpal::BuildStreamError),
}

/// The audio output context refused to resume.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("audio output failed to resume: {0}")]
pub struct ResumeError(pub String);
