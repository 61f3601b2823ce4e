//! Errors raised while starting the sketch or bringing its audio up.

use std::path::PathBuf;

use grain_device::{DecodeError, DependencyLoadError, PatchLoadError};
use thiserror::Error;

/// Building the audio device failed.  The session never exposes a device
/// after one of these; the sketch keeps running and the next gesture retries.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Patch(#[from] PatchLoadError),

    #[error(transparent)]
    Dependencies(#[from] DependencyLoadError),

    #[error("failed to read sample '{path}': {source}")]
    SampleRead {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sample could not be decoded: {0}")]
    Sample(#[from] DecodeError),

    #[error("dependency loader exited without reporting")]
    LoaderLost,
}

/// Fatal application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read config '{path}': {source}")]
    ConfigRead {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("drawing region must have a positive size (got {width}x{height})")]
    InvalidRegion { width: f32, height: f32 },

    #[error("failed to open window: {0}")]
    Window(String),

    #[error(transparent)]
    Patch(#[from] PatchLoadError),

    #[error(transparent)]
    Manifest(#[from] DependencyLoadError),
}
