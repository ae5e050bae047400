//! Errors raised while setting the engine up.
//!
//! Only construction and device plumbing can fail. Once a stream is running,
//! the render path absorbs bad input by clamping or ignoring it and has no
//! error type of its own.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no output device available")]
    NoOutputDevice,

    #[error("output device '{0}' not found")]
    DeviceNotFound(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    #[error("invalid MIDI note number {0} (expected 0-127)")]
    InvalidNote(u8),

    #[error("failed to read config '{}': {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] serde_json::Error),

    #[error("unknown scale: {0}")]
    UnknownScale(String),

    #[cfg(not(target_arch = "wasm32"))]
    #[error(transparent)]
    Devices(#[from] cpal::DevicesError),

    #[cfg(not(target_arch = "wasm32"))]
    #[error(transparent)]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[cfg(not(target_arch = "wasm32"))]
    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(not(target_arch = "wasm32"))]
    #[error(transparent)]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(not(target_arch = "wasm32"))]
    #[error(transparent)]
    PauseStream(#[from] cpal::PauseStreamError),

    #[cfg(not(target_arch = "wasm32"))]
    #[error("MIDI error: {0}")]
    Midi(String),
}

impl EngineError {
    pub fn read_config(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::ReadConfig {
            path: path.into(),
            source,
        }
    }
}
