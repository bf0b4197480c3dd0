//! Error types for tonescope

use crate::pitch::ParseFailure;
use thiserror::Error;

/// Error type for synthesizer operations
#[derive(Error, Debug)]
pub enum Error {
    /// Pitch or frequency text that could not be resolved
    #[error(transparent)]
    Parse(#[from] ParseFailure),

    #[error("audio engine unavailable: {0}")]
    EngineInit(String),

    #[error("audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to enumerate devices")]
    Devices(#[from] cpal::DevicesError),

    #[error("unknown channel {0}")]
    UnknownChannel(usize),

    #[error("invalid value {value} for {name}")]
    InvalidParameter { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;
