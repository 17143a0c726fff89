//! Error types for signallock

use std::path::PathBuf;
use thiserror::Error;

/// Rejected configuration values
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Audio asset loading and buffer setup errors
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Audio asset {0} contains no frames")]
    Empty(PathBuf),

    #[error("Audio buffer has no frames")]
    NoFrames,

    #[error("Audio buffer has zero channels")]
    NoChannels,

    #[error("Sample count {samples} is not a multiple of {channels} channels")]
    Shape { samples: usize, channels: u16 },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Malformed inbound bus payloads
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Payload is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Malformed sensor reading {0:?}")]
    Reading(String),

    #[error("Sensor value {value} exceeds full scale {full_scale}")]
    OutOfRange { value: u32, full_scale: u32 },

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Message bus errors
#[derive(Error, Debug)]
pub enum BusError {
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("Status encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Output device and stream errors
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Failed to build audio stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("Failed to start audio stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}
