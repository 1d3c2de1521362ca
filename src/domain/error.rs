use serde::Serialize;
use thiserror::Error;

/// Domain-level errors for HoldSense.
#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("No Bluetooth device configured")]
    NoTargetDevice,

    #[error("Invalid device identifier: {0}")]
    InvalidDeviceIdentifier(String),

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Unable to open webcam index {index}")]
    CameraUnavailable { index: u32 },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Auto-detection model is not installed")]
    ModelUnavailable,

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Detection failed: {0}")]
    Inference(String),

    #[error("Unexpected model output shape {shape:?}")]
    OutputShape { shape: Vec<usize> },

    #[error("Audio link error: {0}")]
    AudioLink(String),

    #[error("Audio link did not respond within {secs}s")]
    AudioLinkTimeout { secs: u64 },

    #[error("Hotkey error: {0}")]
    Hotkey(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error classes surfaced to observers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// User must fix something (device, webcam index). Not retried.
    Configuration,
    /// Camera or model could not be acquired. Retried on a fixed interval.
    Resource,
    /// A single frame failed. Counted as "no detection".
    Inference,
    /// Connect/disconnect failed. Re-attempted on the next trigger.
    AudioLink,
    /// Anything caught at a loop or task boundary.
    Internal,
}

impl DomainError {
    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Config(_)
            | DomainError::NoTargetDevice
            | DomainError::InvalidDeviceIdentifier(_)
            | DomainError::Hotkey(_) => ErrorKind::Configuration,
            DomainError::Camera(_)
            | DomainError::CameraUnavailable { .. }
            | DomainError::ModelNotFound(_)
            | DomainError::ModelLoad(_)
            | DomainError::ModelUnavailable
            | DomainError::Io(_) => ErrorKind::Resource,
            DomainError::InvalidFrame(_)
            | DomainError::Inference(_)
            | DomainError::OutputShape { .. } => ErrorKind::Inference,
            DomainError::AudioLink(_) | DomainError::AudioLinkTimeout { .. } => {
                ErrorKind::AudioLink
            }
            DomainError::Serialization(_) | DomainError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DomainError {
    fn from(err: toml::ser::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
