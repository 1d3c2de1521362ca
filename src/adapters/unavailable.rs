use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::{DeviceIdentifier, DomainError, HotkeyAction};
use crate::ports::{AudioLink, CameraProvider, FrameSource, HotkeySource, InferenceEngine, InferenceSession};

/// Camera provider that never opens anything.
#[derive(Debug, Default)]
pub struct UnavailableCamera;

impl CameraProvider for UnavailableCamera {
    fn open(&self, index: u32) -> Result<Box<dyn FrameSource>, DomainError> {
        Err(DomainError::CameraUnavailable { index })
    }
}

/// Inference engine that cannot load models.
#[derive(Debug, Default)]
pub struct UnavailableInference;

impl InferenceEngine for UnavailableInference {
    fn load(&self, path: &Path) -> Result<Box<dyn InferenceSession>, DomainError> {
        Err(DomainError::ModelLoad(format!(
            "no inference backend in this build ({})",
            path.display()
        )))
    }
}

/// Audio link for platforms without a Bluetooth backend.
pub struct UnsupportedAudioLink {
    tx: broadcast::Sender<bool>,
}

impl Default for UnsupportedAudioLink {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }
}

#[async_trait]
impl AudioLink for UnsupportedAudioLink {
    async fn connect(&self, device_id: &str) -> Result<(), DomainError> {
        let id = DeviceIdentifier::parse(device_id)?;
        Err(DomainError::AudioLink(format!(
            "no Bluetooth audio backend in this build, cannot connect {}",
            id
        )))
    }

    async fn disconnect(&self) -> Result<(), DomainError> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Hotkey source that registers nothing.
pub struct InactiveHotkeys {
    enabled: AtomicBool,
    tx: broadcast::Sender<HotkeyAction>,
}

impl InactiveHotkeys {
    pub fn new(enabled: bool) -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            enabled: AtomicBool::new(enabled),
            tx,
        }
    }
}

impl HotkeySource for InactiveHotkeys {
    fn start(&self) -> Result<(), DomainError> {
        warn!("Global hotkeys are not available in this build");
        Ok(())
    }

    fn stop(&self) {}

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<HotkeyAction> {
        self.tx.subscribe()
    }
}
