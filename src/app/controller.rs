use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::{LocalModelStore, TomlConfigStore, YoloDetectorLoader};
use crate::app::detection_runtime::{DetectionRuntime, LoopSettings};
use crate::app::orchestrator::RuntimeOrchestrator;
use crate::domain::config::{AudioLinkConfig, DetectionConfig, HotkeyConfig};
use crate::domain::{AppConfig, DetectorSettings, DomainError};
use crate::infrastructure::init_logging;
use crate::ports::{AudioLink, CameraProvider, ConfigStore, HotkeySource, InferenceEngine};

/// Startup overrides, typically from the command line.
#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    /// Use this directory instead of the OS application data directory.
    pub config_dir: Option<PathBuf>,
    /// Replaces `logging.level` from the config file.
    pub log_level: Option<String>,
    /// Forces file logging off.
    pub disable_file_logging: bool,
}

/// Composition root: owns the config store, the logging guard and the
/// runtime wired to this platform's backends.
pub struct AppController {
    config: AppConfig,
    config_store: Arc<TomlConfigStore>,
    orchestrator: RuntimeOrchestrator,
    _log_guard: Option<WorkerGuard>,
}

impl AppController {
    /// Initialize the application controller.
    /// This sets up configuration, logging and every runtime component.
    pub fn new(options: &ControllerOptions) -> Result<Self, DomainError> {
        // Step 1: Initialize config store
        let config_store = Arc::new(match &options.config_dir {
            Some(dir) => TomlConfigStore::with_data_dir(dir.clone())?,
            None => TomlConfigStore::new()?,
        });

        // Step 2: Load configuration
        let config = config_store.load()?;

        // Step 3: Initialize logging
        let mut logging = config.logging.clone();
        if let Some(level) = &options.log_level {
            logging.level = level.clone();
        }
        if options.disable_file_logging {
            logging.file_logging = false;
        }
        let log_guard = init_logging(&config_store.logs_dir(), &logging)?;

        info!(version = env!("CARGO_PKG_VERSION"), "HoldSense starting up");

        // Step 4: Wire the runtime
        let models = Arc::new(LocalModelStore::new(
            &config_store.data_dir(),
            config.detection.model_path.clone(),
        ));
        let detectors = Arc::new(YoloDetectorLoader::new(
            inference_engine(&config.detection),
            DetectorSettings::from(&config.detection),
        ));
        let detection = DetectionRuntime::new(
            camera_provider(),
            detectors,
            models,
            LoopSettings::from_config(&config.detection),
        );
        let orchestrator = RuntimeOrchestrator::new(
            config_store.clone(),
            audio_link(&config.audio),
            hotkey_source(&config.hotkeys),
            detection,
        );

        info!(
            config_path = ?config_store.config_path(),
            device_configured = config.audio.has_device(),
            "AppController initialized"
        );

        Ok(Self {
            config,
            config_store,
            orchestrator,
            _log_guard: log_guard,
        })
    }

    pub fn orchestrator(&self) -> &RuntimeOrchestrator {
        &self.orchestrator
    }

    /// Configuration as loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the config file path.
    pub fn config_path(&self) -> PathBuf {
        self.config_store.config_path()
    }

    /// Get the logs directory path.
    pub fn logs_dir(&self) -> PathBuf {
        self.config_store.logs_dir()
    }
}

#[cfg(feature = "onnx")]
fn inference_engine(config: &DetectionConfig) -> Arc<dyn InferenceEngine> {
    Arc::new(crate::adapters::OnnxInferenceEngine::new(
        config.inference_threads,
    ))
}

#[cfg(not(feature = "onnx"))]
fn inference_engine(_config: &DetectionConfig) -> Arc<dyn InferenceEngine> {
    Arc::new(crate::adapters::UnavailableInference)
}

#[cfg(feature = "camera")]
fn camera_provider() -> Arc<dyn CameraProvider> {
    Arc::new(crate::adapters::OpenCvCameraProvider::new())
}

#[cfg(not(feature = "camera"))]
fn camera_provider() -> Arc<dyn CameraProvider> {
    Arc::new(crate::adapters::UnavailableCamera)
}

#[cfg(all(target_os = "linux", feature = "bluez"))]
fn audio_link(config: &AudioLinkConfig) -> Arc<dyn AudioLink> {
    Arc::new(crate::adapters::BluezAudioLink::new(
        config.bluez_adapter.clone(),
        std::time::Duration::from_secs(config.connect_timeout_secs),
    ))
}

#[cfg(target_os = "windows")]
fn audio_link(config: &AudioLinkConfig) -> Arc<dyn AudioLink> {
    Arc::new(crate::adapters::PlaybackConnectionLink::new(
        std::time::Duration::from_secs(config.connect_timeout_secs),
    ))
}

#[cfg(not(any(all(target_os = "linux", feature = "bluez"), target_os = "windows")))]
fn audio_link(_config: &AudioLinkConfig) -> Arc<dyn AudioLink> {
    Arc::new(crate::adapters::UnsupportedAudioLink::default())
}

#[cfg(feature = "hotkeys")]
fn hotkey_source(config: &HotkeyConfig) -> Arc<dyn HotkeySource> {
    Arc::new(crate::adapters::GlobalHotkeySource::new(config.clone()))
}

#[cfg(not(feature = "hotkeys"))]
fn hotkey_source(config: &HotkeyConfig) -> Arc<dyn HotkeySource> {
    Arc::new(crate::adapters::InactiveHotkeys::new(config.enabled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_uses_config_dir() {
        let temp = tempfile::tempdir().unwrap();
        let options = ControllerOptions {
            config_dir: Some(temp.path().to_path_buf()),
            log_level: Some("debug".to_string()),
            disable_file_logging: true,
        };

        let controller = AppController::new(&options).unwrap();
        assert_eq!(controller.config_path(), temp.path().join("config.toml"));
        assert!(controller.config_path().exists());
        assert_eq!(controller.logs_dir(), temp.path().join("logs"));
        assert!(!controller.config().audio.has_device());
    }

    #[test]
    fn test_camera_capture_is_a_default_feature() {
        let manifest: toml::Table = toml::from_str(include_str!("../../Cargo.toml")).unwrap();
        let defaults = manifest["features"]["default"].as_array().unwrap();
        assert!(defaults.iter().any(|feature| feature.as_str() == Some("camera")));
    }
}
