use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Bluetooth audio link configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioLinkConfig {
    /// Target phone: MAC address or native platform device id. Empty means unset.
    pub device_id: String,
    /// Upper bound for a single connect or disconnect call.
    pub connect_timeout_secs: u64,
    /// BlueZ adapter used to build device object paths (Linux only).
    pub bluez_adapter: String,
}

impl Default for AudioLinkConfig {
    fn default() -> Self {
        Self {
            device_id: String::new(),
            connect_timeout_secs: 15,
            bluez_adapter: "hci0".to_string(),
        }
    }
}

impl AudioLinkConfig {
    /// Whether a target device has been chosen.
    pub fn has_device(&self) -> bool {
        !self.device_id.trim().is_empty()
    }
}

/// Webcam detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Auto-detection requested at startup.
    pub enabled: bool,
    /// Camera index. Negative values are clamped to 0.
    pub webcam_index: i32,
    /// Explicit model file. When unset the model store searches the usual locations.
    pub model_path: Option<PathBuf>,
    /// Class index of the target object in the model output (67 is "cell phone" in COCO).
    pub target_class: usize,
    /// Minimum class score for a candidate box.
    pub confidence_threshold: f32,
    /// Maximum IoU between two kept boxes.
    pub nms_threshold: f32,
    /// Only every n-th successfully read frame is run through the model.
    pub process_every_n_frames: u32,
    /// Intra-op threads for the inference runtime (0 = runtime default).
    pub inference_threads: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webcam_index: 0,
            model_path: None,
            target_class: 67,
            confidence_threshold: 0.25,
            nms_threshold: 0.45,
            process_every_n_frames: 2,
            inference_threads: 0,
        }
    }
}

impl DetectionConfig {
    /// Camera index with negative values clamped to 0.
    pub fn camera_index(&self) -> u32 {
        self.webcam_index.max(0) as u32
    }
}

/// Global shortcut configuration.
///
/// Bindings use the `modifier+modifier+Code` form, e.g. `ctrl+alt+KeyC`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Hotkey presses are delivered only while this is true.
    pub enabled: bool,
    /// Toggles the audio link.
    pub toggle_audio: String,
    /// Toggles auto-detection.
    pub toggle_detection: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            toggle_audio: "ctrl+alt+KeyC".to_string(),
            toggle_detection: "ctrl+alt+KeyW".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
    /// Maximum number of log files to keep.
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
            max_files: 7,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioLinkConfig,
    pub detection: DetectionConfig,
    pub hotkeys: HotkeyConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
