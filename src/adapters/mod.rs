pub mod config_store;
pub mod link_state;
pub mod model_store;
pub mod unavailable;
pub mod yolo_detector;

#[cfg(all(target_os = "linux", feature = "bluez"))]
pub mod bluez_audio;
#[cfg(feature = "hotkeys")]
pub mod global_hotkeys;
#[cfg(feature = "onnx")]
pub mod onnx_runtime;
#[cfg(feature = "camera")]
pub mod opencv_camera;
#[cfg(target_os = "windows")]
pub mod playback_connection;

pub use config_store::TomlConfigStore;
pub use link_state::ConnectionSignal;
pub use model_store::LocalModelStore;
pub use unavailable::{InactiveHotkeys, UnavailableCamera, UnavailableInference, UnsupportedAudioLink};
pub use yolo_detector::{YoloDetector, YoloDetectorLoader};

#[cfg(all(target_os = "linux", feature = "bluez"))]
pub use bluez_audio::BluezAudioLink;
#[cfg(feature = "hotkeys")]
pub use global_hotkeys::GlobalHotkeySource;
#[cfg(feature = "onnx")]
pub use onnx_runtime::OnnxInferenceEngine;
#[cfg(feature = "camera")]
pub use opencv_camera::OpenCvCameraProvider;
#[cfg(target_os = "windows")]
pub use playback_connection::PlaybackConnectionLink;
