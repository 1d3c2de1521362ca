pub mod audio_link;
pub mod camera;
pub mod config;
pub mod detector;
pub mod hotkey;
pub mod inference;
pub mod model;

pub use audio_link::AudioLink;
pub use camera::{CameraProvider, FrameSource};
pub use config::ConfigStore;
pub use detector::{DetectorLoader, ObjectDetector};
pub use hotkey::HotkeySource;
pub use inference::{InferenceEngine, InferenceSession, OutputTensor};
pub use model::ModelProvider;
